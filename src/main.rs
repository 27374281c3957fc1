//! Storyloom - write a story together with an AI, one turn at a time
//!
//! Reads turns from stdin (one line per turn) and prints the AI's replies.
//! The session ends when either side writes THE END.

use std::io::Write;
use std::process::ExitCode;
use storyloom::client::StoryApiClient;
use storyloom::config::StoryConfig;
use storyloom::story::Sender;
use storyloom::{SessionEvent, SessionHandle, SessionRuntime, TERMINAL_MARKER};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the story
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyloom=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = StoryConfig::from_env()?;
    let api = StoryApiClient::new(&config.api_url)?;
    tracing::info!(
        api_url = %api.base_url(),
        generate_timeout = ?config.timeouts.generate,
        format_timeout = ?config.timeouts.format,
        "Story service configured"
    );

    let handle = SessionRuntime::spawn(api.clone(), api, config.timeouts);
    tracing::info!(session_id = %handle.session_id(), "Story session started");
    let mut events = handle.subscribe();

    println!("Take turns with the AI to write a story. Press Enter to send a turn.");
    println!("End your turn with \"{TERMINAL_MARKER}\" to finish the story.");
    println!();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            // Updates already broadcast are shown before noticing the stop
            biased;

            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(code) = render(&handle, event) {
                        return Ok(code);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Display fell behind the session");
                }
                Err(RecvError::Closed) => return Ok(ExitCode::FAILURE),
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(text) => handle.submit(text).await?,
                None => {
                    // Queued turns, and any formatting they start, still complete
                    stdin_open = false;
                    handle.finish();
                }
            },
            () = handle.stopped() => return Ok(ExitCode::SUCCESS),
            result = tokio::signal::ctrl_c() => {
                result?;
                handle.close();
                println!();
                return Ok(ExitCode::from(130));
            }
        }
    }
}

/// Print one session update. Returns an exit code once the session is over.
fn render(handle: &SessionHandle, event: SessionEvent) -> Option<ExitCode> {
    match event {
        SessionEvent::TurnAppended { turn } => {
            if turn.sender == Sender::Ai {
                println!("{}> {}", turn.sender.label(), turn.text);
                prompt();
            }
        }
        SessionEvent::GenerationFailed { error } => {
            println!("! {error}");
            if error.kind.is_transient() {
                println!("! Your turn was kept. Send another to continue.");
            } else {
                println!("! The story service could not use that turn.");
                println!("! Try wording it differently.");
            }
            prompt();
        }
        SessionEvent::Rejected { reason } => println!("! {reason}"),
        SessionEvent::StoryEnded { .. } => {
            println!();
            println!("The story has ended. Formatting...");
        }
        SessionEvent::StoryFormatted { story } => {
            println!();
            println!("{}", story.to_plain_text());
            return Some(ExitCode::SUCCESS);
        }
        SessionEvent::FormatFailed { error } => {
            eprintln!("Could not format the story: {error}");
            println!();
            println!("{}", handle.current_story());
            return Some(ExitCode::FAILURE);
        }
    }
    None
}

fn prompt() {
    print!("you> ");
    let _ = std::io::stdout().flush();
}
