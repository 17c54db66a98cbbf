use anyhow::Result;
use parley::backend::{BackendConfig, HttpBackend};
use parley::interaction::{InteractionController, InteractionEvent, NoticeSeverity};
use parley::transcript::{ExportFormat, Role, TranscriptStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley chat client");

    let base_url = std::env::var("PARLEY_BACKEND_URL")
        .unwrap_or_else(|_| "http://localhost:5001".to_string());
    let backend = Arc::new(HttpBackend::new(BackendConfig::new(base_url))?);
    let controller = InteractionController::new(backend, TranscriptStore::new());
    let events = controller.event_receiver();

    println!("Type a message and press Enter. Commands: /cancel /clear /export [json|text] /stats /quit");

    // Print controller events as they arrive
    tokio::spawn(async move {
        loop {
            drain_events(&events);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" => break,
            "/cancel" => controller.cancel_generation(),
            "/clear" => {
                // The command itself is the confirmation gesture
                let _ = controller.clear_transcript(true);
            }
            "/stats" => println!("Round trips: {}", controller.round_trip_summary()),
            "/export" | "/export json" => print_export(&controller, ExportFormat::Json),
            "/export text" => print_export(&controller, ExportFormat::Text),
            _ => {
                // Run the submission in the background so /cancel works
                // while the response is in flight
                let submitter = controller.clone();
                tokio::spawn(async move {
                    let _ = submitter.submit_text(&line).await;
                });
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

fn drain_events(events: &crossbeam_channel::Receiver<InteractionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            InteractionEvent::TurnAppended(turn) => {
                let who = match turn.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                println!("{}: {}", who, turn.content);
            }
            InteractionEvent::LatencyUpdate(breakdown) => {
                println!("  [{}]", breakdown.summary());
            }
            InteractionEvent::Notice { severity, message } => {
                let tag = match severity {
                    NoticeSeverity::Info => "info",
                    NoticeSeverity::Warning => "warn",
                    NoticeSeverity::Error => "error",
                };
                println!("  ({}) {}", tag, message);
            }
            _ => {}
        }
    }
}

fn print_export(controller: &InteractionController, format: ExportFormat) {
    match controller.export(format) {
        Ok(content) => println!("{}", content),
        Err(e) => eprintln!("Export failed: {}", e),
    }
}
