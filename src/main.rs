use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use voicerag::config::AppConfig;
use voicerag::core::{
    EventRouter, NullSink, ResponseOrchestrator, RetrievalClient, SessionHandle, SilenceSource,
    TransportSession,
};

/// Realtime voice console with retrieval-grounded answers
#[derive(Parser, Debug)]
#[command(name = "voicerag")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => AppConfig::from_file(&path),
        None => AppConfig::from_env(),
    }
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    info!(model = %config.model, retrieval = %config.retrieval_url, "starting console");

    let handle = SessionHandle::new();
    let retrieval = RetrievalClient::new(&config.retrieval_url);
    let orchestrator =
        ResponseOrchestrator::new(handle.clone(), retrieval, config.retrieval_tool.clone());
    let router = Arc::new(EventRouter::new(
        handle.clone(),
        orchestrator.clone(),
        config.retrieval_tool.clone(),
    ));
    let session = TransportSession::new(
        config.transport(),
        handle.clone(),
        router,
        Arc::new(SilenceSource),
        Arc::new(NullSink),
    );

    session.start().await?;
    println!("session started; type a message, :log for history, :quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" => break,
            ":log" => {
                for entry in handle.log().snapshot() {
                    println!(
                        "{} {:>8} {} {}",
                        entry.timestamp,
                        format!("{:?}", entry.direction).to_lowercase(),
                        entry.event_type,
                        entry.event_id.as_deref().unwrap_or("-"),
                    );
                }
            }
            text => {
                if let Err(err) = orchestrator.send_user_message(text).await {
                    eprintln!("send failed: {err}");
                }
            }
        }
    }

    session.stop().await?;
    info!("console stopped");
    Ok(())
}
