use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use audiobridge::{BridgeConfig, ChannelSink, CommandDispatcher, RodioPlayerFactory, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Optional config file as first argument; defaults otherwise.
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load(&path)?,
        None => BridgeConfig::default(),
    };

    let (sink, mut rx_event) = ChannelSink::new(config.event_buffer);
    let manager = SessionManager::new(&config, Arc::new(RodioPlayerFactory), Arc::new(sink));
    let dispatcher = CommandDispatcher::new(manager.clone());

    // stdin reader task: one JSON command per line.
    let (tx_line, mut rx_line) = mpsc::channel::<String>(100);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx_line.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("stdin read error: {}", e);
                    break;
                }
            }
        }
    });

    log::info!("audiobridge started ({} ms progress period)", config.progress_interval_ms);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }

            Some(line) = rx_line.recv() => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match dispatcher.handle_message(trimmed).await {
                    Some(reply) => println!("{}", reply),
                    None => log::warn!("Ignoring non-command input: {}", trimmed),
                }
            }

            Some(event) = rx_event.recv() => {
                let frame = serde_json::json!({
                    "method": event.method(),
                    "arguments": event.arguments(),
                });
                println!("{}", frame);
            }
        }
    }

    manager.shutdown().await;
    Ok(())
}
