mod console;
mod gateway;

use clap::{Parser, Subcommand};
use console::{console_address, ConsoleAdapter, EchoDialog};
use gateway::notifier::Notifier;
use gateway::Gateway;
use herald_core::{activity::IncomingActivity, config, traits::ChannelAdapter};
use herald_state::{registry::ConversationRegistry, store::StateStore, transcript::TranscriptLog};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "herald",
    version,
    about = "Herald — proactive conversational agent core"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent on the local console channel.
    Start,
    /// Print the resolved configuration.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => start(&cli.config).await,
        Commands::Status => status(&cli.config),
    }
}

async fn start(config_path: &str) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;

    let store = StateStore::in_memory();
    let registry = Arc::new(ConversationRegistry::new());
    let transcript = TranscriptLog::new(store.clone(), &cfg.herald.log_id);
    let adapter: Arc<dyn ChannelAdapter> = Arc::new(ConsoleAdapter);
    let gateway = Arc::new(Gateway::new(
        store,
        registry.clone(),
        transcript,
        Arc::new(EchoDialog),
    ));

    let notifier = if cfg.notify.enabled {
        let notifier = Notifier::new(
            adapter.clone(),
            registry,
            cfg.herald.app_id.clone(),
            &cfg.notify,
        )?;
        notifier.arm();
        Some(notifier)
    } else {
        None
    };

    info!(
        "Herald gateway running | channel: console | notify: {}",
        if cfg.notify.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("Herald is listening. Type a message, 'notify' to trigger a broadcast, ctrl-c to quit.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text == "notify" {
                    match &notifier {
                        Some(notifier) => {
                            let receipt = notifier.notify_now().await;
                            println!(
                                "notified: {} delivered, {} failed, next timer {}",
                                receipt.delivered,
                                receipt.failed,
                                if receipt.armed { "armed" } else { "not armed" }
                            );
                        }
                        None => println!("notifications are disabled"),
                    }
                    continue;
                }

                let activity = IncomingActivity::new(text, console_address());
                let ctx = adapter
                    .resume_conversation(&cfg.herald.app_id, &activity.address)
                    .await?;
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    gateway.handle_turn(ctx.as_ref(), &activity).await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

fn status(config_path: &str) -> anyhow::Result<()> {
    let cfg = config::load(config_path)?;
    println!("Herald — Status\n");
    println!("Config: {config_path}");
    println!("App id: {}", cfg.herald.app_id);
    println!("Transcript log id: {}", cfg.herald.log_id);
    println!(
        "Notify: {} at {:02}:{:02} {}",
        if cfg.notify.enabled {
            "enabled"
        } else {
            "disabled"
        },
        cfg.notify.hour,
        cfg.notify.minute,
        cfg.notify.timezone
    );
    Ok(())
}
