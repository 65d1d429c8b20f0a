use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use helpdesk_demo::{config::Config, scenario};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting helpdesk chat walkthrough");
    tracing::info!(
        "Acting as {} ({:?})",
        config.participant.id,
        config.participant.role
    );

    let transcript = scenario::run(&config).await?;

    tracing::info!("Conversation {}", transcript.conversation_id);
    for line in &transcript.lines {
        let marker = if line.pending { " (sending)" } else { "" };
        tracing::info!("[{}] {:?}: {}{}", line.label, line.sender, line.text, marker);
    }
    tracing::info!("Unread remaining: {}", transcript.total_unread);

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
