use anyhow::Result;
use autonomous_program::app::App;
use autonomous_program::models::{parse_history_window, Config};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "autonomous-program")]
#[command(about = "Generate image variations and an ebook, then chat with a model")]
struct CliArgs {
    /// Number of chat turns (overrides CHAT_TURNS).
    #[arg(long)]
    turns: Option<usize>,

    /// Number of image variations (overrides IMAGE_VARIATIONS).
    #[arg(long)]
    variations: Option<u32>,

    /// Variation size, e.g. 1024x1024 (overrides IMAGE_SIZE).
    #[arg(long)]
    size: Option<String>,

    /// Only send the last N exchanges to the dialogue model (overrides HISTORY_WINDOW).
    #[arg(long, value_parser = parse_window_arg)]
    history_window: Option<usize>,
}

fn parse_window_arg(input: &str) -> std::result::Result<usize, String> {
    parse_history_window(input).map_err(|e| e.to_string())
}

impl CliArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(turns) = self.turns {
            config.chat_turns = turns;
        }
        if let Some(variations) = self.variations {
            config.image_variations = variations;
        }
        if let Some(size) = self.size {
            config.image_size = size;
        }
        if let Some(window) = self.history_window {
            config.history_window = Some(window);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autonomous_program=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting autonomous-program");

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    match App::new(&config) {
        Ok(mut app) => match app.run().await {
            Ok(summary) => {
                info!(
                    "Run completed: {} variation(s), ebook at {}, {}/{} chat turns",
                    summary.variations.len(),
                    summary.ebook_path.display(),
                    summary.chat.completed,
                    summary.chat.requested
                );
                Ok(())
            }
            Err(e) => {
                error!("Run failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
