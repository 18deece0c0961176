use std::sync::Arc;

use clap::{Parser, Subcommand};
use shopsight_core::load_app_config;
use shopsight_scraper::{extract_store_insights, OpenAiModel, StoreClient, Structurer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopsight")]
#[command(about = "Storefront commerce-intelligence extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extracts the full insight report for one storefront URL.
    Extract {
        /// Storefront URL, with or without a scheme.
        url: String,
        /// Pretty-print the JSON report.
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract { url, pretty } => {
            let client = StoreClient::from_config(&config)?;
            let structurer = match config.openai_api_key.as_deref() {
                Some(key) => {
                    let model = OpenAiModel::new(
                        key.to_owned(),
                        config.openai_model.clone(),
                        config.request_timeout_secs,
                    )?;
                    Some(Structurer::new(
                        Arc::new(model),
                        config.llm_concurrency,
                        config.llm_max_retries,
                    ))
                }
                None => {
                    tracing::info!("no OPENAI_API_KEY set, structuring fallback disabled");
                    None
                }
            };

            let report = extract_store_insights(&client, structurer.as_ref(), &config, &url).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
