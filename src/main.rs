use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagepulse::config::{load_settings, Settings};
use pagepulse::repository::open_store;
use pagepulse::server::{self, AppState};
use pagepulse::services::{PerformanceService, ScoreScale};

#[derive(Parser)]
#[command(name = "pagepulse")]
#[command(about = "Record page-quality insights and chart them over time")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the dashboard and fetcher HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3030)]
        port: u16,
    },
    /// Run the insight fetcher for the given URLs and store the outcomes
    Collect {
        /// URLs to analyse, in order
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Run PageSpeed Insights for one URL (both strategies)
    Pagespeed {
        /// URL to analyse; defaults to the configured target URL
        #[arg(short, long)]
        url: Option<String>,
    },
    /// List every URL with stored insights
    Urls,
    /// Print the mobile and desktop score series for a URL
    Series {
        url: String,
        /// Emit raw 0..1 scores instead of percentages
        #[arg(long)]
        fraction: bool,
    },
}

/// Services backed by the configured insight store.
async fn app_state(settings: &Settings) -> Result<AppState> {
    let store = open_store(settings).await?;
    AppState::from_settings(settings, store)
}

async fn handle(command: Command) -> Result<()> {
    let settings = load_settings().await;

    match command {
        Command::Serve { host, port } => server::serve(app_state(&settings).await?, &host, port).await,
        Command::Collect { urls } => {
            let results = app_state(&settings).await?.insights.process(&urls).await?;
            let body = serde_json::json!({ "results": results });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Command::Pagespeed { url } => {
            let report = PerformanceService::from_settings(&settings)?
                .report(url.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Urls => {
            for url in app_state(&settings).await?.dashboard.list_urls().await? {
                println!("{}", url);
            }
            Ok(())
        }
        Command::Series { url, fraction } => {
            let scale = if fraction {
                ScoreScale::Fraction
            } else {
                ScoreScale::Percent
            };
            let series = app_state(&settings).await?.dashboard.series(&url, scale).await?;
            println!("{}", serde_json::to_string_pretty(&series)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    handle(cli.command).await
}
