use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rule40_screen::api::{ApiRateLimiter, FmpClient};
use rule40_screen::export;
use rule40_screen::models::{Config, Overrides};
use rule40_screen::universe::UniverseProvider;
use rule40_screen::Screener;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rule of 40 screen for the Russell 3000", long_about = None)]
struct Args {
    /// FMP API key (or set FMP_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// CSV with columns Ticker,Name to override the IWV universe
    #[arg(long)]
    tickers_csv: Option<PathBuf>,

    /// Minimum Rule of 40 score kept in the screened output
    #[arg(long)]
    min_score: Option<f64>,

    /// Delay between fundamentals requests, in seconds
    #[arg(long)]
    sleep: Option<f64>,

    /// Tickers fetched concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Only screen the first N tickers of the universe
    #[arg(long)]
    limit: Option<usize>,

    /// Directory for the CSV outputs
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rule40_screen=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn overrides(args: &Args) -> Result<Overrides> {
    let request_delay = args
        .sleep
        .map(|sleep| {
            Duration::try_from_secs_f64(sleep)
                .map_err(|e| anyhow::anyhow!("Invalid --sleep {}: {}", sleep, e))
        })
        .transpose()?;

    Ok(Overrides {
        min_score: args.min_score,
        request_delay,
        concurrency: args.concurrency,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = Config::from_env(args.api_key.clone())?;
    config.apply(overrides(&args)?)?;

    let provider = UniverseProvider::new(config.universe.clone())?;
    let mut universe = provider.load(args.tickers_csv.as_deref()).await?;
    if let Some(limit) = args.limit {
        universe.truncate(limit);
        info!("🔢 Limiting to {} tickers", universe.len());
    }

    let limiter = Arc::new(ApiRateLimiter::new(config.screen.request_delay));
    let client = FmpClient::new(config.fundamentals.clone())?.with_retry_limiter(limiter.clone());
    let screener = Screener::with_limiter(client, config.screen.clone(), limiter);
    let report = screener.run(&universe).await;
    report.stats.log_summary();

    let min_score = config.screen.min_score;
    let files = export::write_outputs(&args.output_dir, &report.table, min_score)?;
    info!("💾 Saved: {}, {}", files.full.display(), files.screened.display());

    if files.screened_count > 0 {
        info!("✅ {} names with Rule of 40 >= {}", files.screened_count, min_score);
    } else {
        warn!("No names with Rule of 40 >= {}", min_score);
    }

    Ok(())
}
