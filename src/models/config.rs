//! Configuration loaded from the environment (and `.env`), overridable from the CLI.

use std::time::Duration;

use crate::error::ScreenError;

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// iShares Russell 3000 ETF holdings, used as a Russell 3000 proxy
pub const DEFAULT_UNIVERSE_URL: &str = "https://www.ishares.com/us/products/239714/ishares-russell-3000-etf/1467271812596.ajax?dataType=fund&fileName=IWV_holdings&fileType=csv";

/// Settings for the fundamentals client
#[derive(Debug, Clone)]
pub struct FundamentalsConfig {
    pub base_url: String,
    pub api_key: String,
    /// Number of quarterly periods requested per ticker
    pub quarters: u32,
    pub max_attempts: u32,
    /// Wait before the second attempt; later attempts add `retry_step` each
    pub retry_base_delay: Duration,
    pub retry_step: Duration,
    pub timeout: Duration,
}

impl FundamentalsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_FMP_BASE_URL.to_string(),
            api_key: api_key.into(),
            quarters: 8,
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_step: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }

    /// Linear backoff: base plus `attempt` steps (attempt is zero-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay + self.retry_step * attempt
    }
}

/// Settings for the holdings download
#[derive(Debug, Clone)]
pub struct UniverseConfig {
    pub holdings_url: String,
    pub timeout: Duration,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            holdings_url: DEFAULT_UNIVERSE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the batch run
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Minimum spacing between fundamentals requests across all workers
    pub request_delay: Duration,
    /// Tickers processed at once; 1 means strictly sequential
    pub concurrency: usize,
    pub min_score: f64,
    pub progress_every: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(250),
            concurrency: 1,
            min_score: 40.0,
            progress_every: 25,
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub fundamentals: FundamentalsConfig,
    pub universe: UniverseConfig,
    pub screen: ScreenConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `api_key` takes precedence over `FMP_API_KEY`; a run without any key
    /// is refused before any work starts. Values are not validated here since
    /// command-line overrides may still replace them, see [`Config::apply`].
    pub fn from_env(api_key: Option<String>) -> Result<Self, ScreenError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let api_key = resolve_api_key(api_key, std::env::var("FMP_API_KEY").ok())?;
        let timeout = Duration::from_secs(env_var_parse("HTTP_TIMEOUT_SECS", 30));

        let mut fundamentals = FundamentalsConfig::new(api_key);
        fundamentals.timeout = timeout;
        fundamentals.max_attempts = env_var_parse("FETCH_MAX_ATTEMPTS", 3);
        if let Ok(url) = std::env::var("FMP_BASE_URL") {
            fundamentals.base_url = url;
        }

        let universe = UniverseConfig {
            holdings_url: std::env::var("UNIVERSE_URL")
                .unwrap_or_else(|_| DEFAULT_UNIVERSE_URL.to_string()),
            timeout,
        };

        let screen = ScreenConfig {
            request_delay: Duration::from_millis(env_var_parse("REQUEST_DELAY_MS", 250)),
            concurrency: env_var_parse("SCREEN_CONCURRENCY", 1),
            min_score: env_var_parse("MIN_SCORE", 40.0),
            ..ScreenConfig::default()
        };

        Ok(Config {
            fundamentals,
            universe,
            screen,
        })
    }

    /// Apply command-line overrides, then validate the merged result
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ScreenError> {
        if let Some(min_score) = overrides.min_score {
            self.screen.min_score = min_score;
        }
        if let Some(request_delay) = overrides.request_delay {
            self.screen.request_delay = request_delay;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.screen.concurrency = concurrency;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.fundamentals.max_attempts == 0 {
            return Err(ScreenError::Config("FETCH_MAX_ATTEMPTS must be at least 1".to_string()));
        }
        if self.screen.concurrency == 0 {
            return Err(ScreenError::Config("concurrency must be at least 1".to_string()));
        }
        if !self.screen.min_score.is_finite() {
            return Err(ScreenError::Config("minimum score must be a finite number".to_string()));
        }
        Ok(())
    }
}

/// Screen settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub min_score: Option<f64>,
    pub request_delay: Option<Duration>,
    pub concurrency: Option<usize>,
}

/// Command-line key wins over the environment; blank values count as missing
pub fn resolve_api_key(cli: Option<String>, env: Option<String>) -> Result<String, ScreenError> {
    cli.into_iter()
        .chain(env)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or(ScreenError::MissingApiKey)
}

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
