use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ApiRateLimiter, FundamentalsSource};
use crate::error::FetchError;
use crate::models::{FundamentalsConfig, QuarterlyStatement};

/// Financial Modeling Prep client for quarterly income statements
pub struct FmpClient {
    client: Client,
    config: FundamentalsConfig,
    retry_limiter: Option<Arc<ApiRateLimiter>>,
}

/// Result of one HTTP attempt
enum Attempt {
    Done(Result<Vec<QuarterlyStatement>, FetchError>),
    Retry(String),
}

impl FmpClient {
    /// Create a new FMP client; every request is bounded by `config.timeout`
    pub fn new(config: FundamentalsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("rule40-screen/0.1")
            .build()?;

        Ok(Self {
            client,
            config,
            retry_limiter: None,
        })
    }

    /// Pace retries with the limiter that already paces first attempts
    pub fn with_retry_limiter(mut self, limiter: Arc<ApiRateLimiter>) -> Self {
        self.retry_limiter = Some(limiter);
        self
    }

    fn statement_url(&self, symbol: &str) -> String {
        format!(
            "{}/income-statement/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        )
    }

    async fn attempt(&self, symbol: &str) -> Attempt {
        let quarters = self.config.quarters.to_string();
        let response = self
            .client
            .get(self.statement_url(symbol))
            .query(&[
                ("period", "quarter"),
                ("limit", quarters.as_str()),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Attempt::Retry(format!("HTTP {}", status));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => return Attempt::Retry(format!("unreadable body: {}", e)),
        };

        Attempt::Done(parse_statements(body))
    }
}

/// Decode an FMP income-statement payload.
///
/// Anything other than a JSON array is rejected. A record that fails to decode
/// becomes an empty quarter in its slot, so later quarters keep their position.
pub fn parse_statements(body: Value) -> Result<Vec<QuarterlyStatement>, FetchError> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(map) => {
            let message = map
                .get("Error Message")
                .and_then(Value::as_str)
                .unwrap_or("object instead of statement list");
            return Err(FetchError::UnexpectedPayload(message.to_string()));
        }
        other => {
            return Err(FetchError::UnexpectedPayload(format!(
                "expected a statement list, got {}",
                other
            )))
        }
    };

    let mut statements: Vec<QuarterlyStatement> = rows
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap_or_default())
        .collect();

    // FMP returns newest first; re-sort only when every row is dated
    if statements.iter().all(|s| s.date.is_some()) {
        statements.sort_by(|a, b| b.date.cmp(&a.date));
    }

    Ok(statements)
}

#[async_trait]
impl FundamentalsSource for FmpClient {
    async fn quarterly_income(&self, symbol: &str) -> Result<Vec<QuarterlyStatement>, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                if let Some(limiter) = &self.retry_limiter {
                    limiter.wait().await;
                }
            }

            match self.attempt(symbol).await {
                Attempt::Done(result) => {
                    if let Ok(statements) = &result {
                        debug!("{}: {} quarterly statements", symbol, statements.len());
                    }
                    return result;
                }
                Attempt::Retry(reason) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        max_attempts,
                        symbol,
                        reason
                    );
                    last_error = reason;
                }
            }

            if attempt + 1 < max_attempts {
                tokio::time::sleep(self.config.retry_delay(attempt)).await;
            }
        }

        Err(FetchError::Exhausted {
            attempts: max_attempts,
            last: last_error,
        })
    }
}
