use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use std::time::Duration;

use crate::error::FetchError;
use crate::models::QuarterlyStatement;

pub mod fmp_client;
pub use fmp_client::FmpClient;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces out requests shared by every worker of a run.
///
/// A zero delay disables limiting entirely.
pub struct ApiRateLimiter {
    limiter: Option<DirectLimiter>,
}

impl ApiRateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            limiter: Quota::with_period(delay).map(DirectLimiter::direct),
        }
    }

    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Source of quarterly income statements, most recent quarter first.
///
/// `Ok(vec![])` means the source answered but has nothing for the symbol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn quarterly_income(&self, symbol: &str) -> Result<Vec<QuarterlyStatement>, FetchError>;
}
