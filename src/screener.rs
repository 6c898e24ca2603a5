//! Batch screening over a ticker universe.
//!
//! Each ticker is an independent unit of work (fetch, aggregate, derive) that
//! always ends in exactly one [`TickerOutcome`]. Units run through a bounded
//! `buffer_unordered` stream; results come back tagged with their universe
//! index and are merged by the driving task alone, so completion order never
//! leaks into the output.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::cmp::Ordering;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ApiRateLimiter, FundamentalsSource};
use crate::metrics;
use crate::models::{ScreenConfig, ScreenRow, TickerOutcome, UniverseEntry};
use crate::stats::ScreenStats;

/// Rows sorted by score, highest first, unscored rows last
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<ScreenRow>,
}

impl ResultTable {
    pub fn new(mut rows: Vec<ScreenRow>) -> Self {
        sort_by_score(&mut rows);
        Self { rows }
    }

    pub fn rows(&self) -> &[ScreenRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&ScreenRow> {
        self.rows.iter().find(|row| row.entry.symbol == symbol)
    }

    /// Rows scoring at least `min_score`, in table order
    pub fn screened(&self, min_score: f64) -> Vec<&ScreenRow> {
        self.rows
            .iter()
            .filter(|row| row.score().is_some_and(|score| score >= min_score))
            .collect()
    }
}

/// Stable sort: score descending, undefined scores after every defined one
pub fn sort_by_score(rows: &mut [ScreenRow]) {
    rows.sort_by(|a, b| match (a.score(), b.score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Completed run: the table plus its summary
#[derive(Debug, Clone)]
pub struct ScreenReport {
    pub table: ResultTable,
    pub stats: ScreenStats,
}

pub struct Screener<S> {
    source: S,
    config: ScreenConfig,
    limiter: Arc<ApiRateLimiter>,
}

impl<S: FundamentalsSource> Screener<S> {
    pub fn new(source: S, config: ScreenConfig) -> Self {
        let limiter = Arc::new(ApiRateLimiter::new(config.request_delay));
        Self::with_limiter(source, config, limiter)
    }

    /// Share `limiter` with the source so its retries are paced too
    pub fn with_limiter(source: S, config: ScreenConfig, limiter: Arc<ApiRateLimiter>) -> Self {
        Self {
            source,
            config,
            limiter,
        }
    }

    /// Screen every entry; never fails, a broken ticker becomes a not-ok row
    pub async fn run(&self, universe: &[UniverseEntry]) -> ScreenReport {
        let started = Instant::now();
        let total = universe.len();
        let concurrency = self.config.concurrency.max(1);
        let progress_every = self.config.progress_every.max(1);

        info!("🚀 Screening {} tickers ({} at a time)", total, concurrency);

        let mut slots: Vec<Option<TickerOutcome>> = vec![None; total];
        let mut results = stream::iter(universe.iter().enumerate())
            .map(|(index, entry)| async move { (index, self.screen_ticker(entry).await) })
            .buffer_unordered(concurrency);

        let mut processed = 0;
        while let Some((index, outcome)) = results.next().await {
            processed += 1;
            slots[index] = Some(outcome);

            if processed % progress_every == 0 {
                info!("📊 Processed {} / {}...", processed, total);
            }
        }

        let rows: Vec<ScreenRow> = universe
            .iter()
            .zip(slots)
            .map(|(entry, outcome)| {
                let outcome = outcome
                    .unwrap_or_else(|| TickerOutcome::Failed("not processed".to_string()));
                ScreenRow::new(entry.clone(), outcome)
            })
            .collect();

        let stats = ScreenStats::from_rows(&rows, started.elapsed());
        ScreenReport {
            table: ResultTable::new(rows),
            stats,
        }
    }

    /// One unit of work; panics inside it are caught here
    async fn screen_ticker(&self, entry: &UniverseEntry) -> TickerOutcome {
        self.limiter.wait().await;

        let symbol = entry.symbol.as_str();
        let unit = async {
            match self.source.quarterly_income(symbol).await {
                Ok(statements) if statements.is_empty() => TickerOutcome::NoData,
                Ok(statements) => {
                    TickerOutcome::Computed(metrics::compute_from_statements(&statements))
                }
                Err(e) => TickerOutcome::Failed(e.to_string()),
            }
        };

        let outcome = match AssertUnwindSafe(unit).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => TickerOutcome::Failed(panic_message(payload)),
        };

        match &outcome {
            TickerOutcome::Computed(record) => debug!(
                "{}: score {:?} ({:?})",
                symbol, record.rule40_score, record.margin_basis
            ),
            TickerOutcome::NoData => debug!("{}: no statements returned", symbol),
            TickerOutcome::Failed(reason) => warn!("❌ {}: {}", symbol, reason),
        }
        outcome
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panicked: {}", detail)
}
