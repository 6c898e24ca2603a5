//! Run summary.

use std::time::Duration;

use crate::models::{ScreenRow, TickerOutcome};

/// Counts per outcome for one screening run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenStats {
    pub total: usize,
    pub computed: usize,
    pub no_data: usize,
    pub failed: usize,
    /// Rows with a defined Rule of 40 score
    pub scored: usize,
    pub elapsed: Duration,
}

impl ScreenStats {
    pub fn from_rows(rows: &[ScreenRow], elapsed: Duration) -> Self {
        let mut stats = Self {
            total: rows.len(),
            elapsed,
            ..Self::default()
        };

        for row in rows {
            match row.outcome {
                TickerOutcome::Computed(_) => stats.computed += 1,
                TickerOutcome::NoData => stats.no_data += 1,
                TickerOutcome::Failed(_) => stats.failed += 1,
            }
            if row.score().is_some() {
                stats.scored += 1;
            }
        }
        stats
    }

    /// Share of tickers that ended with a score (%)
    pub fn scored_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.scored as f64 / self.total as f64) * 100.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            computed = self.computed,
            no_data = self.no_data,
            failed = self.failed,
            scored = self.scored,
            scored_rate = format!("{:.1}%", self.scored_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "Screen completed"
        );
    }
}
