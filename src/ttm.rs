//! Trailing-twelve-month aggregation over quarterly statements.

use crate::models::QuarterlyStatement;

/// Quarters summed into one TTM figure
pub const QUARTERS_PER_TTM: usize = 4;

/// Sum of the first four valid values at or after `offset`.
///
/// Values are ordered most recent first. Missing and non-finite values are
/// skipped. With fewer than four valid values the result is `None`; partial
/// sums are never returned.
pub fn ttm_from_quarters(values: &[Option<f64>], offset: usize) -> Option<f64> {
    let window: Vec<f64> = values
        .iter()
        .skip(offset)
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .take(QUARTERS_PER_TTM)
        .collect();

    if window.len() < QUARTERS_PER_TTM {
        return None;
    }
    Some(window.iter().sum())
}

/// Current and prior TTM figures for the fields the screen uses
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TtmFigures {
    pub revenue: Option<f64>,
    pub revenue_prior: Option<f64>,
    pub operating_income: Option<f64>,
    pub sbc: Option<f64>,
}

impl TtmFigures {
    pub fn from_statements(statements: &[QuarterlyStatement]) -> Self {
        let revenue: Vec<Option<f64>> = statements.iter().map(|s| s.revenue()).collect();
        let operating_income: Vec<Option<f64>> =
            statements.iter().map(|s| s.operating_income).collect();
        let sbc: Vec<Option<f64>> = statements
            .iter()
            .map(|s| s.stock_based_compensation)
            .collect();

        Self {
            revenue: ttm_from_quarters(&revenue, 0),
            revenue_prior: ttm_from_quarters(&revenue, QUARTERS_PER_TTM),
            operating_income: ttm_from_quarters(&operating_income, 0),
            sbc: ttm_from_quarters(&sbc, 0),
        }
    }
}
