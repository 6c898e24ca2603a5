//! Rule of 40 derivations.
//!
//! Every function here is total over optional inputs: an absent input, a zero
//! denominator or a non-finite intermediate yields `None`.

use chrono::NaiveDate;

use crate::models::{MarginBasis, MetricRecord, QuarterlyStatement};
use crate::ttm::TtmFigures;

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

fn to_pct(fraction: Option<f64>) -> Option<f64> {
    fraction.map(|f| f * 100.0)
}

/// YoY growth of TTM revenue, as a fraction
pub fn revenue_growth(revenue_ttm: Option<f64>, revenue_ttm_prior: Option<f64>) -> Option<f64> {
    ratio(revenue_ttm?, revenue_ttm_prior?).map(|r| r - 1.0)
}

/// (operating income + SBC) / revenue, as a fraction
pub fn adjusted_margin(
    operating_income_ttm: Option<f64>,
    sbc_ttm: Option<f64>,
    revenue_ttm: Option<f64>,
) -> Option<f64> {
    ratio(operating_income_ttm? + sbc_ttm?, revenue_ttm?)
}

/// Operating income / revenue, as a fraction
pub fn gaap_margin(operating_income_ttm: Option<f64>, revenue_ttm: Option<f64>) -> Option<f64> {
    ratio(operating_income_ttm?, revenue_ttm?)
}

/// Composite score and the margin it was built from.
///
/// Growth is mandatory. The adjusted margin is preferred; the GAAP margin is
/// the only fallback.
pub fn rule_of_40(
    growth: Option<f64>,
    adjusted: Option<f64>,
    gaap: Option<f64>,
) -> Option<(f64, MarginBasis)> {
    let growth = growth?;
    let (margin, basis) = match (adjusted, gaap) {
        (Some(margin), _) => (margin, MarginBasis::Adjusted),
        (None, Some(margin)) => (margin, MarginBasis::Gaap),
        (None, None) => return None,
    };
    Some(((growth + margin) * 100.0, basis)).filter(|(score, _)| score.is_finite())
}

/// Build the metric record from aggregated TTM figures
pub fn compute(figures: &TtmFigures, latest_quarter: Option<NaiveDate>) -> MetricRecord {
    let growth = revenue_growth(figures.revenue, figures.revenue_prior);
    let adjusted = adjusted_margin(figures.operating_income, figures.sbc, figures.revenue);
    let gaap = gaap_margin(figures.operating_income, figures.revenue);
    let score = rule_of_40(growth, adjusted, gaap);

    MetricRecord {
        revenue_ttm: figures.revenue,
        revenue_ttm_prior: figures.revenue_prior,
        sbc_ttm: figures.sbc,
        operating_income_ttm: figures.operating_income,
        growth_yoy_pct: to_pct(growth),
        adj_op_margin_pct: to_pct(adjusted),
        gaap_op_margin_pct: to_pct(gaap),
        rule40_score: score.map(|(s, _)| s),
        margin_basis: score.map(|(_, basis)| basis),
        latest_quarter,
    }
}

/// Aggregate and derive in one step from raw quarterly statements
pub fn compute_from_statements(statements: &[QuarterlyStatement]) -> MetricRecord {
    let figures = TtmFigures::from_statements(statements);
    compute(&figures, statements.first().and_then(|s| s.date))
}
