use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub mod config;

pub use config::{Config, FundamentalsConfig, Overrides, ScreenConfig, UniverseConfig};

/// One screenable ticker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseEntry {
    pub symbol: String,
    pub name: String,
}

impl UniverseEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// FMP quarterly income statement, reduced to the fields the screen reads.
///
/// Every numeric field is optional: a missing or non-numeric value stays `None`
/// and is never coerced to zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyStatement {
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub revenue: Option<f64>,
    /// Legacy revenue field still returned for some older filers
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sales_revenue_net: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub operating_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub stock_based_compensation: Option<f64>,
}

impl QuarterlyStatement {
    pub fn from_values(
        revenue: Option<f64>,
        operating_income: Option<f64>,
        stock_based_compensation: Option<f64>,
    ) -> Self {
        Self {
            revenue,
            operating_income,
            stock_based_compensation,
            ..Self::default()
        }
    }

    /// Reported revenue, falling back to `salesRevenueNet`
    pub fn revenue(&self) -> Option<f64> {
        self.revenue.or(self.sales_revenue_net)
    }
}

/// Accepts JSON numbers and numeric strings; everything else is absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
        _ => None,
    })
}

/// Which margin definition fed the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginBasis {
    Adjusted,
    Gaap,
}

impl MarginBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginBasis::Adjusted => "adjusted",
            MarginBasis::Gaap => "gaap",
        }
    }
}

impl fmt::Display for MarginBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived Rule of 40 figures for one ticker.
///
/// Percentages are fractions scaled by 100 with no rounding. The default value
/// (everything `None`) is the not-ok record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    pub revenue_ttm: Option<f64>,
    pub revenue_ttm_prior: Option<f64>,
    pub sbc_ttm: Option<f64>,
    pub operating_income_ttm: Option<f64>,
    pub growth_yoy_pct: Option<f64>,
    pub adj_op_margin_pct: Option<f64>,
    pub gaap_op_margin_pct: Option<f64>,
    pub rule40_score: Option<f64>,
    pub margin_basis: Option<MarginBasis>,
    /// Fiscal period end of the most recent quarter, when reported
    pub latest_quarter: Option<NaiveDate>,
}

impl MetricRecord {
    pub fn not_ok() -> Self {
        Self::default()
    }
}

/// How a single ticker's unit of work ended
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Computed(MetricRecord),
    NoData,
    Failed(String),
}

impl TickerOutcome {
    pub fn metrics(&self) -> MetricRecord {
        match self {
            TickerOutcome::Computed(record) => record.clone(),
            TickerOutcome::NoData | TickerOutcome::Failed(_) => MetricRecord::not_ok(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TickerOutcome::Computed(_))
    }
}

/// One row of the result table
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRow {
    pub entry: UniverseEntry,
    pub metrics: MetricRecord,
    pub outcome: TickerOutcome,
}

impl ScreenRow {
    pub fn new(entry: UniverseEntry, outcome: TickerOutcome) -> Self {
        Self {
            metrics: outcome.metrics(),
            entry,
            outcome,
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.metrics.rule40_score
    }
}
