//! Rule of 40 screen over a broad equity universe.
//!
//! Growth is TTM revenue over prior-TTM revenue; the margin is operating
//! income plus stock-based compensation over revenue, falling back to the
//! GAAP operating margin when SBC is not reported.

pub mod api;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod screener;
pub mod stats;
pub mod ttm;
pub mod universe;

pub use error::{FetchError, ScreenError};
pub use screener::{ResultTable, ScreenReport, Screener};
