//! Error types for the screener.
//!
//! `ScreenError` covers failures that abort a run before any per-ticker work
//! starts. `FetchError` is the per-ticker failure signal returned by a
//! [`FundamentalsSource`](crate::api::FundamentalsSource); the screener turns it
//! into a not-ok row instead of propagating it.

use thiserror::Error;

/// Fatal configuration and startup errors
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("FMP API key missing: pass --api-key or set FMP_API_KEY")]
    MissingApiKey,

    #[error("tickers CSV {path} is missing required column(s): {missing}")]
    OverrideSchema { path: String, missing: String },

    #[error("could not read tickers CSV {path}: {source}")]
    OverrideRead {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("holdings file has no recognisable {field} column (upstream format changed?)")]
    UniverseSchema { field: &'static str },

    #[error("holdings download failed: {0}")]
    UniverseDownload(#[from] reqwest::Error),

    #[error("holdings download returned HTTP {0}")]
    UniverseStatus(reqwest::StatusCode),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Why fundamentals for one ticker could not be obtained
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no usable response after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}
