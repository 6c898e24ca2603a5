//! Ticker universe: a user-supplied CSV or the IWV holdings extract.

use csv::{ReaderBuilder, StringRecord, Trim};
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ScreenError;
use crate::models::{UniverseConfig, UniverseEntry};

/// Accepted holdings headers per logical field, tried in order
pub const SYMBOL_ALIASES: &[&str] = &["ticker", "ticker_", "symbol"];
pub const NAME_ALIASES: &[&str] = &["name", "security name", "company name"];
pub const ASSET_CLASS_ALIASES: &[&str] = &["asset class", "asset_class", "assetclass"];

/// Required headers of an override file (exact, after trimming)
pub const OVERRIDE_SYMBOL_COLUMN: &str = "Ticker";
pub const OVERRIDE_NAME_COLUMN: &str = "Name";

/// Uppercase and use the dash share-class separator (`BRK.B` -> `BRK-B`)
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase().replace('.', "-")
}

/// Cash lines, futures and the `X` placeholder carried in fund holdings
pub fn is_placeholder_symbol(symbol: &str) -> bool {
    symbol.starts_with("CASH") || symbol.contains("FUT") || symbol == "X"
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
}

/// Column positions in the holdings file, resolved once per load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HoldingsColumns {
    symbol: usize,
    name: usize,
    asset_class: Option<usize>,
}

impl HoldingsColumns {
    fn resolve(record: &StringRecord) -> (Option<usize>, Option<Self>) {
        let headers: Vec<String> = record.iter().map(normalize_header).collect();
        let symbol = find_column(&headers, SYMBOL_ALIASES);
        let name = find_column(&headers, NAME_ALIASES);

        let columns = match (symbol, name) {
            (Some(symbol), Some(name)) => Some(Self {
                symbol,
                name,
                asset_class: find_column(&headers, ASSET_CLASS_ALIASES),
            }),
            _ => None,
        };
        (symbol, columns)
    }
}

/// Drops blank rows, normalizes symbols and keeps the first row per symbol
struct UniverseBuilder {
    seen: HashSet<String>,
    entries: Vec<UniverseEntry>,
    skip_placeholders: bool,
}

impl UniverseBuilder {
    fn new(skip_placeholders: bool) -> Self {
        Self {
            seen: HashSet::new(),
            entries: Vec::new(),
            skip_placeholders,
        }
    }

    fn push(&mut self, raw_symbol: &str, raw_name: &str) {
        let symbol = normalize_symbol(raw_symbol);
        let name = raw_name.trim();
        if symbol.is_empty() || name.is_empty() {
            return;
        }
        if self.skip_placeholders && is_placeholder_symbol(&symbol) {
            debug!("Skipping placeholder holding {}", symbol);
            return;
        }
        if self.seen.insert(symbol.clone()) {
            self.entries.push(UniverseEntry::new(symbol, name));
        }
    }

    fn finish(self) -> Vec<UniverseEntry> {
        self.entries
    }
}

/// Parse a holdings extract into equity universe entries.
///
/// The header row is the first row where both a symbol and a name alias
/// resolve, so the fund preamble above it and disclaimers below the data are
/// tolerated.
pub fn parse_holdings(text: &str) -> Result<Vec<UniverseEntry>, ScreenError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Option<HoldingsColumns> = None;
    let mut saw_symbol_column = false;
    let mut builder = UniverseBuilder::new(true);

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable holdings row: {}", e);
                continue;
            }
        };

        let cols = match columns {
            Some(cols) => cols,
            None => {
                let (symbol, resolved) = HoldingsColumns::resolve(&record);
                saw_symbol_column |= symbol.is_some();
                columns = resolved;
                continue;
            }
        };

        if let Some(asset_col) = cols.asset_class {
            let asset_class = record.get(asset_col).unwrap_or_default().to_lowercase();
            if !asset_class.contains("equity") {
                continue;
            }
        }

        builder.push(
            record.get(cols.symbol).unwrap_or_default(),
            record.get(cols.name).unwrap_or_default(),
        );
    }

    if columns.is_none() {
        let field = if saw_symbol_column { "name" } else { "symbol" };
        return Err(ScreenError::UniverseSchema { field });
    }

    Ok(builder.finish())
}

/// Load a user-supplied universe with `Ticker` and `Name` columns
pub fn load_override(path: &Path) -> Result<Vec<UniverseEntry>, ScreenError> {
    let display = path.display().to_string();
    let read_err = |source| ScreenError::OverrideRead {
        path: display.clone(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();
    let position = |column: &str| headers.iter().position(|h| h == column);

    let (symbol_col, name_col) = match (
        position(OVERRIDE_SYMBOL_COLUMN),
        position(OVERRIDE_NAME_COLUMN),
    ) {
        (Some(symbol), Some(name)) => (symbol, name),
        (symbol, name) => {
            let missing: Vec<&str> = [
                (symbol, OVERRIDE_SYMBOL_COLUMN),
                (name, OVERRIDE_NAME_COLUMN),
            ]
            .iter()
            .filter(|(found, _)| found.is_none())
            .map(|(_, column)| *column)
            .collect();
            return Err(ScreenError::OverrideSchema {
                path: display.clone(),
                missing: missing.join(", "),
            });
        }
    };

    let mut builder = UniverseBuilder::new(false);
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        builder.push(
            record.get(symbol_col).unwrap_or_default(),
            record.get(name_col).unwrap_or_default(),
        );
    }

    Ok(builder.finish())
}

/// Produces the universe for a run
pub struct UniverseProvider {
    client: Client,
    config: UniverseConfig,
}

impl UniverseProvider {
    pub fn new(config: UniverseConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("rule40-screen/0.1")
            .build()?;

        Ok(Self { client, config })
    }

    /// Use the override file when given, otherwise download holdings
    pub async fn load(&self, override_path: Option<&Path>) -> Result<Vec<UniverseEntry>, ScreenError> {
        let universe = match override_path {
            Some(path) => {
                info!("📋 Loading universe from {}", path.display());
                load_override(path)?
            }
            None => {
                info!("🌐 Downloading IWV holdings as a Russell 3000 proxy...");
                self.fetch_holdings().await?
            }
        };

        info!("✅ Universe size: {}", universe.len());
        Ok(universe)
    }

    /// Download and clean the holdings extract (single attempt, no caching)
    pub async fn fetch_holdings(&self) -> Result<Vec<UniverseEntry>, ScreenError> {
        let response = self.client.get(&self.config.holdings_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScreenError::UniverseStatus(status));
        }

        let text = response.text().await?;
        parse_holdings(&text)
    }
}
