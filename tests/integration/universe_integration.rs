//! Universe download and override loading

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::logging::{init_test_logging, log_test_data};
use rule40_screen::models::{UniverseConfig, UniverseEntry};
use rule40_screen::universe::UniverseProvider;
use rule40_screen::ScreenError;

const IWV_EXTRACT: &str = "iShares Russell 3000 ETF
Fund Holdings as of,\"Oct 17, 2025\"

Ticker,Name,Sector,Asset Class,Market Value,Weight (%),Notional Value,Quantity,Price,Location,Exchange,Currency
NVDA,NVIDIA CORP,Information Technology,Equity,\"1,000\",6.4,\"1,000\",10,183.2,United States,NASDAQ,USD
BRK.B,BERKSHIRE HATHAWAY INC CLASS B,Financials,Equity,\"900\",1.5,\"900\",2,480.1,United States,New York Stock Exchange Inc.,USD
XTSLA,BLK CSH FND TREASURY SL AGENCY,Cash and/or Derivatives,Money Market,\"50\",0.3,\"50\",50,1.0,United States,-,USD
USD,USD CASH,Cash and/or Derivatives,Cash,\"10\",0.0,\"10\",10,100.0,United States,-,USD
RTYZ5,RUSSELL 2000 EMINI DEC 25,Cash and/or Derivatives,Futures,\"0\",0.0,\"30\",1,2500.0,United States,Chicago Mercantile Exchange,USD

\"The content contained herein is owned or licensed by BlackRock and/or its third-party information providers.\"
";

fn provider(server: &MockServer, route: &str) -> UniverseProvider {
    UniverseProvider::new(UniverseConfig {
        holdings_url: format!("{}{}", server.uri(), route),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

#[tokio::test]
async fn test_download_holdings() {
    init_test_logging();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IWV_holdings.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IWV_EXTRACT))
        .expect(1)
        .mount(&server)
        .await;

    let universe = provider(&server, "/IWV_holdings.csv").load(None).await.unwrap();
    log_test_data("Universe", &universe);

    assert_eq!(
        universe,
        vec![
            UniverseEntry::new("NVDA", "NVIDIA CORP"),
            UniverseEntry::new("BRK-B", "BERKSHIRE HATHAWAY INC CLASS B"),
        ]
    );
}

#[tokio::test]
async fn test_holdings_schema_change_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Issuer,Weight\nNVIDIA,6.4\n"))
        .mount(&server)
        .await;

    assert_matches!(
        provider(&server, "/holdings.csv").load(None).await,
        Err(ScreenError::UniverseSchema { field: "symbol" })
    );
}

#[tokio::test]
async fn test_holdings_http_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    assert_matches!(
        provider(&server, "/holdings.csv").fetch_holdings().await,
        Err(ScreenError::UniverseStatus(status)) if status.as_u16() == 404
    );
}

#[tokio::test]
async fn test_override_skips_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IWV_EXTRACT))
        .expect(0)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Ticker,Name").unwrap();
    writeln!(file, "aapl,Apple Inc.").unwrap();
    writeln!(file, "brk.a,Berkshire Hathaway A").unwrap();

    let universe = provider(&server, "/holdings.csv")
        .load(Some(file.path()))
        .await
        .unwrap();

    assert_eq!(
        universe,
        vec![
            UniverseEntry::new("AAPL", "Apple Inc."),
            UniverseEntry::new("BRK-A", "Berkshire Hathaway A"),
        ]
    );
}
