use anyhow::{Context, Result};
use coinapi::{CoinApi, QueryParameters};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let key = std::env::var("COINAPI_KEY").context("set COINAPI_KEY to run this demo")?;
    let api = CoinApi::new(key, None)?;

    let symbol = "BITSTAMP_SPOT_BTC_USD";
    let params = QueryParameters::from([
        ("period_id".to_string(), "1HRS".to_string()),
        ("limit".to_string(), "3".to_string()),
    ]);

    let candles = api.ohlcv_latest_data(symbol, Some(params))?;
    println!("{}", serde_json::to_string_pretty(&candles)?);

    let rate = api.exchange_rates_get_specific_rate("BTC", "USD", None)?;
    println!("BTC/USD: {}", rate["rate"]);
    Ok(())
}
