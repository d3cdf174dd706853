//! A small blocking Rust client for the CoinAPI v1 market-data REST API.
//!
//! Every endpoint (exchanges, assets, symbols, exchange rates, OHLCV, trades, quotes,
//! order books) is one method on [`CoinApi`] that issues a single GET and returns the
//! decoded JSON as a [`serde_json::Value`]. Responses are not validated against a schema.
//!
//! ## Quick start
//! - Pass the API key to [`CoinApi::new`].
//! - Call the endpoint method you need.
//!
//! ```no_run
//! use anyhow::Result;
//! use coinapi::{CoinApi, QueryParameters};
//!
//! fn main() -> Result<()> {
//!     let api = CoinApi::new("<your-api-key>", None)?;
//!     let params = QueryParameters::from([
//!         ("period_id".to_string(), "1DAY".to_string()),
//!         ("limit".to_string(), "5".to_string()),
//!     ]);
//!     let candles = api.ohlcv_latest_data("BITSTAMP_SPOT_BTC_USD", Some(params))?;
//!     println!("{}", candles);
//!     Ok(())
//! }
//! ```
//!
//! Requests go through a [`Transport`]; supply your own with [`CoinApi::with_transport`].

#![forbid(unsafe_code)]

mod client;
mod error;
mod http;
pub mod request;
mod util;

pub use client::{API_KEY_HEADER, CoinApi};
pub use http::{
    COMPRESSED_ENCODING, DEFAULT_TIMEOUT, Headers, HttpClient, PRODUCTION_URL, RawResponse,
    ReqwestTransport, Transport,
};
pub use request::{Endpoint, QueryParameters};
