//! Request descriptors: one type per CoinAPI operation.
//!
//! A descriptor resolves to an endpoint path (relative to the API base URL) and the query
//! parameters the caller supplied. Identifiers are passed through as given.

use std::collections::BTreeMap;

/// Query-string parameters, passed to the transport unmodified.
pub type QueryParameters = BTreeMap<String, String>;

pub trait Endpoint {
    /// Resolved path, e.g. `/ohlcv/BITSTAMP_SPOT_BTC_USD/latest`.
    fn endpoint(&self) -> String;

    /// Query parameters for this request. Empty unless the descriptor carries some.
    fn query_parameters(&self) -> QueryParameters {
        QueryParameters::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataListExchangesRequest;

impl Endpoint for MetadataListExchangesRequest {
    fn endpoint(&self) -> String {
        "/exchanges".to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataListAssetsRequest;

impl Endpoint for MetadataListAssetsRequest {
    fn endpoint(&self) -> String {
        "/assets".to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataListSymbolsRequest;

impl Endpoint for MetadataListSymbolsRequest {
    fn endpoint(&self) -> String {
        "/symbols".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRatesGetSpecificRateRequest {
    pub asset_id_base: String,
    pub asset_id_quote: String,
    pub query_parameters: QueryParameters,
}

impl ExchangeRatesGetSpecificRateRequest {
    pub fn new(
        asset_id_base: impl Into<String>,
        asset_id_quote: impl Into<String>,
        query_parameters: Option<QueryParameters>,
    ) -> Self {
        Self {
            asset_id_base: asset_id_base.into(),
            asset_id_quote: asset_id_quote.into(),
            query_parameters: query_parameters.unwrap_or_default(),
        }
    }
}

impl Endpoint for ExchangeRatesGetSpecificRateRequest {
    fn endpoint(&self) -> String {
        format!("/exchangerate/{}/{}", self.asset_id_base, self.asset_id_quote)
    }

    fn query_parameters(&self) -> QueryParameters {
        self.query_parameters.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRatesGetAllCurrentRatesRequest {
    pub asset_id_base: String,
}

impl ExchangeRatesGetAllCurrentRatesRequest {
    pub fn new(asset_id_base: impl Into<String>) -> Self {
        Self {
            asset_id_base: asset_id_base.into(),
        }
    }
}

impl Endpoint for ExchangeRatesGetAllCurrentRatesRequest {
    fn endpoint(&self) -> String {
        format!("/exchangerate/{}", self.asset_id_base)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OhlcvListAllPeriodsRequest;

impl Endpoint for OhlcvListAllPeriodsRequest {
    fn endpoint(&self) -> String {
        "/ohlcv/periods".to_string()
    }
}

// Descriptors addressed by one symbol id plus optional query parameters.
// `$path` has a single `{}` slot for the symbol.
macro_rules! symbol_request {
    ($(#[$meta:meta])* $name:ident, $path:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub symbol_id: String,
            pub query_parameters: QueryParameters,
        }

        impl $name {
            pub fn new(
                symbol_id: impl Into<String>,
                query_parameters: Option<QueryParameters>,
            ) -> Self {
                Self {
                    symbol_id: symbol_id.into(),
                    query_parameters: query_parameters.unwrap_or_default(),
                }
            }
        }

        impl Endpoint for $name {
            fn endpoint(&self) -> String {
                format!($path, self.symbol_id)
            }

            fn query_parameters(&self) -> QueryParameters {
                self.query_parameters.clone()
            }
        }
    };
}

symbol_request!(OhlcvLatestDataRequest, "/ohlcv/{}/latest");
symbol_request!(
    /// Historical candles; the API expects `period_id` and `time_start` parameters.
    OhlcvHistoricalDataRequest,
    "/ohlcv/{}/history"
);
symbol_request!(TradesLatestDataSymbolRequest, "/trades/{}/latest");
symbol_request!(TradesHistoricalDataRequest, "/trades/{}/history");
symbol_request!(
    /// Latest quotes for one symbol. Supports [`limit`](Self::limit) / [`only`](Self::only).
    QuotesLatestDataSymbolRequest,
    "/quotes/{}/latest"
);
symbol_request!(QuotesHistoricalDataRequest, "/quotes/{}/history");
symbol_request!(OrderbooksLatestDataRequest, "/orderbooks/{}/latest");
symbol_request!(OrderbooksHistoricalDataRequest, "/orderbooks/{}/history");

impl QuotesLatestDataSymbolRequest {
    /// Returns a copy of this request that also carries `limit=lim`.
    pub fn limit(&self, lim: u32) -> Self {
        self.with_limit(lim)
    }

    /// Same as [`limit`](Self::limit).
    pub fn only(&self, lim: u32) -> Self {
        self.with_limit(lim)
    }

    fn with_limit(&self, lim: u32) -> Self {
        let mut params = self.query_parameters.clone();
        params.insert("limit".to_string(), lim.to_string());
        Self::new(self.symbol_id.clone(), Some(params))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradesLatestDataAllRequest {
    pub query_parameters: QueryParameters,
}

impl TradesLatestDataAllRequest {
    pub fn new(query_parameters: Option<QueryParameters>) -> Self {
        Self {
            query_parameters: query_parameters.unwrap_or_default(),
        }
    }
}

impl Endpoint for TradesLatestDataAllRequest {
    fn endpoint(&self) -> String {
        "/trades/latest".to_string()
    }

    fn query_parameters(&self) -> QueryParameters {
        self.query_parameters.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotesCurrentDataAllRequest;

impl Endpoint for QuotesCurrentDataAllRequest {
    fn endpoint(&self) -> String {
        "/quotes/current".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotesCurrentDataSymbolRequest {
    pub symbol_id: String,
}

impl QuotesCurrentDataSymbolRequest {
    pub fn new(symbol_id: impl Into<String>) -> Self {
        Self {
            symbol_id: symbol_id.into(),
        }
    }
}

impl Endpoint for QuotesCurrentDataSymbolRequest {
    fn endpoint(&self) -> String {
        format!("/quotes/{}/current", self.symbol_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotesLatestDataAllRequest {
    pub query_parameters: QueryParameters,
}

impl QuotesLatestDataAllRequest {
    pub fn new(query_parameters: Option<QueryParameters>) -> Self {
        Self {
            query_parameters: query_parameters.unwrap_or_default(),
        }
    }
}

impl Endpoint for QuotesLatestDataAllRequest {
    fn endpoint(&self) -> String {
        "/quotes/latest".to_string()
    }

    fn query_parameters(&self) -> QueryParameters {
        self.query_parameters.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderbooksCurrentDataAllRequest;

impl Endpoint for OrderbooksCurrentDataAllRequest {
    fn endpoint(&self) -> String {
        "/orderbooks/current".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderbooksCurrentDataSymbolRequest {
    pub symbol_id: String,
}

impl OrderbooksCurrentDataSymbolRequest {
    pub fn new(symbol_id: impl Into<String>) -> Self {
        Self {
            symbol_id: symbol_id.into(),
        }
    }
}

impl Endpoint for OrderbooksCurrentDataSymbolRequest {
    fn endpoint(&self) -> String {
        format!("/orderbooks/{}/current", self.symbol_id)
    }
}
