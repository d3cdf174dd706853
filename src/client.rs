use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::http::{
    DEFAULT_TIMEOUT, Headers, HttpClient, PRODUCTION_URL, ReqwestTransport, Transport,
};
use crate::request::*;

/// Header carrying the API key. Always present, always wins.
pub const API_KEY_HEADER: &str = "X-CoinAPI-Key";

/// Client for the CoinAPI v1 REST API.
///
/// Values are immutable: [`with_header`](Self::with_header) and friends return a new client.
/// Clones share the underlying connection pool.
#[derive(Clone)]
pub struct CoinApi {
    api_key: String,
    headers: Headers,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for CoinApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinApi")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn default_headers() -> Headers {
    Headers::from([("Accept".to_string(), "application/json".to_string())])
}

fn merge_headers(api_key: &str, headers: Option<Headers>) -> Headers {
    let mut merged = default_headers();
    merged.extend(headers.unwrap_or_default());
    // Header names are case-insensitive on the wire.
    merged.retain(|name, _| !name.eq_ignore_ascii_case(API_KEY_HEADER));
    merged.insert(API_KEY_HEADER.to_string(), api_key.to_string());
    merged
}

impl CoinApi {
    /// Creates a client talking to the production API.
    ///
    /// `headers` override the defaults (`Accept: application/json`) but never the API key.
    pub fn new(api_key: impl Into<String>, headers: Option<Headers>) -> Result<Self> {
        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT)?;
        Ok(Self::from_parts(
            api_key.into(),
            headers,
            PRODUCTION_URL.to_string(),
            Arc::new(transport),
        ))
    }

    fn from_parts(
        api_key: String,
        headers: Option<Headers>,
        base_url: String,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let headers = merge_headers(&api_key, headers);
        Self {
            api_key,
            headers,
            base_url,
            transport,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a client with one more header. Setting the API-key header here has no effect.
    pub fn with_header(&self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_headers(Headers::from([(header.into(), value.into())]))
    }

    /// Returns a client whose headers are this client's merged with `additional`.
    pub fn with_headers(&self, additional: Headers) -> Self {
        let mut headers = self.headers.clone();
        headers.extend(additional);
        Self::from_parts(
            self.api_key.clone(),
            Some(headers),
            self.base_url.clone(),
            Arc::clone(&self.transport),
        )
    }

    /// Returns a client pointed at another base URL, e.g. a sandbox.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self.clone()
        }
    }

    /// Returns a client using a fresh reqwest transport with the given timeout.
    ///
    /// This replaces any transport installed with [`with_transport`](Self::with_transport).
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        Ok(self.with_transport(Arc::new(ReqwestTransport::new(timeout)?)))
    }

    /// Returns a client that sends requests through `transport`.
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            ..self.clone()
        }
    }

    fn perform<E: Endpoint>(&self, request: &E) -> Result<Value> {
        HttpClient::new(
            &self.base_url,
            &request.endpoint(),
            &self.headers,
            request.query_parameters(),
            self.transport.as_ref(),
        )
        .perform()
    }

    pub fn metadata_list_exchanges(&self) -> Result<Value> {
        self.perform(&MetadataListExchangesRequest)
    }

    pub fn metadata_list_assets(&self) -> Result<Value> {
        self.perform(&MetadataListAssetsRequest)
    }

    pub fn metadata_list_symbols(&self) -> Result<Value> {
        self.perform(&MetadataListSymbolsRequest)
    }

    pub fn exchange_rates_get_specific_rate(
        &self,
        asset_id_base: &str,
        asset_id_quote: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&ExchangeRatesGetSpecificRateRequest::new(
            asset_id_base,
            asset_id_quote,
            query_parameters,
        ))
    }

    pub fn exchange_rates_get_all_current_rates(&self, asset_id_base: &str) -> Result<Value> {
        self.perform(&ExchangeRatesGetAllCurrentRatesRequest::new(asset_id_base))
    }

    pub fn ohlcv_list_all_periods(&self) -> Result<Value> {
        self.perform(&OhlcvListAllPeriodsRequest)
    }

    pub fn ohlcv_latest_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&OhlcvLatestDataRequest::new(symbol_id, query_parameters))
    }

    /// The API requires `period_id` and `time_start` for this endpoint.
    pub fn ohlcv_historical_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&OhlcvHistoricalDataRequest::new(symbol_id, query_parameters))
    }

    pub fn trades_latest_data_all(
        &self,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&TradesLatestDataAllRequest::new(query_parameters))
    }

    pub fn trades_latest_data_symbol(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&TradesLatestDataSymbolRequest::new(symbol_id, query_parameters))
    }

    pub fn trades_historical_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&TradesHistoricalDataRequest::new(symbol_id, query_parameters))
    }

    pub fn quotes_current_data_all(&self) -> Result<Value> {
        self.perform(&QuotesCurrentDataAllRequest)
    }

    pub fn quotes_current_data_symbol(&self, symbol_id: &str) -> Result<Value> {
        self.perform(&QuotesCurrentDataSymbolRequest::new(symbol_id))
    }

    pub fn quotes_latest_data_all(
        &self,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&QuotesLatestDataAllRequest::new(query_parameters))
    }

    pub fn quotes_latest_data_symbol(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&QuotesLatestDataSymbolRequest::new(symbol_id, query_parameters))
    }

    pub fn quotes_historical_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&QuotesHistoricalDataRequest::new(symbol_id, query_parameters))
    }

    pub fn orderbooks_current_data_all(&self) -> Result<Value> {
        self.perform(&OrderbooksCurrentDataAllRequest)
    }

    pub fn orderbooks_current_data_symbol(&self, symbol_id: &str) -> Result<Value> {
        self.perform(&OrderbooksCurrentDataSymbolRequest::new(symbol_id))
    }

    pub fn orderbooks_latest_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&OrderbooksLatestDataRequest::new(symbol_id, query_parameters))
    }

    pub fn orderbooks_historical_data(
        &self,
        symbol_id: &str,
        query_parameters: Option<QueryParameters>,
    ) -> Result<Value> {
        self.perform(&OrderbooksHistoricalDataRequest::new(symbol_id, query_parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::to_header_map;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_header_set() {
        assert_eq!(
            merge_headers("K", None),
            headers(&[("Accept", "application/json"), ("X-CoinAPI-Key", "K")])
        );
    }

    #[test]
    fn caller_headers_override_defaults_not_key() {
        let merged = merge_headers(
            "K",
            Some(headers(&[("Accept", "text/plain"), ("X-CoinAPI-Key", "other")])),
        );
        assert_eq!(
            merged,
            headers(&[("Accept", "text/plain"), ("X-CoinAPI-Key", "K")])
        );
    }

    #[test]
    fn key_header_wins_regardless_of_case() {
        let api = CoinApi::new("K", None)
            .unwrap()
            .with_header("x-coinapi-key", "other")
            .with_headers(headers(&[("X-COINAPI-KEY", "other")]));
        assert_eq!(
            api.headers(),
            &headers(&[("Accept", "application/json"), ("X-CoinAPI-Key", "K")])
        );

        let wire = to_header_map(api.headers()).unwrap();
        assert_eq!(wire.get_all(API_KEY_HEADER).iter().count(), 1);
        assert_eq!(wire[API_KEY_HEADER], "K");
    }

    #[test]
    fn fresh_default_per_call() {
        let mut first = merge_headers("K", None);
        first.insert("Extra".into(), "1".into());
        assert!(!merge_headers("K", None).contains_key("Extra"));
    }

    #[test]
    fn construct_and_extend() {
        let api = CoinApi::new("K", None).unwrap();
        assert_eq!(api.api_key(), "K");
        assert_eq!(api.base_url(), PRODUCTION_URL);

        let text = api.with_headers(headers(&[("Accept", "text/plain")]));
        assert_eq!(
            text.headers(),
            &headers(&[("Accept", "text/plain"), ("X-CoinAPI-Key", "K")])
        );
        assert_eq!(
            api.headers(),
            &headers(&[("Accept", "application/json"), ("X-CoinAPI-Key", "K")])
        );

        let forced = text.with_header(API_KEY_HEADER, "stolen");
        assert_eq!(forced.headers()[API_KEY_HEADER], "K");
    }

    #[test]
    fn header_extension_keeps_base_url() {
        let api = CoinApi::new("K", None)
            .unwrap()
            .with_base_url("https://rest-sandbox.coinapi.io/v1")
            .with_header("Accept-Encoding", "deflat, gzip");
        assert_eq!(api.base_url(), "https://rest-sandbox.coinapi.io/v1");
        assert_eq!(api.headers()["Accept-Encoding"], "deflat, gzip");
    }
}
