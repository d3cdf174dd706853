use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use reqwest::StatusCode;
use reqwest::blocking::Client as ReqwestClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

use crate::error::log_api_error;
use crate::request::QueryParameters;
use crate::util::endpoint_url;

/// Request headers, keyed by header name exactly as given.
pub type Headers = BTreeMap<String, String>;

/// Production base URL; endpoint paths are appended verbatim.
pub const PRODUCTION_URL: &str = "https://rest.coinapi.io/v1";

/// The only `Accept-Encoding` value that makes the client gunzip the body itself.
pub const COMPRESSED_ENCODING: &str = "deflat, gzip";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Raw response as seen by [`HttpClient`].
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Performs a single GET. Implement this to put something other than reqwest on the wire.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &Headers, params: &QueryParameters) -> Result<RawResponse>;
}

/// [`Transport`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("coinapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("coinapi-rs")),
        );

        let http = ReqwestClient::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, headers: &Headers, params: &QueryParameters) -> Result<RawResponse> {
        let resp = self
            .http
            .get(url)
            .headers(to_header_map(headers)?)
            .query(params)
            .send()
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .with_context(|| format!("failed to read response body (url={})", url))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

pub(crate) fn to_header_map(headers: &Headers) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {:?}", name))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {}", name))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// One GET against one endpoint. Built per request and dropped afterwards.
pub struct HttpClient<'a> {
    url: String,
    headers: &'a Headers,
    params: QueryParameters,
    transport: &'a dyn Transport,
}

impl<'a> HttpClient<'a> {
    pub fn new(
        base_url: &str,
        endpoint: &str,
        headers: &'a Headers,
        params: QueryParameters,
        transport: &'a dyn Transport,
    ) -> Self {
        Self {
            url: endpoint_url(base_url, endpoint),
            headers,
            params,
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends the request and decodes the body as JSON.
    ///
    /// The status code is not checked: error payloads come back as JSON like any other.
    pub fn perform(&self) -> Result<Value> {
        debug!(url = %self.url, params = ?self.params, "GET");
        let resp = self.transport.get(&self.url, self.headers, &self.params)?;

        let mut data = resp.body;
        if self.headers.get("Accept-Encoding").map(String::as_str) == Some(COMPRESSED_ENCODING) {
            data = gunzip(&data).with_context(|| {
                format!("failed to decompress response (url={})", self.url)
            })?;
        }

        if !resp.status.is_success() {
            log_api_error(resp.status, &self.url, &data);
        }

        serde_json::from_slice(&data).with_context(|| {
            format!(
                "failed to parse API JSON (url={}, status={})",
                self.url, resp.status
            )
        })
    }
}

pub(crate) fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    debug!(compressed = data.len(), decompressed = out.len(), "gunzipped body");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::sync::Mutex;

    struct Canned {
        status: StatusCode,
        body: Vec<u8>,
        seen: Mutex<Vec<(String, QueryParameters)>>,
    }

    impl Canned {
        fn ok(body: impl Into<Vec<u8>>) -> Self {
            Self {
                status: StatusCode::OK,
                body: body.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn get(
            &self,
            url: &str,
            _headers: &Headers,
            params: &QueryParameters,
        ) -> Result<RawResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), params.clone()));
            Ok(RawResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap()
    }

    fn encoding(value: &str) -> Headers {
        Headers::from([("Accept-Encoding".to_string(), value.to_string())])
    }

    fn get(endpoint: &str, headers: &Headers, transport: &Canned) -> Result<Value> {
        HttpClient::new(
            PRODUCTION_URL,
            endpoint,
            headers,
            QueryParameters::new(),
            transport,
        )
        .perform()
    }

    #[test]
    fn builds_url_from_base_and_endpoint() {
        let headers = Headers::new();
        let transport = Canned::ok("[]");
        let client = HttpClient::new(
            PRODUCTION_URL,
            "/assets",
            &headers,
            QueryParameters::new(),
            &transport,
        );
        assert_eq!(client.url(), "https://rest.coinapi.io/v1/assets");
    }

    #[test]
    fn passes_params_to_transport() {
        let headers = Headers::new();
        let transport = Canned::ok("{}");
        let mut params = QueryParameters::new();
        params.insert("limit".into(), "2".into());

        HttpClient::new(
            PRODUCTION_URL,
            "/trades/latest",
            &headers,
            params.clone(),
            &transport,
        )
        .perform()
        .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "https://rest.coinapi.io/v1/trades/latest");
        assert_eq!(seen[0].1, params);
    }

    #[test]
    fn decompresses_on_exact_encoding() {
        let transport = Canned::ok(gzip(r#"{"asset_id":"BTC"}"#));
        let headers = encoding(COMPRESSED_ENCODING);
        let value = get("/assets", &headers, &transport).unwrap();
        assert_eq!(value["asset_id"], "BTC");
    }

    #[test]
    fn plain_body_with_compressed_encoding_fails() {
        let transport = Canned::ok(r#"[{"asset_id":"BTC"}]"#);
        let headers = encoding(COMPRESSED_ENCODING);
        let err = get("/assets", &headers, &transport).unwrap_err();
        assert!(err.to_string().contains("failed to decompress"), "{:#}", err);
    }

    #[test]
    fn other_encodings_leave_body_alone() {
        for value in ["gzip", "deflate, gzip", "DEFLAT, GZIP"] {
            let transport = Canned::ok(r#"[1,2]"#);
            let body = get("/x", &encoding(value), &transport).unwrap();
            assert_eq!(body, serde_json::json!([1, 2]), "encoding {}", value);
        }
    }

    #[test]
    fn gzip_body_without_header_fails_to_parse() {
        let transport = Canned::ok(gzip("[]"));
        let err = get("/x", &Headers::new(), &transport).unwrap_err();
        assert!(err.to_string().contains("failed to parse API JSON"));
    }

    #[test]
    fn error_status_body_is_still_returned() {
        let transport = Canned {
            status: StatusCode::UNAUTHORIZED,
            body: br#"{"error":"Invalid API key"}"#.to_vec(),
            seen: Mutex::new(Vec::new()),
        };
        let value = get("/assets", &Headers::new(), &transport).unwrap();
        assert_eq!(value["error"], "Invalid API key");
    }

    #[test]
    fn header_map_rejects_bad_names() {
        let mut headers = Headers::new();
        headers.insert("bad header".into(), "x".into());
        assert!(to_header_map(&headers).is_err());
    }
}
