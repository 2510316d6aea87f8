//! Blockbook API data source implementation
//!
//! This module talks to a Blockbook-compatible REST API (for example the
//! NOWNodes `btcbook` endpoint) for address and transaction lookups.
//!
//! Each lookup is one GET request. Status classification lives in free
//! functions so it can be exercised without a network.

use super::{AddressRecord, DataSource, TransactionRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

/// Default endpoint used when the configuration does not name one
pub const DEFAULT_BASE_URL: &str = "https://btcbook.nownodes.io/api/v2";

/// Header carrying the API key
pub const DEFAULT_API_KEY_HEADER: &str = "api-key";

/// Longest body excerpt kept in error messages
const MAX_DIAGNOSTIC_LEN: usize = 512;

/// Blockbook API client
#[derive(Debug, Clone)]
pub struct BlockbookDataSource {
    client: Client,
    base_url: Url,
    api_key: String,
    api_key_header: String,
    timeout: Duration,
}

impl BlockbookDataSource {
    /// Create a new Blockbook data source
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid provider base URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Provider base URL {:?} cannot take path segments",
                base_url.as_str()
            )));
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Set the header name the API key is sent under
    pub fn with_api_key_header(mut self, header: &str) -> Self {
        self.api_key_header = header.to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address_url(&self, address: &str) -> Url {
        self.endpoint("address", address)
    }

    pub fn transaction_url(&self, txid: &str) -> Url {
        self.endpoint("tx", txid)
    }

    /// Append `resource/id` to the base path, percent-encoding `id` as one segment
    fn endpoint(&self, resource: &str, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource).push(id);
        }
        url
    }

    /// Issue a GET and return the status with the raw body
    async fn get(&self, url: Url) -> Result<(StatusCode, String)> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("Provider status: {}, body length: {}", status, body.len());
        Ok((status, body))
    }
}

/// Classify an address lookup response
pub fn parse_address_response(address: &str, status: StatusCode, body: &str) -> Result<AddressRecord> {
    match status {
        StatusCode::OK => serde_json::from_str(body).map_err(|e| {
            Error::malformed(format!("address {}: {}", address, e))
        }),
        StatusCode::BAD_REQUEST => Err(Error::InvalidAddress(address.to_string())),
        StatusCode::UNAUTHORIZED => Err(Error::InvalidCredential),
        other => Err(Error::provider(Some(other.as_u16()), diagnostic(body))),
    }
}

/// Classify a transaction lookup response
///
/// Unlike address lookups, every non-200 status is reported as a provider error.
pub fn parse_transaction_response(
    txid: &str,
    status: StatusCode,
    body: &str,
) -> Result<TransactionRecord> {
    if status != StatusCode::OK {
        return Err(Error::provider(
            Some(status.as_u16()),
            format!("transaction {}: {}", txid, diagnostic(body)),
        ));
    }

    serde_json::from_str(body).map_err(|e| Error::malformed(format!("transaction {}: {}", txid, e)))
}

fn diagnostic(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    match body.char_indices().nth(MAX_DIAGNOSTIC_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl DataSource for BlockbookDataSource {
    async fn get_address(&self, address: &str) -> Result<AddressRecord> {
        // `.` and `..` are dropped by path segment encoding
        if matches!(address, "" | "." | "..") {
            return Err(Error::InvalidAddress(address.to_string()));
        }
        let (status, body) = self.get(self.address_url(address)).await?;
        parse_address_response(address, status, &body)
    }

    async fn get_transaction(&self, txid: &str) -> Result<TransactionRecord> {
        if matches!(txid, "" | "." | "..") {
            return Err(Error::provider(None, format!("transaction {:?}: invalid id", txid)));
        }
        let (status, body) = self.get(self.transaction_url(txid)).await?;
        parse_transaction_response(txid, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let ds = BlockbookDataSource::new("https://example.org/api/v2/", "key".into()).unwrap();
        assert_eq!(
            ds.address_url("bc1qabc").as_str(),
            "https://example.org/api/v2/address/bc1qabc"
        );
        assert_eq!(
            ds.transaction_url("ff00").as_str(),
            "https://example.org/api/v2/tx/ff00"
        );
    }

    #[test]
    fn test_address_stays_in_one_segment() {
        let ds = BlockbookDataSource::new("https://example.org/api/v2", "key".into()).unwrap();
        let url = ds.address_url("x/../../tx/abc?y=1#z");

        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(&segments[..3], &["api", "v2", "address"]);
        assert!(segments[3].contains("%2F"));
    }

    #[tokio::test]
    async fn test_dot_segments_rejected_without_request() {
        // never contacted
        let ds = BlockbookDataSource::new("http://127.0.0.1:9/api", "key".into()).unwrap();
        assert!(matches!(
            ds.get_address("..").await,
            Err(Error::InvalidAddress(ref a)) if a == ".."
        ));
        assert!(matches!(
            ds.get_transaction(".").await,
            Err(Error::Provider { status: None, .. })
        ));
    }

    /// Serve one canned response and hand back the raw request
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api/v2", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (base, handle)
    }

    #[tokio::test]
    async fn test_get_address_sends_key_header() {
        let (base, server) = serve_once(r#"{"address": "bc1qabc", "balance": "5", "txs": 0}"#).await;
        let mut ds = BlockbookDataSource::new(&base, "secret".into())
            .unwrap()
            .with_api_key_header("x-token");
        ds.client = Client::builder().no_proxy().build().unwrap();

        let record = ds.get_address("bc1qabc").await.unwrap();
        assert_eq!(record.address, "bc1qabc");

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/v2/address/bc1qabc http/1.1"));
        assert!(request.contains("x-token: secret"));
        assert!(request.contains("user-agent: wallet-flow-viz/"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = BlockbookDataSource::new("not a url", "key".into()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_address_ok() {
        let body = r#"{"address": "bc1qabc", "txs": 1, "txids": ["t1"]}"#;
        let record = parse_address_response("bc1qabc", StatusCode::OK, body).unwrap();
        assert_eq!(record.txids, vec!["t1"]);
    }

    #[test]
    fn test_address_status_classification() {
        let err = parse_address_response("nope", StatusCode::BAD_REQUEST, "{}").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(ref a) if a == "nope"));

        let err = parse_address_response("bc1q", StatusCode::UNAUTHORIZED, "").unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));

        let err = parse_address_response("bc1q", StatusCode::TOO_MANY_REQUESTS, "slow down")
            .unwrap_err();
        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_address_malformed_body() {
        let err = parse_address_response("bc1q", StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_transaction_failures_are_provider_errors() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let err = parse_transaction_response("t1", status, "").unwrap_err();
            assert!(
                matches!(err, Error::Provider { status: Some(s), .. } if s == status.as_u16())
            );
        }
    }

    #[test]
    fn test_transaction_ok_and_malformed() {
        let body = r#"{"txid": "t1", "value": "10", "vout": [{"value": "9", "addresses": ["a"]}]}"#;
        let tx = parse_transaction_response("t1", StatusCode::OK, body).unwrap();
        assert_eq!(tx.vout[0].addresses, vec!["a"]);

        let err = parse_transaction_response("t1", StatusCode::OK, r#"{"txid": "t1"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_diagnostic_truncation() {
        let long = "x".repeat(MAX_DIAGNOSTIC_LEN + 10);
        let d = diagnostic(&long);
        assert_eq!(d.len(), MAX_DIAGNOSTIC_LEN + 3);
        assert!(d.ends_with("..."));
        assert_eq!(diagnostic("   "), "<empty body>");
    }
}
