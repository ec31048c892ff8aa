//! A client for the [Wayback Availability JSON
//! API](https://archive.org/help/wayback_api.php).

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::{
    config::DEFAULT_ENDPOINT,
    error::{Error, Result},
    timestamp::Timestamp,
};

/// The archived snapshot closest to the requested time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    pub time: DateTime<Utc>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.url, self.time.format("%a %b %e %H:%M:%S %Y"))
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    http_client: reqwest::Client,
    endpoint: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with a default HTTP client and the public endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_http_client(reqwest::Client::new())
    }

    /// Creates a client that sends requests through `http_client`. Timeouts
    /// and proxies are whatever `http_client` is configured with.
    #[must_use]
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            endpoint: DEFAULT_ENDPOINT.into(),
        }
    }

    /// Sends requests to `endpoint` instead of the public availability API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the most recent snapshot of `url`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotAvailable`] if the archive has no snapshot of
    /// `url`, or if the request or the response decoding fails.
    pub async fn available(&self, url: &str) -> Result<Snapshot> {
        let api_url = Url::parse_with_params(&self.endpoint, &[("url", url)])?;
        self.get_closest(api_url).await
    }

    /// Returns the snapshot of `url` closest to `timestamp`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotAvailable`] if the archive has no snapshot of
    /// `url`, or if the request or the response decoding fails.
    pub async fn available_at(&self, url: &str, timestamp: &Timestamp) -> Result<Snapshot> {
        let timestamp = timestamp.to_string();
        let api_url = Url::parse_with_params(
            &self.endpoint,
            &[("url", url), ("timestamp", timestamp.as_str())],
        )?;
        self.get_closest(api_url).await
    }

    async fn get_closest(&self, api_url: Url) -> Result<Snapshot> {
        log::debug!("GET {}", api_url);
        let resp = self.http_client.get(api_url).send().await?;
        let status = resp.status();
        log::debug!("wayback API responded with HTTP {}", status);
        if status != StatusCode::OK {
            return Err(Error::Status(status));
        }

        let body = resp.bytes().await?;
        log::trace!("wayback API response: {}", String::from_utf8_lossy(&body));
        let resp: WaybackResponse = serde_json::from_slice(&body)?;
        resp.into_snapshot()
    }
}

#[derive(Deserialize, Debug, PartialEq)]
struct WaybackResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
struct ArchivedSnapshots {
    /// Missing or null when the archive never captured the URL.
    #[serde(default)]
    closest: Option<Closest>,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Closest {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    timestamp: Timestamp,
    #[serde(default)]
    status: String,
}

impl WaybackResponse {
    fn into_snapshot(self) -> Result<Snapshot> {
        let closest = match self.archived_snapshots.closest {
            Some(closest) if closest.available => closest,
            _ => return Err(Error::NotAvailable),
        };
        log::debug!(
            "closest snapshot captured at {} (HTTP {})",
            closest.timestamp,
            closest.status
        );
        Ok(Snapshot {
            url: closest.url,
            time: closest.timestamp.to_time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    static AVAILABLE_RESPONSE: &str = r#"
    {
        "url": "example.com",
        "archived_snapshots": {
            "closest": {
                "available": true,
                "url": "http://web.archive.org/web/20130919044612/http://example.com/",
                "timestamp": "20130919044612",
                "status": "200"
            }
        }
    }
    "#;

    fn client_for(server: &MockServer) -> Client {
        Client::new().with_endpoint(format!("{}/wayback/available", server.uri()))
    }

    #[test]
    fn test_deserialize_available_response() {
        let resp: WaybackResponse =
            serde_json::from_str(AVAILABLE_RESPONSE).expect("failed to deserialize payload");
        let snapshot = resp.into_snapshot().unwrap();
        assert_eq!(
            snapshot.url,
            "http://web.archive.org/web/20130919044612/http://example.com/"
        );
        assert_eq!(
            snapshot.time,
            Utc.with_ymd_and_hms(2013, 9, 19, 4, 46, 12).unwrap()
        );
    }

    #[test]
    fn test_deserialize_empty_snapshots_is_not_available() {
        let resp: WaybackResponse = serde_json::from_str(
            r#"{"url": "example.invalid", "archived_snapshots": {}}"#,
        )
        .expect("failed to deserialize payload");
        assert!(resp.into_snapshot().unwrap_err().is_not_available());
    }

    #[test]
    fn test_deserialize_null_closest_is_not_available() {
        let resp: WaybackResponse = serde_json::from_str(
            r#"{"url": "example.invalid", "archived_snapshots": {"closest": null}}"#,
        )
        .expect("failed to deserialize payload");
        assert!(resp.into_snapshot().unwrap_err().is_not_available());
    }

    #[test]
    fn test_snapshot_display_uses_ansi_c_time() {
        let snapshot = Snapshot {
            url: "http://web.archive.org/web/2013/http://example.com/".into(),
            time: Utc.with_ymd_and_hms(2013, 9, 19, 4, 46, 12).unwrap(),
        };
        assert_eq!(
            snapshot.to_string(),
            "http://web.archive.org/web/2013/http://example.com/\tThu Sep 19 04:46:12 2013"
        );
    }

    #[tokio::test]
    async fn test_available_returns_closest_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .and(query_param("url", "http://example.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AVAILABLE_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = client_for(&server)
            .available("http://example.com/")
            .await
            .unwrap();

        assert_eq!(
            snapshot.url,
            "http://web.archive.org/web/20130919044612/http://example.com/"
        );
        assert_eq!(
            snapshot.time,
            Utc.with_ymd_and_hms(2013, 9, 19, 4, 46, 12).unwrap()
        );
    }

    #[tokio::test]
    async fn test_available_at_sends_trimmed_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .and(query_param("url", "example.com"))
            .and(query_param("timestamp", "20060102"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AVAILABLE_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let timestamp = Timestamp::parse("20060102", None).unwrap();
        let result = client_for(&server)
            .available_at("example.com", &timestamp)
            .await;

        assert!(result.is_ok(), "{:?}", result);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.query(),
            Some("url=example.com&timestamp=20060102")
        );
    }

    #[tokio::test]
    async fn test_available_escapes_url_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AVAILABLE_RESPONSE))
            .mount(&server)
            .await;

        client_for(&server)
            .available("http://example.com/?a=1&b=2")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].url.query(),
            Some("url=http%3A%2F%2Fexample.com%2F%3Fa%3D1%26b%3D2")
        );
    }

    #[tokio::test]
    async fn test_available_when_not_available_returns_not_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"archived_snapshots": {"closest": {"available": false, "url": "", "timestamp": "", "status": ""}}}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .available("example.invalid")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotAvailable), "{:?}", err);
    }

    #[tokio::test]
    async fn test_available_when_status_not_ok_returns_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .available("example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusCode::SERVICE_UNAVAILABLE)));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_available_when_body_malformed_returns_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"archived_snapshots\":"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .available("example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_available_when_server_unreachable_returns_transport_error() {
        // Nothing listens on port 1.
        let client = Client::new().with_endpoint("http://127.0.0.1:1/wayback/available");

        let err = client.available("example.com").await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_available_with_invalid_endpoint_returns_url_error() {
        let client = Client::new().with_endpoint("not a url");

        let err = client.available("example.com").await.unwrap_err();

        assert!(matches!(err, Error::Url(_)), "{:?}", err);
    }
}
