//! Minimal Giphy API client.
//!
//! This crate covers the one endpoint the stream tools need:
//! - `GET /gifs/random` with an optional tag and content rating
//! - Extraction of the original-rendition URL from the response

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.giphy.com/v1";

/// Errors that can occur when using the Giphy client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No GIF found for tag '{0}'")]
    NoResults(String),
}

/// Content rating filter accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    G,
    Pg,
    Pg13,
    R,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::G => "g",
            Rating::Pg => "pg",
            Rating::Pg13 => "pg-13",
            Rating::R => "r",
        }
    }
}

/// A GIF picked by the random endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gif {
    pub id: String,
    pub title: String,
    /// URL of the original rendition.
    pub url: String,
}

/// Giphy API client.
#[derive(Clone)]
pub struct Giphy {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    rating: Option<Rating>,
}

impl Giphy {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
            rating: None,
        }
    }

    /// Create a client from the GIPHY_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GIPHY_KEY").map_err(|_| Error::NoApiKey)?;
        if api_key.is_empty() {
            return Err(Error::NoApiKey);
        }
        Ok(Self::new(api_key))
    }

    /// Point the client at a different API root (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Restrict results to a content rating.
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Fetch a random GIF for `tag`.
    pub async fn random(&self, tag: &str) -> Result<Gif, Error> {
        let mut query = vec![("api_key", self.api_key.as_str()), ("tag", tag)];
        if let Some(rating) = self.rating {
            query.push(("rating", rating.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/gifs/random", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_random(body, tag)
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Deserialize)]
struct ApiGif {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    images: ApiImages,
}

#[derive(Deserialize)]
struct ApiImages {
    original: Option<ApiRendition>,
}

#[derive(Deserialize)]
struct ApiRendition {
    url: Option<String>,
}

/// Turn a random-endpoint response body into a [`Gif`].
///
/// The API answers an empty search with `"data": []` instead of an object.
fn parse_random(body: Value, tag: &str) -> Result<Gif, Error> {
    let data = match body.get("data") {
        Some(Value::Object(_)) => body["data"].clone(),
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(Error::NoResults(tag.to_string()))
        }
        _ => return Err(Error::Parse("missing 'data' object".to_string())),
    };

    let gif: ApiGif = serde_json::from_value(data).map_err(|e| Error::Parse(e.to_string()))?;

    let url = gif
        .images
        .original
        .and_then(|r| r.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::NoResults(tag.to_string()))?;

    Ok(Gif {
        id: gif.id,
        title: gif.title,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with `status` and `body`. Resolves to the request line.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;

            let head = String::from_utf8_lossy(&head).into_owned();
            head.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{addr}/v1"), handle)
    }

    fn gif_body() -> String {
        json!({
            "data": {
                "id": "abc123",
                "title": "Party Time GIF",
                "images": { "original": { "url": "https://media.giphy.com/media/abc123/giphy.gif" } }
            },
            "meta": { "status": 200, "msg": "OK" }
        })
        .to_string()
    }

    #[test]
    fn test_parse_random() {
        let body = json!({
            "data": {
                "type": "gif",
                "id": "abc123",
                "title": "Party Time GIF",
                "images": {
                    "original": {
                        "url": "https://media.giphy.com/media/abc123/giphy.gif",
                        "width": "480",
                        "height": "270"
                    },
                    "fixed_height": { "url": "https://example.invalid/small.gif" }
                }
            },
            "meta": { "status": 200, "msg": "OK" }
        });

        let gif = parse_random(body, "celebration").unwrap();
        assert_eq!(gif.id, "abc123");
        assert_eq!(gif.title, "Party Time GIF");
        assert_eq!(gif.url, "https://media.giphy.com/media/abc123/giphy.gif");
    }

    #[test]
    fn test_parse_empty_result() {
        let body = json!({ "data": [], "meta": { "status": 200 } });
        let err = parse_random(body, "nothing-here").unwrap_err();
        assert!(matches!(err, Error::NoResults(tag) if tag == "nothing-here"));
    }

    #[test]
    fn test_parse_missing_original() {
        let body = json!({ "data": { "id": "x", "images": {} } });
        assert!(matches!(
            parse_random(body, "t"),
            Err(Error::NoResults(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_random(json!({ "meta": {} }), "t"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_random(json!({ "data": { "id": "x" } }), "t"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_rating_strings() {
        assert_eq!(Rating::Pg13.as_str(), "pg-13");
        assert_eq!(Rating::G.as_str(), "g");
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = Giphy::new("key").with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = Giphy::new("key").with_base_url("http://127.0.0.1:9");
        let err = client.random("celebration").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_random_sends_key_tag_and_rating() {
        let (base_url, server) = serve_once("200 OK", gif_body()).await;
        let client = Giphy::new("test-key")
            .with_base_url(base_url)
            .with_rating(Rating::Pg13);

        let gif = client.random("celebration").await.unwrap();
        assert_eq!(gif.url, "https://media.giphy.com/media/abc123/giphy.gif");

        let request_line = server.await.unwrap();
        assert!(
            request_line.starts_with("GET /v1/gifs/random?"),
            "request line: {request_line}"
        );
        assert!(request_line.contains("api_key=test-key"));
        assert!(request_line.contains("tag=celebration"));
        assert!(request_line.contains("rating=pg-13"));
    }

    #[tokio::test]
    async fn test_random_without_rating() {
        let (base_url, server) = serve_once("200 OK", gif_body()).await;
        let client = Giphy::new("test-key").with_base_url(base_url);

        client.random("cats").await.unwrap();

        let request_line = server.await.unwrap();
        assert!(request_line.contains("tag=cats"));
        assert!(!request_line.contains("rating="));
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let body = json!({ "meta": { "status": 403, "msg": "Forbidden" } }).to_string();
        let (base_url, _server) = serve_once("403 Forbidden", body).await;
        let client = Giphy::new("bad-key").with_base_url(base_url);

        match client.random("celebration").await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("Forbidden"), "message: {message}");
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_result_over_http() {
        let body = json!({ "data": [], "meta": { "status": 200 } }).to_string();
        let (base_url, _server) = serve_once("200 OK", body).await;
        let client = Giphy::new("test-key").with_base_url(base_url);

        let err = client.random("nothing-here").await.unwrap_err();
        assert!(matches!(err, Error::NoResults(tag) if tag == "nothing-here"));
    }

    #[test]
    fn test_new_defaults() {
        let client = Giphy::new("key");
        assert_eq!(client.api_key, "key");
        assert_eq!(client.base_url, API_BASE);
        assert_eq!(client.rating, None);
    }
}
