use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use tracing::info;

use crate::error::FetchError;

/// Single attempt, no retry. A timeout means fallback.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// How much of each body is kept for diagnosing source drift.
pub const PREVIEW_CHARS: usize = 5000;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Raw upstream answer, before any interpretation.
#[derive(Debug, Clone)]
pub struct SourceContent {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl SourceContent {
    pub fn preview(&self) -> String {
        preview(&self.body, PREVIEW_CHARS)
    }
}

pub trait Fetcher: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<SourceContent, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
            token,
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err)
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<SourceContent, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.query(&[("bearer_token", token)]);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| self.classify(e))?;

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "source response received"
        );
        Ok(SourceContent {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// First `max` characters of `body`.
pub fn preview(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use super::*;

    async fn spawn_source() -> String {
        let app = Router::new()
            .route(
                "/feed",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(serde_json::json!({ "token": q.get("bearer_token") }))
                }),
            )
            .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetch_passes_token_and_content_type() {
        let base = spawn_source().await;
        let fetcher = HttpFetcher::new(format!("{base}/feed"), Some("abc".into()), FETCH_TIMEOUT).unwrap();
        let content = fetcher.fetch().await.unwrap();
        assert_eq!(content.status, 200);
        assert!(content.content_type.unwrap().contains("application/json"));
        assert_eq!(content.body, r#"{"token":"abc"}"#);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = spawn_source().await;
        let fetcher = HttpFetcher::new(format!("{base}/down"), None, FETCH_TIMEOUT).unwrap();
        assert!(matches!(fetcher.fetch().await, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let base = spawn_source().await;
        let fetcher = HttpFetcher::new(format!("{base}/slow"), None, Duration::from_millis(200)).unwrap();
        assert!(matches!(fetcher.fetch().await, Err(FetchError::Timeout(_))));
    }

    #[test]
    fn preview_counts_chars() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("ab", 5000), "ab");
    }
}
