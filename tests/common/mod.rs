// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use linkcard::handlers;
use linkcard::preview::fetcher::{FetchError, FetchResult, Fetcher};
use linkcard::preview::{PreviewExtractor, PreviewOptions};
use linkcard::state::AppState;

// ── Fixture fetcher ──────────────────────────────────────────────────────────

#[derive(Clone)]
enum Fixture {
    Page {
        content_type: String,
        body: String,
        body_delay: Option<Duration>,
    },
    Fail(FetchError),
}

/// Serves canned responses keyed by URL and records every fetch it sees.
///
/// URLs without a fixture fail with a network error.
#[derive(Default)]
pub struct FixtureFetcher {
    fixtures: HashMap<String, Fixture>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.respond(url, "text/html; charset=utf-8", body)
    }

    pub fn respond(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.fixtures.insert(
            url.to_string(),
            Fixture::Page {
                content_type: content_type.to_string(),
                body: body.to_string(),
                body_delay: None,
            },
        );
        self
    }

    /// Headers arrive immediately, the body only after `delay`.
    pub fn slow_body(
        mut self,
        url: &str,
        content_type: &str,
        body: &str,
        delay: Duration,
    ) -> Self {
        self.fixtures.insert(
            url.to_string(),
            Fixture::Page {
                content_type: content_type.to_string(),
                body: body.to_string(),
                body_delay: Some(delay),
            },
        );
        self
    }

    pub fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.fixtures.insert(url.to_string(), Fixture::Fail(error));
        self
    }

    /// Delay every response (before headers) by `delay`, ignoring the timeout.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.fixtures.get(url).cloned() {
            Some(Fixture::Page {
                content_type,
                body,
                body_delay,
            }) => Ok(FetchResult::new(
                [("Content-Type", content_type)],
                async move {
                    if let Some(delay) = body_delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(body)
                },
            )),
            Some(Fixture::Fail(error)) => Err(error),
            None => Err(FetchError::Network(format!("no fixture for {url}"))),
        }
    }
}

pub fn extractor(fetcher: Arc<FixtureFetcher>) -> PreviewExtractor {
    PreviewExtractor::new(fetcher, PreviewOptions::default())
}

// ── App ──────────────────────────────────────────────────────────────────────

/// Build the application router around a fixture-backed extractor.
pub fn create_test_app(fetcher: Arc<FixtureFetcher>) -> Router {
    let state = AppState {
        extractor: extractor(fetcher),
    };
    Router::new()
        .route("/health", routing::get(handlers::health_check))
        .route(
            "/link-preview",
            routing::get(handlers::link_preview::get_link_preview)
                .post(handlers::link_preview::post_link_preview),
        )
        .with_state(state)
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
