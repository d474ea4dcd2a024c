//! Shared helpers for integration tests: an in-memory upstream and a router
//! wired to it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use catalog_gateway::{
    api::create_router,
    cache::{CacheSettings, ResponseCache},
    upstream::{Pagination, Upstream, UpstreamError, UpstreamRequest, UpstreamResponse},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

type Answer = Result<UpstreamResponse, (StatusCode, Value)>;

/// Upstream fake keyed by request path. Unknown paths answer `200 null`.
#[derive(Default)]
pub struct MockUpstream {
    answers: Mutex<HashMap<String, Answer>>,
    calls: Mutex<Vec<UpstreamRequest>>,
}

impl MockUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.answer(path, Ok(UpstreamResponse::ok(body)));
    }

    pub fn respond_paginated(&self, path: &str, body: Value, total_pages: &str, total: &str) {
        let response = UpstreamResponse {
            pagination: Pagination::new(total_pages, total),
            ..UpstreamResponse::ok(body)
        };
        self.answer(path, Ok(response));
    }

    pub fn fail(&self, path: &str, status: StatusCode, details: Value) {
        self.answer(path, Err((status, details)));
    }

    fn answer(&self, path: &str, answer: Answer) {
        self.answers
            .lock()
            .unwrap()
            .insert(path.to_string(), answer);
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of upstream calls made for `path`.
    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .count()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let answer = self.answers.lock().unwrap().get(&request.path).cloned();
        self.calls.lock().unwrap().push(request);

        match answer {
            Some(Ok(response)) => Ok(response),
            Some(Err((status, details))) => Err(UpstreamError::Status { status, details }),
            None => Ok(UpstreamResponse::ok(Value::Null)),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: Arc<MockUpstream>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_settings(CacheSettings::default().with_ttl(ttl))
    }

    pub fn with_settings(settings: CacheSettings) -> Self {
        let upstream = MockUpstream::new();
        let state = AppState::new(ResponseCache::new(settings), upstream.clone());
        Self {
            router: create_router(state.clone()),
            state,
            upstream,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn seed(&self, keys: &[&str]) {
        for key in keys {
            self.state
                .cache
                .insert(key.to_string(), Value::Null, Vec::new())
                .await
                .unwrap();
        }
    }
}

pub async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
