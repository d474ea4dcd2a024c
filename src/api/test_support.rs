//! In-memory upstream for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

use super::AppState;
use crate::cache::ResponseCache;
use crate::upstream::{Pagination, Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};

/// Answers by request path and records every call. Unknown paths get `200 null`.
#[derive(Default)]
pub struct RecordingUpstream {
    routes: Mutex<HashMap<String, Result<UpstreamResponse, (StatusCode, Value)>>>,
    calls: Mutex<Vec<UpstreamRequest>>,
}

impl RecordingUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.respond_with(path, UpstreamResponse::ok(body));
    }

    pub fn respond_paginated(&self, path: &str, body: Value, pagination: Pagination) {
        self.respond_with(
            path,
            UpstreamResponse {
                pagination,
                ..UpstreamResponse::ok(body)
            },
        );
    }

    pub fn respond_with(&self, path: &str, response: UpstreamResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(response));
    }

    pub fn fail(&self, path: &str, status: StatusCode, details: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Err((status, details)));
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<UpstreamRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let answer = self.routes.lock().unwrap().get(&request.path).cloned();
        self.calls.lock().unwrap().push(request);

        match answer {
            Some(Ok(response)) => Ok(response),
            Some(Err((status, details))) => Err(UpstreamError::Status { status, details }),
            None => Ok(UpstreamResponse::ok(Value::Null)),
        }
    }
}

pub fn state_with(upstream: Arc<RecordingUpstream>) -> AppState {
    AppState::new(ResponseCache::default(), upstream)
}
