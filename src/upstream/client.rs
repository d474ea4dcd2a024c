//! reqwest-backed upstream client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    Pagination, RequestBody, Service, Upstream, UpstreamError, UpstreamRequest, UpstreamResponse,
};
use crate::config::UpstreamConfig;

/// Path appended to the commerce base URL.
const COMMERCE_API_PREFIX: &str = "wp-json/wc/v3";

/// Production upstream: WooCommerce for [`Service::Commerce`], WordPress for
/// [`Service::Content`], both with HTTP basic auth.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Full URL for a service-relative path.
    pub fn url(&self, service: Service, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match service {
            Service::Commerce => format!(
                "{}/{}/{}",
                self.config.commerce_url.trim_end_matches('/'),
                COMMERCE_API_PREFIX,
                path
            ),
            Service::Content => {
                format!("{}/{}", self.config.content_url.trim_end_matches('/'), path)
            }
        }
    }

    fn credentials(&self, service: Service) -> (&str, &str) {
        match service {
            Service::Commerce => (
                self.config.consumer_key.as_str(),
                self.config.consumer_secret.as_str(),
            ),
            Service::Content => (
                self.config.content_username.as_str(),
                self.config.content_password.as_str(),
            ),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url(request.service, &request.path);
        let (username, password) = self.credentials(request.service);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .basic_auth(username, Some(password));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::File(upload) => {
                let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
                if let Some(content_type) = upload.content_type {
                    part = part.mime_str(&content_type)?;
                }
                builder.multipart(Form::new().part("file", part))
            }
        };

        debug!(method = %request.method, url = %url, "calling upstream");

        let response = builder.send().await?;
        let status = response.status();
        let pagination = Pagination::from_headers(response.headers());
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);

        if !status.is_success() {
            warn!(
                method = %request.method,
                url = %url,
                status = status.as_u16(),
                "upstream returned an error"
            );
            return Err(UpstreamError::Status {
                status,
                details: body,
            });
        }

        Ok(UpstreamResponse { body, pagination })
    }
}

/// JSON when possible, the raw text otherwise, `null` for an empty body.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
