//! The HTTP collaborator
//!
//! Everything above this layer sees a single async request function taking a
//! method, a URL and a credential-forwarding flag and returning a parsed JSON
//! body. Timeouts are enforced here and surface as [`FetchError::Timeout`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    /// Forward session cookies with the request
    pub with_credentials: bool,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: Url, with_credentials: bool) -> Self {
        Self {
            method: Method::Get,
            url,
            with_credentials,
            body: None,
        }
    }

    pub fn post(url: Url, with_credentials: bool, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            with_credentials,
            body: Some(body),
        }
    }
}

/// Async request function used by [`crate::ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: ApiRequest) -> FetchResult<Value>;
}

/// [`Transport`] over `reqwest`.
///
/// Holds two clients so credential forwarding can be chosen per request: one
/// keeps a cookie store, the other never sends cookies.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    with_cookies: Client,
    anonymous: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let with_cookies = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        let anonymous = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            with_cookies,
            anonymous,
        })
    }

    async fn handle_response(response: reqwest::Response) -> FetchResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED => FetchError::Unauthorized,
                StatusCode::NOT_FOUND => FetchError::NotFound(text),
                _ => FetchError::Status {
                    status: status.as_u16(),
                    message: text,
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> FetchResult<Value> {
        let client = if request.with_credentials {
            &self.with_cookies
        } else {
            &self.anonymous
        };

        tracing::debug!("{} {}", request.method, request.url);

        let mut builder = match request.method {
            Method::Get => client.get(request.url),
            Method::Post => client.post(request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        Self::handle_response(response).await
    }
}
