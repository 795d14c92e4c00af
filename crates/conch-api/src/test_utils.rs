//! Test utilities for API consumers
//!
//! [`FakeTransport`] answers requests from scripted per-path responses,
//! records every request, and can hold responses for a path until the test
//! releases them, which is how tests line up concurrent and out-of-order
//! completions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{FetchError, FetchResult};
use crate::transport::{ApiRequest, Transport};

/// Releases the responses held for one path.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Default)]
struct FakeState {
    responses: HashMap<String, FetchResult<Value>>,
    gates: HashMap<String, watch::Receiver<bool>>,
    requests: Vec<ApiRequest>,
}

/// Scripted in-memory [`Transport`]. Paths are matched on `Url::path()`.
#[derive(Debug, Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer every request for `path` with `body`.
    pub fn respond(&self, path: &str, body: Value) {
        self.state().responses.insert(path.to_string(), Ok(body));
    }

    /// Fail every request for `path` with `error`.
    pub fn fail(&self, path: &str, error: FetchError) {
        self.state().responses.insert(path.to_string(), Err(error));
    }

    /// Hold requests for `path` until the returned gate is opened.
    ///
    /// The response is read when the gate opens, so it may be scripted after
    /// the request was issued.
    pub fn hold(&self, path: &str) -> Gate {
        let (tx, rx) = watch::channel(false);
        self.state().gates.insert(path.to_string(), rx);
        Gate { tx: Arc::new(tx) }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> FetchResult<Value> {
        let path = request.url.path().to_string();
        let gate = {
            let mut state = self.state();
            state.requests.push(request);
            state.gates.get(&path).cloned()
        };

        if let Some(mut gate) = gate {
            if gate.wait_for(|open| *open).await.is_err() {
                return Err(FetchError::Network("gate dropped".to_string()));
            }
        }

        self.state()
            .responses
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(path: &str) -> ApiRequest {
        ApiRequest::get(Url::parse("http://fake.test").unwrap().join(path).unwrap(), true)
    }

    #[tokio::test]
    async fn test_scripted_response() {
        let fake = FakeTransport::new();
        fake.respond("/rack", serde_json::json!({ "ok": true }));
        let body = fake.send(get("/rack")).await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(fake.request_count("/rack"), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let fake = FakeTransport::new();
        fake.fail("/relay", FetchError::Timeout);
        assert_eq!(fake.send(get("/relay")).await, Err(FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_held_request_waits_for_gate() {
        let fake = FakeTransport::new();
        let gate = fake.hold("/device");
        fake.respond("/device", Value::Null);

        let pending = tokio::spawn({
            let fake = fake.clone();
            async move { fake.send(get("/device")).await }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.open();
        assert_eq!(pending.await.unwrap(), Ok(Value::Null));
    }
}
