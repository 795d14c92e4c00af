//! Typed inventory API client

use std::collections::BTreeMap;
use std::sync::Arc;

use conch_core::{DeviceLocation, Entity, EntityKind};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::transport::{ApiRequest, Transport};

/// Client for the inventory API's documented endpoints.
///
/// List endpoints answer `{ "data": { "<collection>": [...] } }`; single
/// resource endpoints answer the bare entity object.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    with_credentials: bool,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            with_credentials: true,
        }
    }

    /// Whether requests forward session credentials (default: true)
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, escaping each segment.
    fn url(&self, segments: &[&str]) -> FetchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str]) -> FetchResult<Value> {
        let url = self.url(segments)?;
        self.transport
            .send(ApiRequest::get(url, self.with_credentials))
            .await
    }

    /// `GET /<resource>`, preserving server order.
    pub async fn list<T: Entity>(&self) -> FetchResult<Vec<T>> {
        let kind = T::KIND;
        let body = self.get_json(&[kind.resource()]).await?;
        let items = parse_list(kind, body)?;
        debug!("Fetched {} {}", items.len(), kind.collection());
        Ok(items)
    }

    /// `GET /<resource>/<id>`
    pub async fn get<T: Entity>(&self, id: &str) -> FetchResult<T> {
        let body = self.get_json(&[T::KIND.resource(), id]).await?;
        parse_entity(body)
    }

    /// `GET /device/<id>/location`
    pub async fn device_location(&self, device_id: &str) -> FetchResult<DeviceLocation> {
        let body = self
            .get_json(&[EntityKind::Device.resource(), device_id, "location"])
            .await?;
        parse_entity(body)
    }

    /// `POST /rack/<id>/layout` with a device id to slot mapping.
    ///
    /// The response body is ignored; callers reload the rack to observe the
    /// new layout.
    pub async fn assign_devices(
        &self,
        rack_id: &str,
        assignments: &BTreeMap<String, u32>,
    ) -> FetchResult<()> {
        let url = self.url(&[EntityKind::Rack.resource(), rack_id, "layout"])?;
        let body = serde_json::to_value(assignments)?;
        self.transport
            .send(ApiRequest::post(url, self.with_credentials, body))
            .await?;
        Ok(())
    }

    /// `POST /feedback` with `{ "message": <text> }`. The response body is
    /// ignored.
    pub async fn send_feedback(&self, text: &str) -> FetchResult<()> {
        let url = self.url(&["feedback"])?;
        let body = serde_json::json!({ "message": text });
        self.transport
            .send(ApiRequest::post(url, self.with_credentials, body))
            .await?;
        debug!("Sent {} bytes of feedback", text.len());
        Ok(())
    }
}

/// Extract `data.<collection>` from a list response.
pub fn parse_list<T: DeserializeOwned>(kind: EntityKind, body: Value) -> FetchResult<Vec<T>> {
    let Value::Object(mut envelope) = body else {
        return Err(FetchError::InvalidResponse(format!(
            "{} list response is not an object",
            kind.resource()
        )));
    };
    let items = match envelope.get_mut("data") {
        Some(Value::Object(data)) => data.remove(kind.collection()),
        _ => None,
    }
    .ok_or_else(|| {
        FetchError::InvalidResponse(format!("missing data.{}", kind.collection()))
    })?;
    Ok(serde_json::from_value(items)?)
}

fn parse_entity<T: DeserializeOwned>(body: Value) -> FetchResult<T> {
    Ok(serde_json::from_value(body)?)
}
