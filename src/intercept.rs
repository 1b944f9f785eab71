//! The injectable network primitive and the recording decorator around it.

use crate::debug::{DebugError, DebugStore};
use crate::models::{ApiCallRecord, Body};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

impl ApiRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(body)?);
        self.content_type = Some("application/json".to_string());
        Ok(self)
    }

    /// Path plus query string, as dispatched.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Records every call dispatched while debug mode is on, then hands back the
/// inner transport's result untouched.
pub struct Intercepted<T> {
    inner: T,
    store: Arc<DebugStore>,
}

pub fn intercept<T: Transport>(inner: T, store: Arc<DebugStore>) -> Intercepted<T> {
    Intercepted { inner, store }
}

// Request metadata kept aside while the call is in flight.
struct Dispatched {
    method: String,
    url: String,
    body: Option<Vec<u8>>,
    content_type: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Dispatched {
    fn into_record(
        self,
        id: u64,
        result: &Result<ApiResponse, TransportError>,
        elapsed: Duration,
    ) -> Result<ApiCallRecord, DebugError> {
        let duration_ms = u64::try_from(elapsed.as_millis())
            .map_err(|_| DebugError::Capture(format!("duration {elapsed:?} out of range")))?;
        // Request bodies declared as JSON were encoded by us; a mismatch means
        // the request was built wrongly and is not worth recording.
        let request_body = match (&self.body, self.content_type.as_deref()) {
            (Some(bytes), Some(ct)) if ct.contains("json") => {
                Some(Body::Json(serde_json::from_slice(bytes)?))
            }
            (Some(bytes), ct) => Body::from_bytes(bytes, ct),
            (None, _) => None,
        };
        let mut record = ApiCallRecord {
            id,
            method: self.method,
            url: self.url,
            request_body,
            status_code: None,
            error: None,
            response_body: None,
            content_type: None,
            response_size: None,
            timestamp: self.timestamp,
            duration_ms,
        };
        match result {
            Ok(response) => {
                record.status_code = Some(response.status);
                record.response_body = Body::from_bytes(&response.body, response.content_type.as_deref());
                record.content_type = response.content_type.clone();
                record.response_size = Some(response.body.len());
            }
            Err(err) => record.error = Some(err.to_string()),
        }
        Ok(record)
    }
}

#[async_trait]
impl<T: Transport> Transport for Intercepted<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let dispatched = self.store.debug_mode().then(|| Dispatched {
            method: request.method.clone(),
            url: request.url(),
            body: request.body.clone(),
            content_type: request.content_type.clone(),
            timestamp: Utc::now(),
        });
        let start = Instant::now();

        let result = self.inner.send(request).await;

        if let Some(dispatched) = dispatched {
            let id = self.store.next_id();
            match dispatched.into_record(id, &result, start.elapsed()) {
                Ok(record) => {
                    trace!(call = %record, "captured api call");
                    self.store.record(record);
                }
                Err(err) => warn!(error = %err, "dropping api call record"),
            }
        }
        result
    }
}
