use crate::intercept::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Plain HTTP access to the dashboard backend.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    timeout: Option<u64>,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, TransportError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        // Request paths are joined relative to the base, so it must end in '/'
        // for a path prefix like `/dashboard` to survive.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let mut builder = Client::builder().user_agent(concat!("kdash/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, base_url, timeout: timeout_secs })
    }

    fn resolve(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        self.base_url
            .join(request.url().trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", request.url())))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request)?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidUrl(format!("bad method {}", request.method)))?;
        debug!(%method, %url, "sending request");

        let mut builder = self.client.request(method, url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(e))?.to_vec();
        Ok(ApiResponse { status, content_type, body })
    }
}

impl HttpTransport {
    fn classify(&self, err: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(secs) if err.is_timeout() => TransportError::Timeout(secs),
            _ => TransportError::Network(err.to_string()),
        }
    }
}
