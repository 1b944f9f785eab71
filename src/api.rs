//! Thin wrappers over the dashboard backend's REST endpoints.

use crate::intercept::{ApiRequest, ApiResponse, Transport, TransportError};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{path} returned {status}: {message}")]
    Status { path: String, status: u16, message: String },
    #[error("could not decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode request body")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub nodes: u32,
    pub pods: u32,
    pub deployments: u32,
    pub namespaces: u32,
    pub secrets: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActionResult {
    pub message: String,
}

#[derive(Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Serialize)]
struct WorkflowSubmission<'a> {
    parameters: &'a BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Resource {
    Overview,
    Nodes,
    Pods,
    Deployments,
    Secrets,
    Namespaces,
}

#[derive(Clone)]
pub struct DashboardApi {
    transport: Arc<dyn Transport>,
}

impl DashboardApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::Status { path, status: response.status, message: error_message(&response) });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.call(request).await?;
        response.json().map_err(|source| ApiError::Decode { path, source })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, namespace: Option<&str>) -> Result<Vec<T>, ApiError> {
        let mut request = ApiRequest::get(path);
        if let Some(ns) = namespace {
            request = request.with_query("namespace", ns);
        }
        let list: ItemList<T> = self.fetch(request).await?;
        debug!(path, count = list.items.len(), "listed resources");
        Ok(list.items)
    }

    pub async fn overview(&self) -> Result<Overview, ApiError> {
        self.fetch(ApiRequest::get("/api/overview")).await
    }

    pub async fn nodes(&self) -> Result<Vec<Node>, ApiError> {
        self.list("/api/nodes", None).await
    }

    pub async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, ApiError> {
        self.list("/api/pods", namespace).await
    }

    pub async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>, ApiError> {
        self.list("/api/deployments", namespace).await
    }

    pub async fn secrets(&self, namespace: Option<&str>) -> Result<Vec<Secret>, ApiError> {
        self.list("/api/secrets", namespace).await
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>, ApiError> {
        self.list("/api/namespaces", None).await
    }

    pub async fn restart_deployment(&self, namespace: &str, name: &str) -> Result<ActionResult, ApiError> {
        let path = format!("/api/deployments/{}/{}/restart", segment(namespace), segment(name));
        self.fetch(ApiRequest::post(&path)).await
    }

    pub async fn submit_workflow_template(
        &self,
        namespace: &str,
        template: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<ActionResult, ApiError> {
        let path = format!("/api/workflows/{}/templates/{}/submit", segment(namespace), segment(template));
        let request = ApiRequest::post(&path).with_json(&WorkflowSubmission { parameters })?;
        self.fetch(request).await
    }
}

/// Percent-encodes one path segment. `byte_serialize` writes spaces as `+`,
/// which would stay literal in a path, and encodes a real `+` as `%2B`.
fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn error_message(response: &ApiResponse) -> String {
    if let Ok(value) = response.json::<serde_json::Value>() {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let text = response.text();
    let text = text.trim();
    if text.is_empty() {
        return "no response body".to_string();
    }
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugStore;
    use crate::intercept::intercept;
    use crate::intercept::tests::FakeTransport;
    use serde_json::json;

    fn api(fake: FakeTransport) -> DashboardApi {
        DashboardApi::new(Arc::new(fake))
    }

    #[tokio::test]
    async fn overview_counts_are_decoded() {
        let api = api(FakeTransport::default().json("/api/overview", 200, json!({"nodes": 3, "pods": 40})));
        let overview = api.overview().await.unwrap();
        assert_eq!(overview, Overview { nodes: 3, pods: 40, ..Overview::default() });
    }

    #[tokio::test]
    async fn pods_are_listed_with_namespace_query() {
        let body = json!({"items": [
            {"metadata": {"name": "web-1", "namespace": "shop"}, "status": {"phase": "Running"}},
            {"metadata": {"name": "web-2", "namespace": "shop"}, "status": {"phase": "Pending"}}
        ]});
        let fake = Arc::new(FakeTransport::default().json("/api/pods", 200, body));
        let api = DashboardApi::new(fake.clone());

        let pods = api.pods(Some("shop")).await.unwrap();
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].metadata.name.as_deref(), Some("web-1"));
        assert_eq!(fake.seen.lock().unwrap().as_slice(), ["/api/pods?namespace=shop"]);
    }

    #[tokio::test]
    async fn missing_items_is_an_empty_list() {
        let api = api(FakeTransport::default().json("/api/namespaces", 200, json!({})));
        assert!(api.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_carries_backend_message() {
        let api = api(FakeTransport::default().json("/api/secrets", 403, json!({"error": "secrets are forbidden"})));
        match api.secrets(None).await {
            Err(ApiError::Status { status, message, .. }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "secrets are forbidden");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let api = api(FakeTransport::default().json("/api/nodes", 200, json!({"items": "nope"})));
        assert!(matches!(api.nodes().await, Err(ApiError::Decode { .. })));
    }

    #[tokio::test]
    async fn restart_posts_to_deployment_path() {
        let fake = Arc::new(
            FakeTransport::default().json("/api/deployments/shop/web/restart", 200, json!({"message": "restarted"})),
        );
        let api = DashboardApi::new(fake.clone());
        let result = api.restart_deployment("shop", "web").await.unwrap();
        assert_eq!(result.message, "restarted");
    }

    #[tokio::test]
    async fn workflow_submission_is_recorded_with_parameters() {
        let fake = FakeTransport::default().json("/api/workflows/ci/templates/build/submit", 201, json!({"message": "build-x7k2"}));
        let store = Arc::new(DebugStore::new());
        store.set_debug_mode(true);
        let api = DashboardApi::new(Arc::new(intercept(fake, store.clone())));

        let params = BTreeMap::from([("branch".to_string(), "main".to_string())]);
        let result = api.submit_workflow_template("ci", "build", &params).await.unwrap();
        assert_eq!(result.message, "build-x7k2");

        let record = store.get(0).unwrap();
        assert_eq!(record.method, "POST");
        assert_eq!(record.status_code, Some(201));
        assert_eq!(
            record.request_body,
            Some(crate::models::Body::Json(json!({"parameters": {"branch": "main"}})))
        );
    }

    #[tokio::test]
    async fn transport_failure_reaches_the_caller() {
        let store = Arc::new(DebugStore::new());
        store.set_debug_mode(true);
        let fake = FakeTransport::default().fail("/api/overview", "connection reset");
        let api = DashboardApi::new(Arc::new(intercept(fake, store.clone())));

        let err = api.overview().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Network(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn path_segments_are_encoded() {
        let fake = Arc::new(FakeTransport::default());
        let api = DashboardApi::new(fake.clone());

        let _ = api.submit_workflow_template("ci", "a?b", &BTreeMap::new()).await;
        let _ = api.restart_deployment("team a", "web/1+x").await;

        assert_eq!(
            fake.seen.lock().unwrap().as_slice(),
            ["/api/workflows/ci/templates/a%3Fb/submit", "/api/deployments/team%20a/web%2F1%2Bx/restart"]
        );
    }

    #[test]
    fn plain_text_errors_are_trimmed() {
        let response = ApiResponse { status: 502, content_type: Some("text/plain".into()), body: b"  bad gateway\n".to_vec() };
        assert_eq!(error_message(&response), "bad gateway");
    }
}
