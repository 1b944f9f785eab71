use kube::config::{Config, Kubeconfig};
use tracing::debug;

/// Namespace of the current kubeconfig context, if a kubeconfig can be loaded.
pub async fn context_namespace() -> Option<String> {
    match Config::infer().await {
        Ok(config) => Some(config.default_namespace),
        Err(e) => {
            debug!(error = %e, "no kubeconfig available, defaulting to all namespaces");
            None
        }
    }
}

pub fn context_name() -> String {
    Kubeconfig::read()
        .ok()
        .and_then(|kc| kc.current_context)
        .unwrap_or_else(|| "unknown".to_string())
}
