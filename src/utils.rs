use crate::api::{ApiError, DashboardApi};
use crate::debug::DebugStore;
use crate::k8s;
use crate::models::DeploymentOption;
use crate::namespaces::NamespaceFilter;
use crate::summary;
use colored::*;
use comfy_table::Table;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::MultiSelect;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

// --- SHARED SPINNER ---
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

// --- SHARED NAMESPACE LOGIC ---
pub async fn get_selected_namespaces(
    api: &DashboardApi,
    arg: Option<Option<String>>,
) -> anyhow::Result<Vec<NamespaceFilter>> {
    match arg {
        None => match k8s::context_namespace().await {
            Some(ns) => {
                println!("Using context namespace: {}", ns.cyan());
                Ok(vec![NamespaceFilter::Only(ns)])
            }
            None => Ok(vec![NamespaceFilter::All]),
        },
        Some(None) => {
            let pb = create_spinner("Fetching namespaces...");
            let ns_list = api.namespaces().await;
            pb.finish_and_clear();

            let ns_options: Vec<String> = ns_list?.into_iter().filter_map(|n| n.metadata.name).collect();
            let picked = MultiSelect::new("Select Namespaces:", ns_options).prompt()?;
            if picked.is_empty() {
                return Ok(vec![NamespaceFilter::All]);
            }
            Ok(picked.into_iter().map(NamespaceFilter::Only).collect())
        }
        Some(Some(ns)) => Ok(vec![NamespaceFilter::Only(ns)]),
    }
}

// --- SHARED PER-NAMESPACE FETCHING (PARALLEL) ---
pub async fn fetch_across<T, F, Fut>(namespaces: Vec<NamespaceFilter>, fetch: F) -> anyhow::Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(NamespaceFilter) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
{
    let mut tasks = Vec::new();
    let semaphore = Arc::new(Semaphore::new(8));

    for ns in namespaces {
        let sem = semaphore.clone();
        let fut = fetch(ns);
        tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await;
            fut.await
        }));
    }

    let mut all = Vec::new();
    for res in join_all(tasks).await {
        all.extend(res??);
    }
    Ok(all)
}

pub async fn fetch_all_deployments(
    api: &DashboardApi,
    namespaces: Vec<NamespaceFilter>,
) -> anyhow::Result<Vec<DeploymentOption>> {
    let pb = create_spinner("Fetching deployments...");
    let api = api.clone();
    let deployments = fetch_across(namespaces, move |ns| {
        let api = api.clone();
        async move { api.deployments(ns.as_query()).await }
    })
    .await;
    pb.finish_and_clear();

    Ok(deployments?
        .into_iter()
        .map(|d| DeploymentOption { name: summary::name_of(&d.metadata), namespace: summary::namespace_of(&d.metadata) })
        .collect())
}

/// Table of captured calls, printed after one-shot commands run with `--debug`.
pub fn print_call_log(store: &DebugStore) {
    let log = store.log();
    println!("\n{}", "--- API CALLS ---".bold().bright_white());
    if log.is_empty() {
        println!("   (No API calls captured)");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Method", "URL", "Status", "Duration", "Time"]);
    for record in &log {
        let status = if record.is_success() { record.status_label().green() } else { record.status_label().red() };
        table.add_row(vec![
            record.id.to_string(),
            record.method.clone(),
            record.url.clone(),
            status.to_string(),
            format!("{}ms", record.duration_ms),
            record.timestamp.format("%H:%M:%S%.3f").to_string(),
        ]);
    }
    println!("{table}");
}
