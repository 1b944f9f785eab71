use crate::api::DashboardApi;
use crate::utils;
use colored::*;
use std::collections::BTreeMap;

/// Parses a `key=value` workflow parameter.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

pub async fn run(
    api: DashboardApi,
    template: String,
    namespace: String,
    params: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let parameters: BTreeMap<String, String> = params.into_iter().collect();

    let pb = utils::create_spinner(&format!("Submitting workflow template {template}..."));
    let result = api.submit_workflow_template(&namespace, &template, &parameters).await;
    pb.finish_and_clear();

    let result = result?;
    println!("{} Submitted {} ({})", "✔".green().bold(), template.cyan(), namespace);
    if !result.message.is_empty() {
        println!("   {}", result.message);
    }
    Ok(())
}
