use crate::api::DashboardApi;
use crate::models::DeploymentOption;
use crate::namespaces::NamespaceFilter;
use crate::utils;
use colored::*;
use inquire::{Confirm, Select};

pub async fn run(
    api: DashboardApi,
    deployment_arg: Option<String>,
    namespace_arg: Option<Option<String>>,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let selected_ns = utils::get_selected_namespaces(&api, namespace_arg).await?;

    let target = match deployment_arg {
        Some(name) => {
            let namespace = match selected_ns.first() {
                Some(NamespaceFilter::Only(ns)) => ns.clone(),
                _ => anyhow::bail!("restarting {name} needs a namespace (-n)"),
            };
            DeploymentOption { name, namespace }
        }
        None => {
            let deployments = utils::fetch_all_deployments(&api, selected_ns).await?;
            if deployments.is_empty() {
                println!("   (No deployments found)");
                return Ok(());
            }
            Select::new("Select deployment to restart:", deployments).prompt()?
        }
    };

    if !assume_yes {
        let question = format!("Restart {target}? Its pods will be rolled.");
        if !Confirm::new(&question).with_default(false).prompt()? {
            println!("{}", "Restart cancelled.".yellow());
            return Ok(());
        }
    }

    let pb = utils::create_spinner(&format!("Restarting {}...", target.name));
    let result = api.restart_deployment(&target.namespace, &target.name).await;
    pb.finish_and_clear();

    let result = result?;
    let message = if result.message.is_empty() { format!("Restarted {target}") } else { result.message };
    println!("{} {}", "✔".green().bold(), message);
    Ok(())
}
