use crate::api::{DashboardApi, Resource};
use crate::namespaces::{Favorites, NamespaceFilter, filter_objects};
use crate::{secrets, summary, utils};
use colored::*;
use comfy_table::Table;
use regex::Regex;

pub async fn run(
    api: DashboardApi,
    resource: Resource,
    namespace_arg: Option<Option<String>>,
    filter: Option<String>,
) -> anyhow::Result<()> {
    let filter_regex = filter.as_deref().map(Regex::new).transpose()?;

    match resource {
        Resource::Overview => {
            let pb = utils::create_spinner("Fetching overview...");
            let overview = api.overview().await;
            pb.finish_and_clear();
            let overview = overview?;

            println!("\n{}", "--- CLUSTER OVERVIEW ---".bold().bright_white());
            let mut table = Table::new();
            table.set_header(vec!["Resource", "Count"]);
            for (label, count) in [
                ("Nodes", overview.nodes),
                ("Namespaces", overview.namespaces),
                ("Pods", overview.pods),
                ("Deployments", overview.deployments),
                ("Secrets", overview.secrets),
            ] {
                table.add_row(vec![label.to_string(), count.to_string()]);
            }
            println!("{table}");
        }
        Resource::Nodes => {
            let pb = utils::create_spinner("Fetching nodes...");
            let nodes = api.nodes().await;
            pb.finish_and_clear();
            let nodes = filter_objects(nodes?, &NamespaceFilter::All, filter_regex.as_ref(), |n| &n.metadata);

            let mut table = Table::new();
            table.set_header(vec!["Name", "Status", "Roles", "Version"]);
            for n in &nodes {
                let status = if summary::node_ready(n) { "Ready".green() } else { "NotReady".red() };
                table.add_row(vec![
                    summary::name_of(&n.metadata),
                    status.to_string(),
                    summary::node_roles(n),
                    summary::node_version(n),
                ]);
            }
            print_table("NODES", nodes.is_empty(), table);
        }
        Resource::Namespaces => {
            let pb = utils::create_spinner("Fetching namespaces...");
            let list = api.namespaces().await;
            pb.finish_and_clear();
            let list = filter_objects(list?, &NamespaceFilter::All, filter_regex.as_ref(), |n| &n.metadata);
            let favorites = Favorites::load(Favorites::default_path());

            let mut table = Table::new();
            table.set_header(vec!["Name", "Status", "Favorite"]);
            for ns in &list {
                let name = summary::name_of(&ns.metadata);
                let star = if favorites.contains(&name) { "★".yellow().to_string() } else { String::new() };
                table.add_row(vec![name, summary::namespace_phase(ns), star]);
            }
            print_table("NAMESPACES", list.is_empty(), table);
        }
        Resource::Pods => {
            let selected = utils::get_selected_namespaces(&api, namespace_arg).await?;
            let pb = utils::create_spinner("Fetching pods...");
            let fetch_api = api.clone();
            let pods = utils::fetch_across(selected, move |ns| {
                let api = fetch_api.clone();
                async move { api.pods(ns.as_query()).await }
            })
            .await;
            pb.finish_and_clear();
            let pods = filter_objects(pods?, &NamespaceFilter::All, filter_regex.as_ref(), |p| &p.metadata);

            let mut table = Table::new();
            table.set_header(vec!["Name", "Namespace", "Status", "Restarts", "Node"]);
            for p in &pods {
                let phase = summary::pod_phase(p);
                let colored_phase = if phase == "Running" || phase == "Succeeded" { phase.green() } else { phase.red() };
                table.add_row(vec![
                    summary::name_of(&p.metadata),
                    summary::namespace_of(&p.metadata),
                    colored_phase.to_string(),
                    summary::pod_restarts(p).to_string(),
                    summary::pod_node(p),
                ]);
            }
            print_table("PODS", pods.is_empty(), table);
        }
        Resource::Deployments => {
            let selected = utils::get_selected_namespaces(&api, namespace_arg).await?;
            let pb = utils::create_spinner("Fetching deployments...");
            let fetch_api = api.clone();
            let list = utils::fetch_across(selected, move |ns| {
                let api = fetch_api.clone();
                async move { api.deployments(ns.as_query()).await }
            })
            .await;
            pb.finish_and_clear();
            let list = filter_objects(list?, &NamespaceFilter::All, filter_regex.as_ref(), |d| &d.metadata);

            let mut table = Table::new();
            table.set_header(vec!["Name", "Namespace", "Ready", "Available"]);
            for d in &list {
                let ready = summary::deployment_ready(d);
                let ready = if summary::deployment_healthy(d) { ready.green() } else { ready.yellow() };
                table.add_row(vec![
                    summary::name_of(&d.metadata),
                    summary::namespace_of(&d.metadata),
                    ready.to_string(),
                    summary::deployment_available(d).to_string(),
                ]);
            }
            print_table("DEPLOYMENTS", list.is_empty(), table);
        }
        Resource::Secrets => {
            let selected = utils::get_selected_namespaces(&api, namespace_arg).await?;
            let pb = utils::create_spinner("Fetching secrets...");
            let fetch_api = api.clone();
            let list = utils::fetch_across(selected, move |ns| {
                let api = fetch_api.clone();
                async move { api.secrets(ns.as_query()).await }
            })
            .await;
            pb.finish_and_clear();
            let list = filter_objects(list?, &NamespaceFilter::All, filter_regex.as_ref(), |s| &s.metadata);

            // Values stay masked on the CLI; the dashboard can reveal them.
            let mut table = Table::new();
            table.set_header(vec!["Name", "Namespace", "Type", "Keys"]);
            for s in &list {
                table.add_row(vec![
                    summary::name_of(&s.metadata),
                    summary::namespace_of(&s.metadata),
                    summary::secret_type(s),
                    secrets::key_summary(s),
                ]);
            }
            print_table("SECRETS", list.is_empty(), table);
        }
    }
    Ok(())
}

fn print_table(title: &str, empty: bool, table: Table) {
    println!("\n{}", format!("--- {title} ---").bold().bright_white());
    if empty {
        println!("   (No {} found)", title.to_lowercase());
    } else {
        println!("{table}");
    }
}
