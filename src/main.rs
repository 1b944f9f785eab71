mod api;
mod app;
mod commands;
mod debug;
mod export;
mod intercept;
mod k8s;
mod models;
mod namespaces;
mod secrets;
mod summary;
mod transport;
mod tui;
mod ui;
pub mod utils;

use api::{DashboardApi, Resource};
use clap::{Parser, Subcommand};
use debug::DebugStore;
use namespaces::{Favorites, NamespaceFilter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
// Add these attributes to enable auto-generation of help/version
#[command(name = "kdash", about = "K8s Admin Dashboard", author, version, long_about = None)]
struct Cli {
    /// Base URL of the dashboard backend
    #[arg(long, global = true, env = "KDASH_API_URL", default_value = "http://localhost:8080")]
    api_url: String,
    /// Per-request timeout in seconds (no timeout when omitted)
    #[arg(long, global = true, env = "KDASH_TIMEOUT")]
    timeout: Option<u64>,
    /// Maximum number of API calls kept in the debug log
    #[arg(long, global = true, default_value_t = debug::DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,
    /// Record API calls for this session (off by default)
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Ui {
        /// Start filtered to this namespace instead of all namespaces
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// List cluster resources
    Get {
        #[arg(value_enum)]
        resource: Resource,
        /// Pass target namespace.
        /// If -n is passed without a value, shows interactive menu.
        /// If -n is missing, uses current context.
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
        /// Only show objects whose name matches this regex
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Trigger a rolling restart of a deployment
    Restart {
        /// Deployment name (optional, will show menu if missing)
        deployment: Option<String>,
        /// Target namespace.
        /// If -n is passed without a value, shows interactive menu.
        /// If -n is missing, uses current context.
        #[arg(short, long, num_args = 0..=1, default_missing_value = None)]
        namespace: Option<Option<String>>,
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Submit a workflow from a workflow template
    Submit {
        template: String,
        #[arg(short, long, default_value = "default")]
        namespace: String,
        /// Workflow parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = commands::submit::parse_param)]
        params: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // 1. Initialize Crypto
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // 2. Wire the shared debug store between the network primitive and every caller
    let store = Arc::new(DebugStore::with_capacity(cli.log_capacity));
    if cli.debug {
        store.set_debug_mode(true);
    }
    let http = transport::HttpTransport::new(&cli.api_url, cli.timeout)?;
    let api = DashboardApi::new(Arc::new(intercept::intercept(http, store.clone())));

    let result = match cli.command.unwrap_or(Commands::Ui { namespace: None }) {
        Commands::Ui { namespace } => {
            let app = app::App::new(
                api,
                store,
                k8s::context_name(),
                NamespaceFilter::from_option(namespace),
                Favorites::load(Favorites::default_path()),
            );
            return tui::run(app);
        }
        Commands::Get { resource, namespace, filter } => {
            commands::get::run(api, resource, namespace, filter).await
        }
        Commands::Restart { deployment, namespace, yes } => {
            commands::restart::run(api, deployment, namespace, yes).await
        }
        Commands::Submit { template, namespace, params } => {
            commands::submit::run(api, template, namespace, params).await
        }
    };

    // Failed calls are often the ones worth inspecting.
    if store.debug_mode() {
        utils::print_call_log(&store);
    }
    result
}
