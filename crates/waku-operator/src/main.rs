//! Waku Operator
//!
//! Kubernetes operator running Waku nodes from Node resources.

use anyhow::{anyhow, Context as _};
use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use waku_operator::{
    config::{OperatorConfig, ResolverConfig, DEFAULT_RPC_PORT},
    controllers::{Context, NodeController},
    crds::Node,
    resolver::ServiceResolver,
    store::KubeStore,
};

#[derive(Parser)]
#[command(name = "waku-operator")]
#[command(about = "Kubernetes operator for Waku nodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Node CRD manifest to stdout
    Crds,
    /// Run the operator
    Run {
        /// RPC port of sibling node Services, used to resolve static peers
        #[arg(long, env = "WAKU_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
        rpc_port: u16,

        /// Timeout for a sibling info request, in seconds
        #[arg(long, env = "RESOLVE_TIMEOUT_SECS", default_value_t = 10)]
        resolve_timeout_secs: u64,

        /// Delay before the follow-up pass after creating an object, in seconds
        #[arg(long, env = "REQUEUE_SECS", default_value_t = 5)]
        requeue_secs: u64,

        /// Delay before retrying a failed pass, in seconds
        #[arg(long, env = "ERROR_REQUEUE_SECS", default_value_t = 60)]
        error_requeue_secs: u64,

        /// Log format: text or json
        #[arg(long, env = "LOG_FORMAT", default_value = "text")]
        log_format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Crds => print_crds(),
        Commands::Run {
            rpc_port,
            resolve_timeout_secs,
            requeue_secs,
            error_requeue_secs,
            log_format,
        } => {
            init_tracing(&log_format);
            let config = OperatorConfig {
                resolver: ResolverConfig {
                    rpc_port,
                    timeout: Duration::from_secs(resolve_timeout_secs),
                },
                requeue_interval: Duration::from_secs(requeue_secs),
                error_requeue_interval: Duration::from_secs(error_requeue_secs),
            };
            run_operator(config).await
        }
    }
}

fn print_crds() -> anyhow::Result<()> {
    println!("---");
    println!(
        "{}",
        serde_yaml::to_string(&Node::crd()).context("Failed to serialize Node CRD")?
    );
    Ok(())
}

fn init_tracing(log_format: &str) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

async fn run_operator(config: OperatorConfig) -> anyhow::Result<()> {
    info!(?config, "Starting waku-operator");

    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes");

    let store = Arc::new(KubeStore::new(client.clone()));
    let resolver = ServiceResolver::new(store.clone(), config.resolver.clone())
        .context("Failed to build info RPC client")?;
    let ctx = Arc::new(Context::new(store, Arc::new(resolver), config));

    NodeController::run(client, ctx).await;

    info!("waku-operator stopped");
    Ok(())
}
