use anyhow::Context;
use clap::Parser;
use federated_cluster::algorithms::{central, register_defaults};
use federated_cluster::collaboration::types::{Collaboration, OrganizationId, SessionId};
use federated_cluster::config::cli::{AverageArgs, Cli, Command, NodeArgs, ProbeArgs, ServeArgs};
use federated_cluster::config::{DatabaseCatalog, parse_organizations, parse_sessions};
use federated_cluster::executor::executor::TaskExecutor;
use federated_cluster::executor::registry::JobRegistry;
use federated_cluster::orchestrator::{Aggregator, Orchestrator};
use federated_cluster::probe::{ProbeSettings, run_probe};
use federated_cluster::queue::client::HttpTaskQueue;
use federated_cluster::queue::handlers::router;
use federated_cluster::queue::store::InMemoryTaskQueue;
use federated_cluster::queue::TaskQueue;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("federated_cluster=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Node(args) => node(args).await,
        Command::Average(args) => average(args).await,
        Command::Probe(args) => probe(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let organizations = parse_organizations(&args.organizations).map_err(anyhow::Error::msg)?;
    anyhow::ensure!(!organizations.is_empty(), "at least one organization is required");
    let collaboration = Collaboration::new(organizations, parse_sessions(&args.sessions));

    tracing::info!(
        organizations = ?collaboration.organizations,
        sessions = collaboration.sessions.len(),
        "Starting task queue"
    );

    let queue: Arc<dyn TaskQueue> = Arc::new(InMemoryTaskQueue::new(collaboration));
    let app = router(queue);

    tracing::info!("HTTP server listening on {}", args.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn node(args: NodeArgs) -> anyhow::Result<()> {
    let catalog = DatabaseCatalog::parse(&args.databases).map_err(anyhow::Error::msg)?;
    if catalog.is_empty() {
        tracing::warn!("No databases configured, federated runs will fail");
    }

    let registry = JobRegistry::new();
    register_defaults(&registry)?;

    let queue: Arc<dyn TaskQueue> = Arc::new(HttpTaskQueue::new(&args.queue_url));
    let executor = TaskExecutor::new(
        queue,
        registry.clone(),
        OrganizationId(args.organization),
        catalog.clone(),
        args.proxy.into(),
        args.workers,
    );

    tracing::info!(
        organization = args.organization,
        node = %executor.node_id(),
        queue = %args.queue_url,
        databases = ?catalog.labels(),
        jobs = ?registry.list_jobs(),
        "Starting data node"
    );

    executor.start().await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}

async fn average(args: AverageArgs) -> anyhow::Result<()> {
    let registry = JobRegistry::new();
    register_defaults(&registry)?;

    let queue: Arc<dyn TaskQueue> = Arc::new(HttpTaskQueue::new(&args.queue_url));
    let aggregator = Aggregator::new(queue.clone()).with_max_wait(args.max_wait_secs.map(Duration::from_secs));
    let orchestrator = Orchestrator::new(queue, registry).with_aggregator(aggregator);

    let organizations = match args.organizations.as_deref() {
        Some(list) => Some(
            parse_organizations(list)
                .map_err(anyhow::Error::msg)?
                .into_iter()
                .collect(),
        ),
        None => None,
    };

    let combined = central::average(
        &orchestrator,
        &args.column,
        organizations,
        args.session.map(SessionId),
        args.database,
        Vec::new(),
    )
    .await
    .with_context(|| format!("federated average of '{}' failed", args.column))?;

    println!("{}", serde_json::to_string_pretty(&combined)?);
    Ok(())
}

async fn probe(args: ProbeArgs) -> anyhow::Result<()> {
    let sleep = Duration::try_from_secs_f64(args.sleep_secs).context("--sleep-secs must be non-negative")?;
    let settings = ProbeSettings::new(args.proxy.into()).with_sleep(sleep);

    let report = run_probe(&settings).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
