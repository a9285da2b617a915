//! memberd: a RESTful read/write API for memberships in Neo4j

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use memberd_core::RwService;
use memberd_graph::{CypherRunner, GraphConfig, MembershipRepository, DEFAULT_BATCH_SIZE};
use memberd_server::{serve, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "memberd",
    version,
    about = "A RESTful API for managing memberships in Neo4j"
)]
struct Args {
    /// Neo4j bolt endpoint URL
    #[arg(long, default_value = "bolt://localhost:7687", env = "NEO_URL")]
    neo_url: String,

    /// Neo4j user
    #[arg(long, default_value = "neo4j", env = "NEO_USER")]
    neo_user: String,

    /// Neo4j password
    #[arg(long, default_value = "", env = "NEO_PASS", hide_env_values = true)]
    neo_pass: String,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "APP_PORT")]
    port: u16,

    /// Maximum number of statements to execute per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, env = "BATCH_SIZE")]
    batch_size: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Environment this app is running in
    #[arg(long, default_value = "local", env = "APP_ENV")]
    env: String,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let args = Args::parse();

    info!(env = %args.env, neo_url = %args.neo_url, "starting memberd");

    let graph_config = GraphConfig {
        uri: args.neo_url.clone(),
        user: args.neo_user,
        password: args.neo_pass,
        batch_size: args.batch_size,
    };
    let runner = CypherRunner::connect(&graph_config)
        .await
        .with_context(|| format!("could not connect to neo4j at {}", args.neo_url))?;

    let repository = MembershipRepository::new(runner);
    // Constraint setup failure is not fatal; the problem still surfaces
    // through the health check.
    if let Err(err) = repository.initialise().await {
        warn!("could not ensure graph constraints: {err}");
    }

    let server_config = ServerConfig {
        host: args.bind,
        port: args.port,
        system_code: "memberd".to_string(),
        description:
            "Writes memberships to Neo4j, usually as part of a bulk upload done on a schedule"
                .to_string(),
        request_timeout: Duration::from_secs(args.request_timeout),
    };
    serve(repository, server_config).await?;
    Ok(())
}
