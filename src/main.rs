//! Root agent - orchestrates the MCP generation pipeline.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mcp_pipeline_agent::{
    AgentRegistry, AgentServer, HttpCollaboratorClient, LlmIntentClassifier, OrchestratorConfig,
    RetryPolicy, RootOrchestrator,
};

/// Root agent - coordinates documentation extraction, workflow analysis, and
/// MCP code generation across remote collaborators.
#[derive(Parser, Debug)]
#[command(name = "root-agent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address of the documentation extractor.
    #[arg(long, default_value = "http://localhost:10001/")]
    extractor_url: String,

    /// Address of the workflow generator.
    #[arg(long, default_value = "http://localhost:10002/")]
    workflow_url: String,

    /// Address of the MCP code generator.
    #[arg(long, default_value = "http://localhost:10003/")]
    generator_url: String,

    /// Optional LLM endpoint for last-resort routing decisions.
    #[arg(long)]
    classifier_url: Option<String>,

    /// Maximum attempts per collaborator call.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Base backoff delay in seconds (doubles per attempt).
    #[arg(long, default_value_t = 1.0)]
    base_delay_secs: f64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON.
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging - output to stderr to keep stdout protocol-clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Root agent starting");
    info!(
        "Collaborators: extractor={} workflow={} generator={}",
        args.extractor_url, args.workflow_url, args.generator_url
    );

    let registry = AgentRegistry::new(args.extractor_url, args.workflow_url, args.generator_url);
    let config = OrchestratorConfig {
        retry: RetryPolicy {
            max_retries: args.max_retries,
            base_delay: Duration::from_secs_f64(args.base_delay_secs),
        },
        ..Default::default()
    };

    let mut orchestrator =
        RootOrchestrator::with_config(registry, Arc::new(HttpCollaboratorClient::new()), config);
    if let Some(url) = args.classifier_url {
        info!("Routing classifier enabled at {}", url);
        orchestrator = orchestrator.with_classifier(Arc::new(LlmIntentClassifier::new(url)));
    }

    let server = AgentServer::new(orchestrator);
    server.run_stdio().await?;

    Ok(())
}
