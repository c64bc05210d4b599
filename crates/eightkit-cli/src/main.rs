//! eightkit - run a workflow node from the command line
//!
//! Plays the host runtime: reads a batch of items and the node
//! parameters, runs the node against the live API and prints every
//! output channel as JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use eightkit_client::ReqwestTransport;
use eightkit_core::config::{env_var, API_KEY_VAR};
use eightkit_core::{ClientConfig, Credentials};
use eightkit_nodes::{node_by_name, Dispatcher, InputItem, NodeContext, Parameters};

#[derive(Parser, Debug)]
#[command(name = "eightkit")]
#[command(about = "Run an 8kit or Stratagems node over JSON items")]
struct Args {
    /// Node type (eightKit, stratagemsTool)
    #[arg(short, long, default_value = "eightKit")]
    node: String,

    /// Input items: inline JSON array or a file path ("-" for stdin)
    #[arg(short, long, default_value = "[{}]")]
    items: String,

    /// Node parameters: inline JSON object or a file path
    #[arg(short, long)]
    params: String,

    /// API host URL (defaults to EIGHTKIT_HOST_URL)
    #[arg(long)]
    host_url: Option<String>,

    /// API key (defaults to EIGHTKIT_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Retries after a transient failure
    #[arg(long)]
    max_retries: Option<u32>,

    /// Delay between retries in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = eightkit_core::load_environment();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eightkit=info".parse()?)
                .add_directive("eightkit_client=info".parse()?)
                .add_directive("eightkit_nodes=info".parse()?),
        )
        .init();

    let args = Args::parse();
    if env_file.is_none() {
        info!("Using process environment only");
    }

    let node = match node_by_name(&args.node) {
        Some(node) => node,
        None => bail!("Unknown node type: {} (expected eightKit or stratagemsTool)", args.node),
    };

    let credentials = credentials(&args)?;
    let config = client_config(&args);
    let parameters = Parameters::from_value(read_json(&args.params).context("reading --params")?)?;
    let items = match read_json(&args.items).context("reading --items")? {
        Value::Array(items) => items,
        other => vec![other],
    };
    let batch: Vec<InputItem> = items
        .into_iter()
        .map(|json| InputItem::new(json, parameters.clone()))
        .collect();

    info!(
        node = node.name(),
        items = batch.len(),
        host = %credentials.host_url,
        api_key = %credentials.masked_key(),
        "Running node"
    );

    let ctx = NodeContext::new(Arc::new(ReqwestTransport::new()), Arc::new(credentials)).with_config(config);
    let output = Dispatcher::new(ctx).run(node.as_ref(), &batch).await?;

    let json = output.to_json();
    let rendered = if args.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Flags win over the environment.
fn credentials(args: &Args) -> Result<Credentials> {
    let credentials = match &args.host_url {
        Some(host_url) => Credentials::new(host_url.clone(), env_var(API_KEY_VAR).unwrap_or_default()),
        None => Credentials::from_env()?,
    };
    let credentials = match &args.api_key {
        Some(api_key) => Credentials::new(credentials.host_url, api_key.clone()),
        None => credentials,
    };

    if credentials.api_key.is_empty() {
        warn!("No API key configured; requests will be unauthenticated");
    }
    Ok(credentials)
}

fn client_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }
    if let Some(retry_delay_ms) = args.retry_delay_ms {
        config = config.with_retry_delay_ms(retry_delay_ms);
    }
    config
}

/// Inline JSON, `-` for stdin, or a file path
fn read_json(source: &str) -> Result<Value> {
    let trimmed = source.trim_start();
    let text = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        source.to_string()
    } else if source == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading stdin")?
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))?
    };
    serde_json::from_str(&text).context("parsing JSON")
}
