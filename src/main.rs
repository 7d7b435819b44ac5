use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use precisionmed_config::StackConfig;
use precisionmed_deployer::{Deployer, SimulatedExecutor};
use precisionmed_stack::{DeploymentPlan, build_stack};

/// Precisionmed - composes the precision-medicine platform into a deployment plan
#[derive(Parser)]
#[command(name = "precisionmed")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Stack configuration file (default: ~/.precisionmed/stack.json, or stdin when piped)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate the configuration and the resulting resource graph
  Validate,

  /// Print the deployment plan as JSON
  Plan,

  /// Deploy against a simulated executor and print the stack outputs
  Simulate {
    /// Account id used in fabricated ARNs
    #[arg(long, default_value = "000000000000")]
    account: String,

    /// Region used in fabricated endpoints and ARNs
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Make this node fail when provisioned
    #[arg(long)]
    fail_on: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Validate) => validate(cli.config)?,
    Some(Commands::Plan) => plan(cli.config)?,
    Some(Commands::Simulate {
      account,
      region,
      fail_on,
    }) => simulate(cli.config, account, region, fail_on)?,
    None => {
      println!("precisionmed - use --help to see available commands");
    }
  }

  Ok(())
}

fn validate(config: Option<PathBuf>) -> Result<()> {
  let plan = load_plan(config)?;

  eprintln!("Configuration valid for workload: {}", plan.workload_name);
  eprintln!(
    "Resources: {} in {} batches",
    plan.plan.len(),
    plan.plan.batches().len()
  );
  eprintln!("Security rules: {}", plan.rules.len());
  for decision in &plan.decisions {
    let state = if decision.included {
      "included"
    } else {
      "placeholder"
    };
    eprintln!("Feature {}: {}", decision.feature, state);
  }

  Ok(())
}

fn plan(config: Option<PathBuf>) -> Result<()> {
  let plan = load_plan(config)?;
  println!("{}", serde_json::to_string_pretty(&plan.to_document())?);
  Ok(())
}

fn simulate(
  config: Option<PathBuf>,
  account: String,
  region: String,
  fail_on: Option<String>,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { simulate_async(config, account, region, fail_on).await })
}

async fn simulate_async(
  config: Option<PathBuf>,
  account: String,
  region: String,
  fail_on: Option<String>,
) -> Result<()> {
  let plan = load_plan(config)?;

  let mut executor = SimulatedExecutor::new(account, region);
  if let Some(node_id) = fail_on {
    executor = executor.fail_on(node_id);
  }
  let deployer = Deployer::new(Arc::new(executor));

  // Ctrl-C cancels the in-flight batch.
  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_signal.cancel();
    }
  });

  let result = deployer
    .deploy(plan, cancel)
    .await
    .context("simulated deployment failed")?;

  eprintln!("Deployment completed: {}", result.deployment_id);
  eprintln!("Nodes provisioned: {}", result.resolved.len());

  println!("{}", serde_json::to_string_pretty(&result.outputs)?);

  Ok(())
}

fn load_plan(config: Option<PathBuf>) -> Result<DeploymentPlan> {
  let config = load_config(config)?;
  info!(workload = %config.workload_name, "configuration loaded");

  let stack = build_stack(&config).context("failed to build stack")?;
  stack.freeze().context("failed to freeze stack")
}

fn load_config(path: Option<PathBuf>) -> Result<StackConfig> {
  if let Some(path) = path {
    return StackConfig::from_path(&path)
      .with_context(|| format!("failed to load config: {}", path.display()));
  }

  if !io::stdin().is_terminal() {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read config from stdin")?;
    if !input.trim().is_empty() {
      return StackConfig::from_json(&input).context("failed to parse config from stdin");
    }
  }

  let path = dirs::home_dir()
    .context("could not determine home directory")?
    .join(".precisionmed")
    .join("stack.json");
  StackConfig::from_path(&path)
    .with_context(|| format!("failed to load config: {}", path.display()))
}
