use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use cadence_action::{Action, StepKind};
use cadence_invoker::HostCommand;
use cadence_resolver::{Resolver, StandardResolver};
use cadence_runtime::{RunnerConfig, StepRunner, exit_code};

mod report;

/// Cadence - runs composite action steps in order
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.cadence)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run every step of an action
  Run(RunArgs),

  /// Load and validate an action, then print its steps
  Validate {
    /// Path to the action file (YAML, or JSON with a .json extension)
    file: PathBuf,
  },

  /// List the inputs an action declares
  Inputs {
    /// Path to the action file (YAML, or JSON with a .json extension)
    file: PathBuf,
  },
}

#[derive(clap::Args)]
struct RunArgs {
  /// Path to the action file (YAML, or JSON with a .json extension)
  file: PathBuf,

  /// Input value, repeatable
  #[arg(short = 'i', long = "input", value_name = "NAME=VALUE", value_parser = parse_input)]
  inputs: Vec<(String, String)>,

  /// Keep running after a step fails
  #[arg(long)]
  no_fail_fast: bool,

  /// Base directory for relative working directories (default: current directory)
  #[arg(long)]
  workdir: Option<PathBuf>,

  /// Runtime tool cache (default: <data-dir>/tools)
  #[arg(long)]
  tool_cache: Option<PathBuf>,

  /// Program that runs actions with no built-in handler
  #[arg(long, value_name = "CMD")]
  host_action: Option<String>,

  /// Timeout in seconds for steps that declare none
  #[arg(long, value_name = "SECS")]
  step_timeout: Option<f64>,

  /// Report format
  #[arg(long, value_enum, default_value_t = Format::Text)]
  format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
  Text,
  Json,
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let code = match dispatch(cli) {
    Ok(code) => code,
    Err(e) => {
      eprintln!("error: {:#}", e);
      exit_code::LOAD_ERROR
    }
  };

  std::process::exit(code);
}

fn init_logging(verbose: bool) {
  use tracing_subscriber::layer::SubscriberExt;
  use tracing_subscriber::util::SubscriberInitExt;

  let default = if verbose { "cadence=debug" } else { "cadence=info" };
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn dispatch(cli: Cli) -> Result<i32> {
  match cli.command {
    Commands::Run(args) => {
      let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
          .context("could not determine home directory")?
          .join(".cadence"),
      };
      run_action(args, data_dir)
    }
    Commands::Validate { file } => {
      let action = load_action(&file)?;
      print_steps(&action);
      Ok(exit_code::SUCCESS)
    }
    Commands::Inputs { file } => {
      let action = load_action(&file)?;
      print_inputs(&action);
      Ok(exit_code::SUCCESS)
    }
  }
}

fn load_action(file: &Path) -> Result<Action> {
  let def = cadence_config::from_path(file)
    .with_context(|| format!("failed to load action file: {}", file.display()))?;

  StandardResolver::new()
    .resolve(def)
    .with_context(|| format!("invalid action: {}", file.display()))
}

fn run_action(args: RunArgs, data_dir: PathBuf) -> Result<i32> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_action_async(args, data_dir).await })
}

async fn run_action_async(args: RunArgs, data_dir: PathBuf) -> Result<i32> {
  let action = load_action(&args.file)?;

  let base_dir = match args.workdir {
    Some(dir) => dir,
    None => std::env::current_dir().context("failed to determine working directory")?,
  };

  let mut config = RunnerConfig::new(args.tool_cache.unwrap_or_else(|| data_dir.join("tools")));
  config.fail_fast = !args.no_fail_fast;
  config.default_timeout = args.step_timeout.map(parse_step_timeout).transpose()?;
  config.host_command = match args.host_action.as_deref() {
    Some(cmd) => Some(HostCommand::parse(cmd).context("--host-action must name a program")?),
    None => None,
  };

  let supplied: HashMap<String, String> = args.inputs.into_iter().collect();
  let runner = StepRunner::new(config);
  let ctx = runner
    .prepare(&action, &supplied, base_dir)
    .context("failed to resolve inputs")?;

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("interrupt received, stopping after the current step");
      on_interrupt.cancel();
    }
  });

  let report = runner.execute(&action, ctx, cancel).wait().await;

  match args.format {
    Format::Text => report::print_text(&report),
    Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
  }

  Ok(report.exit_code())
}

fn parse_step_timeout(secs: f64) -> Result<Duration> {
  match Duration::try_from_secs_f64(secs) {
    Ok(timeout) if !timeout.is_zero() => Ok(timeout),
    _ => bail!("--step-timeout must be a positive number of seconds, got {}", secs),
  }
}

fn parse_input(s: &str) -> Result<(String, String), String> {
  match s.split_once('=') {
    Some((name, value)) if !name.trim().is_empty() => {
      Ok((name.trim().to_string(), value.to_string()))
    }
    _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
  }
}

fn print_steps(action: &Action) {
  println!("{}: {} step(s)", action.name, action.steps.len());
  for (index, step) in action.steps.iter().enumerate() {
    match &step.kind {
      StepKind::Run { .. } => {
        let shell = step
          .shell
          .map(|s| s.to_string())
          .unwrap_or_else(|| "default".to_string());
        println!("  {}. {} (run, {})", index + 1, step.name, shell);
      }
      StepKind::Uses { reference, .. } => {
        let pinned = if reference.is_pinned() { "" } else { ", unpinned" };
        println!("  {}. {} (uses {}{})", index + 1, step.name, reference, pinned);
      }
    }
  }
}

fn print_inputs(action: &Action) {
  if action.inputs.is_empty() {
    println!("{} declares no inputs", action.name);
    return;
  }

  for input in action.inputs.values() {
    let mut line = input.name.clone();
    if input.required {
      line.push_str(" (required)");
    }
    if let Some(default) = &input.default {
      line.push_str(&format!(" [default: {}]", default));
    }
    if !input.description.is_empty() {
      line.push_str(&format!(" - {}", input.description));
    }
    println!("{}", line);
  }
}
