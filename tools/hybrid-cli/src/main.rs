// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use clap::{Args, Parser, Subcommand, ValueHint};
use serde::Serialize;
use st_hybrid::config::{ConfigLayering, LayeredConfig};
use st_hybrid::ops::{global_operator_registry, global_slot};
use st_hybrid::runtime::{random_smoke_tensor, HybridLoop, HybridReport, HybridSettings};
use st_hybrid::telemetry;
use st_hybrid::Value;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

type DynError = Box<dyn Error>;

type Result<T> = std::result::Result<T, DynError>;

#[derive(Parser)]
#[command(author, version, about = "Host driver for the SpiralTorch hybrid ops")]
struct Cli {
    /// Directory holding base.toml / site.toml / run.json (defaults to SPIRAL_CONFIG_ROOT discovery)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    config_root: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke a registered op once with a JSON operand
    Call(CallArgs),

    /// Run the producer loop that feeds a single op worker
    Hybrid(HybridArgs),

    /// Build and print a random 2x3 tensor
    Smoke(SmokeArgs),

    /// List registered ops
    List,
}

#[derive(Args)]
struct CallArgs {
    /// Registry name of the op (simpleop, opwithglobal)
    op: String,

    /// Operand as JSON: 5, 2.5, [1, 2, 3], [[1, 2], [3, 4]]
    value: String,

    /// Shared value bound before the call, as JSON
    #[arg(long)]
    global: Option<String>,
}

#[derive(Args)]
struct HybridArgs {
    /// Number of producer iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Simulated producer work per iteration in milliseconds
    #[arg(long)]
    fast_step_ms: Option<u64>,

    /// Simulated op latency in milliseconds
    #[arg(long)]
    op_latency_ms: Option<u64>,

    /// Tensor length
    #[arg(long)]
    width: Option<usize>,

    /// Op run by the worker
    #[arg(long)]
    op: Option<String>,
}

#[derive(Args)]
struct SmokeArgs {
    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct HybridSummary<'a> {
    launched: &'a [usize],
    busy: &'a [usize],
    outputs: Vec<(usize, &'a Value)>,
}

impl<'a> From<&'a HybridReport> for HybridSummary<'a> {
    fn from(report: &'a HybridReport) -> Self {
        Self {
            launched: &report.launched,
            busy: &report.busy,
            outputs: report.outputs.iter().map(|(i, v)| (*i, v)).collect(),
        }
    }
}

fn main() {
    telemetry::init_tracing();
    let outcome = try_main();
    telemetry::shutdown_tracing();
    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Call(args) => run_call(&cli, args),
        Command::Hybrid(args) => run_hybrid(&cli, args),
        Command::Smoke(args) => run_smoke(&cli, args),
        Command::List => run_list(&cli),
    }
}

fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let layering = match cli.config_root.as_ref() {
        Some(root) => ConfigLayering::in_dir(root),
        None => ConfigLayering::discover(),
    };
    Ok(LayeredConfig::load(layering)?)
}

fn run_call(cli: &Cli, args: &CallArgs) -> Result<()> {
    let input = Value::parse(&args.value)?;
    if let Some(global) = args.global.as_deref() {
        global_slot().set(Value::parse(global)?)?;
    }

    let output = global_operator_registry().call(&args.op, &input)?;
    if cli.json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Op return value:");
        println!("{output}");
    }
    Ok(())
}

fn run_hybrid(cli: &Cli, args: &HybridArgs) -> Result<()> {
    let mut settings = HybridSettings::from_config(&load_config(cli)?)?;
    if let Some(iterations) = args.iterations {
        settings.iterations = iterations;
    }
    if let Some(ms) = args.fast_step_ms {
        settings.fast_step_ms = ms;
    }
    if let Some(ms) = args.op_latency_ms {
        settings.op_latency_ms = ms;
    }
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(op) = args.op.as_ref() {
        settings.op = op.clone();
    }
    info!(?settings, "hybrid settings resolved");

    let report = HybridLoop::new(settings)?.run()?;
    if cli.json {
        println!("{}", serde_json::to_string(&HybridSummary::from(&report))?);
    } else {
        for (iteration, output) in &report.outputs {
            println!("Op return value for iteration {iteration}:");
            println!("{output}");
        }
        println!(
            "launched {} workers, skipped {} busy iterations",
            report.launched.len(),
            report.busy.len()
        );
    }
    Ok(())
}

fn run_smoke(cli: &Cli, args: &SmokeArgs) -> Result<()> {
    let tensor = random_smoke_tensor(args.seed)?;
    if cli.json {
        println!("{}", serde_json::to_string(&tensor)?);
    } else {
        println!("Starting test.");
        println!("Random 2x3 tensor:");
        println!("{tensor}");
    }
    Ok(())
}

fn run_list(cli: &Cli) -> Result<()> {
    let registry = global_operator_registry();
    let names = registry.list_operators();
    if cli.json {
        println!("{}", serde_json::to_string(&names)?);
        return Ok(());
    }
    for name in names {
        let description = registry
            .get(&name)
            .map(|op| op.metadata().description.clone())
            .unwrap_or_default();
        println!("{name}\t{description}");
    }
    Ok(())
}
