mod block_queue;
mod clock;
mod config;
mod crossing;
mod error;
mod fleet;
mod input;
mod logging;
mod mine;
mod sim;
mod slot;
mod stats;
mod sync;
mod types;
mod vehicle;
mod worker;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::SimConfig;
use crate::error::SimError;

#[derive(Parser)]
#[command(name = "haulsim")]
#[command(about = "Mining, loading and ferry-crossing simulation", long_about = None)]
struct Cli {
    /// Increase console log detail (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a map file
    Run(RunArgs),
    /// Run the built-in demo map (default)
    Demo,
    /// Sweep worker counts over a synthetic map and print CSV
    Bench(BenchArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Map file; runs of non-space characters are blocks
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Where to write the event log
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of workers
    #[arg(long, alias = "cWorker")]
    workers: usize,

    /// Max time (ms) to mine one unit
    #[arg(long, alias = "tWorker")]
    worker_time: u64,

    /// Units per vehicle
    #[arg(long, alias = "capLorry")]
    vehicle_capacity: u64,

    /// Max time (ms) of each vehicle travel leg
    #[arg(long, alias = "tLorry")]
    vehicle_time: u64,

    /// Vehicles per crossing transit
    #[arg(long, alias = "capFerry")]
    crossing_capacity: usize,
}

#[derive(Args)]
struct BenchArgs {
    /// Worker counts to sweep (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "1,2,4,8")]
    workers: Vec<usize>,

    #[arg(long, default_value = "40")]
    blocks: usize,

    #[arg(long, default_value = "5")]
    block_size: u64,

    #[arg(long, default_value = "2")]
    worker_time: u64,

    #[arg(long, default_value = "10")]
    vehicle_capacity: u64,

    #[arg(long, default_value = "5")]
    vehicle_time: u64,

    #[arg(long, default_value = "2")]
    crossing_capacity: usize,
}

fn run(args: RunArgs) -> Result<(), SimError> {
    let config = SimConfig::new(
        args.workers,
        args.worker_time,
        args.vehicle_capacity,
        args.vehicle_time,
        args.crossing_capacity,
    )?;
    let report = sim::run_file(&args.input, args.output.as_deref(), config)?;
    println!("{report}");
    Ok(())
}

fn demo() -> Result<(), SimError> {
    let report = sim::run_demo()?;
    println!("{report}");
    println!("consistent={}", report.is_consistent());
    Ok(())
}

fn bench(args: BenchArgs) -> Result<(), SimError> {
    // Worker count is swept; validate the rest with a placeholder of one.
    let base = SimConfig::new(
        1,
        args.worker_time,
        args.vehicle_capacity,
        args.vehicle_time,
        args.crossing_capacity,
    )?;
    for line in sim::run_bench(&args.workers, args.blocks, args.block_size, base)? {
        println!("{line}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result = match cli.command {
        Some(Command::Run(args)) => run(args),
        Some(Command::Bench(args)) => bench(args),
        Some(Command::Demo) | None => demo(),
    };
    if let Err(err) = result {
        eprintln!("haulsim[ERROR]: {err}");
        std::process::exit(err.exit_code());
    }
}
