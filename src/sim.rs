//! Runners for the `run`, `demo` and `bench` commands.

use std::path::Path;
use std::sync::Arc;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::input;
use crate::logging::EventLog;
use crate::mine::Mine;
use crate::stats::SimulationReport;
use crate::types::Block;

// Demo knobs, small for quick CLI feedback.
const DEMO_BLOCKS: [u64; 6] = [2, 3, 1, 4, 2, 5];
const DEMO_WORKERS: usize = 3;
const DEMO_WORKER_MAX_MS: u64 = 5;
const DEMO_VEHICLE_CAPACITY: u64 = 4;
const DEMO_VEHICLE_MAX_MS: u64 = 10;
const DEMO_CROSSING_CAPACITY: usize = 2;

const BENCH_HEADER: &str = "workers,blocks,units,vehicles,transits,elapsed_ms,throughput_units_per_s,cpu_user_s,cpu_sys_s,delivered_ok";

/// Simulate the map at `input`, writing the event log to `output` if given.
pub fn run_file(
    input: &Path,
    output: Option<&Path>,
    config: SimConfig,
) -> Result<SimulationReport, SimError> {
    let blocks = input::read_blocks(input)?;
    let log = Arc::new(EventLog::new());
    let report = Mine::new(config, blocks, Arc::clone(&log)).run();
    if let Some(path) = output {
        log.flush_to(path).map_err(|source| SimError::LogFlush {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), events = log.len(), "event log written");
    }
    Ok(report)
}

/// Run the built-in demo map.
pub fn run_demo() -> Result<SimulationReport, SimError> {
    let config = SimConfig::new(
        DEMO_WORKERS,
        DEMO_WORKER_MAX_MS,
        DEMO_VEHICLE_CAPACITY,
        DEMO_VEHICLE_MAX_MS,
        DEMO_CROSSING_CAPACITY,
    )?;
    let blocks = DEMO_BLOCKS.iter().copied().map(Block::new).collect();
    Ok(Mine::new(config, blocks, Arc::new(EventLog::new())).run())
}

/// Synthetic map of `blocks` blocks, each `block_size` units.
pub fn synthetic_blocks(blocks: usize, block_size: u64) -> Vec<Block> {
    (0..blocks).map(|_| Block::new(block_size)).collect()
}

/// Sweep worker counts over one synthetic map; returns CSV lines.
pub fn run_bench(
    worker_sets: &[usize],
    blocks: usize,
    block_size: u64,
    base: SimConfig,
) -> Result<Vec<String>, SimError> {
    if block_size == 0 {
        return Err(crate::error::ConfigError::NotPositive { name: "block-size" }.into());
    }
    let mut lines = vec![BENCH_HEADER.to_string()];
    for &workers in worker_sets {
        let config = SimConfig::new(
            workers,
            base.worker_max_ms,
            base.vehicle_capacity,
            base.vehicle_max_ms,
            base.crossing_capacity,
        )?;
        let map = synthetic_blocks(blocks, block_size);
        let report = Mine::new(config, map, Arc::new(EventLog::new())).run();
        let (cpu_user, cpu_sys) = report.cpu.formatted();
        lines.push(format!(
            "{},{},{},{},{},{},{:.2},{},{},{}",
            workers,
            report.blocks_total,
            report.units_total,
            report.trips.len(),
            report.transits,
            report.elapsed.as_millis(),
            report.throughput(),
            cpu_user,
            cpu_sys,
            report.is_consistent()
        ));
        if !report.is_consistent() {
            eprintln!("# violation,delivered={},units={}", report.delivered, report.units_total);
        }
    }
    Ok(lines)
}
