// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Solver Loop
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Iteration driver: exchange → relax → reduce → check, then gather.
//!
//! Two executors share the same arithmetic:
//! * [`solve_threaded`] runs one OS thread per worker, each executing
//!   [`run_worker`] over channels.
//! * [`solve_lockstep`] keeps every subdomain in one address space and
//!   relaxes them with Rayon.
//!
//! Both produce bit-identical grids and residual histories.

use crate::comm::{channel_world, Communicator};
use crate::decomposition::{decompose_with, largest_tiling_count, Decomposition, ProcessGrid};
use crate::gather::{assemble, gather, GlobalGrid};
use crate::halo::{exchange, serial_halo_exchange};
use crate::reduce::{combine_residuals, reduce_global_residual, ConvergenceReducer};
use crate::stencil::relax_step;
use crate::subdomain::{BoundaryProvider, InnerRegionBoundary, Subdomain};
use heat_types::config::{Executor, HeatConfig, SolverConfig};
use heat_types::error::{HeatError, HeatResult};
use heat_types::state::{IterationState, SolveReport};
use rayon::prelude::*;
use std::thread;
use std::time::Instant;

/// Rank that owns the assembled grid and does the progress logging.
pub const COLLECTOR: usize = 0;

/// Converged solution plus its run summary.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub report: SolveReport,
    pub grid: GlobalGrid,
}

/// What one worker returns from [`run_worker`].
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub rank: usize,
    pub state: IterationState,
    pub converged: bool,
    pub residual_history: Vec<f64>,
    /// `Some` on the collector only.
    pub grid: Option<GlobalGrid>,
}

fn log_progress(cfg: &SolverConfig, state: &IterationState) {
    if cfg.log_interval > 0 && state.iteration % cfg.log_interval == 0 {
        log::info!(
            "iteration {}: residual norm {:e}",
            state.iteration,
            state.residual_norm
        );
    }
}

fn log_summary(report: &SolveReport) {
    if report.converged {
        log::info!(
            "converged after {} iterations, residual norm {:e}, {:.3} ms",
            report.iterations,
            report.residual_norm,
            report.elapsed_ms
        );
    } else {
        log::warn!(
            "stopped after {} iterations without converging, residual norm {:e}, {:.3} ms",
            report.iterations,
            report.residual_norm,
            report.elapsed_ms
        );
    }
}

/// SPMD body for one worker. Every worker in the collective must call this
/// with the same decomposition, provider and configuration.
pub fn run_worker<C: Communicator + ?Sized>(
    comm: &C,
    decomposition: &Decomposition,
    provider: &dyn BoundaryProvider,
    cfg: &SolverConfig,
) -> HeatResult<WorkerOutcome> {
    let rank = comm.rank();
    if comm.size() != decomposition.len() {
        return Err(HeatError::TopologyError(format!(
            "Communicator of size {} cannot run a {}-way decomposition",
            comm.size(),
            decomposition.len()
        )));
    }
    let placement = *decomposition.placement(rank)?;
    let neighbors = *decomposition.neighbors(rank)?;
    log::debug!(
        "worker {rank}: {}×{} at ({}, {}), {} neighbours",
        placement.width,
        placement.height,
        placement.x0,
        placement.y0,
        neighbors.count()
    );

    let mut sub = Subdomain::initialize(placement, provider);
    let reducer = ConvergenceReducer::from_config(cfg);
    let mut state = IterationState::new();
    let mut history = Vec::new();

    while !reducer.should_stop(&state) {
        let round = state.iteration + 1;
        exchange(&mut sub, &neighbors, comm, round)?;
        let local_sq = relax_step(&mut sub)?;
        let norm = reduce_global_residual(comm, round, local_sq)?;
        state.advance(norm);
        history.push(norm);
        if rank == COLLECTOR {
            log_progress(cfg, &state);
        }
    }

    let grid = gather(comm, &sub, decomposition, COLLECTOR)?;
    Ok(WorkerOutcome {
        rank,
        state,
        converged: reducer.converged(&state),
        residual_history: history,
        grid,
    })
}

/// Pick the error worth reporting: a root cause beats the disconnects it
/// triggered on the other workers.
fn first_root_cause(errors: Vec<HeatError>) -> Option<HeatError> {
    let pos = errors
        .iter()
        .position(|e| !e.is_topology())
        .unwrap_or(0);
    errors.into_iter().nth(pos)
}

/// One scoped thread per placement, message passing over channels.
pub fn solve_threaded(
    decomposition: &Decomposition,
    provider: &dyn BoundaryProvider,
    cfg: &SolverConfig,
) -> HeatResult<SolveOutcome> {
    let start = Instant::now();
    let world = channel_world(decomposition.len());

    let results: Vec<HeatResult<WorkerOutcome>> = thread::scope(|scope| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| scope.spawn(move || run_worker(&comm, decomposition, provider, cfg)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(HeatError::WorkerPanicked { rank }))
            })
            .collect()
    });

    let mut collector = None;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(outcome) if outcome.rank == COLLECTOR => collector = Some(outcome),
            Ok(_) => {}
            Err(e) => {
                log::debug!("worker failed: {e}");
                errors.push(e);
            }
        }
    }
    if let Some(err) = first_root_cause(errors) {
        return Err(err);
    }

    let outcome = collector.ok_or_else(|| {
        HeatError::TopologyError(format!("Collector rank {COLLECTOR} returned no outcome"))
    })?;
    let grid = outcome.grid.ok_or_else(|| {
        HeatError::TopologyError(format!("Collector rank {COLLECTOR} holds no grid"))
    })?;
    let report = SolveReport {
        iterations: outcome.state.iteration,
        residual_norm: outcome.state.residual_norm,
        converged: outcome.converged,
        residual_history: outcome.residual_history,
        elapsed_ms: start.elapsed().as_secs_f64() * 1e3,
    };
    log_summary(&report);
    Ok(SolveOutcome { report, grid })
}

/// Every subdomain in this address space: serial halo copy, parallel
/// relaxation (one Rayon task per subdomain), rank-ordered reduction.
pub fn solve_lockstep(
    decomposition: &Decomposition,
    provider: &dyn BoundaryProvider,
    cfg: &SolverConfig,
) -> HeatResult<SolveOutcome> {
    let start = Instant::now();
    let mut subs: Vec<Subdomain> = decomposition
        .placements()
        .iter()
        .map(|p| Subdomain::initialize(*p, provider))
        .collect();

    let reducer = ConvergenceReducer::from_config(cfg);
    let mut state = IterationState::new();
    let mut history = Vec::new();

    while !reducer.should_stop(&state) {
        serial_halo_exchange(&mut subs, decomposition)?;
        let local_sums = subs
            .par_iter_mut()
            .map(relax_step)
            .collect::<HeatResult<Vec<f64>>>()?;
        let norm = combine_residuals(&local_sums);
        state.advance(norm);
        history.push(norm);
        log_progress(cfg, &state);
    }

    let grid = assemble(&subs, decomposition)?;
    let report = SolveReport {
        iterations: state.iteration,
        residual_norm: state.residual_norm,
        converged: reducer.converged(&state),
        residual_history: history,
        elapsed_ms: start.elapsed().as_secs_f64() * 1e3,
    };
    log_summary(&report);
    Ok(SolveOutcome { report, grid })
}

/// Worker count from config, else the size of a configured process grid,
/// else the largest count up to the Rayon pool size that tiles the grid.
pub fn resolve_worker_count(config: &HeatConfig) -> HeatResult<usize> {
    if let Some(n) = config.workers.count {
        return Ok(n);
    }
    if let Some([px, py]) = config.workers.process_grid {
        return Ok(px * py);
    }
    let available = rayon::current_num_threads().max(1);
    largest_tiling_count(
        config.grid.width,
        config.grid.height,
        available,
        config.workers.tiling,
    )
    .ok_or_else(|| {
        HeatError::ConfigurationError(format!(
            "No worker count up to {available} tiles a {}×{} grid",
            config.grid.width, config.grid.height
        ))
    })
}

/// Validate, resolve the worker count and decompose.
pub fn decompose_config(config: &HeatConfig) -> HeatResult<Decomposition> {
    config.validate()?;
    let count = resolve_worker_count(config)?;
    let process_grid = config
        .workers
        .process_grid
        .map(|[px, py]| ProcessGrid { px, py });
    decompose_with(
        config.grid.width,
        config.grid.height,
        count,
        config.workers.tiling,
        process_grid,
    )
}

/// Full solve from configuration. Configuration and tiling errors are
/// raised before any worker starts.
pub fn solve(config: &HeatConfig) -> HeatResult<SolveOutcome> {
    let decomposition = decompose_config(config)?;
    let provider = InnerRegionBoundary::from_config(&config.boundary);
    log::info!(
        "solving {}×{} on {} workers ({:?} executor)",
        config.grid.width,
        config.grid.height,
        decomposition.len(),
        config.solver.executor
    );
    match config.solver.executor {
        Executor::Threaded => solve_threaded(&decomposition, &provider, &config.solver),
        Executor::Lockstep => solve_lockstep(&decomposition, &provider, &config.solver),
    }
}
