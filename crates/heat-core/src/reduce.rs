// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Convergence Reduction
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Global residual norm and the termination predicate.
//!
//! The all-reduce is a gather to rank 0 followed by a broadcast. Rank 0
//! adds contributions in rank order, so every worker (and the lockstep
//! executor, which calls [`combine_residuals`] directly) sees the same
//! bits.

use crate::comm::{Communicator, Tag};
use heat_types::config::SolverConfig;
use heat_types::error::{HeatError, HeatResult};
use heat_types::state::IterationState;

const ROOT: usize = 0;

/// sqrt of the rank-ordered sum of local squared residuals.
pub fn combine_residuals(local_sums: &[f64]) -> f64 {
    local_sums.iter().fold(0.0f64, |acc, &v| acc + v).sqrt()
}

fn scalar(payload: Vec<f64>, source: usize, what: &str) -> HeatResult<f64> {
    match payload.as_slice() {
        [v] => Ok(*v),
        other => Err(HeatError::TopologyError(format!(
            "{what} from rank {source} carried {} values, expected 1",
            other.len()
        ))),
    }
}

/// Collective: every worker passes its local Σ(new − old)² and gets back
/// the identical global norm. Blocks until all contributions are in.
pub fn reduce_global_residual<C: Communicator + ?Sized>(
    comm: &C,
    round: usize,
    local_sq: f64,
) -> HeatResult<f64> {
    let size = comm.size();
    if comm.rank() != ROOT {
        comm.send(ROOT, Tag::Residual { round }, vec![local_sq])?;
        let payload = comm.recv(ROOT, Tag::Norm { round })?;
        return scalar(payload, ROOT, "Norm");
    }

    let mut sums = vec![0.0f64; size];
    sums[ROOT] = local_sq;
    for (source, slot) in sums.iter_mut().enumerate().skip(1) {
        let payload = comm.recv(source, Tag::Residual { round })?;
        *slot = scalar(payload, source, "Residual")?;
    }
    let norm = combine_residuals(&sums);
    for dest in 1..size {
        comm.send(dest, Tag::Norm { round }, vec![norm])?;
    }
    Ok(norm)
}

/// Termination rule, evaluated identically on every worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceReducer {
    pub threshold: f64,
    pub max_iterations: usize,
}

impl ConvergenceReducer {
    pub fn from_config(cfg: &SolverConfig) -> Self {
        ConvergenceReducer {
            threshold: cfg.convergence_threshold,
            max_iterations: cfg.max_iterations,
        }
    }

    /// NaN never compares below the threshold, so a diverged run simply
    /// reports not converged.
    pub fn converged(&self, state: &IterationState) -> bool {
        state.residual_norm <= self.threshold
    }

    pub fn should_stop(&self, state: &IterationState) -> bool {
        self.converged(state) || state.iteration >= self.max_iterations
    }
}
