// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

/// Loop state shared (by value) between workers after every reduction.
/// Lives only for the duration of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationState {
    pub iteration: usize,
    pub residual_norm: f64,
}

impl IterationState {
    pub fn new() -> Self {
        IterationState {
            iteration: 0,
            residual_norm: f64::INFINITY,
        }
    }

    /// Record a completed sweep with its agreed global residual.
    pub fn advance(&mut self, residual_norm: f64) {
        self.iteration += 1;
        self.residual_norm = residual_norm;
    }
}

impl Default for IterationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a finished solve, identical on every worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub iterations: usize,
    pub residual_norm: f64,
    pub converged: bool,
    /// Global residual norm after each iteration (index 0 = iteration 1).
    pub residual_history: Vec<f64>,
    pub elapsed_ms: f64,
}
