// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reference problem: the cross-with-hole plate the solver was first
//! written for. Every value here is only a default; all of them can be
//! overridden from the JSON config.

/// Global grid width (columns).
pub const DEFAULT_WIDTH: usize = 500;

/// Global grid height (rows).
pub const DEFAULT_HEIGHT: usize = 300;

/// Number of workers in the reference run.
pub const DEFAULT_WORKERS: usize = 4;

/// Temperature held on the outer domain edge.
pub const OUTER_BOUNDARY: f64 = 60.0;

/// Temperature held on the inner (hole) boundary.
pub const INNER_BOUNDARY: f64 = 20.0;

/// Inner region `[x_start, x_end) × [y_start, y_end)` in global interior
/// coordinates: the central 100×100 block.
pub const INNER_REGION: [usize; 4] = [200, 300, 100, 200];

/// Stop once the global residual norm drops to this value.
pub const CONVERGENCE_THRESHOLD: f64 = 1.0e-2;

/// Hard cap on relaxation sweeps.
pub const MAX_ITERATIONS: usize = 100;

/// Output file written by the collector.
pub const OUTPUT_FILE: &str = "outputMatrix.txt";
