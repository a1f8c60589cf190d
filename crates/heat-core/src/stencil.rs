// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Jacobi Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 5-point Jacobi relaxation for the Laplace equation.
//!
//!   u_new[y][x] = (u[y][x-1] + u[y][x+1] + u[y-1][x] + u[y+1][x]) / 4
//!
//! Every read sees the previous sweep: the new interior is built into a
//! separate array and only committed once the sweep is complete.

use crate::subdomain::Subdomain;
use heat_types::error::HeatResult;
use ndarray::Array2;

/// Result of one sweep over a subdomain's interior.
#[derive(Debug, Clone)]
pub struct Relaxation {
    /// New interior values, shape (height, width).
    pub values: Array2<f64>,
    /// Σ (new − old)² over interior cells.
    pub residual_sq: f64,
}

/// One Jacobi sweep. Ghost cells are read, never written, and never
/// enter the residual. Pinned cells keep their value.
pub fn relax(sub: &Subdomain) -> Relaxation {
    let p = sub.placement();
    let (h, w) = (p.height, p.width);
    let u = sub.cells();
    let pinned = sub.pinned_mask();

    let mut values = Array2::zeros((h, w));
    let mut residual_sq = 0.0f64;
    for row in 1..=h {
        for col in 1..=w {
            let old = u[[row, col]];
            if pinned[[row, col]] {
                values[[row - 1, col - 1]] = old;
                continue;
            }
            // Fixed order: West+East first keeps mirrored cells bitwise equal.
            let new = (u[[row, col - 1]] + u[[row, col + 1]] + u[[row - 1, col]] + u[[row + 1, col]])
                / 4.0;
            let d = new - old;
            residual_sq += d * d;
            values[[row - 1, col - 1]] = new;
        }
    }
    Relaxation {
        values,
        residual_sq,
    }
}

/// Sweep and commit in one call; returns the local squared residual.
pub fn relax_step(sub: &mut Subdomain) -> HeatResult<f64> {
    let relaxation = relax(sub);
    sub.commit(relaxation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::Placement;
    use crate::subdomain::{BoundaryProvider, UniformBoundary};

    fn whole(width: usize, height: usize) -> Placement {
        Placement {
            rank: 0,
            x0: 0,
            y0: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_uniform_field_is_fixed_point() {
        let mut sub = Subdomain::initialize(whole(8, 5), &UniformBoundary { value: 42.0 });
        let r = relax_step(&mut sub).unwrap();
        assert_eq!(r, 0.0);
        assert!(sub.cells().iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_single_cell_average_and_residual() {
        let mut sub = Subdomain::new(whole(1, 1), 0.0);
        sub.set(0, 1, 4.0).unwrap(); // North ghost
        sub.set(2, 1, 8.0).unwrap(); // South ghost
        sub.set(1, 0, 2.0).unwrap(); // West ghost
        sub.set(1, 2, 6.0).unwrap(); // East ghost
        sub.set(1, 1, 1.0).unwrap();
        let out = relax(&sub);
        assert_eq!(out.values[[0, 0]], 5.0);
        assert_eq!(out.residual_sq, 16.0);
        // relax is pure.
        assert_eq!(sub.get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_reads_previous_sweep_only() {
        // Hot West ghost column, cold elsewhere. After one Jacobi sweep only
        // the first interior column may change; Gauss-Seidel would leak heat
        // further East within the same sweep.
        let mut sub = Subdomain::new(whole(4, 3), 0.0);
        for row in 0..5 {
            sub.set(row, 0, 100.0).unwrap();
        }
        relax_step(&mut sub).unwrap();
        for row in 1..=3 {
            assert_eq!(sub.get(row, 1).unwrap(), 25.0);
            for col in 2..=4 {
                assert_eq!(sub.get(row, col).unwrap(), 0.0, "leak at ({row},{col})");
            }
        }
    }

    #[test]
    fn test_ghosts_untouched_and_excluded_from_residual() {
        let mut sub = Subdomain::new(whole(3, 3), 10.0);
        for col in 0..5 {
            sub.set(0, col, 1000.0).unwrap();
        }
        let before = sub.cells().row(0).to_owned();
        let r = relax_step(&mut sub).unwrap();
        assert_eq!(sub.cells().row(0), before);
        // Only the three cells under the hot ghost row change: (1000-10)/4 each.
        let d = (1000.0 - 10.0) / 4.0;
        assert!((r - 3.0 * d * d).abs() < 1e-9, "residual {r}");
    }

    #[test]
    fn test_pinned_cells_hold_value() {
        let mut sub = Subdomain::new(whole(3, 3), 0.0);
        sub.set(2, 2, 20.0).unwrap();
        sub.pin(2, 2).unwrap();
        for col in 0..5 {
            sub.set(0, col, 60.0).unwrap();
        }
        for _ in 0..10 {
            relax_step(&mut sub).unwrap();
        }
        assert_eq!(sub.get(2, 2).unwrap(), 20.0);
    }

    #[test]
    fn test_residual_decreases_towards_steady_state() {
        let provider = UniformBoundary { value: 0.0 };
        let mut sub = Subdomain::initialize(whole(16, 16), &provider);
        assert_eq!(provider.outer_value(), 0.0);
        for col in 0..18 {
            sub.set(0, col, 100.0).unwrap();
        }
        let first = relax_step(&mut sub).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = relax_step(&mut sub).unwrap();
        }
        assert!(last < first, "Residual should decrease: {first} -> {last}");
        assert!(!sub.cells().iter().any(|v| v.is_nan()), "No NaN allowed");
    }

    #[test]
    fn test_nan_propagates() {
        let mut sub = Subdomain::new(whole(2, 1), 0.0);
        sub.set(1, 0, f64::NAN).unwrap();
        let r = relax_step(&mut sub).unwrap();
        assert!(r.is_nan());
        assert!(sub.get(1, 1).unwrap().is_nan());
    }
}
