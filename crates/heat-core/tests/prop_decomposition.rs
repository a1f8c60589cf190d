// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Property-Based Tests (proptest) for heat-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for heat-core using proptest.
//!
//! Covers: tiling exact cover, neighbour symmetry, scatter/gather inverse,
//! serial halo exchange against the global grid, Jacobi residual bounds.

use heat_core::decomposition::{decompose_with, Direction};
use heat_core::gather::{assemble, scatter, GlobalGrid};
use heat_core::halo::serial_halo_exchange;
use heat_core::stencil::relax;
use heat_types::config::TilingStrategy;
use ndarray::Array2;
use proptest::prelude::*;

fn strategy() -> impl Strategy<Value = TilingStrategy> {
    prop_oneof![Just(TilingStrategy::Uniform), Just(TilingStrategy::Balanced)]
}

fn framed(width: usize, height: usize, seed: u64) -> GlobalGrid {
    let cells = Array2::from_shape_fn((height + 2, width + 2), |(i, j)| {
        let k = (i * 131 + j * 17) as u64 ^ seed;
        (k % 1000) as f64 * 0.125
    });
    GlobalGrid::from_cells(width, height, cells).expect("framed grid")
}

// ── Tiling ───────────────────────────────────────────────────────────

proptest! {
    /// Every interior cell is owned by exactly one worker and ranks are
    /// dense from 0.
    #[test]
    fn tiling_is_exact_cover(
        width in 1usize..48,
        height in 1usize..48,
        n in 1usize..12,
        strat in strategy(),
    ) {
        let Ok(d) = decompose_with(width, height, n, strat, None) else {
            return Ok(());
        };
        prop_assert_eq!(d.len(), n);
        let mut owners = Array2::<u32>::zeros((height, width));
        for (rank, p) in d.placements().iter().enumerate() {
            prop_assert_eq!(p.rank, rank);
            prop_assert!(p.width >= 1 && p.height >= 1);
            for y in p.y0..p.y_end() {
                for x in p.x0..p.x_end() {
                    owners[[y, x]] += 1;
                }
            }
        }
        prop_assert!(owners.iter().all(|&c| c == 1), "cells owned more or less than once");
    }

    /// Uniform tiling either fails or gives identical tile extents.
    #[test]
    fn uniform_tiles_are_identical(width in 1usize..64, height in 1usize..64, n in 1usize..10) {
        if let Ok(d) = decompose_with(width, height, n, TilingStrategy::Uniform, None) {
            let first = d.placements()[0];
            for p in d.placements() {
                prop_assert_eq!((p.width, p.height), (first.width, first.height));
            }
        }
    }

    /// Balanced extents along each axis differ by at most one.
    #[test]
    fn balanced_tiles_differ_by_at_most_one(width in 4usize..64, height in 4usize..64, n in 1usize..8) {
        if let Ok(d) = decompose_with(width, height, n, TilingStrategy::Balanced, None) {
            let ws: Vec<usize> = d.placements().iter().map(|p| p.width).collect();
            let hs: Vec<usize> = d.placements().iter().map(|p| p.height).collect();
            let spread = |v: &[usize]| v.iter().max().unwrap() - v.iter().min().unwrap();
            prop_assert!(spread(&ws) <= 1);
            prop_assert!(spread(&hs) <= 1);
        }
    }

    /// B is A's neighbour on D iff A is B's neighbour on opposite(D), and
    /// shared faces have equal length.
    #[test]
    fn neighbours_are_symmetric(
        width in 1usize..40,
        height in 1usize..40,
        n in 1usize..10,
        strat in strategy(),
    ) {
        let Ok(d) = decompose_with(width, height, n, strat, None) else {
            return Ok(());
        };
        for a in 0..d.len() {
            for dir in Direction::ALL {
                if let Some(b) = d.neighbors(a).unwrap().get(dir) {
                    prop_assert_eq!(d.neighbors(b).unwrap().get(dir.opposite()), Some(a));
                    let pa = d.placement(a).unwrap();
                    let pb = d.placement(b).unwrap();
                    prop_assert_eq!(pa.edge_len(dir), pb.edge_len(dir.opposite()));
                }
            }
        }
    }
}

// ── Scatter / Gather ─────────────────────────────────────────────────

proptest! {
    /// Scatter then gather reproduces the framed grid exactly.
    #[test]
    fn gather_inverts_scatter(
        width in 1usize..32,
        height in 1usize..32,
        n in 1usize..9,
        strat in strategy(),
        seed in any::<u64>(),
    ) {
        let Ok(d) = decompose_with(width, height, n, strat, None) else {
            return Ok(());
        };
        let global = framed(width, height, seed);
        let subs = scatter(&global, &d).unwrap();
        prop_assert_eq!(assemble(&subs, &d).unwrap(), global);
    }

    /// After a serial exchange every non-corner ghost equals the global
    /// cell it shadows.
    #[test]
    fn halo_exchange_restores_ghosts(
        width in 2usize..24,
        height in 2usize..24,
        n in 2usize..7,
        seed in any::<u64>(),
    ) {
        let Ok(d) = decompose_with(width, height, n, TilingStrategy::Balanced, None) else {
            return Ok(());
        };
        let global = framed(width, height, seed);
        let reference = scatter(&global, &d).unwrap();
        let mut subs: Vec<_> = reference
            .iter()
            .map(|s| {
                let mut blank = s.clone();
                for (dir, _) in d.neighbors(s.rank()).unwrap().iter() {
                    let zeros = vec![0.0; s.placement().edge_len(dir)];
                    heat_core::halo::apply_edge(&mut blank, dir, &zeros).unwrap();
                }
                blank
            })
            .collect();
        serial_halo_exchange(&mut subs, &d).unwrap();
        for (got, want) in subs.iter().zip(&reference) {
            for dir in Direction::ALL {
                prop_assert_eq!(
                    heat_core::halo::read_ghost(got, dir),
                    heat_core::halo::read_ghost(want, dir)
                );
            }
        }
    }

    /// Jacobi averages: with no pinned cells every new value lies within
    /// the range of the old padded block.
    #[test]
    fn relax_respects_maximum_principle(width in 1usize..16, height in 1usize..16, seed in any::<u64>()) {
        let d = decompose_with(width, height, 1, TilingStrategy::Uniform, None).unwrap();
        let global = framed(width, height, seed);
        let sub = scatter(&global, &d).unwrap().remove(0);
        let lo = sub.cells().iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = sub.cells().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let out = relax(&sub);
        prop_assert!(out.residual_sq >= 0.0);
        prop_assert!(out.values.iter().all(|&v| v >= lo && v <= hi));
    }
}
