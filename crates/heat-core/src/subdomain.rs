// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Subdomain
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Worker-local grid with a one-cell ghost border, and the boundary
//! providers that seed it.
//!
//! Local layout is `(height + 2) × (width + 2)`; row/column 0 and the last
//! row/column are ghosts. Padded local `(row, col)` maps to global interior
//! `(x0 + col - 1, y0 + row - 1)`.

use crate::decomposition::{Direction, Placement};
use crate::stencil::Relaxation;
use heat_types::config::{BoundaryConfig, Region};
use heat_types::error::{HeatError, HeatResult};
use ndarray::{aview1, s, Array2, ArrayView1};

/// Initial-condition provider. Called once per worker before the loop.
pub trait BoundaryProvider: Sync {
    /// Value every cell (ghosts included) starts from.
    fn outer_value(&self) -> f64;

    /// Overwrite and pin the cells that belong to an inner boundary.
    fn apply_boundary(&self, subdomain: &mut Subdomain, placement: &Placement);
}

/// Same value everywhere, no inner boundary.
#[derive(Debug, Clone, Copy)]
pub struct UniformBoundary {
    pub value: f64,
}

impl BoundaryProvider for UniformBoundary {
    fn outer_value(&self) -> f64 {
        self.value
    }

    fn apply_boundary(&self, _subdomain: &mut Subdomain, _placement: &Placement) {}
}

/// Outer edge at one value, an optional rectangle held at another.
#[derive(Debug, Clone, Copy)]
pub struct InnerRegionBoundary {
    pub outer: f64,
    pub inner: f64,
    pub region: Option<Region>,
}

impl InnerRegionBoundary {
    pub fn from_config(cfg: &BoundaryConfig) -> Self {
        InnerRegionBoundary {
            outer: cfg.outer_value,
            inner: cfg.inner_value,
            region: cfg.inner_region,
        }
    }
}

impl BoundaryProvider for InnerRegionBoundary {
    fn outer_value(&self) -> f64 {
        self.outer
    }

    fn apply_boundary(&self, subdomain: &mut Subdomain, placement: &Placement) {
        let Some(region) = self.region else {
            return;
        };
        let (rows, cols) = placement.padded_shape();
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = subdomain.global_of(row, col);
                if !region.contains(x, y) {
                    continue;
                }
                subdomain.cells[[row, col]] = self.inner;
                if subdomain.is_interior(row, col) {
                    subdomain.pinned[[row, col]] = true;
                }
            }
        }
    }
}

/// One worker's padded grid. Interior cells are owned; ghost cells mirror
/// neighbours or hold fixed boundary values.
#[derive(Debug, Clone)]
pub struct Subdomain {
    placement: Placement,
    cells: Array2<f64>,
    pinned: Array2<bool>,
}

impl Subdomain {
    /// Padded grid filled with `fill`, nothing pinned.
    pub fn new(placement: Placement, fill: f64) -> Self {
        let shape = placement.padded_shape();
        Subdomain {
            placement,
            cells: Array2::from_elem(shape, fill),
            pinned: Array2::from_elem(shape, false),
        }
    }

    /// Fill with the provider's outer value, then let it apply its inner
    /// boundary.
    pub fn initialize(placement: Placement, provider: &dyn BoundaryProvider) -> Self {
        let mut sub = Self::new(placement, provider.outer_value());
        provider.apply_boundary(&mut sub, &placement);
        sub
    }

    /// Wrap an existing padded block (e.g. one scattered from a global grid).
    pub fn from_cells(placement: Placement, cells: Array2<f64>) -> HeatResult<Self> {
        if cells.dim() != placement.padded_shape() {
            return Err(HeatError::TopologyError(format!(
                "Padded block shape {:?} does not match placement {:?}",
                cells.dim(),
                placement.padded_shape()
            )));
        }
        let pinned = Array2::from_elem(cells.dim(), false);
        Ok(Subdomain {
            placement,
            cells,
            pinned,
        })
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn rank(&self) -> usize {
        self.placement.rank
    }

    /// Padded cells, ghosts included.
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    /// Padded row (North/South) or column (East/West) of a face strip.
    fn line_index(&self, dir: Direction, ghost: bool) -> usize {
        let p = &self.placement;
        match (dir, ghost) {
            (Direction::North, true) | (Direction::West, true) => 0,
            (Direction::North, false) | (Direction::West, false) => 1,
            (Direction::South, false) => p.height,
            (Direction::South, true) => p.height + 1,
            (Direction::East, false) => p.width,
            (Direction::East, true) => p.width + 1,
        }
    }

    fn strip(&self, dir: Direction, ghost: bool) -> ArrayView1<'_, f64> {
        let p = &self.placement;
        let k = self.line_index(dir, ghost);
        if dir.is_horizontal_face() {
            self.cells.slice(s![k, 1..=p.width])
        } else {
            self.cells.slice(s![1..=p.height, k])
        }
    }

    /// Outward-facing interior strip on `dir`, ordered West→East or
    /// North→South.
    pub fn edge(&self, dir: Direction) -> ArrayView1<'_, f64> {
        self.strip(dir, false)
    }

    /// Ghost strip on `dir`, corners excluded.
    pub fn ghost(&self, dir: Direction) -> ArrayView1<'_, f64> {
        self.strip(dir, true)
    }

    pub fn set_ghost(&mut self, dir: Direction, data: &[f64]) -> HeatResult<()> {
        let p = self.placement;
        let expected = p.edge_len(dir);
        if data.len() != expected {
            return Err(HeatError::TopologyError(format!(
                "{dir:?} halo length mismatch on rank {}: expected {expected}, got {}",
                p.rank,
                data.len()
            )));
        }
        let k = self.line_index(dir, true);
        let mut target = if dir.is_horizontal_face() {
            self.cells.slice_mut(s![k, 1..=p.width])
        } else {
            self.cells.slice_mut(s![1..=p.height, k])
        };
        target.assign(&aview1(data));
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> HeatResult<f64> {
        self.cells
            .get([row, col])
            .copied()
            .ok_or(HeatError::GridOutOfBounds { row, col })
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> HeatResult<()> {
        let cell = self
            .cells
            .get_mut([row, col])
            .ok_or(HeatError::GridOutOfBounds { row, col })?;
        *cell = value;
        Ok(())
    }

    /// Mark an interior cell as Dirichlet: relaxation leaves it alone.
    pub fn pin(&mut self, row: usize, col: usize) -> HeatResult<()> {
        if !self.is_interior(row, col) {
            return Err(HeatError::GridOutOfBounds { row, col });
        }
        self.pinned[[row, col]] = true;
        Ok(())
    }

    pub fn is_pinned(&self, row: usize, col: usize) -> bool {
        self.pinned.get([row, col]).copied().unwrap_or(false)
    }

    pub fn pinned_count(&self) -> usize {
        self.pinned.iter().filter(|&&p| p).count()
    }

    pub(crate) fn pinned_mask(&self) -> &Array2<bool> {
        &self.pinned
    }

    pub fn is_interior(&self, row: usize, col: usize) -> bool {
        let p = &self.placement;
        (1..=p.height).contains(&row) && (1..=p.width).contains(&col)
    }

    /// Global interior coordinates `(x, y)` of a padded local cell. Ghost
    /// cells on a domain edge map to -1 or the global extent.
    pub fn global_of(&self, row: usize, col: usize) -> (i64, i64) {
        let p = &self.placement;
        (
            p.x0 as i64 + col as i64 - 1,
            p.y0 as i64 + row as i64 - 1,
        )
    }

    /// Replace the interior with a relaxation result and return its local
    /// squared residual. Shape is checked before anything is written.
    pub fn commit(&mut self, relaxation: Relaxation) -> HeatResult<f64> {
        let p = self.placement;
        if relaxation.values.dim() != (p.height, p.width) {
            return Err(HeatError::TopologyError(format!(
                "Relaxed block shape {:?} does not match interior ({}, {})",
                relaxation.values.dim(),
                p.height,
                p.width
            )));
        }
        self.cells
            .slice_mut(s![1..=p.height, 1..=p.width])
            .assign(&relaxation.values);
        Ok(relaxation.residual_sq)
    }
}
