// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Gather
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reassembly of worker grids into the global grid on the collector.
//!
//! The global grid is framed: `(height + 2) × (width + 2)` with the fixed
//! outer boundary in the ring. A padded local cell `(row, col)` of a
//! placement at `(x0, y0)` lands on framed `(y0 + row, x0 + col)`. That one
//! mapping drives both [`GlobalGrid::extract`] (scatter) and
//! [`GlobalGrid::inject`] (gather), so each is the other's inverse.

use crate::comm::{Communicator, Tag};
use crate::decomposition::{Decomposition, Direction, Neighbors, Placement};
use crate::subdomain::Subdomain;
use heat_types::error::{HeatError, HeatResult};
use ndarray::{s, Array2, ArrayView2};

/// Full solution grid, owned by the collector only.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalGrid {
    width: usize,
    height: usize,
    cells: Array2<f64>,
}

impl GlobalGrid {
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        GlobalGrid {
            width,
            height,
            cells: Array2::from_elem((height + 2, width + 2), fill),
        }
    }

    pub fn from_cells(width: usize, height: usize, cells: Array2<f64>) -> HeatResult<Self> {
        if cells.dim() != (height + 2, width + 2) {
            return Err(HeatError::ConfigurationError(format!(
                "Framed grid for {width}×{height} must be ({}, {}), got {:?}",
                height + 2,
                width + 2,
                cells.dim()
            )));
        }
        Ok(GlobalGrid {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Framed cells, boundary ring included.
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    /// Framed coordinates: `x` in `0..=width+1`, `y` in `0..=height+1`.
    pub fn value(&self, x: usize, y: usize) -> HeatResult<f64> {
        self.cells
            .get([y, x])
            .copied()
            .ok_or(HeatError::GridOutOfBounds { row: y, col: x })
    }

    fn check_placement(&self, p: &Placement) -> HeatResult<()> {
        if p.x_end() > self.width || p.y_end() > self.height {
            return Err(HeatError::TopologyError(format!(
                "Placement of rank {} exceeds global grid {}×{}",
                p.rank, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Padded local block for `placement`, ghosts filled from the
    /// surrounding global cells.
    pub fn extract(&self, placement: &Placement) -> Array2<f64> {
        let (rows, cols) = placement.padded_shape();
        let (y0, x0) = (placement.y0, placement.x0);
        self.cells
            .slice(s![y0..(y0 + rows), x0..(x0 + cols)])
            .to_owned()
    }

    /// Write a padded local block back. The interior always lands; ghost
    /// strips land only where the face is a true domain edge, which is how
    /// the boundary ring is rebuilt without double-writing shared faces.
    pub fn inject(
        &mut self,
        cells: ArrayView2<'_, f64>,
        placement: &Placement,
        neighbors: &Neighbors,
    ) -> HeatResult<()> {
        self.check_placement(placement)?;
        if cells.dim() != placement.padded_shape() {
            return Err(HeatError::TopologyError(format!(
                "Rank {} sent block {:?}, expected {:?}",
                placement.rank,
                cells.dim(),
                placement.padded_shape()
            )));
        }
        let (h, w) = (placement.height, placement.width);
        let edge = |dir: Direction| neighbors.get(dir).is_none();
        let r0 = if edge(Direction::North) { 0 } else { 1 };
        let r1 = if edge(Direction::South) { h + 1 } else { h };
        let c0 = if edge(Direction::West) { 0 } else { 1 };
        let c1 = if edge(Direction::East) { w + 1 } else { w };

        let (y0, x0) = (placement.y0, placement.x0);
        self.cells
            .slice_mut(s![(y0 + r0)..=(y0 + r1), (x0 + c0)..=(x0 + c1)])
            .assign(&cells.slice(s![r0..=r1, c0..=c1]));
        Ok(())
    }
}

/// Collective: every worker hands its padded block to `collector`. The
/// collector gets `Some(grid)`; everyone else gets `None`.
pub fn gather<C: Communicator + ?Sized>(
    comm: &C,
    sub: &Subdomain,
    decomposition: &Decomposition,
    collector: usize,
) -> HeatResult<Option<GlobalGrid>> {
    if comm.rank() != collector {
        let payload: Vec<f64> = sub.cells().iter().copied().collect();
        comm.send(collector, Tag::Gather, payload)?;
        return Ok(None);
    }

    let mut grid = GlobalGrid::new(
        decomposition.global_width(),
        decomposition.global_height(),
        0.0,
    );
    grid.inject(
        sub.cells().view(),
        sub.placement(),
        decomposition.neighbors(collector)?,
    )?;
    for source in (0..comm.size()).filter(|&r| r != collector) {
        let placement = decomposition.placement(source)?;
        let payload = comm.recv(source, Tag::Gather)?;
        let block = Array2::from_shape_vec(placement.padded_shape(), payload).map_err(|e| {
            HeatError::TopologyError(format!("Gather block from rank {source}: {e}"))
        })?;
        grid.inject(block.view(), placement, decomposition.neighbors(source)?)?;
    }
    Ok(Some(grid))
}

/// In-process gather for subdomains that already live together.
pub fn assemble(subs: &[Subdomain], decomposition: &Decomposition) -> HeatResult<GlobalGrid> {
    if subs.len() != decomposition.len() {
        return Err(HeatError::TopologyError(format!(
            "subdomains/placements length mismatch: {} vs {}",
            subs.len(),
            decomposition.len()
        )));
    }
    let mut grid = GlobalGrid::new(
        decomposition.global_width(),
        decomposition.global_height(),
        0.0,
    );
    for sub in subs {
        let rank = sub.rank();
        grid.inject(sub.cells().view(), sub.placement(), decomposition.neighbors(rank)?)?;
    }
    Ok(grid)
}

/// Scatter a framed global grid into per-rank subdomains.
pub fn scatter(global: &GlobalGrid, decomposition: &Decomposition) -> HeatResult<Vec<Subdomain>> {
    decomposition
        .placements()
        .iter()
        .map(|p| {
            global.check_placement(p)?;
            Subdomain::from_cells(*p, global.extract(p))
        })
        .collect()
}
