// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Domain Decomposition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 2D Cartesian domain decomposition.
//!
//! The (height × width) global grid is cut into a (py × px) process grid;
//! each rank owns one rectangular placement. Neighbours are derived from
//! placement geometry alone, so custom tilings built with
//! [`Decomposition::from_placements`] get the same treatment as the
//! generated ones.
//!
//! Axis convention: `x` runs West→East over columns, `y` runs North→South
//! over rows. Ranks are row-major: `rank = iy * px + ix`.

use heat_types::config::TilingStrategy;
use heat_types::error::{HeatError, HeatResult};

/// Face of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// North/South faces run along x; their strips have `width` cells.
    pub fn is_horizontal_face(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

/// One rank's owned rectangle in global interior coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rank: usize,
    /// First owned column.
    pub x0: usize,
    /// First owned row.
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl Placement {
    pub fn x_end(&self) -> usize {
        self.x0 + self.width
    }

    pub fn y_end(&self) -> usize {
        self.y0 + self.height
    }

    /// Local array shape including the one-cell ghost border: (rows, cols).
    pub fn padded_shape(&self) -> (usize, usize) {
        (self.height + 2, self.width + 2)
    }

    /// Number of cells on the given face.
    pub fn edge_len(&self, dir: Direction) -> usize {
        if dir.is_horizontal_face() {
            self.width
        } else {
            self.height
        }
    }

    fn overlaps(&self, other: &Placement) -> bool {
        self.x0 < other.x_end()
            && other.x0 < self.x_end()
            && self.y0 < other.y_end()
            && other.y0 < self.y_end()
    }
}

/// Up to four face neighbours; `None` marks a true domain edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub north: Option<usize>,
    pub south: Option<usize>,
    pub east: Option<usize>,
    pub west: Option<usize>,
}

impl Neighbors {
    pub fn get(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    fn set(&mut self, dir: Direction, rank: Option<usize>) {
        match dir {
            Direction::North => self.north = rank,
            Direction::South => self.south = rank,
            Direction::East => self.east = rank,
            Direction::West => self.west = rank,
        }
    }

    /// Present neighbours in `Direction::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, usize)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.get(d).map(|r| (d, r)))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Process-grid dimensions: `px` tiles across, `py` tiles down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    pub px: usize,
    pub py: usize,
}

impl ProcessGrid {
    pub fn size(&self) -> usize {
        self.px * self.py
    }
}

/// Immutable tiling of the global grid plus its neighbour topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    global_width: usize,
    global_height: usize,
    process_grid: Option<ProcessGrid>,
    placements: Vec<Placement>,
    neighbors: Vec<Neighbors>,
}

impl Decomposition {
    /// Build from an arbitrary set of placements. The placements must be
    /// indexed by rank, tile the grid exactly and share every internal face
    /// in full with exactly one partner.
    pub fn from_placements(
        global_width: usize,
        global_height: usize,
        placements: Vec<Placement>,
    ) -> HeatResult<Self> {
        validate_tiling(global_width, global_height, &placements)?;
        let neighbors = derive_neighbors(&placements)?;
        Ok(Decomposition {
            global_width,
            global_height,
            process_grid: None,
            placements,
            neighbors,
        })
    }

    pub fn global_width(&self) -> usize {
        self.global_width
    }

    pub fn global_height(&self) -> usize {
        self.global_height
    }

    /// `None` for decompositions built from custom placements.
    pub fn process_grid(&self) -> Option<ProcessGrid> {
        self.process_grid
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, rank: usize) -> HeatResult<&Placement> {
        self.placements.get(rank).ok_or_else(|| {
            HeatError::TopologyError(format!(
                "Rank {rank} outside decomposition of {} workers",
                self.placements.len()
            ))
        })
    }

    pub fn neighbors(&self, rank: usize) -> HeatResult<&Neighbors> {
        self.neighbors.get(rank).ok_or_else(|| {
            HeatError::TopologyError(format!(
                "Rank {rank} outside decomposition of {} workers",
                self.neighbors.len()
            ))
        })
    }

}

/// Decompose with the uniform strategy and automatic process-grid choice.
pub fn decompose(
    global_width: usize,
    global_height: usize,
    worker_count: usize,
) -> HeatResult<Decomposition> {
    decompose_with(
        global_width,
        global_height,
        worker_count,
        TilingStrategy::Uniform,
        None,
    )
}

/// Decompose a (global_height × global_width) grid over `worker_count`
/// ranks. An explicit `process_grid` bypasses automatic selection but is
/// still checked against the strategy.
pub fn decompose_with(
    global_width: usize,
    global_height: usize,
    worker_count: usize,
    strategy: TilingStrategy,
    process_grid: Option<ProcessGrid>,
) -> HeatResult<Decomposition> {
    if global_width == 0 || global_height == 0 {
        return Err(HeatError::ConfigurationError(format!(
            "Global grid must be at least 1×1, got {global_width}×{global_height}"
        )));
    }
    if worker_count == 0 {
        return Err(HeatError::ConfigurationError(
            "Worker count must be >= 1".to_string(),
        ));
    }

    let grid = match process_grid {
        Some(pg) => {
            if pg.size() != worker_count {
                return Err(HeatError::ConfigurationError(format!(
                    "Process grid {}×{} does not match worker count {worker_count}",
                    pg.px, pg.py
                )));
            }
            if !fits(global_width, global_height, pg, strategy) {
                return Err(HeatError::ConfigurationError(format!(
                    "Cannot tile {global_width}×{global_height} with a {}×{} {strategy:?} process grid",
                    pg.px, pg.py
                )));
            }
            pg
        }
        None => optimal_process_grid(global_width, global_height, worker_count, strategy)
            .ok_or_else(|| {
                HeatError::ConfigurationError(format!(
                    "{worker_count} workers cannot tile a {global_width}×{global_height} grid \
                     ({strategy:?} strategy)"
                ))
            })?,
    };

    let x_splits = split_extent(global_width, grid.px, strategy);
    let y_splits = split_extent(global_height, grid.py, strategy);

    let mut placements = Vec::with_capacity(grid.size());
    let mut y_cursor = 0usize;
    for height in y_splits {
        let mut x_cursor = 0usize;
        for &width in &x_splits {
            placements.push(Placement {
                rank: placements.len(),
                x0: x_cursor,
                y0: y_cursor,
                width,
                height,
            });
            x_cursor += width;
        }
        y_cursor += height;
    }

    let mut decomposition = Decomposition::from_placements(global_width, global_height, placements)?;
    decomposition.process_grid = Some(grid);
    log::debug!(
        "decomposed {global_width}×{global_height} into {}×{} tiles ({strategy:?})",
        grid.px,
        grid.py
    );
    Ok(decomposition)
}

fn fits(width: usize, height: usize, pg: ProcessGrid, strategy: TilingStrategy) -> bool {
    if pg.px == 0 || pg.py == 0 || pg.px > width || pg.py > height {
        return false;
    }
    match strategy {
        TilingStrategy::Uniform => width % pg.px == 0 && height % pg.py == 0,
        TilingStrategy::Balanced => true,
    }
}

/// Split `n` cells across `k` strips. Uniform assumes `n % k == 0`;
/// balanced hands the remainder to the leading strips.
fn split_extent(n: usize, k: usize, strategy: TilingStrategy) -> Vec<usize> {
    let base = n / k;
    let rem = n % k;
    match strategy {
        TilingStrategy::Uniform => vec![base; k],
        TilingStrategy::Balanced => (0..k).map(|i| base + usize::from(i < rem)).collect(),
    }
}

/// Process-grid factorisation of `nranks` that minimises the
/// surface-to-volume ratio of each tile (halo traffic per owned cell).
/// Ties keep the smaller `px`. `None` if no factorisation tiles the grid.
pub fn optimal_process_grid(
    width: usize,
    height: usize,
    nranks: usize,
    strategy: TilingStrategy,
) -> Option<ProcessGrid> {
    let mut best: Option<(ProcessGrid, f64)> = None;
    for px in 1..=nranks {
        if nranks % px != 0 {
            continue;
        }
        let pg = ProcessGrid {
            px,
            py: nranks / px,
        };
        if !fits(width, height, pg, strategy) {
            continue;
        }
        let tile_w = width as f64 / pg.px as f64;
        let tile_h = height as f64 / pg.py as f64;
        let cost = 2.0 * (tile_w + tile_h) / (tile_w * tile_h);
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((pg, cost));
        }
    }
    best.map(|(pg, _)| pg)
}

/// Largest worker count `<= max_workers` that tiles the grid.
pub fn largest_tiling_count(
    width: usize,
    height: usize,
    max_workers: usize,
    strategy: TilingStrategy,
) -> Option<usize> {
    (1..=max_workers)
        .rev()
        .find(|&n| optimal_process_grid(width, height, n, strategy).is_some())
}

/// Exact-cover check: in bounds, no overlap, areas sum to the grid.
pub fn validate_tiling(width: usize, height: usize, placements: &[Placement]) -> HeatResult<()> {
    if placements.is_empty() {
        return Err(HeatError::ConfigurationError(
            "Decomposition has no placements".to_string(),
        ));
    }
    let mut area = 0usize;
    for (i, p) in placements.iter().enumerate() {
        if p.rank != i {
            return Err(HeatError::ConfigurationError(format!(
                "Placement at index {i} carries rank {}",
                p.rank
            )));
        }
        if p.width == 0 || p.height == 0 {
            return Err(HeatError::ConfigurationError(format!(
                "Placement {i} is empty ({}×{})",
                p.width, p.height
            )));
        }
        if p.x_end() > width || p.y_end() > height {
            return Err(HeatError::ConfigurationError(format!(
                "Placement {i} [{}..{})×[{}..{}) exceeds grid {width}×{height}",
                p.x0,
                p.x_end(),
                p.y0,
                p.y_end()
            )));
        }
        area += p.width * p.height;
    }
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if a.overlaps(b) {
                return Err(HeatError::ConfigurationError(format!(
                    "Placements {} and {} overlap",
                    a.rank, b.rank
                )));
            }
        }
    }
    if area != width * height {
        return Err(HeatError::ConfigurationError(format!(
            "Placements cover {area} cells, grid has {}",
            width * height
        )));
    }
    Ok(())
}

/// Geometric neighbour derivation. B is A's East neighbour when A's far
/// column edge is B's near column edge and their row ranges overlap; the
/// other faces follow by symmetry. Every shared face must match in full.
pub fn derive_neighbors(placements: &[Placement]) -> HeatResult<Vec<Neighbors>> {
    let mut out = vec![Neighbors::default(); placements.len()];
    for a in placements {
        for dir in Direction::ALL {
            let candidates: Vec<&Placement> = placements
                .iter()
                .filter(|b| b.rank != a.rank && touches(a, b, dir))
                .collect();
            match candidates.as_slice() {
                [] => {}
                [b] if same_face_extent(a, b, dir) => out[a.rank].set(dir, Some(b.rank)),
                _ => {
                    return Err(HeatError::ConfigurationError(format!(
                        "Non-conforming tiling: {dir:?} face of rank {} is shared with ranks {:?}",
                        a.rank,
                        candidates.iter().map(|b| b.rank).collect::<Vec<_>>()
                    )));
                }
            }
        }
    }
    Ok(out)
}

fn touches(a: &Placement, b: &Placement, dir: Direction) -> bool {
    let rows_overlap = a.y0 < b.y_end() && b.y0 < a.y_end();
    let cols_overlap = a.x0 < b.x_end() && b.x0 < a.x_end();
    match dir {
        Direction::North => b.y_end() == a.y0 && cols_overlap,
        Direction::South => a.y_end() == b.y0 && cols_overlap,
        Direction::East => a.x_end() == b.x0 && rows_overlap,
        Direction::West => b.x_end() == a.x0 && rows_overlap,
    }
}

fn same_face_extent(a: &Placement, b: &Placement, dir: Direction) -> bool {
    if dir.is_horizontal_face() {
        a.x0 == b.x0 && a.width == b.width
    } else {
        a.y0 == b.y0 && a.height == b.height
    }
}
