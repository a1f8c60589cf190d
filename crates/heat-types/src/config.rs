// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants;
use crate::error::{HeatError, HeatResult};
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
/// Every section is optional in JSON; missing sections fall back to the
/// reference cross-plate problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeatConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

fn default_width() -> usize {
    constants::DEFAULT_WIDTH
}
fn default_height() -> usize {
    constants::DEFAULT_HEIGHT
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// How rows and columns are distributed over the process grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TilingStrategy {
    /// Every tile has identical extents; dimensions must divide evenly.
    #[default]
    Uniform,
    /// Extents differ by at most one cell along each axis.
    Balanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers. `null` picks the largest count that fits the
    /// available Rayon threads and tiles the grid.
    #[serde(default = "default_worker_count")]
    pub count: Option<usize>,
    #[serde(default)]
    pub tiling: TilingStrategy,
    /// Explicit process grid `[px, py]`; overrides automatic selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_grid: Option<[usize; 2]>,
}

fn default_worker_count() -> Option<usize> {
    Some(constants::DEFAULT_WORKERS)
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            count: default_worker_count(),
            tiling: TilingStrategy::default(),
            process_grid: None,
        }
    }
}

/// Rectangle `[x_start, x_end) × [y_start, y_end)` in global interior
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl Region {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x_start as i64
            && x < self.x_end as i64
            && y >= self.y_start as i64
            && y < self.y_end as i64
    }

    pub fn is_empty(&self) -> bool {
        self.x_start >= self.x_end || self.y_start >= self.y_end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    #[serde(default = "default_outer")]
    pub outer_value: f64,
    #[serde(default = "default_inner")]
    pub inner_value: f64,
    /// Region held at `inner_value`. `null` means no inner boundary.
    #[serde(default = "default_inner_region")]
    pub inner_region: Option<Region>,
}

fn default_outer() -> f64 {
    constants::OUTER_BOUNDARY
}
fn default_inner() -> f64 {
    constants::INNER_BOUNDARY
}
fn default_inner_region() -> Option<Region> {
    let [x_start, x_end, y_start, y_end] = constants::INNER_REGION;
    Some(Region {
        x_start,
        x_end,
        y_start,
        y_end,
    })
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        BoundaryConfig {
            outer_value: default_outer(),
            inner_value: default_inner(),
            inner_region: default_inner_region(),
        }
    }
}

/// Which executor drives the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    /// One OS thread per worker, message passing over channels.
    #[default]
    Threaded,
    /// All subdomains in one address space, Rayon-parallel relaxation.
    Lockstep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_threshold")]
    pub convergence_threshold: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Log the residual every `log_interval` iterations on the collector.
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
    #[serde(default)]
    pub executor: Executor,
}

fn default_threshold() -> f64 {
    constants::CONVERGENCE_THRESHOLD
}
fn default_max_iterations() -> usize {
    constants::MAX_ITERATIONS
}
fn default_log_interval() -> usize {
    1
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            convergence_threshold: default_threshold(),
            max_iterations: default_max_iterations(),
            log_interval: default_log_interval(),
            executor: Executor::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    constants::OUTPUT_FILE.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: default_output_path(),
        }
    }
}

impl HeatConfig {
    /// Load from a JSON file. The result is not validated.
    pub fn from_file(path: &str) -> HeatResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Reject combinations that cannot describe a solvable problem.
    /// Tiling feasibility is checked later by the decomposer.
    pub fn validate(&self) -> HeatResult<()> {
        let GridConfig { width, height } = self.grid;
        if width == 0 || height == 0 {
            return Err(HeatError::ConfigurationError(format!(
                "Grid must be at least 1×1, got {width}×{height}"
            )));
        }
        if self.workers.count == Some(0) {
            return Err(HeatError::ConfigurationError(
                "Worker count must be >= 1".to_string(),
            ));
        }
        if let Some([px, py]) = self.workers.process_grid {
            if px == 0 || py == 0 {
                return Err(HeatError::ConfigurationError(format!(
                    "Process grid dimensions must be >= 1, got [{px}, {py}]"
                )));
            }
        }
        // Boundary values are taken as given; NaN/Inf surfaces as a solve
        // that does not converge.
        if let Some(region) = self.boundary.inner_region {
            if region.is_empty() {
                return Err(HeatError::ConfigurationError(format!(
                    "Inner region is empty: {region:?}"
                )));
            }
            if region.x_end > width || region.y_end > height {
                return Err(HeatError::ConfigurationError(format!(
                    "Inner region {region:?} exceeds grid {width}×{height}"
                )));
            }
        }
        let s = &self.solver;
        if !s.convergence_threshold.is_finite() || s.convergence_threshold < 0.0 {
            return Err(HeatError::ConfigurationError(format!(
                "Convergence threshold must be finite and >= 0, got {}",
                s.convergence_threshold
            )));
        }
        if s.max_iterations == 0 {
            return Err(HeatError::ConfigurationError(
                "max_iterations must be >= 1".to_string(),
            ));
        }
        if s.log_interval == 0 {
            return Err(HeatError::ConfigurationError(
                "log_interval must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
