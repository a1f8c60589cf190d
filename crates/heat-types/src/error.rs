use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeatError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Topology error: {0}")]
    TopologyError(String),

    #[error("Worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("Grid index out of bounds: row={row}, col={col}")]
    GridOutOfBounds { row: usize, col: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HeatError {
    /// True for the failures that abort the whole collective mid-run.
    pub fn is_topology(&self) -> bool {
        matches!(self, HeatError::TopologyError(_))
    }
}

pub type HeatResult<T> = Result<T, HeatError>;
