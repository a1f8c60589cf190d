//! Solve runner: configuration loading, solve, output and reporting.

use std::path::Path;

use anyhow::{Context, Result};

use heat_core::decomposition::{Decomposition, Direction};
use heat_core::output::write_grid_csv;
use heat_core::solver::{decompose_config, solve, SolveOutcome};
use heat_types::config::HeatConfig;
use heat_types::state::SolveReport;

/// Load a configuration file, or the reference problem when none is given.
pub fn load_config(path: Option<&Path>) -> Result<HeatConfig> {
    let Some(path) = path else {
        return Ok(HeatConfig::default());
    };
    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 config path: {}", path.display()))?;
    HeatConfig::from_file(path_str)
        .with_context(|| format!("Failed to load config {}", path.display()))
}

pub fn init_thread_pool(threads: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to configure the Rayon thread pool")
}

pub fn decompose(cfg: &HeatConfig) -> Result<Decomposition> {
    decompose_config(cfg).context("Invalid configuration")
}

/// Solve, then write the framed grid to `cfg.output.path`.
pub fn run(cfg: &HeatConfig) -> Result<SolveOutcome> {
    let outcome = solve(cfg).context("Solve failed")?;
    write_grid_csv(&outcome.grid, &cfg.output.path)
        .with_context(|| format!("Failed to write {}", cfg.output.path))?;
    Ok(outcome)
}

pub fn print_report(report: &SolveReport, output: &str) {
    let status = if report.converged {
        "converged"
    } else {
        "NOT converged"
    };
    println!("Iterations:     {}", report.iterations);
    println!("Residual norm:  {:e} ({status})", report.residual_norm);
    println!("Execution time: {:.3} s", report.elapsed_ms / 1e3);
    println!("Output:         {output}");
}

fn neighbour(d: &Decomposition, rank: usize, dir: Direction) -> String {
    d.neighbors(rank)
        .ok()
        .and_then(|nb| nb.get(dir))
        .map_or_else(|| "-".to_string(), |r| r.to_string())
}

pub fn print_decomposition(d: &Decomposition) {
    match d.process_grid() {
        Some(pg) => println!(
            "{}×{} grid on {} workers ({}×{} process grid)",
            d.global_width(),
            d.global_height(),
            d.len(),
            pg.px,
            pg.py
        ),
        None => println!(
            "{}×{} grid on {} workers",
            d.global_width(),
            d.global_height(),
            d.len()
        ),
    }
    println!(
        "{:>4} {:>6} {:>6} {:>6} {:>6}  {:>5} {:>5} {:>5} {:>5}",
        "rank", "x0", "y0", "width", "height", "N", "S", "E", "W"
    );
    for p in d.placements() {
        println!(
            "{:>4} {:>6} {:>6} {:>6} {:>6}  {:>5} {:>5} {:>5} {:>5}",
            p.rank,
            p.x0,
            p.y0,
            p.width,
            p.height,
            neighbour(d, p.rank, Direction::North),
            neighbour(d, p.rank, Direction::South),
            neighbour(d, p.rank, Direction::East),
            neighbour(d, p.rank, Direction::West),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heat_types::config::Executor;

    #[test]
    fn test_missing_path_is_reference_problem() {
        let cfg = load_config(None).unwrap();
        assert_eq!((cfg.grid.width, cfg.grid.height), (500, 300));
        assert!(decompose(&cfg).is_ok());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config(Some(Path::new("/no/such/heat.json"))).expect_err("missing");
        assert!(format!("{err:#}").contains("Failed to load config"));
    }

    #[test]
    fn test_run_writes_framed_grid() {
        let mut cfg = HeatConfig::default();
        cfg.grid.width = 12;
        cfg.grid.height = 8;
        cfg.boundary.inner_region = None;
        cfg.workers.count = Some(2);
        cfg.solver.executor = Executor::Lockstep;
        let path = std::env::temp_dir().join(format!("heat_cli_run_{}.txt", std::process::id()));
        cfg.output.path = path.to_string_lossy().into_owned();

        let outcome = run(&cfg).expect("run");
        assert!(outcome.report.converged, "uniform field is already steady");
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text.lines().count(), 10);
        assert!(text.lines().all(|l| l.split(',').filter(|s| !s.is_empty()).count() == 14));
    }
}
