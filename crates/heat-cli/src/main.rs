//! SCPN heat relaxation command-line interface.
//!
//! Solve the cross-plate problem from JSON configuration files:
//! ```sh
//! heat-cli run configs/reference.json
//! heat-cli run --workers 8 --executor lockstep
//! heat-cli validate configs/strip_balanced.json
//! heat-cli decompose configs/reference.json
//! ```

mod runner;

use clap::{Parser, Subcommand, ValueEnum};
use heat_types::config::Executor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heat-cli")]
#[command(about = "Domain-decomposed Jacobi solver for 2D steady-state heat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExecutorArg {
    Threaded,
    Lockstep,
}

impl From<ExecutorArg> for Executor {
    fn from(arg: ExecutorArg) -> Self {
        match arg {
            ExecutorArg::Threaded => Executor::Threaded,
            ExecutorArg::Lockstep => Executor::Lockstep,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve and write the framed grid. Without a config file the
    /// 500×300 reference problem is solved.
    Run {
        /// Path to the JSON configuration file.
        config: Option<PathBuf>,
        /// Output file (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker count (overrides config file setting).
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(short, long, value_enum)]
        executor: Option<ExecutorArg>,
        /// Size of the Rayon pool used by the lockstep executor and by
        /// automatic worker selection.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Parse, validate and decompose a configuration without solving.
    Validate {
        config: PathBuf,
    },
    /// Print the placement and neighbour table for a configuration.
    Decompose {
        config: PathBuf,
    },
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            config,
            output,
            workers,
            executor,
            threads,
        } => {
            if let Some(n) = threads {
                runner::init_thread_pool(n)?;
            }
            let mut cfg = runner::load_config(config.as_deref())?;
            if let Some(path) = output {
                cfg.output.path = path.to_string_lossy().into_owned();
            }
            if let Some(n) = workers {
                cfg.workers.count = Some(n);
                cfg.workers.process_grid = None;
            }
            if let Some(e) = executor {
                cfg.solver.executor = e.into();
            }

            println!("SCPN Heat Relax");
            println!("===============");
            if let Some(path) = &config {
                println!("Configuration: {}", path.display());
            }
            let outcome = runner::run(&cfg)?;
            runner::print_report(&outcome.report, &cfg.output.path);
            Ok(())
        }
        Commands::Validate { config } => {
            let cfg = runner::load_config(Some(config.as_path()))?;
            let d = runner::decompose(&cfg)?;
            println!(
                "Configuration is valid: {} ({} workers)",
                config.display(),
                d.len()
            );
            Ok(())
        }
        Commands::Decompose { config } => {
            let cfg = runner::load_config(Some(config.as_path()))?;
            let d = runner::decompose(&cfg)?;
            runner::print_decomposition(&d);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli) {
        log::error!("{err:#}");
        return Err(err);
    }
    Ok(())
}
