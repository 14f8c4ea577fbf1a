//! The `tandem` participant binary.
//!
//! Runs the reference heat participant against the standalone coupling
//! substrate:
//!
//! ```text
//! tandem params.toml [--set Group.Key=value]... [coupling.toml]
//! ```
//!
//! Exit codes: 0 success, 1 parameter error, 2 grid error, 3 framework error,
//! 4 internal error.

mod config;
mod error;
mod run;

use std::{error::Error as StdError, path::PathBuf, process::ExitCode};

use clap::{Parser, error::ErrorKind};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use config::{Override, Params};
pub use error::Error;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Runs one participant of a partitioned coupled simulation", long_about = None)]
struct Cli {
    /// Parameter file (TOML).
    params: PathBuf,

    /// Coupling configuration file.
    #[arg(default_value = "precice-config.xml")]
    coupling_config: PathBuf,

    /// Overrides a parameter, e.g. `--set TimeLoop.TEnd=2.0`.
    #[arg(long = "set", value_name = "GROUP.KEY=VALUE")]
    overrides: Vec<Override>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => return abort(&Error::from(err)),
    };

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging unavailable: {err}");
    }

    let result = Params::load(&cli.params, &cli.overrides)
        .map_err(Error::from)
        .and_then(|params| run::execute(&params, &cli.coupling_config));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => abort(&err),
    }
}

fn abort(err: &Error) -> ExitCode {
    eprintln!("error: {} ---> Abort!", chain(err));
    ExitCode::from(err.exit_code())
}

/// Renders an error and its sources on one line, skipping sources whose
/// message is already included.
fn chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}
