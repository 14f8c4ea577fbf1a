use std::error::Error as StdError;

use tandem_coupling::CouplingError;
use tandem_heat::GridError;

use crate::config::ConfigError;

/// Everything that can abort a participant run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid command line: {0}")]
    Usage(String),

    #[error("parameter error: {0}")]
    Config(#[from] ConfigError),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("{0}")]
    Run(#[source] Box<dyn StdError + Send + Sync>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn run<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Run(Box::new(err))
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) | Error::Config(_) => 1,
            Error::Grid(_) => 2,
            Error::Run(_) => 3,
            Error::Internal(_) => 4,
        }
    }
}

impl From<tandem_driver::subcycling::Error> for Error {
    fn from(err: tandem_driver::subcycling::Error) -> Self {
        match err {
            tandem_driver::subcycling::Error::Internal(message) => Self::Internal(message),
            other => Self::run(other),
        }
    }
}

/// Keeps the first line of clap's report; usage hints follow on later lines.
impl From<clap::Error> for Error {
    fn from(err: clap::Error) -> Self {
        let rendered = err.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        Self::Usage(first.trim_start_matches("error: ").trim().to_string())
    }
}

impl From<CouplingError> for Error {
    fn from(err: CouplingError) -> Self {
        Self::run(err)
    }
}
