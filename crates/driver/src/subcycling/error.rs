use std::error::Error as StdError;

use tandem_coupling::{CheckpointError, CouplingError, ExchangeError, InterfaceError};

/// Errors that abort a coupled run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("interface error: {0}")]
    Interface(#[source] InterfaceError),

    #[error("coupling error: {0}")]
    Coupling(#[source] CouplingError),

    #[error("data exchange error: {0}")]
    Exchange(#[source] ExchangeError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("solver error: {0}")]
    Solver(#[source] Box<dyn StdError + Send + Sync>),

    #[error("framework error: {0}")]
    Framework(#[source] Box<dyn StdError + Send + Sync>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn solver<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Solver(Box::new(err))
    }

    pub(crate) fn framework<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Framework(Box::new(err))
    }
}

impl From<InterfaceError> for Error {
    fn from(err: InterfaceError) -> Self {
        Self::Interface(err)
    }
}

/// Interface problems surface as [`Error::Interface`] wherever they arise.
impl From<CouplingError> for Error {
    fn from(err: CouplingError) -> Self {
        match err {
            CouplingError::Interface(err) => Self::Interface(err),
            other => Self::Coupling(other),
        }
    }
}

impl From<ExchangeError> for Error {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Coupling(err) => err.into(),
            other => Self::Exchange(other),
        }
    }
}
