use tandem_core::TimeIncrement;
use tandem_coupling::InterfaceExtractor;

/// Settings for [`startup`](super::startup).
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// Name of the interface mesh in the coupling configuration.
    pub mesh_name: String,

    /// Selects the interface faces on the participant's grid.
    pub extractor: InterfaceExtractor,

    /// The user's initial step size.
    pub dt_initial: TimeIncrement,
}

impl StartupConfig {
    #[must_use]
    pub fn new(
        mesh_name: impl Into<String>,
        extractor: InterfaceExtractor,
        dt_initial: TimeIncrement,
    ) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            extractor,
            dt_initial,
        }
    }
}

/// Outcome of [`startup`](super::startup).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Startup {
    /// Number of interface vertices registered.
    pub vertices: usize,

    /// Maximum sub-step reported by the substrate.
    pub substrate_dt: TimeIncrement,

    /// Step size set on the time loop.
    pub dt: TimeIncrement,

    /// Whether initial data was sent to the peer.
    pub wrote_initial_data: bool,
}
