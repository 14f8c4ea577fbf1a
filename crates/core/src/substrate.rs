//! The contract consumed from the coupling substrate.
//!
//! A substrate is the library that moves interface data between participants
//! and decides when a coupling window is complete. The driver talks to it only
//! through [`CouplingSubstrate`], usually wrapped in a coupling adapter.

use std::{fmt, path::Path};

/// Identifier of a mesh registered with the substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// Identifier of a data field registered on a substrate mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub usize);

/// Identifier the substrate assigns to a registered interface vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// A driver-side operation the substrate may request during an iteration.
///
/// The substrate's convention is query, then perform the work, then
/// acknowledge with [`CouplingSubstrate::mark_action_fulfilled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CouplingAction {
    WriteIterationCheckpoint,
    ReadIterationCheckpoint,
    WriteInitialData,
}

impl CouplingAction {
    /// The substrate's name for this action.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CouplingAction::WriteIterationCheckpoint => "write-iteration-checkpoint",
            CouplingAction::ReadIterationCheckpoint => "read-iteration-checkpoint",
            CouplingAction::WriteInitialData => "write-initial-data",
        }
    }
}

impl fmt::Display for CouplingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A process-global coupling library seen from one participant rank.
///
/// Times cross this boundary as plain seconds. Block transfers use `values`
/// laid out vertex-major with `values.len() == vertex_ids.len() * components`.
pub trait CouplingSubstrate {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Configures the substrate for one participant rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    fn configure(
        &mut self,
        participant: &str,
        config_file: &Path,
        rank: usize,
        size: usize,
    ) -> Result<(), Self::Error>;

    /// Spatial dimension of the coupling configuration.
    fn dimensions(&self) -> usize;

    /// Looks up a mesh by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is not part of the configuration.
    fn mesh_id(&self, mesh_name: &str) -> Result<MeshId, Self::Error>;

    /// Registers interface vertices and returns their substrate IDs in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh rejects the vertices.
    fn set_mesh_vertices(
        &mut self,
        mesh: MeshId,
        coordinates: &[f64],
    ) -> Result<Vec<VertexId>, Self::Error>;

    /// Looks up a data field on a mesh, or `None` if this participant does
    /// not exchange it.
    fn data_id(&self, data_name: &str, mesh: MeshId) -> Option<DataId>;

    /// Reads a block of values for the given vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails.
    fn read_block_data(
        &mut self,
        data: DataId,
        vertex_ids: &[VertexId],
        values: &mut [f64],
    ) -> Result<(), Self::Error>;

    /// Writes a block of values for the given vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails.
    fn write_block_data(
        &mut self,
        data: DataId,
        vertex_ids: &[VertexId],
        values: &[f64],
    ) -> Result<(), Self::Error>;

    /// Returns `true` if the substrate requires `action` in this iteration.
    fn is_action_required(&self, action: CouplingAction) -> bool;

    /// Acknowledges that a required action has been performed.
    ///
    /// # Errors
    ///
    /// Returns an error if the action was not required.
    fn mark_action_fulfilled(&mut self, action: CouplingAction) -> Result<(), Self::Error>;

    /// Completes the setup handshake and returns the first admissible
    /// sub-step in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails.
    fn initialize(&mut self) -> Result<f64, Self::Error>;

    /// Performs the initial data exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    fn initialize_data(&mut self) -> Result<(), Self::Error>;

    /// Commits an iteration that used `dt` seconds and returns the next
    /// admissible sub-step in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the peer fails.
    fn advance(&mut self, dt: f64) -> Result<f64, Self::Error>;

    /// Returns `false` once the coupled run has ended.
    fn is_coupling_ongoing(&self) -> bool;

    /// Releases substrate resources.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails.
    fn finalize(&mut self) -> Result<(), Self::Error>;
}
