//! An in-process coupling substrate that plays a prescribed peer.
//!
//! The peer sends constant values and, under the implicit scheme, demands a
//! fixed number of passes over each time window. This is enough to run a
//! single participant end to end without a second solver.

mod config;

pub use config::{Scheme, StandaloneConfig};

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

use tandem_core::{CouplingAction, CouplingSubstrate, DataId, MeshId, VertexId};
use thiserror::Error;

/// Relative slack when comparing times against window boundaries.
const TIME_EPS: f64 = 1e-10;

#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("cannot read coupling configuration `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed coupling configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid coupling configuration: {0}")]
    InvalidConfig(String),

    #[error("substrate used before `configure`")]
    NotConfigured,

    #[error("participant `{got}` is not configured (expected `{expected}`)")]
    UnknownParticipant { expected: String, got: String },

    #[error("mesh `{0}` is not configured")]
    UnknownMesh(String),

    #[error("{len} coordinates are not a multiple of dimension {dimension}")]
    Coordinates { len: usize, dimension: usize },

    #[error("unknown data ID {0:?}")]
    UnknownData(DataId),

    #[error("time step {dt} exceeds the {remaining} left in the window")]
    StepTooLarge { dt: f64, remaining: f64 },

    #[error("action `{0}` is not required")]
    ActionNotRequired(CouplingAction),

    #[error("action `{0}` must be fulfilled before advancing")]
    ActionPending(CouplingAction),

    #[error("coupling has already ended")]
    CouplingEnded,
}

/// The standalone substrate.
#[derive(Debug, Default)]
pub struct StandaloneSubstrate {
    config: Option<StandaloneConfig>,
    participant: Option<String>,
    vertices: usize,
    time: f64,
    window_start: f64,
    iteration: usize,
    required: BTreeSet<CouplingAction>,
    written: BTreeMap<DataId, Vec<f64>>,
    started: bool,
    finalized: bool,
    advances: usize,
}

impl StandaloneSubstrate {
    /// A substrate that reads its configuration in
    /// [`configure`](CouplingSubstrate::configure).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A substrate with a configuration already loaded; the file passed to
    /// `configure` is ignored.
    #[must_use]
    pub fn from_config(config: StandaloneConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Current coupling time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of `advance` calls so far.
    #[must_use]
    pub fn advances(&self) -> usize {
        self.advances
    }

    /// Last values written for a data name.
    #[must_use]
    pub fn written(&self, data_name: &str) -> Option<&[f64]> {
        let config = self.config.as_ref()?;
        let index = config.data.iter().position(|d| d == data_name)?;
        self.written.get(&DataId(index)).map(Vec::as_slice)
    }

    fn config(&self) -> Result<&StandaloneConfig, SubstrateError> {
        self.config.as_ref().ok_or(SubstrateError::NotConfigured)
    }

    fn window_end(&self, config: &StandaloneConfig) -> f64 {
        (self.window_start + config.max_time_window).min(config.end_time)
    }

    fn ongoing(&self) -> bool {
        match &self.config {
            Some(config) => {
                self.started && !self.finalized && self.time < config.end_time * (1.0 - TIME_EPS)
            }
            None => false,
        }
    }

    fn next_step(&self) -> f64 {
        match &self.config {
            Some(config) if self.ongoing() => self.window_end(config) - self.time,
            _ => 0.0,
        }
    }
}

impl CouplingSubstrate for StandaloneSubstrate {
    type Error = SubstrateError;

    fn configure(
        &mut self,
        participant: &str,
        config_file: &Path,
        rank: usize,
        size: usize,
    ) -> Result<(), SubstrateError> {
        if self.config.is_none() {
            self.config = Some(StandaloneConfig::from_path(config_file)?);
        }
        let config = self.config()?;
        if let Some(expected) = &config.participant {
            if expected != participant {
                return Err(SubstrateError::UnknownParticipant {
                    expected: expected.clone(),
                    got: participant.to_string(),
                });
            }
        }
        if size > 1 {
            tracing::warn!(rank, size, "standalone substrate treats every rank as serial");
        }

        self.participant = Some(participant.to_string());
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.config.as_ref().map_or(0, |config| config.dimensions)
    }

    fn mesh_id(&self, mesh_name: &str) -> Result<MeshId, SubstrateError> {
        if self.config()?.mesh == mesh_name {
            Ok(MeshId(0))
        } else {
            Err(SubstrateError::UnknownMesh(mesh_name.to_string()))
        }
    }

    fn set_mesh_vertices(
        &mut self,
        _mesh: MeshId,
        coordinates: &[f64],
    ) -> Result<Vec<VertexId>, SubstrateError> {
        let dimension = self.config()?.dimensions;
        if coordinates.len() % dimension != 0 {
            return Err(SubstrateError::Coordinates {
                len: coordinates.len(),
                dimension,
            });
        }
        self.vertices = coordinates.len() / dimension;
        Ok((0..self.vertices).map(VertexId).collect())
    }

    fn data_id(&self, data_name: &str, _mesh: MeshId) -> Option<DataId> {
        let config = self.config.as_ref()?;
        config.data.iter().position(|d| d == data_name).map(DataId)
    }

    fn read_block_data(
        &mut self,
        data: DataId,
        _vertex_ids: &[VertexId],
        values: &mut [f64],
    ) -> Result<(), SubstrateError> {
        let config = self.config()?;
        let name = config
            .data
            .get(data.0)
            .ok_or(SubstrateError::UnknownData(data))?;
        values.fill(config.peer.get(name).copied().unwrap_or(0.0));
        Ok(())
    }

    fn write_block_data(
        &mut self,
        data: DataId,
        _vertex_ids: &[VertexId],
        values: &[f64],
    ) -> Result<(), SubstrateError> {
        if data.0 >= self.config()?.data.len() {
            return Err(SubstrateError::UnknownData(data));
        }
        self.written.insert(data, values.to_vec());
        Ok(())
    }

    fn is_action_required(&self, action: CouplingAction) -> bool {
        self.required.contains(&action)
    }

    fn mark_action_fulfilled(&mut self, action: CouplingAction) -> Result<(), SubstrateError> {
        if self.required.remove(&action) {
            Ok(())
        } else {
            Err(SubstrateError::ActionNotRequired(action))
        }
    }

    fn initialize(&mut self) -> Result<f64, SubstrateError> {
        let config = self.config()?;
        let (implicit, initial_data) = (config.scheme == Scheme::Implicit, config.initial_data);

        if implicit {
            self.required.insert(CouplingAction::WriteIterationCheckpoint);
        }
        if initial_data {
            self.required.insert(CouplingAction::WriteInitialData);
        }
        self.started = true;

        tracing::info!(
            participant = self.participant.as_deref().unwrap_or("?"),
            vertices = self.vertices,
            implicit,
            "standalone substrate initialized"
        );
        Ok(self.next_step())
    }

    fn initialize_data(&mut self) -> Result<(), SubstrateError> {
        if self.required.contains(&CouplingAction::WriteInitialData) {
            return Err(SubstrateError::ActionPending(
                CouplingAction::WriteInitialData,
            ));
        }
        Ok(())
    }

    fn advance(&mut self, dt: f64) -> Result<f64, SubstrateError> {
        if !self.ongoing() {
            return Err(SubstrateError::CouplingEnded);
        }
        for action in [
            CouplingAction::WriteIterationCheckpoint,
            CouplingAction::ReadIterationCheckpoint,
        ] {
            if self.required.contains(&action) {
                return Err(SubstrateError::ActionPending(action));
            }
        }

        let config = self.config()?.clone();
        let window_end = self.window_end(&config);
        let remaining = window_end - self.time;
        let slack = TIME_EPS * config.max_time_window;
        if dt > remaining + slack {
            return Err(SubstrateError::StepTooLarge { dt, remaining });
        }

        self.advances += 1;
        self.time += dt;
        if window_end - self.time > slack {
            return Ok(self.next_step());
        }

        // The window is complete.
        self.time = window_end;
        if config.scheme == Scheme::Implicit {
            self.iteration += 1;
            if self.iteration < config.iterations {
                self.time = self.window_start;
                self.required.insert(CouplingAction::ReadIterationCheckpoint);
                return Ok(self.next_step());
            }
            self.iteration = 0;
        }

        self.window_start = window_end;
        if config.scheme == Scheme::Implicit && self.ongoing() {
            self.required.insert(CouplingAction::WriteIterationCheckpoint);
        }
        Ok(self.next_step())
    }

    fn is_coupling_ongoing(&self) -> bool {
        self.ongoing()
    }

    fn finalize(&mut self) -> Result<(), SubstrateError> {
        self.finalized = true;
        self.required.clear();
        tracing::info!(
            time = self.time,
            advances = self.advances,
            "standalone substrate finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn config(scheme: Scheme, iterations: usize) -> StandaloneConfig {
        StandaloneConfig {
            participant: Some("Solid".into()),
            mesh: "Solid-Mesh".into(),
            dimensions: 2,
            max_time_window: 0.5,
            end_time: 1.0,
            scheme,
            iterations,
            initial_data: false,
            data: vec!["Temperature".into(), "Heat-Flux".into()],
            peer: BTreeMap::from([("Heat-Flux".to_string(), 7.0)]),
        }
    }

    fn started(scheme: Scheme, iterations: usize) -> StandaloneSubstrate {
        let mut substrate = StandaloneSubstrate::from_config(config(scheme, iterations));
        substrate
            .configure("Solid", Path::new("unused.toml"), 0, 1)
            .unwrap();
        let mesh = substrate.mesh_id("Solid-Mesh").unwrap();
        substrate.set_mesh_vertices(mesh, &[0.0, 1.0, 0.5, 1.0]).unwrap();
        substrate
    }

    #[test]
    fn wrong_participant_is_rejected() {
        let mut substrate = StandaloneSubstrate::from_config(config(Scheme::Explicit, 1));
        assert!(matches!(
            substrate.configure("Fluid", Path::new("x"), 0, 1),
            Err(SubstrateError::UnknownParticipant { .. })
        ));
    }

    #[test]
    fn explicit_windows_with_subcycling() {
        let mut substrate = started(Scheme::Explicit, 1);
        assert_relative_eq!(substrate.initialize().unwrap(), 0.5);
        substrate.initialize_data().unwrap();

        assert_relative_eq!(substrate.advance(0.2).unwrap(), 0.3);
        assert_relative_eq!(substrate.advance(0.3).unwrap(), 0.5);
        assert!(matches!(
            substrate.advance(0.6),
            Err(SubstrateError::StepTooLarge { .. })
        ));
        assert_relative_eq!(substrate.advance(0.5).unwrap(), 0.0);
        assert!(!substrate.is_coupling_ongoing());
        assert!(!substrate.is_action_required(CouplingAction::WriteIterationCheckpoint));
    }

    #[test]
    fn implicit_windows_repeat_until_iterations_are_done() {
        let mut substrate = started(Scheme::Implicit, 2);
        substrate.initialize().unwrap();
        substrate.initialize_data().unwrap();

        let write = CouplingAction::WriteIterationCheckpoint;
        let read = CouplingAction::ReadIterationCheckpoint;

        assert!(substrate.is_action_required(write));
        substrate.mark_action_fulfilled(write).unwrap();

        substrate.advance(0.5).unwrap();
        assert!(substrate.is_action_required(read));
        assert_relative_eq!(substrate.time(), 0.0);
        assert!(matches!(
            substrate.advance(0.5),
            Err(SubstrateError::ActionPending(_))
        ));
        substrate.mark_action_fulfilled(read).unwrap();

        substrate.advance(0.5).unwrap();
        assert!(!substrate.is_action_required(read));
        assert!(substrate.is_action_required(write));
        assert_relative_eq!(substrate.time(), 0.5);
    }

    #[test]
    fn reads_peer_values_and_keeps_writes() {
        let mut substrate = started(Scheme::Explicit, 1);
        let mesh = MeshId(0);
        let flux = substrate.data_id("Heat-Flux", mesh).unwrap();
        let temperature = substrate.data_id("Temperature", mesh).unwrap();
        assert_eq!(substrate.data_id("Velocity", mesh), None);

        let ids = [VertexId(0), VertexId(1)];
        let mut values = [0.0; 2];
        substrate.read_block_data(flux, &ids, &mut values).unwrap();
        assert_eq!(values, [7.0, 7.0]);

        substrate
            .write_block_data(temperature, &ids, &[300.0, 301.0])
            .unwrap();
        assert_eq!(substrate.written("Temperature"), Some(&[300.0, 301.0][..]));
    }

    #[test]
    fn initial_data_must_be_written_first() {
        let mut cfg = config(Scheme::Explicit, 1);
        cfg.initial_data = true;
        let mut substrate = StandaloneSubstrate::from_config(cfg);
        substrate.configure("Solid", Path::new("x"), 0, 1).unwrap();
        substrate.initialize().unwrap();

        assert!(matches!(
            substrate.initialize_data(),
            Err(SubstrateError::ActionPending(CouplingAction::WriteInitialData))
        ));
        substrate
            .mark_action_fulfilled(CouplingAction::WriteInitialData)
            .unwrap();
        substrate.initialize_data().unwrap();
    }
}
