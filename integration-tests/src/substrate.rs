use std::{collections::BTreeSet, path::Path};

use tandem_core::{CouplingAction, CouplingSubstrate, DataId, MeshId, Quantity, VertexId};
use thiserror::Error;

const TIME_EPS: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("mesh `{0}` is not scripted")]
    UnknownMesh(String),

    #[error("action `{0}` was not required")]
    NotRequired(CouplingAction),

    #[error("coupling already ended")]
    Ended,
}

/// What the scripted peer does.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub mesh: String,
    pub dimension: usize,

    /// Sub-step returned by `initialize`.
    pub initial_dt: f64,

    /// Sub-steps returned after each committed step; the last one repeats.
    pub sub_steps: Vec<f64>,

    /// Passes per step; more than one makes the coupling implicit.
    pub iterations: usize,

    /// Coupling time at which the peer stops.
    pub end_time: f64,

    pub initial_data: bool,

    /// Quantities the peer exchanges.
    pub data: Vec<Quantity>,

    /// Value the peer sends for every read.
    pub peer_value: f64,
}

impl Script {
    /// An explicit peer exchanging heat flux and temperature with a fixed
    /// sub-step of 0.1 s until `t = 1`.
    #[must_use]
    pub fn explicit() -> Self {
        Self {
            mesh: "Fake-Mesh".into(),
            dimension: 2,
            initial_dt: 0.1,
            sub_steps: vec![0.1],
            iterations: 1,
            end_time: 1.0,
            initial_data: false,
            data: vec![Quantity::Temperature, Quantity::HeatFlux],
            peer_value: 5.0,
        }
    }

    #[must_use]
    pub fn implicit(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::explicit()
        }
    }
}

/// Everything the driver did to the substrate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub configured: usize,
    pub registered_vertices: Vec<usize>,
    pub reads: usize,
    pub writes: usize,
    pub last_written: Vec<f64>,

    /// `(dt passed in, sub-step returned, committed)` per `advance` call.
    pub advances: Vec<(f64, f64, bool)>,
    pub fulfilled: Vec<CouplingAction>,
    pub initialize_data: usize,
    pub finalized: usize,
}

impl Record {
    /// Number of times `action` was acknowledged.
    #[must_use]
    pub fn fulfilled(&self, action: CouplingAction) -> usize {
        self.fulfilled.iter().filter(|a| **a == action).count()
    }
}

/// A coupling substrate that follows a [`Script`] and records every call.
#[derive(Debug, Clone)]
pub struct ScriptedSubstrate {
    script: Script,
    record: Record,
    time: f64,
    pass: usize,
    steps: usize,
    required: BTreeSet<CouplingAction>,
}

impl ScriptedSubstrate {
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            record: Record::default(),
            time: 0.0,
            pass: 0,
            steps: 0,
            required: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    fn sub_step(&self) -> f64 {
        let script = &self.script;
        if !self.is_coupling_ongoing() {
            0.0
        } else if self.steps == 0 {
            script.initial_dt
        } else {
            script
                .sub_steps
                .get(self.steps - 1)
                .or(script.sub_steps.last())
                .copied()
                .unwrap_or(script.initial_dt)
        }
    }
}

impl CouplingSubstrate for ScriptedSubstrate {
    type Error = ScriptError;

    fn configure(
        &mut self,
        _participant: &str,
        _config_file: &Path,
        _rank: usize,
        _size: usize,
    ) -> Result<(), ScriptError> {
        self.record.configured += 1;
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.script.dimension
    }

    fn mesh_id(&self, mesh_name: &str) -> Result<MeshId, ScriptError> {
        if mesh_name == self.script.mesh {
            Ok(MeshId(7))
        } else {
            Err(ScriptError::UnknownMesh(mesh_name.to_string()))
        }
    }

    fn set_mesh_vertices(
        &mut self,
        _mesh: MeshId,
        coordinates: &[f64],
    ) -> Result<Vec<VertexId>, ScriptError> {
        let n = coordinates.len() / self.script.dimension;
        self.record.registered_vertices.push(n);
        Ok((0..n).map(|i| VertexId(1000 + i)).collect())
    }

    fn data_id(&self, data_name: &str, _mesh: MeshId) -> Option<DataId> {
        let quantity = data_name.parse::<Quantity>().ok()?;
        self.script
            .data
            .iter()
            .position(|q| *q == quantity)
            .map(DataId)
    }

    fn read_block_data(
        &mut self,
        _data: DataId,
        _vertex_ids: &[VertexId],
        values: &mut [f64],
    ) -> Result<(), ScriptError> {
        self.record.reads += 1;
        values.fill(self.script.peer_value);
        Ok(())
    }

    fn write_block_data(
        &mut self,
        _data: DataId,
        _vertex_ids: &[VertexId],
        values: &[f64],
    ) -> Result<(), ScriptError> {
        self.record.writes += 1;
        self.record.last_written = values.to_vec();
        Ok(())
    }

    fn is_action_required(&self, action: CouplingAction) -> bool {
        self.required.contains(&action)
    }

    fn mark_action_fulfilled(&mut self, action: CouplingAction) -> Result<(), ScriptError> {
        if !self.required.remove(&action) {
            return Err(ScriptError::NotRequired(action));
        }
        self.record.fulfilled.push(action);
        Ok(())
    }

    fn initialize(&mut self) -> Result<f64, ScriptError> {
        if self.script.iterations > 1 {
            self.required.insert(CouplingAction::WriteIterationCheckpoint);
        }
        if self.script.initial_data {
            self.required.insert(CouplingAction::WriteInitialData);
        }
        Ok(self.sub_step())
    }

    fn initialize_data(&mut self) -> Result<(), ScriptError> {
        self.record.initialize_data += 1;
        Ok(())
    }

    fn advance(&mut self, dt: f64) -> Result<f64, ScriptError> {
        if !self.is_coupling_ongoing() {
            return Err(ScriptError::Ended);
        }

        self.pass += 1;
        let committed = self.pass >= self.script.iterations;
        if committed {
            self.pass = 0;
            self.steps += 1;
            self.time += dt;
            if self.script.iterations > 1 && self.is_coupling_ongoing() {
                self.required.insert(CouplingAction::WriteIterationCheckpoint);
            }
        } else {
            self.required.insert(CouplingAction::ReadIterationCheckpoint);
        }

        let next = if committed { self.sub_step() } else { dt };
        self.record.advances.push((dt, next, committed));
        Ok(next)
    }

    fn is_coupling_ongoing(&self) -> bool {
        self.record.finalized == 0 && self.time < self.script.end_time - TIME_EPS
    }

    fn finalize(&mut self) -> Result<(), ScriptError> {
        self.record.finalized += 1;
        Ok(())
    }
}
