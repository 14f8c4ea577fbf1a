//! The participant's single entry point to the coupling substrate.
//!
//! A [`CouplingAdapter`] owns the substrate and everything derived from the
//! interface registration: the substrate vertex IDs, the [`IndexMapper`], and
//! one [`SurfaceBuffer`] per registered quantity. There is exactly one adapter
//! per participant process; it is created in `main` and lent by `&mut` to the
//! driver and the exchange policies.
//!
//! The adapter enforces the substrate's call order:
//!
//! ```text
//! Created ──announce_solver──▶ Announced ──set_mesh_and_initialize──▶ Initialized
//!     ──initialize_data──▶ DataInitialized ──advance…──▶ ──finalize──▶ Finalized
//! ```

mod buffer;

pub use buffer::SurfaceBuffer;

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use tandem_core::{
    CouplingAction, CouplingSubstrate, DataId, MeshId, Quantity, TimeIncrement, VertexId,
    framework::FaceIndex, seconds,
};
use uom::si::f64::Time;

use crate::{CouplingError, IndexMapper, InterfaceError};

/// Lifecycle of a [`CouplingAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Announced,
    Initialized,
    DataInitialized,
    Finalized,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Created => "created",
            State::Announced => "announced",
            State::Initialized => "initialized",
            State::DataInitialized => "data-initialized",
            State::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Announcement {
    name: String,
    config_file: PathBuf,
    rank: usize,
    size: usize,
}

#[derive(Debug)]
struct Mesh<F: FaceIndex> {
    name: String,
    id: MeshId,
    dimension: usize,
    coordinates: Vec<f64>,
    vertex_ids: Vec<VertexId>,
    mapper: IndexMapper<F>,
}

#[derive(Debug)]
struct RegisteredData {
    id: DataId,
    buffer: SurfaceBuffer,
}

/// Wraps a [`CouplingSubstrate`] for one participant rank.
pub struct CouplingAdapter<S: CouplingSubstrate, F: FaceIndex = usize> {
    substrate: S,
    state: State,
    announcement: Option<Announcement>,
    mesh: Option<Mesh<F>>,
    data: BTreeMap<Quantity, RegisteredData>,
}

impl<S: CouplingSubstrate, F: FaceIndex> CouplingAdapter<S, F> {
    /// Wraps a substrate. Nothing is sent to it until
    /// [`announce_solver`](Self::announce_solver).
    pub fn new(substrate: S) -> Self {
        Self {
            substrate,
            state: State::Created,
            announcement: None,
            mesh: None,
            data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// The wrapped substrate.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Consumes the adapter and returns the substrate.
    pub fn into_substrate(self) -> S {
        self.substrate
    }

    /// Announces this participant to the substrate.
    ///
    /// Repeating the call with identical arguments is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::AlreadyAnnounced`] if a different
    /// announcement was made, or a substrate error if configuration fails.
    pub fn announce_solver(
        &mut self,
        name: &str,
        config_file: impl AsRef<Path>,
        rank: usize,
        size: usize,
    ) -> Result<(), CouplingError> {
        let requested = Announcement {
            name: name.to_string(),
            config_file: config_file.as_ref().to_path_buf(),
            rank,
            size,
        };

        if let Some(announced) = &self.announcement {
            if *announced == requested && self.state != State::Finalized {
                return Ok(());
            }
            return Err(CouplingError::AlreadyAnnounced {
                announced: announced.name.clone(),
                requested: requested.name,
                rank: announced.rank,
                size: announced.size,
            });
        }
        self.expect_state("announce_solver", &[State::Created])?;

        self.substrate
            .configure(name, &requested.config_file, rank, size)
            .map_err(CouplingError::substrate)?;

        tracing::info!(
            participant = name,
            config = %requested.config_file.display(),
            rank,
            size,
            "announced solver to coupling substrate"
        );

        self.announcement = Some(requested);
        self.state = State::Announced;
        Ok(())
    }

    /// Registers the interface mesh and runs the substrate's setup handshake.
    ///
    /// `coordinates` is laid out `[x0, y0, (z0), x1, …]` and `faces[i]` is the
    /// solver-local face at `coordinates[i * dimension..]`. Every quantity the
    /// substrate configures on this mesh is registered and gets a zeroed
    /// [`SurfaceBuffer`].
    ///
    /// Returns the maximum coupling sub-step the substrate accepts.
    ///
    /// # Errors
    ///
    /// - [`CouplingError::MeshAlreadySet`] if a mesh was already registered.
    /// - [`InterfaceError::DimensionMismatch`] if `dimension` differs from the
    ///   substrate's.
    /// - [`InterfaceError::EmptyInterface`] for zero faces.
    /// - [`InterfaceError::CoordinateLength`] or
    ///   [`InterfaceError::DuplicateFace`] for malformed input.
    /// - A substrate error if registration or initialization fails.
    pub fn set_mesh_and_initialize(
        &mut self,
        mesh_name: &str,
        dimension: usize,
        coordinates: Vec<f64>,
        faces: Vec<F>,
    ) -> Result<Time, CouplingError> {
        if let Some(mesh) = &self.mesh {
            return Err(CouplingError::MeshAlreadySet {
                mesh: mesh.name.clone(),
            });
        }
        self.expect_state("set_mesh_and_initialize", &[State::Announced])?;

        let substrate_dimension = self.substrate.dimensions();
        if substrate_dimension != dimension {
            return Err(InterfaceError::DimensionMismatch {
                substrate: substrate_dimension,
                grid: dimension,
            }
            .into());
        }
        if faces.is_empty() {
            return Err(InterfaceError::EmptyInterface.into());
        }
        if coordinates.len() != dimension * faces.len() {
            return Err(InterfaceError::CoordinateLength {
                len: coordinates.len(),
                vertices: faces.len(),
                dimension,
            }
            .into());
        }

        let mapper = IndexMapper::new(faces)?;

        let id = self
            .substrate
            .mesh_id(mesh_name)
            .map_err(CouplingError::substrate)?;
        let vertex_ids = self
            .substrate
            .set_mesh_vertices(id, &coordinates)
            .map_err(CouplingError::substrate)?;
        if vertex_ids.len() != mapper.len() {
            return Err(CouplingError::VertexCount {
                expected: mapper.len(),
                got: vertex_ids.len(),
            });
        }

        for quantity in Quantity::ALL {
            if let Some(data_id) = self.substrate.data_id(quantity.data_name(), id) {
                self.data.insert(
                    quantity,
                    RegisteredData {
                        id: data_id,
                        buffer: SurfaceBuffer::new(quantity, mapper.len(), dimension),
                    },
                );
            }
        }

        tracing::info!(
            mesh = mesh_name,
            vertices = mapper.len(),
            quantities = ?self.data.keys().collect::<Vec<_>>(),
            "registered coupling mesh"
        );

        self.mesh = Some(Mesh {
            name: mesh_name.to_string(),
            id,
            dimension,
            coordinates,
            vertex_ids,
            mapper,
        });

        let max_dt = self
            .substrate
            .initialize()
            .map_err(CouplingError::substrate)?;
        self.state = State::Initialized;

        Ok(seconds(max_dt.max(0.0)))
    }

    /// Triggers the substrate's initial data exchange.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::UnacknowledgedAction`] if initial data was
    /// requested but not announced, or a substrate error.
    pub fn initialize_data(&mut self) -> Result<(), CouplingError> {
        self.expect_state("initialize_data", &[State::Initialized])?;
        self.ensure_acknowledged("initialize_data", &[CouplingAction::WriteInitialData])?;

        self.substrate
            .initialize_data()
            .map_err(CouplingError::substrate)?;
        self.state = State::DataInitialized;
        Ok(())
    }

    #[must_use]
    pub fn has_to_write_iteration_checkpoint(&self) -> bool {
        self.is_action_required(CouplingAction::WriteIterationCheckpoint)
    }

    #[must_use]
    pub fn has_to_read_iteration_checkpoint(&self) -> bool {
        self.is_action_required(CouplingAction::ReadIterationCheckpoint)
    }

    #[must_use]
    pub fn has_to_write_initial_data(&self) -> bool {
        self.is_action_required(CouplingAction::WriteInitialData)
    }

    /// Acknowledges a saved iteration checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::ActionNotRequired`] if no checkpoint was
    /// requested.
    pub fn announce_iteration_checkpoint_written(&mut self) -> Result<(), CouplingError> {
        self.fulfill(CouplingAction::WriteIterationCheckpoint)
    }

    /// Acknowledges a restored iteration checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::ActionNotRequired`] if no restore was
    /// requested.
    pub fn announce_iteration_checkpoint_read(&mut self) -> Result<(), CouplingError> {
        self.fulfill(CouplingAction::ReadIterationCheckpoint)
    }

    /// Acknowledges written initial data.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::ActionNotRequired`] if no initial data was
    /// requested.
    pub fn announce_initial_data_written(&mut self) -> Result<(), CouplingError> {
        self.fulfill(CouplingAction::WriteInitialData)
    }

    /// Returns `true` if `quantity` is exchanged by this participant.
    #[must_use]
    pub fn is_registered(&self, quantity: Quantity) -> bool {
        self.data.contains_key(&quantity)
    }

    /// Fills the buffer of `quantity` from the substrate.
    ///
    /// Returns `Ok(false)` without touching the substrate if `quantity` is not
    /// registered on this participant.
    ///
    /// # Errors
    ///
    /// Returns an error if called before mesh registration or if the
    /// substrate read fails.
    pub fn read_from_other_solver(&mut self, quantity: Quantity) -> Result<bool, CouplingError> {
        self.expect_state(
            "read_from_other_solver",
            &[State::Initialized, State::DataInitialized],
        )?;
        let (Some(mesh), Some(data)) = (&self.mesh, self.data.get_mut(&quantity)) else {
            return Ok(false);
        };

        self.substrate
            .read_block_data(data.id, &mesh.vertex_ids, data.buffer.values_mut())
            .map_err(CouplingError::substrate)?;
        Ok(true)
    }

    /// Sends the buffer of `quantity` to the substrate.
    ///
    /// Returns `Ok(false)` without touching the substrate if `quantity` is not
    /// registered on this participant.
    ///
    /// # Errors
    ///
    /// Returns an error if called before mesh registration or if the
    /// substrate write fails.
    pub fn write_to_other_solver(&mut self, quantity: Quantity) -> Result<bool, CouplingError> {
        self.expect_state(
            "write_to_other_solver",
            &[State::Initialized, State::DataInitialized],
        )?;
        let (Some(mesh), Some(data)) = (&self.mesh, self.data.get(&quantity)) else {
            return Ok(false);
        };

        self.substrate
            .write_block_data(data.id, &mesh.vertex_ids, data.buffer.values())
            .map_err(CouplingError::substrate)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// See [`read_from_other_solver`](Self::read_from_other_solver).
    pub fn read_heat_flux_from_other_solver(&mut self) -> Result<bool, CouplingError> {
        self.read_from_other_solver(Quantity::HeatFlux)
    }

    /// # Errors
    ///
    /// See [`read_from_other_solver`](Self::read_from_other_solver).
    pub fn read_temperature_from_other_solver(&mut self) -> Result<bool, CouplingError> {
        self.read_from_other_solver(Quantity::Temperature)
    }

    /// # Errors
    ///
    /// See [`write_to_other_solver`](Self::write_to_other_solver).
    pub fn write_heat_flux_to_other_solver(&mut self) -> Result<bool, CouplingError> {
        self.write_to_other_solver(Quantity::HeatFlux)
    }

    /// # Errors
    ///
    /// See [`write_to_other_solver`](Self::write_to_other_solver).
    pub fn write_temperature_to_other_solver(&mut self) -> Result<bool, CouplingError> {
        self.write_to_other_solver(Quantity::Temperature)
    }

    /// Values of `quantity` on an interface face.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceError::UnknownFace`] for faces off the interface and
    /// [`CouplingError::QuantityNotRegistered`] for unregistered quantities.
    pub fn value_on_face(&self, quantity: Quantity, face: F) -> Result<&[f64], CouplingError> {
        let index = self.index_of(face)?;
        Ok(self.buffer(quantity)?.get(index))
    }

    /// Stores values of `quantity` on an interface face in the outbound
    /// buffer.
    ///
    /// # Errors
    ///
    /// As [`value_on_face`](Self::value_on_face), plus
    /// [`CouplingError::ComponentMismatch`] for a wrong number of values.
    pub fn write_value_on_face(
        &mut self,
        quantity: Quantity,
        face: F,
        values: &[f64],
    ) -> Result<(), CouplingError> {
        let index = self.index_of(face)?;
        let data = self
            .data
            .get_mut(&quantity)
            .ok_or(CouplingError::QuantityNotRegistered { quantity })?;
        data.buffer.set(index, values)
    }

    /// # Errors
    ///
    /// See [`value_on_face`](Self::value_on_face).
    pub fn get_heat_flux_on_face(&self, face: F) -> Result<f64, CouplingError> {
        Ok(self.value_on_face(Quantity::HeatFlux, face)?[0])
    }

    /// # Errors
    ///
    /// See [`value_on_face`](Self::value_on_face).
    pub fn get_temperature_on_face(&self, face: F) -> Result<f64, CouplingError> {
        Ok(self.value_on_face(Quantity::Temperature, face)?[0])
    }

    /// # Errors
    ///
    /// See [`write_value_on_face`](Self::write_value_on_face).
    pub fn write_heat_flux_on_face(&mut self, face: F, value: f64) -> Result<(), CouplingError> {
        self.write_value_on_face(Quantity::HeatFlux, face, &[value])
    }

    /// # Errors
    ///
    /// See [`write_value_on_face`](Self::write_value_on_face).
    pub fn write_temperature_on_face(&mut self, face: F, value: f64) -> Result<(), CouplingError> {
        self.write_value_on_face(Quantity::Temperature, face, &[value])
    }

    /// The buffer of a registered quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::QuantityNotRegistered`] for unregistered
    /// quantities.
    pub fn buffer(&self, quantity: Quantity) -> Result<&SurfaceBuffer, CouplingError> {
        self.data
            .get(&quantity)
            .map(|data| &data.buffer)
            .ok_or(CouplingError::QuantityNotRegistered { quantity })
    }

    /// Returns `true` if `face` lies on the registered interface.
    #[must_use]
    pub fn is_coupled_entity(&self, face: F) -> bool {
        self.mesh
            .as_ref()
            .is_some_and(|mesh| mesh.mapper.contains(face))
    }

    /// Commits the current iteration and returns the next admissible sub-step.
    ///
    /// The returned time is zero once the substrate has ended the coupling.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::UnacknowledgedAction`] if a checkpoint action
    /// is still outstanding, or a substrate error.
    pub fn advance(&mut self, dt_used: TimeIncrement) -> Result<Time, CouplingError> {
        self.expect_state("advance", &[State::DataInitialized])?;
        self.ensure_acknowledged(
            "advance",
            &[
                CouplingAction::WriteIterationCheckpoint,
                CouplingAction::ReadIterationCheckpoint,
            ],
        )?;

        let next = self
            .substrate
            .advance(dt_used.seconds())
            .map_err(CouplingError::substrate)?;

        tracing::debug!(dt_used = dt_used.seconds(), next, "advanced coupling");
        Ok(seconds(next.max(0.0)))
    }

    /// Returns `false` once the coupled run has ended or the adapter is
    /// finalized.
    #[must_use]
    pub fn is_coupling_ongoing(&self) -> bool {
        self.state != State::Finalized && self.substrate.is_coupling_ongoing()
    }

    /// Releases substrate resources. Only dropping the adapter is legal
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::InvalidState`] if never announced or already
    /// finalized, or a substrate error.
    pub fn finalize(&mut self) -> Result<(), CouplingError> {
        self.expect_state(
            "finalize",
            &[State::Announced, State::Initialized, State::DataInitialized],
        )?;
        self.state = State::Finalized;
        self.substrate.finalize().map_err(CouplingError::substrate)?;

        tracing::info!("finalized coupling adapter");
        Ok(())
    }

    /// Spatial dimension of the coupling configuration.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.substrate.dimensions()
    }

    /// Number of interface vertices on this rank.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.mesh.as_ref().map_or(0, |mesh| mesh.mapper.len())
    }

    /// Interface faces in vertex-index order.
    pub fn interface_faces(&self) -> impl Iterator<Item = F> + '_ {
        self.mesh.iter().flat_map(|mesh| mesh.mapper.faces())
    }

    fn index_of(&self, face: F) -> Result<usize, CouplingError> {
        match &self.mesh {
            Some(mesh) => Ok(mesh.mapper.to_index(face)?),
            None => Err(InterfaceError::unknown_face(face).into()),
        }
    }

    fn is_action_required(&self, action: CouplingAction) -> bool {
        self.state != State::Finalized && self.substrate.is_action_required(action)
    }

    fn fulfill(&mut self, action: CouplingAction) -> Result<(), CouplingError> {
        self.expect_state(
            action.name(),
            &[State::Initialized, State::DataInitialized],
        )?;
        if !self.substrate.is_action_required(action) {
            return Err(CouplingError::ActionNotRequired { action });
        }
        self.substrate
            .mark_action_fulfilled(action)
            .map_err(CouplingError::substrate)
    }

    fn ensure_acknowledged(
        &self,
        operation: &'static str,
        actions: &[CouplingAction],
    ) -> Result<(), CouplingError> {
        match actions
            .iter()
            .find(|action| self.substrate.is_action_required(**action))
        {
            Some(&action) => Err(CouplingError::UnacknowledgedAction { action, operation }),
            None => Ok(()),
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[State],
    ) -> Result<(), CouplingError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CouplingError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }
}

/// Prints the interface table: one row per vertex with its face, substrate
/// vertex ID, coordinates, and buffered values.
impl<S: CouplingSubstrate, F: FaceIndex> fmt::Display for CouplingAdapter<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(mesh) = &self.mesh else {
            return writeln!(f, "coupling adapter ({}), no mesh", self.state.name());
        };

        writeln!(
            f,
            "coupling adapter ({}), mesh `{}` ({:?}), {} vertices",
            self.state.name(),
            mesh.name,
            mesh.id,
            mesh.mapper.len()
        )?;
        for (index, face) in mesh.mapper.faces().enumerate() {
            let position = &mesh.coordinates[index * mesh.dimension..(index + 1) * mesh.dimension];
            write!(
                f,
                "  [{index}] face {face:?} -> vertex {} at {position:?}",
                mesh.vertex_ids[index].0
            )?;
            for (quantity, data) in &self.data {
                write!(f, " {quantity}={:?}", data.buffer.get(index))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use tandem_core::as_seconds;

    /// Substrate double with one mesh, configurable data and actions.
    #[derive(Debug, Default)]
    struct FakeSubstrate {
        dimensions: usize,
        data: Vec<&'static str>,
        required: Vec<CouplingAction>,
        peer_value: f64,
        initial_dt: f64,
        written: Vec<(DataId, Vec<f64>)>,
        ongoing: bool,
        finalized: usize,
    }

    impl FakeSubstrate {
        fn heat(dimensions: usize) -> Self {
            Self {
                dimensions,
                data: vec!["Temperature", "Heat-Flux"],
                peer_value: 2.5,
                initial_dt: 0.1,
                ongoing: true,
                ..Self::default()
            }
        }
    }

    impl CouplingSubstrate for FakeSubstrate {
        type Error = Infallible;

        fn configure(&mut self, _: &str, _: &Path, _: usize, _: usize) -> Result<(), Infallible> {
            Ok(())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn mesh_id(&self, _mesh_name: &str) -> Result<MeshId, Infallible> {
            Ok(MeshId(0))
        }

        fn set_mesh_vertices(
            &mut self,
            _mesh: MeshId,
            coordinates: &[f64],
        ) -> Result<Vec<VertexId>, Infallible> {
            let n = coordinates.len() / self.dimensions;
            Ok((0..n).map(|i| VertexId(100 + i)).collect())
        }

        fn data_id(&self, data_name: &str, _mesh: MeshId) -> Option<DataId> {
            self.data.iter().position(|d| *d == data_name).map(DataId)
        }

        fn read_block_data(
            &mut self,
            _data: DataId,
            vertex_ids: &[VertexId],
            values: &mut [f64],
        ) -> Result<(), Infallible> {
            assert_eq!(vertex_ids.first(), Some(&VertexId(100)));
            values.fill(self.peer_value);
            Ok(())
        }

        fn write_block_data(
            &mut self,
            data: DataId,
            _vertex_ids: &[VertexId],
            values: &[f64],
        ) -> Result<(), Infallible> {
            self.written.push((data, values.to_vec()));
            Ok(())
        }

        fn is_action_required(&self, action: CouplingAction) -> bool {
            self.required.contains(&action)
        }

        fn mark_action_fulfilled(&mut self, action: CouplingAction) -> Result<(), Infallible> {
            self.required.retain(|a| *a != action);
            Ok(())
        }

        fn initialize(&mut self) -> Result<f64, Infallible> {
            Ok(self.initial_dt)
        }

        fn initialize_data(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn advance(&mut self, dt: f64) -> Result<f64, Infallible> {
            Ok(dt / 2.0)
        }

        fn is_coupling_ongoing(&self) -> bool {
            self.ongoing
        }

        fn finalize(&mut self) -> Result<(), Infallible> {
            self.finalized += 1;
            Ok(())
        }
    }

    fn ready_adapter(substrate: FakeSubstrate) -> CouplingAdapter<FakeSubstrate> {
        let mut adapter = CouplingAdapter::new(substrate);
        adapter
            .announce_solver("Solid", "precice-config.xml", 0, 1)
            .unwrap();
        adapter
            .set_mesh_and_initialize(
                "SolidMesh",
                2,
                vec![0.0, 1.0, 0.5, 1.0, 1.0, 1.0],
                vec![7, 9, 11],
            )
            .unwrap();
        adapter
    }

    #[test]
    fn announce_is_idempotent_only_with_identical_arguments() {
        let mut adapter = CouplingAdapter::<_, usize>::new(FakeSubstrate::heat(2));
        adapter.announce_solver("Solid", "a.xml", 0, 1).unwrap();
        adapter.announce_solver("Solid", "a.xml", 0, 1).unwrap();

        let err = adapter.announce_solver("Fluid", "a.xml", 0, 1).unwrap_err();
        assert!(matches!(err, CouplingError::AlreadyAnnounced { .. }));
    }

    #[test]
    fn mesh_before_announce_is_rejected() {
        let mut adapter = CouplingAdapter::new(FakeSubstrate::heat(2));
        let err = adapter
            .set_mesh_and_initialize("Mesh", 2, vec![0.0, 0.0], vec![1_usize])
            .unwrap_err();
        assert!(matches!(err, CouplingError::InvalidState { .. }));
    }

    #[test]
    fn set_mesh_registers_quantities_and_returns_max_dt() {
        let mut adapter = CouplingAdapter::new(FakeSubstrate::heat(2));
        adapter.announce_solver("Solid", "c.xml", 0, 1).unwrap();
        let max_dt = adapter
            .set_mesh_and_initialize("SolidMesh", 2, vec![0.0, 1.0, 1.0, 1.0], vec![3, 4])
            .unwrap();

        assert_relative_eq!(as_seconds(max_dt), 0.1);
        assert_eq!(adapter.number_of_vertices(), 2);
        assert!(adapter.is_registered(Quantity::HeatFlux));
        assert!(!adapter.is_registered(Quantity::Velocity));
        assert!(adapter.is_coupled_entity(4));
        assert!(!adapter.is_coupled_entity(5));
    }

    #[test]
    fn negative_initial_sub_step_is_clamped_to_zero() {
        let substrate = FakeSubstrate {
            initial_dt: -1e-12,
            ..FakeSubstrate::heat(2)
        };
        let mut adapter = CouplingAdapter::new(substrate);
        adapter.announce_solver("Solid", "c.xml", 0, 1).unwrap();
        let max_dt = adapter
            .set_mesh_and_initialize("SolidMesh", 2, vec![0.0, 1.0], vec![3])
            .unwrap();

        assert_eq!(as_seconds(max_dt), 0.0);
    }

    #[test]
    fn second_mesh_fails() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        let err = adapter
            .set_mesh_and_initialize("Other", 2, vec![0.0, 0.0], vec![1])
            .unwrap_err();
        assert!(matches!(err, CouplingError::MeshAlreadySet { .. }));
    }

    #[test]
    fn dimension_mismatch_fails_before_registration() {
        let mut adapter = CouplingAdapter::new(FakeSubstrate::heat(3));
        adapter.announce_solver("Solid", "c.xml", 0, 1).unwrap();
        let err = adapter
            .set_mesh_and_initialize("SolidMesh", 2, vec![0.0, 1.0], vec![3_usize])
            .unwrap_err();

        assert!(matches!(
            err,
            CouplingError::Interface(InterfaceError::DimensionMismatch {
                substrate: 3,
                grid: 2
            })
        ));
        assert_eq!(adapter.number_of_vertices(), 0);
    }

    #[test]
    fn empty_interface_is_rejected() {
        let mut adapter = CouplingAdapter::<_, usize>::new(FakeSubstrate::heat(2));
        adapter.announce_solver("Solid", "c.xml", 0, 1).unwrap();
        let err = adapter
            .set_mesh_and_initialize("SolidMesh", 2, vec![], vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            CouplingError::Interface(InterfaceError::EmptyInterface)
        ));
    }

    #[test]
    fn read_fills_buffer_and_face_access_uses_the_mapper() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        assert!(adapter.read_heat_flux_from_other_solver().unwrap());

        assert_relative_eq!(adapter.get_heat_flux_on_face(9).unwrap(), 2.5);
        assert!(matches!(
            adapter.get_heat_flux_on_face(8),
            Err(CouplingError::Interface(InterfaceError::UnknownFace { .. }))
        ));
    }

    #[test]
    fn write_sends_values_in_index_order() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        adapter.write_temperature_on_face(11, 3.0).unwrap();
        adapter.write_temperature_on_face(7, 1.0).unwrap();
        assert!(adapter.write_temperature_to_other_solver().unwrap());

        let substrate = adapter.substrate();
        assert_eq!(substrate.written, vec![(DataId(0), vec![1.0, 0.0, 3.0])]);
    }

    #[test]
    fn unregistered_quantity_transfer_is_a_no_op() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        assert!(!adapter.read_from_other_solver(Quantity::Pressure).unwrap());
        assert!(!adapter.write_to_other_solver(Quantity::Velocity).unwrap());
        assert!(adapter.substrate().written.is_empty());
    }

    #[test]
    fn unacknowledged_checkpoint_blocks_advance() {
        let mut substrate = FakeSubstrate::heat(2);
        substrate.required = vec![CouplingAction::WriteIterationCheckpoint];
        let mut adapter = ready_adapter(substrate);
        adapter.initialize_data().unwrap();

        assert!(adapter.has_to_write_iteration_checkpoint());
        let dt = TimeIncrement::from_seconds(0.1).unwrap();
        assert!(matches!(
            adapter.advance(dt),
            Err(CouplingError::UnacknowledgedAction { .. })
        ));

        adapter.announce_iteration_checkpoint_written().unwrap();
        let next = adapter.advance(dt).unwrap();
        assert_relative_eq!(as_seconds(next), 0.05);
    }

    #[test]
    fn acknowledging_an_unrequired_action_fails() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        assert!(matches!(
            adapter.announce_iteration_checkpoint_read(),
            Err(CouplingError::ActionNotRequired { .. })
        ));
    }

    #[test]
    fn finalize_happens_once() {
        let mut adapter = ready_adapter(FakeSubstrate::heat(2));
        adapter.finalize().unwrap();

        assert!(!adapter.is_coupling_ongoing());
        assert!(matches!(
            adapter.finalize(),
            Err(CouplingError::InvalidState { .. })
        ));
        assert_eq!(adapter.substrate().finalized, 1);
    }

    #[test]
    fn display_lists_every_vertex() {
        let adapter = ready_adapter(FakeSubstrate::heat(2));
        let table = adapter.to_string();
        assert!(table.contains("3 vertices"));
        assert!(table.contains("face 11 -> vertex 102"));
    }
}
