use std::collections::BTreeMap;

use approx::assert_relative_eq;
use nalgebra::DVector;
use tandem_core::{CouplingClock, TimeIncrement, framework::Problem, seconds};
use tandem_coupling::{CouplingAdapter, ExchangePolicy};
use tandem_driver::subcycling::{self, Participant, StartupConfig, Status};
use tandem_heat::{
    BoundaryCondition, HeatAssembler, HeatNewton, HeatProblem, LegacyVtkWriter, Material,
    NewtonConfig, RectGrid, Scheme, Side, StandaloneConfig, StandaloneSubstrate,
};

fn run_solid(peer_heat_flux: f64, scheme: Scheme, iterations: usize) -> (Vec<f64>, usize) {
    let grid = RectGrid::new([0.0, 0.0], [1.0, 0.5], [4, 2]).unwrap();
    let problem = HeatProblem::new("solid", grid.clone(), Material::constant(1.0, 1.0), 300.0)
        .with_boundary(Side::Bottom, BoundaryCondition::Dirichlet(350.0))
        .with_boundary(Side::Top, BoundaryCondition::Coupled);

    let mut solution = DVector::zeros(grid.num_cells());
    problem.apply_initial_solution(&mut solution);

    let dir = std::env::temp_dir().join(format!(
        "tandem-heat-{:?}-{}-{}",
        scheme,
        peer_heat_flux,
        std::process::id()
    ));
    let vtk = LegacyVtkWriter::new(&dir, "solid", grid).unwrap();
    let dt = TimeIncrement::from_seconds(0.1).unwrap();
    let clock = CouplingClock::new(seconds(0.0), dt, seconds(20.0));
    let newton = HeatNewton::new(NewtonConfig::default()).unwrap();
    let mut participant =
        Participant::new(HeatAssembler::new(problem), newton, clock, vtk, solution).unwrap();

    let config = StandaloneConfig {
        participant: Some("Solid".into()),
        mesh: "Solid-Mesh".into(),
        dimensions: 2,
        max_time_window: 0.5,
        end_time: 20.0,
        scheme,
        iterations,
        initial_data: true,
        data: vec!["Temperature".into(), "Heat-Flux".into()],
        peer: BTreeMap::from([("Heat-Flux".to_string(), peer_heat_flux)]),
    };
    let mut adapter = CouplingAdapter::new(StandaloneSubstrate::from_config(config));
    adapter
        .announce_solver("Solid", "unused.toml", 0, 1)
        .unwrap();

    let exchange = ExchangePolicy::solid_energy();
    let startup = StartupConfig::new("Solid-Mesh", Side::Top.extractor(), dt);
    let started = subcycling::startup(&mut adapter, &mut participant, &exchange, &startup).unwrap();
    assert!(started.wrote_initial_data);
    assert_eq!(started.vertices, 4);

    let result = subcycling::run_unobserved(&mut adapter, &mut participant, &exchange).unwrap();
    assert_eq!(result.status, Status::Finished);
    assert_eq!(participant.vtk().frames().len(), result.accepted_steps);

    let written = adapter
        .substrate()
        .written("Temperature")
        .unwrap()
        .to_vec();
    std::fs::remove_dir_all(&dir).unwrap();
    (written, result.rollbacks)
}

#[test]
fn adiabatic_peer_relaxes_to_the_bottom_temperature() {
    let (written, rollbacks) = run_solid(0.0, Scheme::Explicit, 1);
    assert_eq!(rollbacks, 0);
    for temperature in written {
        assert_relative_eq!(temperature, 350.0, epsilon = 1e-6);
    }
}

#[test]
fn heated_interface_reaches_the_linear_profile() {
    // q H / λ = 100 · 0.5 / 1 above the bottom temperature.
    let (written, rollbacks) = run_solid(100.0, Scheme::Implicit, 2);
    assert_eq!(rollbacks, 40);
    for temperature in written {
        assert_relative_eq!(temperature, 400.0, epsilon = 1e-6);
    }
}
