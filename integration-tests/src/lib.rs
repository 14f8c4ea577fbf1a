//! Shared fixtures for cross-crate tests: a scripted coupling substrate and
//! counting fakes for the framework contracts.

pub mod framework;
pub mod substrate;

use framework::{
    CountingClock, FakeAssembler, FakeNewton, FakeProblem, FakeVariables, RecordingVtk,
    StripGeometry,
};
use substrate::{Script, ScriptedSubstrate};
use tandem_core::{CouplingClock, TimeIncrement, seconds};
use tandem_coupling::{BoundarySide, CouplingAdapter, InterfaceExtractor};
use tandem_driver::subcycling::{Participant, StartupConfig};

pub type FakeParticipant = Participant<FakeAssembler, FakeNewton, CountingClock, RecordingVtk>;

pub type FakeAdapter = CouplingAdapter<ScriptedSubstrate>;

/// Newton's step suggestion in every scenario.
pub const NEWTON_SUGGESTION: f64 = 0.2;

/// A fake participant on a 2-D strip with `faces` faces per edge, running
/// from 0 to `t_end`.
///
/// # Panics
///
/// Panics if `dt` is not positive.
#[must_use]
pub fn participant(faces: usize, t_end: f64, dt: f64) -> FakeParticipant {
    let problem = FakeProblem {
        geometry: StripGeometry {
            dimension: 2,
            faces_per_edge: faces,
        },
        received: Vec::new(),
    };
    let assembler = FakeAssembler {
        problem,
        variables: FakeVariables::default(),
        previous: vec![0.0],
        previous_sets: 0,
    };
    let newton = FakeNewton {
        suggestion: NEWTON_SUGGESTION,
        iterations: 3,
        solves: 0,
    };
    let clock = CountingClock {
        inner: CouplingClock::new(seconds(0.0), step(dt), seconds(t_end)),
        finalized: 0,
    };

    match Participant::new(assembler, newton, clock, RecordingVtk::default(), vec![0.0]) {
        Ok(participant) => participant,
        Err(err) => panic!("fake participant failed to build: {err}"),
    }
}

/// An adapter over a scripted substrate, already announced.
///
/// # Panics
///
/// Panics if the announcement fails.
#[must_use]
pub fn adapter(script: Script) -> FakeAdapter {
    let mut adapter = CouplingAdapter::new(ScriptedSubstrate::new(script));
    if let Err(err) = adapter.announce_solver("Fake", "scripted.toml", 0, 1) {
        panic!("announcement failed: {err}");
    }
    adapter
}

/// Couples the top edge of the strip.
#[must_use]
pub fn startup_config(dt: f64) -> StartupConfig {
    StartupConfig::new(
        "Fake-Mesh",
        InterfaceExtractor::new(1, BoundarySide::Max),
        step(dt),
    )
}

/// # Panics
///
/// Panics if `dt` is not positive.
#[must_use]
pub fn step(dt: f64) -> TimeIncrement {
    match TimeIncrement::from_seconds(dt) {
        Ok(dt) => dt,
        Err(err) => panic!("bad step: {err}"),
    }
}
