//! # blochlab
//!
//! Orchestration core for a two-qubit "quantum lab" demonstration: two
//! Bloch-style 3D state-vector indicators, a timed pulse-schedule animation
//! (Hadamard, then CNOT), and an experiment controller that queries a
//! circuit-execution backend and maps the returned measurement probabilities
//! onto the visualizations.
//!
//! This crate does not simulate anything itself. Probabilities come from an
//! external service (`POST /api/run_circuit`), and 3D drawing is behind the
//! [`render::IndicatorScene`] trait so any rendering engine can plug in.
//!
//! ## Modules
//!
//! - [`vector`]: semantic indicator state (`Up`/`Down`/`Mixed`)
//! - [`render`]: render-loop tasks and the rendering seam
//! - [`pulse`]: the fixed gate pulse schedule
//! - [`backend`]: circuit-execution backend client and wire types
//! - [`lab`]: shared lab state, experiment controller, reset
//! - [`error`]: error taxonomy

pub mod backend;
pub mod error;
pub mod lab;
pub mod pulse;
pub mod render;
pub mod vector;

/// Prelude module for convenient imports.
///
/// ```
/// use blochlab::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::{
        CircuitBackend, HttpCircuitBackend, OutcomeDistribution, RunRequest, OUTCOME_KEYS,
    };
    pub use crate::error::LabError;
    pub use crate::lab::{ExperimentController, LabState, QUBIT_COUNT};
    pub use crate::pulse::{PulseStage, PULSE_SCHEDULE};
    pub use crate::render::{HeadlessScene, IndicatorScene, RenderLoop, ViewportSize};
    pub use crate::vector::{VectorIndicator, VisualizationState};
}
