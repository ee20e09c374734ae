//! The fixed gate pulse schedule.
//!
//! One immutable four-stage sequence (start → H → CNOT → end) representing
//! gate application progress along a linear track. Both qubit markers play
//! it in lockstep; there is no per-qubit timing and no branching on results.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time;

use crate::lab::LabState;

/// Duration of the linear marker position transition between stages.
///
/// Independent of the stage holds below; each hold is long enough for the
/// transition to finish before the next stage begins.
pub const MARKER_TRANSITION_MILLIS: u64 = 600;

/// One stage of the pulse schedule.
#[derive(Debug, Clone, Copy)]
pub struct PulseStage {
    /// Marker position along the track, 0–100.
    pub track_percent: f32,
    /// Status line to show when this stage begins, if any.
    pub status: Option<&'static str>,
    /// Time-gate before the next stage.
    pub hold: Duration,
}

/// The schedule: start, H-gate, CNOT, end. Cumulative hold is 2400ms.
pub const PULSE_SCHEDULE: [PulseStage; 4] = [
    PulseStage {
        track_percent: 0.0,
        status: None,
        hold: Duration::from_millis(200),
    },
    PulseStage {
        track_percent: 18.0,
        status: Some("H-Gate: Applying Superposition..."),
        hold: Duration::from_millis(800),
    },
    PulseStage {
        track_percent: 50.0,
        status: Some("CNOT: Entangling Qubits..."),
        hold: Duration::from_millis(800),
    },
    PulseStage {
        track_percent: 90.0,
        status: None,
        hold: Duration::from_millis(600),
    },
];

/// Total wall time the schedule gates a run for.
pub fn total_duration() -> Duration {
    PULSE_SCHEDULE.iter().map(|stage| stage.hold).sum()
}

/// Play the schedule against the shared lab state.
///
/// Both markers become visible instantly (no transition), then move as a
/// pair through the staged positions, each move gated by that stage's hold.
/// Completion is signalled purely by elapsed time; the caller awaits the
/// full sequence before querying the backend.
pub async fn play_schedule(state: &Arc<RwLock<LabState>>) {
    {
        let mut s = state.write().await;
        for marker in &mut s.pulses {
            marker.visible = true;
        }
    }

    for (index, stage) in PULSE_SCHEDULE.iter().enumerate() {
        // Stage 0 is the start position the markers already hold after reset.
        if index > 0 {
            let mut s = state.write().await;
            for marker in &mut s.pulses {
                marker.transition_millis = Some(MARKER_TRANSITION_MILLIS);
                marker.track_percent = stage.track_percent;
            }
            if let Some(label) = stage.status {
                s.set_status(label);
            }
        }
        time::sleep(stage.hold).await;
    }
}
