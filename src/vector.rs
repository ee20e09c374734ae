//! Semantic state of the per-qubit directional indicators.

use serde::{Deserialize, Serialize};

/// Arrow length for a definite (`Up`/`Down`) state.
pub const FULL_MAGNITUDE: f32 = 2.0;

/// Near-zero arrow length signalling "no definite direction".
pub const MIXED_MAGNITUDE: f32 = 0.1;

/// The semantic directional state of one qubit's visual indicator.
///
/// Exactly one state applies to an indicator at any time; it is the sole
/// source of truth for the arrow's direction and length. Transitions are
/// immediate snapshots — any smooth motion is the rendering engine's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationState {
    #[default]
    Up,
    Down,
    Mixed,
}

impl VisualizationState {
    /// Unit direction of the indicator arrow. `Mixed` is degenerate (zero).
    pub fn direction(self) -> [f32; 3] {
        match self {
            VisualizationState::Up => [0.0, 1.0, 0.0],
            VisualizationState::Down => [0.0, -1.0, 0.0],
            VisualizationState::Mixed => [0.0, 0.0, 0.0],
        }
    }

    /// Arrow length for this state.
    pub fn magnitude(self) -> f32 {
        match self {
            VisualizationState::Up | VisualizationState::Down => FULL_MAGNITUDE,
            VisualizationState::Mixed => MIXED_MAGNITUDE,
        }
    }
}

/// One qubit's indicator. Created at startup, mutated only by the experiment
/// controller and reset, never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VectorIndicator {
    state: VisualizationState,
}

impl VectorIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snap the indicator to `state`. Callable at any time, including before
    /// any run has completed.
    pub fn set_state(&mut self, state: VisualizationState) {
        self.state = state;
    }

    pub fn state(&self) -> VisualizationState {
        self.state
    }

    pub fn direction(&self) -> [f32; 3] {
        self.state.direction()
    }

    pub fn magnitude(&self) -> f32 {
        self.state.magnitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_table_matches_contract() {
        assert_eq!(VisualizationState::Up.direction(), [0.0, 1.0, 0.0]);
        assert_eq!(VisualizationState::Up.magnitude(), FULL_MAGNITUDE);

        assert_eq!(VisualizationState::Down.direction(), [0.0, -1.0, 0.0]);
        assert_eq!(VisualizationState::Down.magnitude(), FULL_MAGNITUDE);

        assert_eq!(VisualizationState::Mixed.direction(), [0.0, 0.0, 0.0]);
        assert_eq!(VisualizationState::Mixed.magnitude(), MIXED_MAGNITUDE);
    }

    #[test]
    fn indicator_defaults_to_up_and_snaps() {
        let mut ind = VectorIndicator::new();
        assert_eq!(ind.state(), VisualizationState::Up);

        ind.set_state(VisualizationState::Mixed);
        assert_eq!(ind.direction(), [0.0, 0.0, 0.0]);
        assert_eq!(ind.magnitude(), MIXED_MAGNITUDE);

        ind.set_state(VisualizationState::Down);
        assert_eq!(ind.direction(), [0.0, -1.0, 0.0]);
        assert_eq!(ind.magnitude(), FULL_MAGNITUDE);
    }
}
