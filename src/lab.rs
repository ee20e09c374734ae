//! Shared lab display state and the experiment controller.
//!
//! All transient display state lives in one [`LabState`] behind an
//! `Arc<RwLock<_>>`. Writers (the controller, the pulse animator, reset)
//! take the write lock only for instantaneous mutations and never hold it
//! across a suspension point; the render loops take short read locks and
//! never write.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{CircuitBackend, OutcomeDistribution, OUTCOME_KEYS};
use crate::error::LabError;
use crate::pulse;
use crate::vector::{VectorIndicator, VisualizationState};

/// Number of qubit indicators. Fixed by the demo circuit.
pub const QUBIT_COUNT: usize = 2;

/// One gate pulse marker on the schedule track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseMarker {
    pub visible: bool,
    /// Position along the track, 0–100.
    pub track_percent: f32,
    /// Linear position transition, if enabled. `None` means snap.
    pub transition_millis: Option<u64>,
}

impl Default for PulseMarker {
    fn default() -> Self {
        Self {
            visible: false,
            track_percent: 0.0,
            transition_millis: None,
        }
    }
}

/// One histogram bar/label pair, keyed by outcome.
///
/// Width and label carry the same rendered string (e.g. "37.5%"); the width
/// doubles as a CSS-style percentage for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBar {
    pub key: String,
    pub width: String,
    pub label: String,
}

impl HistogramBar {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            width: "0%".to_string(),
            label: "0%".to_string(),
        }
    }
}

/// One qubit's measurement result box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBox {
    /// Displayed glyph: '?' until a single-shot result lands, then '0'/'1'.
    pub glyph: char,
    /// Confirmed styling (distinct border/text/background from neutral).
    pub confirmed: bool,
}

impl Default for ResultBox {
    fn default() -> Self {
        Self {
            glyph: '?',
            confirmed: false,
        }
    }
}

/// The complete transient display state of the lab page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabState {
    pub vectors: [VectorIndicator; QUBIT_COUNT],
    pub pulses: [PulseMarker; QUBIT_COUNT],
    pub histogram: [HistogramBar; 4],
    pub boxes: [ResultBox; QUBIT_COUNT],
    pub status: String,
    /// User preference: play the pulse schedule before querying the backend.
    pub animation_enabled: bool,
    /// Run guard; set for the full duration of one `run()`.
    pub run_in_progress: bool,
}

impl LabState {
    pub fn new(animation_enabled: bool) -> Self {
        let mut state = Self {
            vectors: [VectorIndicator::new(); QUBIT_COUNT],
            pulses: [PulseMarker::default(); QUBIT_COUNT],
            histogram: OUTCOME_KEYS.map(HistogramBar::new),
            boxes: [ResultBox::default(); QUBIT_COUNT],
            status: String::new(),
            animation_enabled,
            run_in_progress: false,
        };
        state.reset();
        state
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// Restore every visual element to its canonical initial state.
    ///
    /// Synchronous and idempotent. Pulse transitions are disabled so the next
    /// run's transition starts cleanly rather than animating from a stale
    /// position. Does not abort an in-progress run, and leaves the run guard
    /// and the animation preference alone.
    pub fn reset(&mut self) {
        for marker in &mut self.pulses {
            *marker = PulseMarker::default();
        }
        for bar in &mut self.histogram {
            bar.width = "0%".to_string();
            bar.label = "0%".to_string();
        }
        for result_box in &mut self.boxes {
            *result_box = ResultBox::default();
        }
        for vector in &mut self.vectors {
            vector.set_state(VisualizationState::Up);
        }
        self.set_status("System Reset. Ready.");
    }

    /// Render the distribution into the histogram: one decimal place,
    /// percent-suffixed, same string for bar width and label.
    fn apply_distribution(&mut self, dist: &OutcomeDistribution) {
        for bar in &mut self.histogram {
            let rendered = format!("{:.1}%", dist.get(&bar.key));
            bar.width = rendered.clone();
            bar.label = rendered;
        }
    }
}

/// The single-shot "winning" outcome.
///
/// The demo circuit (H then CNOT) populates only the correlated outcomes, so
/// collapse considers `"11"` against `"00"` and nothing else. Kept verbatim;
/// do not generalize to `"01"`/`"10"` without new product semantics.
fn winning_outcome(dist: &OutcomeDistribution) -> &'static str {
    if dist.p11 > 0.0 {
        "11"
    } else {
        "00"
    }
}

/// Orchestrates one experiment run end to end.
pub struct ExperimentController<B: CircuitBackend> {
    state: Arc<RwLock<LabState>>,
    backend: B,
}

impl<B: CircuitBackend> ExperimentController<B> {
    pub fn new(state: Arc<RwLock<LabState>>, backend: B) -> Self {
        Self { state, backend }
    }

    pub fn state(&self) -> &Arc<RwLock<LabState>> {
        &self.state
    }

    /// Run the experiment: optional pulse schedule, backend query, then
    /// histogram/result/vector/status updates.
    ///
    /// `shots == 1` collapses to a definite outcome; `shots > 1` is a batch
    /// and leaves both indicators in the mixed depiction. Overlapping calls
    /// are rejected while a run is in flight.
    pub async fn run(&self, shots: u32) -> Result<(), LabError> {
        if shots == 0 {
            return Err(LabError::InvalidShots);
        }

        {
            let mut state = self.state.write().await;
            if state.run_in_progress {
                warn!("Run rejected: another run is in progress");
                return Err(LabError::RunInProgress);
            }
            state.run_in_progress = true;
            state.set_status(format!("Running Experiment ({shots} Shots)..."));
            for result_box in &mut state.boxes {
                result_box.glyph = '?';
            }
        }

        let outcome = self.run_inner(shots).await;

        let mut state = self.state.write().await;
        state.run_in_progress = false;
        if outcome.is_err() {
            // Result boxes stay unknown and vectors keep their prior state.
            state.set_status("Run Failed.");
        }
        outcome
    }

    async fn run_inner(&self, shots: u32) -> Result<(), LabError> {
        let animate = { self.state.read().await.animation_enabled };
        if animate {
            pulse::play_schedule(&self.state).await;
        }

        let dist = self.backend.run_circuit(shots).await?;

        let mut state = self.state.write().await;
        state.apply_distribution(&dist);

        if shots == 1 {
            let winner = winning_outcome(&dist);
            for (qubit, bit) in winner.chars().enumerate() {
                state.boxes[qubit] = ResultBox {
                    glyph: bit,
                    confirmed: true,
                };
                state.vectors[qubit].set_state(if bit == '1' {
                    VisualizationState::Down
                } else {
                    VisualizationState::Up
                });
            }
            state.set_status(format!("Measurement Result: |{winner}⟩"));
            info!("Single-shot run collapsed to |{winner}⟩");
        } else {
            for vector in &mut state.vectors {
                vector.set_state(VisualizationState::Mixed);
            }
            state.set_status("Batch Complete.");
            info!("Batch run complete ({shots} shots)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time;

    struct FixedBackend(OutcomeDistribution);

    impl CircuitBackend for FixedBackend {
        async fn run_circuit(&self, _shots: u32) -> Result<OutcomeDistribution, LabError> {
            Ok(self.0)
        }
    }

    /// Suspends on the timer once before answering, so a test can observe an
    /// in-flight run under paused time.
    struct SlowBackend(OutcomeDistribution);

    impl CircuitBackend for SlowBackend {
        async fn run_circuit(&self, _shots: u32) -> Result<OutcomeDistribution, LabError> {
            time::sleep(Duration::from_millis(1000)).await;
            Ok(self.0)
        }
    }

    struct FailingBackend;

    impl CircuitBackend for FailingBackend {
        async fn run_circuit(&self, _shots: u32) -> Result<OutcomeDistribution, LabError> {
            Err(LabError::Backend("connection refused".to_string()))
        }
    }

    fn shared_state(animation_enabled: bool) -> Arc<RwLock<LabState>> {
        Arc::new(RwLock::new(LabState::new(animation_enabled)))
    }

    fn bell_11() -> OutcomeDistribution {
        OutcomeDistribution {
            p11: 87.5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_shot_collapse_to_11() {
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));

        controller.run(1).await.unwrap();

        let s = state.read().await;
        assert_eq!(s.status, "Measurement Result: |11⟩");
        for result_box in &s.boxes {
            assert_eq!(result_box.glyph, '1');
            assert!(result_box.confirmed);
        }
        for vector in &s.vectors {
            assert_eq!(vector.state(), VisualizationState::Down);
        }
        assert!(!s.run_in_progress);
    }

    #[tokio::test]
    async fn single_shot_falls_back_to_00_when_11_is_zero() {
        let dist = OutcomeDistribution {
            p00: 62.0,
            ..Default::default()
        };
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(dist));

        controller.run(1).await.unwrap();

        let s = state.read().await;
        assert_eq!(s.status, "Measurement Result: |00⟩");
        for result_box in &s.boxes {
            assert_eq!(result_box.glyph, '0');
            assert!(result_box.confirmed);
        }
        for vector in &s.vectors {
            assert_eq!(vector.state(), VisualizationState::Up);
        }
    }

    #[tokio::test]
    async fn batch_run_mixes_vectors_regardless_of_distribution() {
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));

        controller.run(1000).await.unwrap();

        let s = state.read().await;
        assert_eq!(s.status, "Batch Complete.");
        for vector in &s.vectors {
            assert_eq!(vector.state(), VisualizationState::Mixed);
        }
        // Batch runs never confirm the result boxes.
        for result_box in &s.boxes {
            assert_eq!(result_box.glyph, '?');
        }
    }

    #[tokio::test]
    async fn histogram_rounds_to_one_decimal_with_percent_suffix() {
        let dist = OutcomeDistribution {
            p00: 37.46,
            p01: 0.0,
            p10: 12.54,
            p11: 50.0,
        };
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(dist));

        controller.run(100).await.unwrap();

        let s = state.read().await;
        assert_eq!(s.histogram[0].label, "37.5%");
        assert_eq!(s.histogram[0].width, "37.5%");
        assert_eq!(s.histogram[1].label, "0.0%");
        assert_eq!(s.histogram[2].label, "12.5%");
        assert_eq!(s.histogram[3].label, "50.0%");
    }

    #[tokio::test]
    async fn zero_shots_is_rejected() {
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));

        let err = controller.run(0).await.unwrap_err();
        assert!(matches!(err, LabError::InvalidShots));
        // Nothing started: status is still the reset banner.
        assert_eq!(state.read().await.status, "System Reset. Ready.");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_animation_skips_the_pulse_delay() {
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));

        let start = time::Instant::now();
        controller.run(1000).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        let s = state.read().await;
        assert!(s.pulses.iter().all(|p| !p.visible));
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_animation_holds_for_the_full_schedule() {
        let state = shared_state(true);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));

        let start = time::Instant::now();
        controller.run(1).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(2400));

        let s = state.read().await;
        assert!(s.pulses.iter().all(|p| p.visible));
        assert!(s.pulses.iter().all(|p| p.track_percent == 90.0));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_runs_are_rejected() {
        let state = shared_state(false);
        let controller = Arc::new(ExperimentController::new(
            Arc::clone(&state),
            SlowBackend(bell_11()),
        ));

        let background = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run(1).await })
        };
        // Let the first run reach its backend suspension point.
        tokio::task::yield_now().await;

        let err = controller.run(1).await.unwrap_err();
        assert!(matches!(err, LabError::RunInProgress));

        time::advance(Duration::from_millis(1000)).await;
        background.await.unwrap().unwrap();
        assert!(!state.read().await.run_in_progress);
    }

    #[tokio::test]
    async fn failed_backend_reports_without_corrupting_state() {
        let state = shared_state(false);
        {
            let mut s = state.write().await;
            for vector in &mut s.vectors {
                vector.set_state(VisualizationState::Down);
            }
        }
        let controller = ExperimentController::new(Arc::clone(&state), FailingBackend);

        let err = controller.run(1).await.unwrap_err();
        assert!(matches!(err, LabError::Backend(_)));

        let s = state.read().await;
        assert_eq!(s.status, "Run Failed.");
        for result_box in &s.boxes {
            assert_eq!(result_box.glyph, '?');
        }
        // Prior vector state survives a failed run.
        for vector in &s.vectors {
            assert_eq!(vector.state(), VisualizationState::Down);
        }
        assert!(!s.run_in_progress);
        assert_eq!(s.histogram[0].label, "0%");
    }

    #[tokio::test]
    async fn reset_is_idempotent_from_any_prior_state() {
        let state = shared_state(false);
        let controller = ExperimentController::new(Arc::clone(&state), FixedBackend(bell_11()));
        controller.run(1).await.unwrap();

        let mut s = state.write().await;
        s.reset();
        let once = s.clone();
        s.reset();
        assert_eq!(*s, once);

        assert_eq!(s.status, "System Reset. Ready.");
        assert!(s.pulses.iter().all(|p| *p == PulseMarker::default()));
        assert!(s.boxes.iter().all(|b| *b == ResultBox::default()));
        assert!(s
            .vectors
            .iter()
            .all(|v| v.state() == VisualizationState::Up));
        assert!(s
            .histogram
            .iter()
            .all(|bar| bar.width == "0%" && bar.label == "0%"));
    }
}
