//! Render-loop tasks and the rendering seam.
//!
//! The 3D engine itself is out of scope; anything that can draw a
//! directional indicator inside a scene implements [`IndicatorScene`]. Each
//! indicator gets one unbounded tokio task that reads the shared
//! visualization state every frame and pushes it into its scene. The loop
//! reads state, never writes it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time;

use crate::lab::LabState;

/// Idle rotation of the scene's reference frame, radians per frame.
/// Visual liveliness only, not semantically meaningful.
pub const IDLE_ROTATION_STEP: f32 = 0.002;

/// Default redraw rate.
pub const DEFAULT_FPS: u32 = 60;

/// Viewport dimensions in pixels, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

/// Rendering backend surface for one indicator scene.
pub trait IndicatorScene: Send + 'static {
    /// Snap the directional indicator to `direction` with arrow `length`.
    fn set_indicator(&mut self, direction: [f32; 3], length: f32);

    /// Advance the slow idle rotation of the reference frame.
    fn rotate_frame(&mut self, radians: f32);

    /// Resize the output surface and recompute projection parameters.
    fn resize(&mut self, width: u32, height: u32);

    /// Render one frame.
    fn render_frame(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SceneSnapshot {
    pub direction: [f32; 3],
    pub length: f32,
    pub rotation: f32,
    pub width: u32,
    pub height: u32,
    pub frames: u64,
}

/// Recording scene used by the daemon and by tests. Clones share one
/// underlying scene, so a test can keep a handle while the loop owns its copy.
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    inner: Arc<Mutex<SceneSnapshot>>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        *self.inner.lock().unwrap()
    }
}

impl IndicatorScene for HeadlessScene {
    fn set_indicator(&mut self, direction: [f32; 3], length: f32) {
        let mut scene = self.inner.lock().unwrap();
        scene.direction = direction;
        scene.length = length;
    }

    fn rotate_frame(&mut self, radians: f32) {
        self.inner.lock().unwrap().rotation += radians;
    }

    fn resize(&mut self, width: u32, height: u32) {
        let mut scene = self.inner.lock().unwrap();
        scene.width = width;
        scene.height = height;
    }

    fn render_frame(&mut self) {
        self.inner.lock().unwrap().frames += 1;
    }
}

/// Continuous redraw cycle for one indicator.
#[derive(Debug, Clone, Copy)]
pub struct RenderLoop {
    frame_millis: u64,
    rotation_step: f32,
}

impl RenderLoop {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_millis: (1000 / target_fps.max(1)).max(1) as u64,
            rotation_step: IDLE_ROTATION_STEP,
        }
    }

    /// Begin the unbounded, non-cancellable redraw cycle for `qubit`.
    ///
    /// Each frame reads that indicator's state, snaps the scene's arrow to
    /// it, advances the idle rotation, and renders. Viewport changes arriving
    /// on `viewport` resize the surface within the same frame; they never
    /// touch visualization state. The task is never paused by animation or
    /// an in-flight run.
    pub fn spawn<S: IndicatorScene>(
        self,
        mut scene: S,
        qubit: usize,
        state: Arc<RwLock<LabState>>,
        mut viewport: watch::Receiver<ViewportSize>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                time::sleep(Duration::from_millis(self.frame_millis)).await;

                if viewport.has_changed().unwrap_or(false) {
                    let size = *viewport.borrow_and_update();
                    scene.resize(size.width, size.height);
                }

                let vector = { state.read().await.vectors[qubit] };
                scene.set_indicator(vector.direction(), vector.magnitude());
                scene.rotate_frame(self.rotation_step);
                scene.render_frame();
            }
        })
    }
}
