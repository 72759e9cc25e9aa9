use crate::config::SceneConfig;
use crate::context::SceneContext;
use hologram_render::{RenderError, Renderer};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of elapsed animation time.
pub trait Clock {
    /// Seconds since the clock started.
    fn elapsed_seconds(&self) -> f64;
}

/// Source of wall-clock time for the particle drift.
pub trait WallClock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> f64;
}

/// Monotonic clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_millis(&self) -> f64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// What one successful frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport<O> {
    /// 1-based index of this frame.
    pub frame: u64,
    pub elapsed: f64,
    pub wall_millis: f64,
    pub model_loaded: bool,
    pub camera_moved: bool,
    pub output: O,
}

/// Advances the showcase one frame at a time.
#[derive(Debug)]
pub struct FrameDriver<C = MonotonicClock, W = SystemWallClock> {
    clock: C,
    wall_clock: W,
    frames: u64,
    spin_speed: f32,
    drift_frequency: f64,
    drift_amplitude: f64,
}

impl FrameDriver {
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_clocks(config, MonotonicClock::new(), SystemWallClock)
    }
}

impl<C: Clock, W: WallClock> FrameDriver<C, W> {
    pub fn with_clocks(config: &SceneConfig, clock: C, wall_clock: W) -> Self {
        Self {
            clock,
            wall_clock,
            frames: 0,
            spin_speed: config.model.spin_speed,
            drift_frequency: config.particles.drift_frequency,
            drift_amplitude: config.particles.drift_amplitude,
        }
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn wall_clock_mut(&mut self) -> &mut W {
        &mut self.wall_clock
    }

    /// Frames rendered successfully so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame: animate, update controls, render.
    ///
    /// The model rotation is recomputed from elapsed time every frame. The
    /// particle drift is added on top of the previous positions.
    pub fn step<R: Renderer>(
        &mut self,
        ctx: &mut SceneContext,
        renderer: &mut R,
    ) -> Result<FrameReport<R::Output>, FrameError> {
        let span = tracing::trace_span!("frame", n = self.frames + 1);
        let _enter = span.enter();

        let elapsed = self.clock.elapsed_seconds();
        ctx.set_time_uniform(elapsed as f32);
        ctx.set_model_rotation_y(elapsed as f32 * self.spin_speed);

        let wall_millis = self.wall_clock.now_millis();
        if let Some(field) = ctx.particle_field_mut() {
            field.drift(wall_millis, self.drift_frequency, self.drift_amplitude);
            field.mark_dirty();
        }

        let camera_moved = ctx.controls.update(&mut ctx.camera);
        let output = renderer.render(&ctx.view())?;

        self.frames += 1;
        tracing::trace!(elapsed, camera_moved, "frame rendered");
        Ok(FrameReport {
            frame: self.frames,
            elapsed,
            wall_millis,
            model_loaded: ctx.model().is_some(),
            camera_moved,
            output,
        })
    }

    /// Poll asset loads and step `frames` times, stopping at the first error.
    /// Returns the last report, or `None` when `frames` is zero.
    pub fn run<R: Renderer>(
        &mut self,
        ctx: &mut SceneContext,
        renderer: &mut R,
        frames: u64,
    ) -> Result<Option<FrameReport<R::Output>>, FrameError> {
        let mut last = None;
        for _ in 0..frames {
            ctx.poll_assets();
            match self.step(ctx, renderer) {
                Ok(report) => last = Some(report),
                Err(e) => {
                    tracing::error!(frame = self.frames + 1, "stopping frame loop: {e}");
                    return Err(e);
                }
            }
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use hologram_assets::{AssetError, AssetLoader, ImportedMesh, ModelData, PendingModel};
    use hologram_render::{DebugTextRenderer, SceneView, ViewportSize};
    use hologram_scene::{Geometry, Texture};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path;

    #[derive(Debug, Clone, Copy, Default)]
    struct ManualClock(f64);

    impl Clock for ManualClock {
        fn elapsed_seconds(&self) -> f64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct ManualWall(f64);

    impl WallClock for ManualWall {
        fn now_millis(&self) -> f64 {
            self.0
        }
    }

    struct Loader {
        model: bool,
    }

    impl AssetLoader for Loader {
        fn load_model(&self, path: &Path) -> PendingModel {
            if !self.model {
                return PendingModel::ready(path, Err(AssetError::MissingPositions("robot".into())));
            }
            let geometry = Geometry::new(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                None,
                None,
            );
            PendingModel::ready(
                path,
                Ok(ModelData {
                    name: "robot".into(),
                    meshes: vec![ImportedMesh {
                        name: "body".into(),
                        geometry,
                        material: None,
                    }],
                    materials: Vec::new(),
                }),
            )
        }

        fn load_texture(&self, path: &Path) -> Result<Texture, AssetError> {
            Err(AssetError::InvalidTexture(path.display().to_string()))
        }
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        type Output = ();

        fn render(&mut self, _view: &SceneView<'_>) -> Result<(), RenderError> {
            Err(RenderError::Surface("lost".into()))
        }
    }

    fn setup(model: bool) -> (SceneContext, FrameDriver<ManualClock, ManualWall>) {
        let config = SceneConfig::default();
        let ctx = SceneContext::assemble_with_rng(
            &config,
            ViewportSize::new(800, 600),
            1.0,
            &Loader { model },
            &mut StdRng::seed_from_u64(11),
        );
        let driver = FrameDriver::with_clocks(&config, ManualClock(0.0), ManualWall(0.0));
        (ctx, driver)
    }

    #[test]
    fn time_uniform_tracks_elapsed() {
        let (mut ctx, mut driver) = setup(false);
        driver.clock_mut().0 = 2.5;
        let report = driver.step(&mut ctx, &mut DebugTextRenderer::new()).unwrap();
        assert_eq!(ctx.time_uniform(), Some(2.5));
        assert_eq!(report.frame, 1);
        assert!(!report.model_loaded);
    }

    #[test]
    fn rotation_is_assigned_not_accumulated() {
        let (mut ctx, mut driver) = setup(true);
        assert!(ctx.poll_assets());
        let model = ctx.model().unwrap();
        let mut renderer = DebugTextRenderer::new();

        for t in [1.0, 4.0, 10.0] {
            driver.clock_mut().0 = t;
            driver.step(&mut ctx, &mut renderer).unwrap();
        }
        let rotation = ctx.scene.get(model).unwrap().transform.rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
    }

    #[test]
    fn rotation_waits_for_model() {
        let (mut ctx, mut driver) = setup(false);
        driver.clock_mut().0 = 3.0;
        let report = driver.step(&mut ctx, &mut DebugTextRenderer::new()).unwrap();
        assert!(!report.model_loaded);
        assert!(ctx.is_loading());
        assert!(ctx.model().is_none());
    }

    #[test]
    fn particles_drift_from_previous_positions() {
        let (mut ctx, mut driver) = setup(false);
        let before = ctx.particle_field().unwrap().positions().to_vec();
        let version = ctx.particle_field().unwrap().version();
        let wall = 1_700_000_000_123.0_f64;
        driver.wall_clock_mut().0 = wall;

        driver.step(&mut ctx, &mut DebugTextRenderer::new()).unwrap();

        let field = ctx.particle_field().unwrap();
        assert_eq!(field.positions().len(), 3000);
        assert_eq!(field.version(), version + 1);
        for (j, (after, prior)) in field.positions().iter().zip(&before).enumerate() {
            let i = (j / 3) as f64;
            let expected = (*prior as f64 + (wall * 0.001 + i).sin() * 0.01) as f32;
            assert_eq!(*after, expected, "coordinate {j}");
        }
    }

    #[test]
    fn buffer_length_is_stable_across_frames() {
        let (mut ctx, mut driver) = setup(false);
        let mut renderer = DebugTextRenderer::new();
        for n in 0..5 {
            driver.wall_clock_mut().0 = n as f64 * 16.0;
            driver.step(&mut ctx, &mut renderer).unwrap();
        }
        assert_eq!(ctx.particle_field().unwrap().positions().len(), 3000);
        assert_eq!(driver.frames(), 5);
    }

    #[test]
    fn run_attaches_model_and_returns_last_frame() {
        let (mut ctx, mut driver) = setup(true);
        let report = driver
            .run(&mut ctx, &mut DebugTextRenderer::new(), 3)
            .unwrap()
            .unwrap();
        assert_eq!(report.frame, 3);
        assert!(report.model_loaded);
        assert!(report.output.contains("holographic"));
    }

    #[test]
    fn render_failure_stops_the_run() {
        let (mut ctx, mut driver) = setup(false);
        let err = driver.run(&mut ctx, &mut FailingRenderer, 10).unwrap_err();
        assert!(matches!(err, FrameError::Render(RenderError::Surface(_))));
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn zero_frames_is_a_no_op() {
        let (mut ctx, mut driver) = setup(false);
        let report = driver.run(&mut ctx, &mut DebugTextRenderer::new(), 0).unwrap();
        assert!(report.is_none());
    }
}
