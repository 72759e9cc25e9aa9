use egui::Context as EguiContext;
use hologram_driver::{FrameReport, SceneContext};
use std::time::Instant;

/// Weight of the newest sample in the smoothed frame rate.
const FPS_SMOOTHING: f64 = 0.1;

/// Rolling numbers shown in the stats overlay.
#[derive(Debug, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub elapsed: f64,
    pub fps: f64,
    pub model_loaded: bool,
    last_frame: Option<Instant>,
}

impl FrameStats {
    pub fn record<O>(&mut self, report: &FrameReport<O>, now: Instant) {
        if let Some(last) = self.last_frame {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let sample = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    sample
                } else {
                    self.fps + (sample - self.fps) * FPS_SMOOTHING
                };
            }
        }
        self.last_frame = Some(now);
        self.frames = report.frame;
        self.elapsed = report.elapsed;
        self.model_loaded = report.model_loaded;
    }
}

pub fn draw(ctx: &EguiContext, stats: &FrameStats, scene: &SceneContext) {
    egui::Window::new("Hologram")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.0}", stats.fps));
            ui.label(format!("Frame: {}", stats.frames));
            ui.label(format!("Time: {:.2}s", stats.elapsed));
            ui.separator();

            let model = if stats.model_loaded {
                "loaded"
            } else if scene.is_loading() {
                "loading..."
            } else {
                "unavailable"
            };
            ui.label(format!("Model: {model}"));
            if let Some(field) = scene.particle_field() {
                ui.label(format!("Particles: {}", field.count()));
            }

            let size = scene.viewport();
            let (bw, bh) = scene.surface.drawing_buffer_size();
            ui.label(format!(
                "Viewport: {}x{} @{:.2} ({}x{})",
                size.width,
                size.height,
                scene.surface.pixel_ratio(),
                bw,
                bh
            ));

            ui.separator();
            ui.small("F1: Toggle overlay | LMB: Orbit | RMB: Pan");
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(frame: u64) -> FrameReport<()> {
        FrameReport {
            frame,
            elapsed: frame as f64 / 60.0,
            wall_millis: 0.0,
            model_loaded: frame > 1,
            camera_moved: false,
            output: (),
        }
    }

    #[test]
    fn fps_starts_from_first_interval() {
        let mut stats = FrameStats::default();
        let start = Instant::now();
        stats.record(&report(1), start);
        assert_eq!(stats.fps, 0.0);
        stats.record(&report(2), start + Duration::from_millis(20));
        assert!((stats.fps - 50.0).abs() < 1e-6);
        assert!(stats.model_loaded);
        assert_eq!(stats.frames, 2);
    }

    #[test]
    fn fps_is_smoothed() {
        let mut stats = FrameStats::default();
        let start = Instant::now();
        stats.record(&report(1), start);
        stats.record(&report(2), start + Duration::from_millis(20));
        stats.record(&report(3), start + Duration::from_millis(30));
        assert!((stats.fps - 55.0).abs() < 1e-6);
    }
}
