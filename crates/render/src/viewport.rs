use crate::camera::PerspectiveCamera;
use hologram_common::Color;

/// Output size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, with zero dimensions treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// What the renderer draws into: logical size, pixel ratio and clear color.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    size: ViewportSize,
    pixel_ratio: f64,
    pub clear_color: Color,
    pub antialias: bool,
}

impl RenderSurface {
    pub fn new(size: ViewportSize, pixel_ratio: f64, clear_color: Color) -> Self {
        Self {
            size,
            pixel_ratio,
            clear_color,
            antialias: true,
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn set_size(&mut self, size: ViewportSize) {
        self.size = size;
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    /// Size of the backing pixel buffer: logical size times pixel ratio,
    /// rounded down, never below one pixel.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).floor() as u32).max(1);
        (scale(self.size.width), scale(self.size.height))
    }
}

/// Keeps camera and surface in step with the output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSizer {
    /// Upper bound on the pixel ratio, limiting overdraw on dense displays.
    pub max_pixel_ratio: f64,
}

impl Default for ViewportSizer {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
        }
    }
}

impl ViewportSizer {
    pub fn new(max_pixel_ratio: f64) -> Self {
        Self { max_pixel_ratio }
    }

    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        device_pixel_ratio.min(self.max_pixel_ratio)
    }

    /// Handle a resize: new aspect and projection for the camera, new size and
    /// capped pixel ratio for the surface.
    pub fn resize(
        &self,
        size: ViewportSize,
        device_pixel_ratio: f64,
        camera: &mut PerspectiveCamera,
        surface: &mut RenderSurface,
    ) {
        camera.aspect = size.aspect();
        camera.update_projection_matrix();
        surface.set_size(size);
        surface.set_pixel_ratio(self.pixel_ratio(device_pixel_ratio));
        tracing::debug!(
            width = size.width,
            height = size.height,
            pixel_ratio = surface.pixel_ratio(),
            "viewport resized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn setup() -> (PerspectiveCamera, RenderSurface) {
        let size = ViewportSize::new(800, 600);
        let camera = PerspectiveCamera::new(25.0, size.aspect(), 0.1, 100.0);
        let surface = RenderSurface::new(size, 1.0, Color::rgb(0.0, 0.0, 0.0));
        (camera, surface)
    }

    #[test]
    fn resize_updates_camera_and_surface() {
        let (mut camera, mut surface) = setup();
        ViewportSizer::default().resize(ViewportSize::new(1600, 900), 1.5, &mut camera, &mut surface);

        assert_eq!(camera.aspect, 1600.0 / 900.0);
        assert_eq!(
            camera.projection_matrix(),
            Mat4::perspective_rh(25.0_f32.to_radians(), 1600.0 / 900.0, 0.1, 100.0)
        );
        assert_eq!(surface.size(), ViewportSize::new(1600, 900));
        assert_eq!(surface.pixel_ratio(), 1.5);
        assert_eq!(surface.drawing_buffer_size(), (2400, 1350));
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let (mut camera, mut surface) = setup();
        ViewportSizer::default().resize(ViewportSize::new(1600, 900), 3.0, &mut camera, &mut surface);
        assert_eq!(surface.pixel_ratio(), 2.0);
        assert_eq!(surface.drawing_buffer_size(), (3200, 1800));
    }

    #[test]
    fn zero_height_keeps_projection_finite() {
        let (mut camera, mut surface) = setup();
        ViewportSizer::default().resize(ViewportSize::new(640, 0), 1.0, &mut camera, &mut surface);
        assert!(camera.projection_matrix().is_finite());
        assert_eq!(surface.drawing_buffer_size(), (640, 1));
    }

    #[test]
    fn minimized_size_keeps_projection_finite() {
        assert_eq!(ViewportSize::new(0, 0).aspect(), 1.0);
        let (mut camera, mut surface) = setup();
        ViewportSizer::default().resize(ViewportSize::new(0, 0), 1.0, &mut camera, &mut surface);
        assert!(camera.aspect > 0.0);
        assert!(camera.projection_matrix().is_finite());
        assert_eq!(surface.drawing_buffer_size(), (1, 1));
    }
}
