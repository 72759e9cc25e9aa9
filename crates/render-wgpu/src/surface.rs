use crate::gpu::WgpuRenderer;
use hologram_render::{RenderError, Renderer, SceneView};

/// One frame aimed at a window surface.
///
/// Rendering acquires the next surface texture, draws the scene into it and
/// hands the texture back unpresented so the host can layer its own passes
/// on top before calling `present`.
pub struct SurfaceFrame<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface: &'a wgpu::Surface<'static>,
    pub config: &'a wgpu::SurfaceConfiguration,
}

impl SurfaceFrame<'_> {
    fn acquire(&self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(self.device, self.config);
                self.surface.get_current_texture().map_err(classify)
            }
            Err(e) => Err(classify(e)),
        }
    }
}

/// Maps an acquire failure to a skipped frame or a fatal surface error.
///
/// Timeouts and stale configurations clear up on their own (a minimized
/// window reports `Outdated` until it is restored). Running out of memory
/// does not.
fn classify(err: wgpu::SurfaceError) -> RenderError {
    match err {
        wgpu::SurfaceError::Timeout
        | wgpu::SurfaceError::Outdated
        | wgpu::SurfaceError::Lost => RenderError::Skipped(err.to_string()),
        other => RenderError::Surface(other.to_string()),
    }
}

impl Renderer for SurfaceFrame<'_> {
    type Output = wgpu::SurfaceTexture;

    fn render(&mut self, view: &SceneView<'_>) -> Result<wgpu::SurfaceTexture, RenderError> {
        let texture = self.acquire()?;
        let output = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.draw(self.device, self.queue, &output, view)?;
        Ok(texture)
    }
}
