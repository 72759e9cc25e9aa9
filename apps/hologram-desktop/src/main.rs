mod input;
mod overlay;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use hologram_assets::FsAssetLoader;
use hologram_driver::{FrameDriver, FrameError, SceneConfig, SceneContext};
use hologram_render::ViewportSize;
use hologram_render_wgpu::{SurfaceFrame, WgpuRenderer};
use input::PointerInput;
use overlay::FrameStats;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "hologram-desktop", about = "Holographic model showcase")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// glTF model to display [default: ./static/models/robot/scene.gltf]
    #[arg(long)]
    model: Option<PathBuf>,

    /// Alpha map for the particle sprites [default: ./static/textures/particle.png]
    #[arg(long)]
    particle_texture: Option<PathBuf>,

    /// JSON scene config overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with the stats overlay hidden (F1 toggles it)
    #[arg(long)]
    no_overlay: bool,
}

impl Cli {
    fn scene_config(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(texture) = &self.particle_texture {
            config.particle_texture_path = texture.clone();
        }
        Ok(config)
    }
}

/// Window-bound GPU state, created on `resumed`.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(window: Arc<Window>, egui_ctx: &EguiContext) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("hologram_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, format);
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Logical window size and device pixel ratio.
    fn viewport(&self) -> (ViewportSize, f64) {
        let scale = self.window.scale_factor();
        let logical: LogicalSize<u32> = self.window.inner_size().to_logical(scale);
        (ViewportSize::new(logical.width, logical.height), scale)
    }

    fn paint_overlay(
        &mut self,
        egui_ctx: &EguiContext,
        view: &wgpu::TextureView,
        stats: &FrameStats,
        scene: &SceneContext,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| overlay::draw(ctx, stats, scene));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct HologramApp {
    config: SceneConfig,
    loader: FsAssetLoader,
    gpu: Option<Gpu>,
    scene: Option<SceneContext>,
    driver: Option<FrameDriver>,
    pointer: PointerInput,
    stats: FrameStats,
    egui_ctx: EguiContext,
    show_overlay: bool,
    /// Set once a frame fails for good; no further frames are scheduled.
    halted: bool,
}

impl HologramApp {
    fn new(config: SceneConfig, show_overlay: bool) -> Self {
        Self {
            config,
            loader: FsAssetLoader::new(),
            gpu: None,
            scene: None,
            driver: None,
            pointer: PointerInput::default(),
            stats: FrameStats::default(),
            egui_ctx: EguiContext::default(),
            show_overlay,
            halted: false,
        }
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(scene), Some(driver)) =
            (&mut self.gpu, &mut self.scene, &mut self.driver)
        else {
            return;
        };
        if self.halted {
            return;
        }
        // Minimized. `Resized` schedules the next frame on restore.
        if is_hidden(gpu.window.inner_size()) {
            return;
        }

        scene.poll_assets();

        let result = {
            let mut frame = SurfaceFrame {
                renderer: &mut gpu.renderer,
                device: &gpu.device,
                queue: &gpu.queue,
                surface: &gpu.surface,
                config: &gpu.config,
            };
            driver.step(scene, &mut frame)
        };

        match result {
            Ok(report) => {
                self.stats.record(&report, Instant::now());
                let texture = report.output;
                if self.show_overlay {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    gpu.paint_overlay(&self.egui_ctx, &view, &self.stats, scene);
                }
                texture.present();
                gpu.window.request_redraw();
            }
            Err(FrameError::Render(e)) if e.is_transient() => {
                tracing::debug!("frame {} skipped: {e}", driver.frames() + 1);
                gpu.window.request_redraw();
            }
            Err(e) => {
                tracing::error!("frame {} failed, stopping render loop: {e}", driver.frames() + 1);
                self.halted = true;
            }
        }
    }
}

/// A window with no drawable area has nothing to present.
fn is_hidden(size: PhysicalSize<u32>) -> bool {
    size.width == 0 || size.height == 0
}

impl ApplicationHandler for HologramApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Hologram")
            .with_inner_size(LogicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let gpu = match Gpu::new(window, &self.egui_ctx) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let (viewport, scale) = gpu.viewport();
        self.scene = Some(SceneContext::assemble(
            &self.config,
            viewport,
            scale,
            &self.loader,
        ));
        self.driver = Some(FrameDriver::new(&self.config));
        gpu.window.request_redraw();
        self.gpu = Some(gpu);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if self.show_overlay {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                let (viewport, scale) = gpu.viewport();
                if let Some(scene) = &mut self.scene {
                    scene.resize(viewport, scale);
                }
                if !self.halted {
                    gpu.window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let (viewport, scale) = gpu.viewport();
                if let Some(scene) = &mut self.scene {
                    scene.resize(viewport, scale);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::F1 => self.show_overlay = !self.show_overlay,
                KeyCode::Escape => event_loop.exit(),
                _ => {}
            },
            WindowEvent::MouseInput { button, state, .. } => {
                self.pointer.button(button, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(gpu.window.scale_factor());
                if let (Some(drag), Some(scene)) =
                    (self.pointer.moved(logical.x, logical.y), &mut self.scene)
                {
                    let height = scene.viewport().height as f32;
                    input::apply_drag(drag, &mut scene.controls, &scene.camera, height);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(scene) = &mut self.scene {
                    scene.controls.zoom(input::scroll_steps(delta));
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.scene_config()?;
    tracing::info!(
        model = %config.model_path.display(),
        texture = %config.particle_texture_path.display(),
        "hologram-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = HologramApp::new(config, !cli.no_overlay);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimized_window_is_hidden() {
        assert!(is_hidden(PhysicalSize::new(0, 0)));
        assert!(is_hidden(PhysicalSize::new(1280, 0)));
        assert!(!is_hidden(PhysicalSize::new(1, 1)));
    }
}
