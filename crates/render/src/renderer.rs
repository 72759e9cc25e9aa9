use crate::camera::PerspectiveCamera;
use crate::viewport::RenderSurface;
use hologram_scene::{Material, MaterialLibrary, NodeKind, Scene};
use std::fmt::Write;

/// Errors a renderer can report for a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The output could not produce a texture this frame. The next frame may.
    #[error("frame skipped: {0}")]
    Skipped(String),
    #[error("surface unavailable: {0}")]
    Surface(String),
    #[error("render backend error: {0}")]
    Backend(String),
}

impl RenderError {
    /// Whether the host should keep scheduling frames after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::Skipped(_))
    }
}

/// Read-only view of everything one frame draws.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    pub scene: &'a Scene,
    pub materials: &'a MaterialLibrary,
    pub camera: &'a PerspectiveCamera,
    pub surface: &'a RenderSurface,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer turns a [`SceneView`] into output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, view: &SceneView<'_>) -> Result<Self::Output, RenderError>;
}

/// Renders the scene as text. Used by the headless CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, view: &SceneView<'_>) -> Result<String, RenderError> {
        self.frames += 1;
        let mut out = String::new();
        let size = view.surface.size();
        let (bw, bh) = view.surface.drawing_buffer_size();
        let cam = view.camera;

        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{} @{:.1} -> {}x{}) ===",
            self.frames,
            size.width,
            size.height,
            view.surface.pixel_ratio(),
            bw,
            bh
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.target.x,
            cam.target.y,
            cam.target.z,
            cam.fov_degrees,
            cam.aspect
        );

        view.scene.walk(|id, node, world| {
            let p = world.w_axis;
            let detail = match &node.kind {
                NodeKind::Group => "group".to_string(),
                NodeKind::Mesh(mesh) => {
                    let material = match view.materials.get(mesh.material) {
                        Some(Material::Shader(m)) => {
                            format!("{} t={:.3}", m.label, m.uniforms.time)
                        }
                        Some(other) => other.kind().to_string(),
                        None => "missing".to_string(),
                    };
                    format!(
                        "mesh verts={} material#{} ({material})",
                        mesh.geometry.vertex_count(),
                        mesh.material.0
                    )
                }
                NodeKind::Points(points) => format!(
                    "points count={} version={}",
                    points.field.count(),
                    points.field.version()
                ),
            };
            let _ = writeln!(
                out,
                "  [{}] {} pos=({:.2}, {:.2}, {:.2}) {detail}",
                id.short(),
                node.name,
                p.x,
                p.y,
                p.z
            );
        });

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewportSize;
    use hologram_common::Color;
    use hologram_scene::{Geometry, Node, ParticleField, PointsMaterial, ShaderMaterial};

    fn surface() -> RenderSurface {
        RenderSurface::new(ViewportSize::new(800, 600), 2.0, Color::rgb(0.0, 0.0, 0.0))
    }

    #[test]
    fn empty_scene_prints_header() {
        let scene = Scene::new();
        let materials = MaterialLibrary::new();
        let camera = PerspectiveCamera::default();
        let surface = surface();
        let mut renderer = DebugTextRenderer::new();
        let out = renderer
            .render(&SceneView {
                scene: &scene,
                materials: &materials,
                camera: &camera,
                surface: &surface,
            })
            .unwrap();

        assert!(out.contains("Frame 1"));
        assert!(out.contains("800x600"));
        assert!(out.contains("1600x1200"));
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn lists_meshes_and_points() {
        let mut scene = Scene::new();
        let mut materials = MaterialLibrary::new();
        let holo = materials.add(Material::Shader(ShaderMaterial::holographic(Color::WHITE)));
        let dots = materials.add(Material::Points(PointsMaterial::default()));
        scene.add(Node::mesh("robot", Geometry::default(), holo));
        scene.add(Node::points(
            "particles",
            ParticleField::from_points(&[[0.0; 3]; 4]),
            dots,
        ));
        let unattached = scene.insert(Node::group("hidden"));

        let camera = PerspectiveCamera::default();
        let surface = surface();
        let out = DebugTextRenderer::new()
            .render(&SceneView {
                scene: &scene,
                materials: &materials,
                camera: &camera,
                surface: &surface,
            })
            .unwrap();

        assert!(out.contains("robot"));
        assert!(out.contains("holographic t=0.000"));
        assert!(out.contains("points count=4 version=0"));
        assert!(!out.contains(&unattached.short()));
    }

    #[test]
    fn only_skipped_frames_are_transient() {
        assert!(RenderError::Skipped("timeout".into()).is_transient());
        assert!(!RenderError::Surface("out of memory".into()).is_transient());
        assert!(!RenderError::Backend("validation".into()).is_transient());
    }
}
