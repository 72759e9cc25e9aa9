use crate::config::{ModelPlacement, SceneConfig};
use glam::{Quat, Vec3};
use hologram_assets::{AssetError, AssetLoader, ModelData, PendingModel};
use hologram_common::NodeId;
use hologram_render::{
    OrbitControls, PerspectiveCamera, RenderSurface, SceneView, ViewportSize, ViewportSizer,
};
use hologram_scene::{
    Material, MaterialHandle, MaterialLibrary, Node, ParticleField, PointsMaterial, RenderState,
    Scene, ShaderMaterial, Side,
};
use rand::Rng;

/// Everything the showcase owns, created once by [`SceneContext::assemble`]
/// and alive until the host exits.
#[derive(Debug)]
pub struct SceneContext {
    pub scene: Scene,
    pub materials: MaterialLibrary,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub surface: RenderSurface,
    pub sizer: ViewportSizer,
    hologram: MaterialHandle,
    particles: NodeId,
    model: Option<NodeId>,
    pending_model: Option<PendingModel>,
    placement: ModelPlacement,
}

impl SceneContext {
    /// Build the scene: camera, controls, surface, holographic material,
    /// particle field. Starts the model load; the model appears once
    /// [`SceneContext::poll_assets`] sees it finish.
    pub fn assemble(
        config: &SceneConfig,
        viewport: ViewportSize,
        device_pixel_ratio: f64,
        loader: &dyn AssetLoader,
    ) -> Self {
        Self::assemble_with_rng(
            config,
            viewport,
            device_pixel_ratio,
            loader,
            &mut rand::thread_rng(),
        )
    }

    /// Like [`SceneContext::assemble`] with a caller-supplied random source
    /// for particle placement.
    pub fn assemble_with_rng<R: Rng + ?Sized>(
        config: &SceneConfig,
        viewport: ViewportSize,
        device_pixel_ratio: f64,
        loader: &dyn AssetLoader,
        rng: &mut R,
    ) -> Self {
        let sizer = ViewportSizer::new(config.max_pixel_ratio);

        let mut camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.position = config.camera.position;

        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.enable_zoom = config.controls.enable_zoom;
        controls.enable_damping = config.controls.enable_damping;
        controls.damping_factor = config.controls.damping_factor;
        camera.look_at(controls.target);

        let surface = RenderSurface::new(
            viewport,
            sizer.pixel_ratio(device_pixel_ratio),
            config.clear_color,
        );

        let mut scene = Scene::new();
        let mut materials = MaterialLibrary::new();
        let hologram = materials.add(Material::Shader(ShaderMaterial::holographic(
            config.hologram_color,
        )));

        let pending_model = loader.load_model(&config.model_path);

        let alpha_map = match loader.load_texture(&config.particle_texture_path) {
            Ok(texture) => Some(texture),
            Err(e) => {
                tracing::warn!(
                    path = %config.particle_texture_path.display(),
                    "particle texture unavailable, drawing plain sprites: {e}"
                );
                None
            }
        };

        let field = ParticleField::random(config.particles.count, config.particles.spread, rng);
        let points_material = materials.add(Material::Points(PointsMaterial {
            size: config.particles.size,
            size_attenuation: config.particles.size_attenuation,
            alpha_map,
            state: RenderState::additive_glow(Side::Front),
            ..PointsMaterial::default()
        }));
        let particles = scene.add(Node::points("particles", field, points_material));

        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = surface.pixel_ratio(),
            particles = config.particles.count,
            "scene assembled"
        );

        Self {
            scene,
            materials,
            camera,
            controls,
            surface,
            sizer,
            hologram,
            particles,
            model: None,
            pending_model: Some(pending_model),
            placement: config.model.clone(),
        }
    }

    /// Current output size in logical pixels.
    pub fn viewport(&self) -> ViewportSize {
        self.surface.size()
    }

    /// React to the output surface changing size.
    pub fn resize(&mut self, size: ViewportSize, device_pixel_ratio: f64) {
        self.sizer
            .resize(size, device_pixel_ratio, &mut self.camera, &mut self.surface);
    }

    /// The shared holographic material every model mesh draws with.
    pub fn hologram_material(&self) -> MaterialHandle {
        self.hologram
    }

    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    pub fn is_loading(&self) -> bool {
        self.pending_model.is_some()
    }

    pub fn particles_node(&self) -> NodeId {
        self.particles
    }

    pub fn particle_field(&self) -> Option<&ParticleField> {
        self.scene
            .get(self.particles)
            .and_then(|n| n.as_points())
            .map(|p| &p.field)
    }

    pub fn particle_field_mut(&mut self) -> Option<&mut ParticleField> {
        self.scene
            .get_mut(self.particles)
            .and_then(|n| n.as_points_mut())
            .map(|p| &mut p.field)
    }

    /// Write the time uniform of the holographic material.
    pub fn set_time_uniform(&mut self, seconds: f32) {
        if let Some(material) = self.materials.shader_mut(self.hologram) {
            material.uniforms.time = seconds;
        }
    }

    pub fn time_uniform(&self) -> Option<f32> {
        self.materials.shader(self.hologram).map(|m| m.uniforms.time)
    }

    /// Set the model's rotation about Y. Does nothing before the model loads.
    pub fn set_model_rotation_y(&mut self, radians: f32) {
        let Some(node) = self.model.and_then(|id| self.scene.get_mut(id)) else {
            return;
        };
        node.transform.rotation = Quat::from_rotation_y(radians);
    }

    /// Check on the model load. Returns `true` when the model was attached by
    /// this call. A failed load is logged and never retried.
    pub fn poll_assets(&mut self) -> bool {
        let Some(pending) = self.pending_model.as_mut() else {
            return false;
        };
        let Some(result) = pending.poll() else {
            return false;
        };
        let pending = self.pending_model.take();
        let path = pending
            .as_ref()
            .map(|p| p.path().display().to_string())
            .unwrap_or_default();

        match result.and_then(|model| self.attach_model(model)) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(%path, "model load failed, continuing without it: {e}");
                false
            }
        }
    }

    /// Completion step of the model load: place the model, swap every mesh
    /// material for the shared holographic one, and attach it to the root.
    ///
    /// A second model is ignored; the first one stays for the session.
    pub fn attach_model(&mut self, model: ModelData) -> Result<NodeId, AssetError> {
        if let Some(existing) = self.model {
            tracing::warn!(node = %existing.short(), "model already loaded, ignoring {}", model.name);
            return Ok(existing);
        }

        let name = model.name.clone();
        let root = model.instantiate(&mut self.scene, &mut self.materials)?;
        if let Some(node) = self.scene.get_mut(root) {
            node.transform.scale = Vec3::splat(self.placement.scale);
            node.transform.position.y = self.placement.offset_y;
        }

        let hologram = self.hologram;
        let mut replaced = 0usize;
        self.scene.for_each_mesh_mut(root, |_, mesh| {
            mesh.material = hologram;
            replaced += 1;
        });

        self.scene.attach_to_root(root)?;
        self.model = Some(root);
        tracing::info!(model = %name, node = %root.short(), meshes = replaced, "model attached");
        Ok(root)
    }

    /// Borrow the parts a renderer reads.
    pub fn view(&self) -> SceneView<'_> {
        SceneView {
            scene: &self.scene,
            materials: &self.materials,
            camera: &self.camera,
            surface: &self.surface,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hologram_assets::ImportedMesh;
    use hologram_scene::{Geometry, StandardMaterial, Texture};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path;

    fn two_mesh_model() -> ModelData {
        let tri = || {
            Geometry::new(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                None,
                None,
            )
        };
        ModelData {
            name: "robot".into(),
            meshes: vec![
                ImportedMesh {
                    name: "head".into(),
                    geometry: tri(),
                    material: Some(0),
                },
                ImportedMesh {
                    name: "body".into(),
                    geometry: tri(),
                    material: Some(1),
                },
            ],
            materials: vec![StandardMaterial::default(), StandardMaterial::default()],
        }
    }

    /// Completes model loads immediately.
    struct ImmediateLoader {
        model: Option<ModelData>,
    }

    impl AssetLoader for ImmediateLoader {
        fn load_model(&self, path: &Path) -> PendingModel {
            let result = self
                .model
                .clone()
                .ok_or_else(|| AssetError::LoaderDisconnected(path.to_path_buf()));
            PendingModel::ready(path, result)
        }

        fn load_texture(&self, path: &Path) -> Result<Texture, AssetError> {
            Err(AssetError::InvalidTexture(path.display().to_string()))
        }
    }

    fn assemble(loader: &ImmediateLoader) -> SceneContext {
        SceneContext::assemble_with_rng(
            &SceneConfig::default(),
            ViewportSize::new(800, 600),
            1.0,
            loader,
            &mut StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn assemble_sets_up_camera_surface_and_particles() {
        let ctx = assemble(&ImmediateLoader { model: None });
        assert_eq!(ctx.camera.fov_degrees, 25.0);
        assert_eq!(ctx.camera.aspect, 800.0 / 600.0);
        assert_eq!(ctx.camera.position, Vec3::new(5.0, 2.0, 6.0));
        assert!(!ctx.controls.enable_zoom);
        assert_eq!(ctx.surface.clear_color.to_hex(), "#020215");
        assert_eq!(ctx.particle_field().unwrap().positions().len(), 3000);
        assert_eq!(ctx.time_uniform(), Some(0.0));
        assert!(ctx.model().is_none());
        assert!(ctx.is_loading());
    }

    #[test]
    fn missing_texture_leaves_plain_sprites() {
        let ctx = assemble(&ImmediateLoader { model: None });
        let handle = ctx
            .scene
            .get(ctx.particles_node())
            .and_then(|n| n.as_points())
            .unwrap()
            .material;
        assert!(ctx.materials.points(handle).unwrap().alpha_map.is_none());
    }

    #[test]
    fn loaded_meshes_share_one_material_and_model_attaches_once() {
        let mut ctx = assemble(&ImmediateLoader {
            model: Some(two_mesh_model()),
        });
        assert!(ctx.poll_assets());
        let model = ctx.model().unwrap();

        let mut handles = Vec::new();
        ctx.scene
            .for_each_mesh_mut(model, |_, mesh| handles.push(mesh.material));
        assert_eq!(handles.len(), 2);
        assert!(handles.iter().all(|h| *h == ctx.hologram_material()));

        let roots = ctx.scene.root_children();
        assert_eq!(roots.iter().filter(|r| **r == model).count(), 1);
        assert!(!ctx.is_loading());
        assert!(!ctx.poll_assets());
    }

    #[test]
    fn loaded_model_is_scaled_and_lowered() {
        let mut ctx = assemble(&ImmediateLoader {
            model: Some(two_mesh_model()),
        });
        ctx.poll_assets();
        let node = ctx.scene.get(ctx.model().unwrap()).unwrap();
        assert_eq!(node.transform.scale, Vec3::splat(0.25));
        assert_eq!(node.transform.position.y, -0.75);
    }

    #[test]
    fn failed_load_leaves_model_absent() {
        let mut ctx = assemble(&ImmediateLoader { model: None });
        assert!(!ctx.poll_assets());
        assert!(ctx.model().is_none());
        assert!(!ctx.is_loading());
        ctx.set_model_rotation_y(1.0);
        assert_eq!(ctx.scene.root_children().len(), 1);
    }

    #[test]
    fn second_model_is_ignored() {
        let mut ctx = assemble(&ImmediateLoader {
            model: Some(two_mesh_model()),
        });
        ctx.poll_assets();
        let first = ctx.model().unwrap();
        let again = ctx.attach_model(two_mesh_model()).unwrap();
        assert_eq!(first, again);
        assert_eq!(ctx.scene.root_children().len(), 2);
    }

    #[test]
    fn resize_goes_through_sizer() {
        let mut ctx = assemble(&ImmediateLoader { model: None });
        ctx.resize(ViewportSize::new(1600, 900), 3.0);
        assert_eq!(ctx.viewport(), ViewportSize::new(1600, 900));
        assert_eq!(ctx.camera.aspect, 1600.0 / 900.0);
        assert_eq!(ctx.surface.pixel_ratio(), 2.0);
    }
}
