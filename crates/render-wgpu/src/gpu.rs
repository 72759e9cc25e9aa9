use crate::shaders;
use crate::target::{self, Blitter, OffscreenTarget};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use hologram_common::NodeId;
use hologram_render::{RenderError, SceneView};
use hologram_scene::{
    Blending, Geometry, Material, MaterialHandle, NodeKind, ParticleField, PointsMaterial,
    RenderState, ShaderMaterial, Side,
};
use std::collections::{HashMap, HashSet};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
    /// Drawing buffer width and height, pixel ratio, aspect.
    viewport: [f32; 4],
}

impl CameraUniform {
    pub(crate) fn from_view(view: &SceneView<'_>) -> Self {
        let (width, height) = view.surface.drawing_buffer_size();
        Self {
            view_proj: view.camera.view_projection().to_cols_array_2d(),
            position: view.camera.position.extend(1.0).to_array(),
            viewport: [
                width as f32,
                height as f32,
                view.surface.pixel_ratio() as f32,
                view.camera.aspect,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct HologramUniform {
    color: [f32; 4],
    time: f32,
    _pad: [f32; 3],
}

impl HologramUniform {
    pub(crate) fn from_material(material: &ShaderMaterial) -> Self {
        let [r, g, b] = material.uniforms.color.to_linear();
        Self {
            color: [r, g, b, 1.0],
            time: material.uniforms.time,
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ModelUniform {
    matrix: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
}

impl ModelUniform {
    pub(crate) fn new(world: Mat4) -> Self {
        let normal = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            world
        };
        Self {
            matrix: world.to_cols_array_2d(),
            normal_matrix: normal.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SpriteUniform {
    color: [f32; 4],
    size: f32,
    attenuation: f32,
    has_alpha_map: f32,
    _pad: f32,
}

impl SpriteUniform {
    pub(crate) fn from_material(material: &PointsMaterial) -> Self {
        let [r, g, b] = material.color.to_linear();
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            color: [r, g, b, 1.0],
            size: material.size,
            attenuation: flag(material.size_attenuation),
            has_alpha_map: flag(material.alpha_map.is_some()),
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

pub(crate) fn interleave(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.normals)
        .map(|(position, normal)| Vertex {
            position: *position,
            normal: *normal,
        })
        .collect()
}

pub(crate) fn blend_state(state: &RenderState) -> wgpu::BlendState {
    match (state.blending, state.transparent) {
        (Blending::Additive, _) => {
            let additive = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: additive,
                alpha: additive,
            }
        }
        (Blending::Normal, true) => wgpu::BlendState::ALPHA_BLENDING,
        (Blending::Normal, false) => wgpu::BlendState::REPLACE,
    }
}

pub(crate) fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

pub(crate) fn clear_color(view: &SceneView<'_>) -> wgpu::Color {
    let [r, g, b] = view.surface.clear_color.to_linear();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PipelineKind {
    Hologram,
    Sprite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    kind: PipelineKind,
    state: RenderState,
    samples: u32,
}

struct MeshGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

struct PointsGpu {
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    count: u32,
    /// Field version last uploaded.
    version: Option<u64>,
}

struct MaterialGpu {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Keeps the alpha map alive for sprite materials.
    _texture: Option<wgpu::Texture>,
}

struct Layouts {
    camera: wgpu::BindGroupLayout,
    hologram: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    sprite: wgpu::BindGroupLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        Self {
            camera: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
                entries: &[uniform(0, both)],
            }),
            hologram: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("hologram_bind_group_layout"),
                entries: &[uniform(0, both)],
            }),
            model: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("model_bind_group_layout"),
                entries: &[uniform(0, wgpu::ShaderStages::VERTEX)],
            }),
            sprite: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sprite_bind_group_layout"),
                entries: &[
                    uniform(0, both),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            }),
        }
    }
}

/// One draw recorded while walking the scene, replayed inside the pass.
enum DrawCall {
    Mesh {
        node: NodeId,
        material: MaterialHandle,
        key: PipelineKey,
    },
    Points {
        node: NodeId,
        material: MaterialHandle,
        key: PipelineKey,
    },
}

impl DrawCall {
    fn key(&self) -> &PipelineKey {
        match self {
            DrawCall::Mesh { key, .. } | DrawCall::Points { key, .. } => key,
        }
    }
}

/// wgpu scene renderer.
///
/// Draws shader-material meshes with the holographic program and point nodes
/// as additive sprites into an offscreen target at the drawing-buffer size,
/// then stretches that target over the output view. GPU resources are created
/// lazily per node and per material and dropped when their node leaves the
/// scene.
pub struct WgpuRenderer {
    format: wgpu::TextureFormat,
    layouts: Layouts,
    hologram_shader: wgpu::ShaderModule,
    particle_shader: wgpu::ShaderModule,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    meshes: HashMap<NodeId, MeshGpu>,
    points: HashMap<NodeId, PointsGpu>,
    materials: HashMap<MaterialHandle, MaterialGpu>,
    target: Option<OffscreenTarget>,
    blitter: Blitter,
}

impl WgpuRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let layouts = Layouts::new(device);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let hologram_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("hologram_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::HOLOGRAPHIC_SHADER.into()),
        });
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PARTICLE_SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("alpha_map_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            format,
            blitter: Blitter::new(device, format),
            layouts,
            hologram_shader,
            particle_shader,
            pipelines: HashMap::new(),
            camera_buffer,
            camera_bind_group,
            sampler,
            meshes: HashMap::new(),
            points: HashMap::new(),
            materials: HashMap::new(),
            target: None,
        }
    }

    /// Render `view` into `output`. Validation errors raised while recording
    /// the frame come back as [`RenderError::Backend`].
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        view: &SceneView<'_>,
    ) -> Result<(), RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.encode(device, queue, output, view);
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(RenderError::Backend(error.to_string())),
            None => Ok(()),
        }
    }

    fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        view: &SceneView<'_>,
    ) {
        let (width, height) = view.surface.drawing_buffer_size();
        let samples = target::sample_count(view.surface.antialias);
        if !self
            .target
            .as_ref()
            .is_some_and(|t| t.matches(width, height, samples))
        {
            let target = OffscreenTarget::new(device, self.format, width, height, samples);
            self.blitter.bind(device, &target);
            self.target = Some(target);
        }

        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from_view(view)),
        );

        let calls = self.prepare(device, queue, view, samples);

        let Some(target) = &self.target else {
            return;
        };
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(target.color_attachment(clear_color(view)))],
                depth_stencil_attachment: Some(target.depth_attachment()),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for call in &calls {
                let Some(pipeline) = self.pipelines.get(call.key()) else {
                    continue;
                };
                match call {
                    DrawCall::Mesh { node, material, .. } => {
                        let (Some(mesh), Some(material)) =
                            (self.meshes.get(node), self.materials.get(material))
                        else {
                            continue;
                        };
                        pass.set_pipeline(pipeline);
                        pass.set_bind_group(1, &material.bind_group, &[]);
                        pass.set_bind_group(2, &mesh.model_bind_group, &[]);
                        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    DrawCall::Points { node, material, .. } => {
                        let (Some(points), Some(material)) =
                            (self.points.get(node), self.materials.get(material))
                        else {
                            continue;
                        };
                        if points.count == 0 {
                            continue;
                        }
                        pass.set_pipeline(pipeline);
                        pass.set_bind_group(1, &material.bind_group, &[]);
                        pass.set_vertex_buffer(0, points.instance_buffer.slice(..));
                        pass.draw(0..6, 0..points.count);
                    }
                }
            }
        }

        self.blitter.blit(&mut encoder, output);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Walk the scene, sync GPU resources with it, and return the draw list
    /// with opaque draws ahead of transparent ones.
    fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &SceneView<'_>,
        samples: u32,
    ) -> Vec<DrawCall> {
        let mut calls = Vec::new();
        let mut seen = HashSet::new();

        view.scene.walk(|id, node, world| match &node.kind {
            NodeKind::Group => {}
            NodeKind::Mesh(mesh) => {
                let Some(Material::Shader(material)) = view.materials.get(mesh.material) else {
                    tracing::trace!(node = %id.short(), "skipping mesh without a shader material");
                    return;
                };
                if mesh.geometry.indices.is_empty() || mesh.geometry.positions.is_empty() {
                    return;
                }
                seen.insert(id);
                self.sync_mesh(device, queue, id, &mesh.geometry, world);
                self.sync_hologram(device, queue, mesh.material, material);
                let key = self.pipeline(device, PipelineKind::Hologram, material.state, samples);
                calls.push(DrawCall::Mesh {
                    node: id,
                    material: mesh.material,
                    key,
                });
            }
            NodeKind::Points(points) => {
                let Some(Material::Points(material)) = view.materials.get(points.material) else {
                    tracing::trace!(node = %id.short(), "skipping points without a points material");
                    return;
                };
                seen.insert(id);
                self.sync_points(device, queue, id, &points.field);
                self.sync_sprite(device, queue, points.material, material);
                let key = self.pipeline(device, PipelineKind::Sprite, material.state, samples);
                calls.push(DrawCall::Points {
                    node: id,
                    material: points.material,
                    key,
                });
            }
        });

        self.meshes.retain(|id, _| seen.contains(id));
        self.points.retain(|id, _| seen.contains(id));

        calls.sort_by_key(|call| call.key().state.transparent);
        calls
    }

    fn sync_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: NodeId,
        geometry: &Geometry,
        world: Mat4,
    ) {
        let uniform = ModelUniform::new(world);
        if let Some(mesh) = self.meshes.get(&id) {
            queue.write_buffer(&mesh.model_buffer, 0, bytemuck::bytes_of(&uniform));
            return;
        }

        let vertices = interleave(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout: &self.layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        tracing::debug!(
            node = %id.short(),
            vertices = vertices.len(),
            indices = geometry.indices.len(),
            "mesh uploaded"
        );
        self.meshes.insert(
            id,
            MeshGpu {
                vertex_buffer,
                index_buffer,
                index_count: geometry.indices.len() as u32,
                model_buffer,
                model_bind_group,
            },
        );
    }

    fn sync_points(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: NodeId,
        field: &ParticleField,
    ) {
        let count = field.count();
        let needs_buffer = self
            .points
            .get(&id)
            .is_none_or(|p| p.capacity < count);
        if needs_buffer {
            let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("particle_instance_buffer"),
                size: (count.max(1) * std::mem::size_of::<[f32; 3]>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.points.insert(
                id,
                PointsGpu {
                    instance_buffer,
                    capacity: count,
                    count: 0,
                    version: None,
                },
            );
        }

        let Some(points) = self.points.get_mut(&id) else {
            return;
        };
        if points.version == Some(field.version()) {
            return;
        }
        if count > 0 {
            queue.write_buffer(
                &points.instance_buffer,
                0,
                bytemuck::cast_slice(field.positions()),
            );
        }
        points.count = count as u32;
        points.version = Some(field.version());
    }

    fn sync_hologram(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        handle: MaterialHandle,
        material: &ShaderMaterial,
    ) {
        let uniform = HologramUniform::from_material(material);
        if let Some(gpu) = self.materials.get(&handle) {
            queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&uniform));
            return;
        }

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hologram_buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hologram_bind_group"),
            layout: &self.layouts.hologram,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        self.materials.insert(
            handle,
            MaterialGpu {
                buffer,
                bind_group,
                _texture: None,
            },
        );
    }

    fn sync_sprite(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        handle: MaterialHandle,
        material: &PointsMaterial,
    ) {
        let uniform = SpriteUniform::from_material(material);
        if let Some(gpu) = self.materials.get(&handle) {
            queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&uniform));
            return;
        }

        // A 1x1 white texel stands in when there is no alpha map.
        let (width, height, texels) = match &material.alpha_map {
            Some(map) => (map.width, map.height, map.rgba.as_slice()),
            None => (1, 1, &[255u8; 4][..]),
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("alpha_map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let texture_view = texture.create_view(&Default::default());

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_bind_group"),
            layout: &self.layouts.sprite,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        tracing::debug!(width, height, "sprite material uploaded");
        self.materials.insert(
            handle,
            MaterialGpu {
                buffer,
                bind_group,
                _texture: Some(texture),
            },
        );
    }

    /// Look up or build the pipeline for a material kind and render state.
    fn pipeline(
        &mut self,
        device: &wgpu::Device,
        kind: PipelineKind,
        state: RenderState,
        samples: u32,
    ) -> PipelineKey {
        let key = PipelineKey {
            kind,
            state,
            samples,
        };
        if self.pipelines.contains_key(&key) {
            return key;
        }

        let (label, module, bind_group_layouts, buffers): (
            &str,
            &wgpu::ShaderModule,
            Vec<&wgpu::BindGroupLayout>,
            Vec<wgpu::VertexBufferLayout<'static>>,
        ) = match kind {
            PipelineKind::Hologram => (
                "hologram_pipeline",
                &self.hologram_shader,
                vec![&self.layouts.camera, &self.layouts.hologram, &self.layouts.model],
                vec![wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &HOLOGRAM_ATTRIBUTES,
                }],
            ),
            PipelineKind::Sprite => (
                "sprite_pipeline",
                &self.particle_shader,
                vec![&self.layouts.camera, &self.layouts.sprite],
                vec![wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &SPRITE_ATTRIBUTES,
                }],
            ),
        };

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(blend_state(&state)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: match kind {
                    PipelineKind::Hologram => cull_mode(state.side),
                    PipelineKind::Sprite => None,
                },
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: target::DEPTH_FORMAT,
                depth_write_enabled: state.depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        tracing::debug!(?kind, ?state, samples, "pipeline created");
        self.pipelines.insert(key, pipeline);
        key
    }
}

const HOLOGRAM_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const SPRITE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

#[cfg(test)]
mod tests {
    use super::*;
    use hologram_common::Color;
    use hologram_render::{PerspectiveCamera, RenderSurface, ViewportSize};
    use hologram_scene::{MaterialLibrary, Scene};

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
        assert_eq!(std::mem::size_of::<HologramUniform>(), 32);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
        assert_eq!(std::mem::size_of::<SpriteUniform>(), 32);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn additive_glow_blends_src_alpha_one() {
        let blend = blend_state(&RenderState::additive_glow(Side::Double));
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend_state(&RenderState::default()), wgpu::BlendState::REPLACE);
    }

    #[test]
    fn double_sided_disables_culling() {
        assert_eq!(cull_mode(Side::Double), None);
        assert_eq!(cull_mode(Side::Front), Some(wgpu::Face::Back));
        assert_eq!(cull_mode(Side::Back), Some(wgpu::Face::Front));
    }

    #[test]
    fn camera_uniform_carries_drawing_buffer() {
        let scene = Scene::new();
        let materials = MaterialLibrary::new();
        let camera = PerspectiveCamera::new(25.0, 1600.0 / 900.0, 0.1, 100.0);
        let surface = RenderSurface::new(ViewportSize::new(1600, 900), 2.0, Color::WHITE);
        let view = SceneView {
            scene: &scene,
            materials: &materials,
            camera: &camera,
            surface: &surface,
        };
        let uniform = CameraUniform::from_view(&view);
        assert_eq!(uniform.viewport[0], 3200.0);
        assert_eq!(uniform.viewport[1], 1800.0);
        assert_eq!(uniform.viewport[2], 2.0);
        assert_eq!(clear_color(&view), wgpu::Color::WHITE);
    }

    #[test]
    fn sprite_uniform_flags_alpha_map() {
        let material = PointsMaterial::default();
        let uniform = SpriteUniform::from_material(&material);
        assert_eq!(uniform.has_alpha_map, 0.0);
        assert_eq!(uniform.attenuation, 1.0);
        assert_eq!(uniform.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn interleave_pairs_positions_with_normals() {
        let geometry = Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
        );
        let vertices = interleave(&geometry);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn degenerate_world_matrix_keeps_normals_finite() {
        let uniform = ModelUniform::new(Mat4::from_scale(glam::Vec3::ZERO));
        assert!(uniform.normal_matrix.iter().flatten().all(|v| v.is_finite()));
    }
}
