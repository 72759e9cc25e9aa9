use crate::texture::Texture;
use hologram_common::Color;
use std::collections::BTreeMap;

/// A handle referencing a material in the [`MaterialLibrary`].
///
/// Handles are never reused, so handle equality is material identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u64);

/// How fragments combine with what is already in the color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Which triangle faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Fixed-function state shared by every material kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub transparent: bool,
    pub side: Side,
    pub depth_write: bool,
    pub blending: Blending,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            transparent: false,
            side: Side::Front,
            depth_write: true,
            blending: Blending::Normal,
        }
    }
}

impl RenderState {
    /// Transparent, additive, no depth writes. Used by glowing effects.
    pub fn additive_glow(side: Side) -> Self {
        Self {
            transparent: true,
            side,
            depth_write: false,
            blending: Blending::Additive,
        }
    }
}

/// Uniform inputs of the holographic shader program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderUniforms {
    /// Seconds since the scene clock started. The only value written per frame.
    pub time: f32,
    pub color: Color,
}

/// A material drawn by a custom shader program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub label: String,
    pub uniforms: ShaderUniforms,
    pub state: RenderState,
}

impl ShaderMaterial {
    pub fn holographic(color: Color) -> Self {
        Self {
            label: "holographic".into(),
            uniforms: ShaderUniforms { time: 0.0, color },
            state: RenderState::additive_glow(Side::Double),
        }
    }
}

/// Material for point sprites.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsMaterial {
    pub color: Color,
    /// Sprite size in world units when attenuated, in pixels otherwise.
    pub size: f32,
    pub size_attenuation: bool,
    pub alpha_map: Option<Texture>,
    pub state: RenderState,
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            size: 1.0,
            size_attenuation: true,
            alpha_map: None,
            state: RenderState::default(),
        }
    }
}

/// Material carried over from an imported model before any override.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Shader(ShaderMaterial),
    Points(PointsMaterial),
    Standard(StandardMaterial),
}

impl Material {
    pub fn kind(&self) -> &'static str {
        match self {
            Material::Shader(_) => "shader",
            Material::Points(_) => "points",
            Material::Standard(_) => "standard",
        }
    }
}

/// Handle-addressed material storage.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: BTreeMap<MaterialHandle, Material>,
    next_id: u64,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a material and return a fresh handle for it.
    pub fn add(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id);
        self.next_id += 1;
        tracing::debug!(handle = handle.0, kind = material.kind(), "material added");
        self.materials.insert(handle, material);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(&handle)
    }

    pub fn shader(&self, handle: MaterialHandle) -> Option<&ShaderMaterial> {
        match self.materials.get(&handle) {
            Some(Material::Shader(m)) => Some(m),
            _ => None,
        }
    }

    pub fn shader_mut(&mut self, handle: MaterialHandle) -> Option<&mut ShaderMaterial> {
        match self.materials.get_mut(&handle) {
            Some(Material::Shader(m)) => Some(m),
            _ => None,
        }
    }

    pub fn points(&self, handle: MaterialHandle) -> Option<&PointsMaterial> {
        match self.materials.get(&handle) {
            Some(Material::Points(m)) => Some(m),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials.iter().map(|(h, m)| (*h, m))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
