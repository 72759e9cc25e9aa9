//! Scene state: node graph, material library, particle buffer.
//!
//! # Invariants
//! - All mutations go through explicit operations on [`Scene`] or
//!   [`MaterialLibrary`].
//! - Materials are referenced by handle; two meshes share a material exactly
//!   when their handles are equal.
//! - A [`ParticleField`] never changes its point count after construction.

pub mod geometry;
pub mod graph;
pub mod material;
pub mod particles;
pub mod texture;

pub use geometry::Geometry;
pub use graph::{Mesh, Node, NodeKind, Points, Scene, SceneError};
pub use material::{
    Blending, Material, MaterialHandle, MaterialLibrary, PointsMaterial, RenderState,
    ShaderMaterial, ShaderUniforms, Side, StandardMaterial,
};
pub use particles::ParticleField;
pub use texture::Texture;
