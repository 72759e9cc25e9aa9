//! wgpu render backend for the hologram showcase.
//!
//! Meshes with a shader material are drawn by the holographic program and
//! point nodes as camera-facing sprites. The scene is rendered at the
//! drawing-buffer size (logical size times capped pixel ratio) and then
//! scaled onto the window surface.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Particle positions are re-uploaded only when the field version moves.

mod gpu;
mod shaders;
mod surface;
mod target;

pub use gpu::WgpuRenderer;
pub use surface::SurfaceFrame;
