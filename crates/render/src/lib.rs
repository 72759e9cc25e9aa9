//! Rendering adapter: everything a frame needs that does not talk to a GPU.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - The camera's projection only changes through
//!   [`PerspectiveCamera::update_projection_matrix`].
//! - The surface pixel ratio never exceeds the sizer's cap.

mod camera;
mod controls;
mod renderer;
mod viewport;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use renderer::{DebugTextRenderer, RenderError, Renderer, SceneView};
pub use viewport::{RenderSurface, ViewportSize, ViewportSizer};

pub fn crate_info() -> &'static str {
    concat!("hologram-render v", env!("CARGO_PKG_VERSION"))
}
