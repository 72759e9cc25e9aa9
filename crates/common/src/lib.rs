//! Shared types for the hologram showcase.
//!
//! Nothing here touches the GPU or the window; every other crate in the
//! workspace builds on these.

mod types;

pub use types::{Color, ColorParseError, NodeId, Transform};
