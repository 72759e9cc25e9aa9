//! The showcase itself: scene assembly, model load completion, frame loop.
//!
//! # Invariants
//! - All state lives in one [`SceneContext`]; there are no globals.
//! - Only the thread that owns the context mutates it. Model loads hand their
//!   result over through a [`hologram_assets::PendingModel`].
//! - [`FrameDriver::step`] reports failure as a value; the host decides
//!   whether another frame is scheduled.

mod config;
mod context;
mod frame;

pub use config::{
    CameraConfig, ConfigError, ControlsConfig, ModelPlacement, ParticleConfig, SceneConfig,
};
pub use context::SceneContext;
pub use frame::{
    Clock, FrameDriver, FrameError, FrameReport, MonotonicClock, SystemWallClock, WallClock,
};

pub fn crate_info() -> &'static str {
    concat!("hologram-driver v", env!("CARGO_PKG_VERSION"))
}
