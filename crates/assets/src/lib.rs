//! Asset loading: glTF models, particle textures, background model loads.
//!
//! Everything here produces plain CPU-side data. Models become
//! [`ModelData`], which is turned into scene nodes with
//! [`ModelData::instantiate`]; images become [`hologram_scene::Texture`].
//!
//! # Invariants
//! - A model load is single-shot: a [`PendingModel`] yields its result once.
//! - Loading never touches the scene; only the frame thread does.

mod loader;
mod model;
mod texture;

use std::path::PathBuf;

pub use loader::{AssetLoader, FsAssetLoader, PendingModel};
pub use model::{ImportedMesh, ModelData, import_gltf};
pub use texture::{decode_texture, load_texture};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("mesh {0:?} has no position data")]
    MissingPositions(String),
    #[error("texture {0:?} has unusable dimensions")]
    InvalidTexture(String),
    #[error("scene error: {0}")]
    Scene(#[from] hologram_scene::SceneError),
    #[error("loader for {0:?} stopped without a result")]
    LoaderDisconnected(PathBuf),
}

pub fn crate_info() -> &'static str {
    concat!("hologram-assets v", env!("CARGO_PKG_VERSION"))
}
