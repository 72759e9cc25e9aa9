use crate::model::{ModelData, import_gltf};
use crate::texture::load_texture;
use crate::AssetError;
use hologram_scene::Texture;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

type ModelResult = Result<ModelData, AssetError>;

/// Source of the scene's assets.
///
/// Model loads are asynchronous and hand back a [`PendingModel`] to poll;
/// textures are small and load synchronously.
pub trait AssetLoader {
    fn load_model(&self, path: &Path) -> PendingModel;
    fn load_texture(&self, path: &Path) -> Result<Texture, AssetError>;
}

/// A model load in flight. Yields its result exactly once.
#[derive(Debug)]
pub struct PendingModel {
    path: PathBuf,
    receiver: Option<Receiver<ModelResult>>,
}

impl PendingModel {
    /// Create a pending load and the sender its producer completes it with.
    pub fn channel(path: impl Into<PathBuf>) -> (Sender<ModelResult>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                path: path.into(),
                receiver: Some(rx),
            },
        )
    }

    /// A load that has already finished.
    pub fn ready(path: impl Into<PathBuf>, result: ModelResult) -> Self {
        let (tx, pending) = Self::channel(path);
        // The receiver is alive in `pending`, so this send cannot fail.
        let _ = tx.send(result);
        pending
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the result has been handed out.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }

    /// Non-blocking check for the result. Returns `Some` once, then `None`.
    pub fn poll(&mut self) -> Option<ModelResult> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(AssetError::LoaderDisconnected(self.path.clone())))
            }
        }
    }

    /// Block until the load finishes.
    pub fn wait(mut self) -> ModelResult {
        match self.receiver.take() {
            Some(receiver) => receiver
                .recv()
                .unwrap_or_else(|_| Err(AssetError::LoaderDisconnected(self.path.clone()))),
            None => Err(AssetError::LoaderDisconnected(self.path)),
        }
    }
}

/// Loads assets from the filesystem. Each model is parsed on its own worker thread.
#[derive(Debug, Clone, Default)]
pub struct FsAssetLoader;

impl FsAssetLoader {
    pub fn new() -> Self {
        Self
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_model(&self, path: &Path) -> PendingModel {
        let (tx, pending) = PendingModel::channel(path);
        let path = path.to_path_buf();
        tracing::info!(path = %path.display(), "model load requested");

        let spawned = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn({
                let path = path.clone();
                move || {
                    let result = import_gltf(&path);
                    // The frame side may have gone away; nothing left to tell.
                    let _ = tx.send(result);
                }
            });

        match spawned {
            Ok(_) => pending,
            Err(e) => PendingModel::ready(path, Err(AssetError::Io(e))),
        }
    }

    fn load_texture(&self, path: &Path) -> Result<Texture, AssetError> {
        load_texture(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_yields_once() {
        let mut pending = PendingModel::ready("m.gltf", Ok(ModelData::default()));
        assert!(!pending.is_finished());
        assert!(matches!(pending.poll(), Some(Ok(_))));
        assert!(pending.is_finished());
        assert!(pending.poll().is_none());
    }

    #[test]
    fn empty_channel_is_still_pending() {
        let (_tx, mut pending) = PendingModel::channel("m.gltf");
        assert!(pending.poll().is_none());
        assert!(!pending.is_finished());
    }

    #[test]
    fn dropped_producer_reports_disconnect() {
        let (tx, mut pending) = PendingModel::channel("m.gltf");
        drop(tx);
        assert!(matches!(
            pending.poll(),
            Some(Err(AssetError::LoaderDisconnected(_)))
        ));
        assert!(pending.poll().is_none());
    }

    #[test]
    fn fs_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let pending = FsAssetLoader::new().load_model(&dir.path().join("missing.gltf"));
        assert!(pending.wait().is_err());
    }

    #[test]
    fn fs_loader_delivers_parsed_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::model::tests::write_fixture(dir.path());
        let mut pending = FsAssetLoader::new().load_model(&path);
        assert_eq!(pending.path(), path.as_path());

        let model = loop {
            match pending.poll() {
                Some(result) => break result.unwrap(),
                None => std::thread::sleep(std::time::Duration::from_millis(5)),
            }
        };
        assert_eq!(model.name, "scene");
        assert_eq!(model.mesh_count(), 2);
        assert!(pending.is_finished());
    }

    #[test]
    fn wait_returns_sent_model() {
        let (tx, pending) = PendingModel::channel("m.gltf");
        std::thread::spawn(move || {
            let _ = tx.send(Ok(ModelData {
                name: "late".into(),
                ..ModelData::default()
            }));
        });
        assert_eq!(pending.wait().unwrap().name, "late");
    }
}
