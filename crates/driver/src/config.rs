use glam::Vec3;
use hologram_common::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scene config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every tunable of the scene. Missing fields in a config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub model_path: PathBuf,
    pub particle_texture_path: PathBuf,
    pub clear_color: Color,
    pub hologram_color: Color,
    /// Upper bound applied to the device pixel ratio.
    pub max_pixel_ratio: f64,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub model: ModelPlacement,
    pub particles: ParticleConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("static/models/robot/scene.gltf"),
            particle_texture_path: PathBuf::from("static/textures/particle.png"),
            clear_color: Color::rgb(2.0 / 255.0, 2.0 / 255.0, 21.0 / 255.0),
            hologram_color: Color::rgb(112.0 / 255.0, 193.0 / 255.0, 1.0),
            max_pixel_ratio: 2.0,
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            model: ModelPlacement::default(),
            particles: ParticleConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 25.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(5.0, 2.0, 6.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_zoom: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_zoom: false,
            enable_damping: false,
            damping_factor: 0.05,
        }
    }
}

/// Where the loaded model sits and how fast it turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPlacement {
    pub scale: f32,
    pub offset_y: f32,
    /// Radians of rotation about Y per second of elapsed time.
    pub spin_speed: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            scale: 0.25,
            offset_y: -0.75,
            spin_speed: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Half-width of the cube the particles start in.
    pub spread: f32,
    pub size: f32,
    pub size_attenuation: bool,
    pub drift_amplitude: f64,
    /// Multiplier turning wall-clock milliseconds into drift phase.
    pub drift_frequency: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            spread: 5.0,
            size: 0.15,
            size_attenuation: true,
            drift_amplitude: 0.01,
            drift_frequency: 0.001,
        }
    }
}
