use anyhow::Context;
use clap::{Parser, Subcommand};
use hologram_assets::FsAssetLoader;
use hologram_driver::{FrameDriver, SceneConfig, SceneContext};
use hologram_render::{DebugTextRenderer, ViewportSize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hologram-cli", about = "Headless tools for the hologram showcase")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a glTF model and print what it contains
    Inspect {
        /// Path to a .gltf or .glb file
        model: PathBuf,
    },
    /// Assemble the scene without a window and run frames through the text renderer
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Model to load instead of the configured one
        #[arg(long)]
        model: Option<PathBuf>,
        /// JSON scene config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("hologram-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", hologram_assets::crate_info());
            println!("render: {}", hologram_render::crate_info());
            println!("driver: {}", hologram_driver::crate_info());
        }
        Commands::Inspect { model } => {
            let data = hologram_assets::import_gltf(&model)
                .with_context(|| format!("loading {}", model.display()))?;
            println!("Model: {}", data.name);
            println!(
                "  meshes={} vertices={} triangles={} materials={}",
                data.mesh_count(),
                data.vertex_count(),
                data.triangle_count(),
                data.materials.len()
            );
            for mesh in &data.meshes {
                println!(
                    "  - {} verts={} tris={} material={}",
                    mesh.name,
                    mesh.geometry.vertex_count(),
                    mesh.geometry.triangle_count(),
                    mesh.material
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| "none".into())
                );
            }
        }
        Commands::Simulate {
            frames,
            model,
            config,
        } => {
            let mut scene_config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => SceneConfig::default(),
            };
            if let Some(model) = model {
                scene_config.model_path = model;
            }

            let loader = FsAssetLoader::new();
            let mut ctx =
                SceneContext::assemble(&scene_config, ViewportSize::new(800, 600), 1.0, &loader);

            // Give the background load a chance to land before the first frame.
            let waited = std::time::Instant::now();
            while ctx.is_loading() && waited.elapsed() < std::time::Duration::from_secs(10) {
                if !ctx.poll_assets() {
                    std::thread::sleep(std::time::Duration::from_millis(5));
                }
            }
            if ctx.is_loading() {
                tracing::warn!(
                    path = %scene_config.model_path.display(),
                    "model still loading after 10s, simulating without it"
                );
            }

            tracing::info!(frames, "simulating");

            let mut driver = FrameDriver::new(&scene_config);
            let mut renderer = DebugTextRenderer::new();
            match driver.run(&mut ctx, &mut renderer, frames)? {
                Some(report) => {
                    print!("{}", report.output);
                    println!(
                        "Simulated {} frames: elapsed={:.3}s model={}",
                        report.frame,
                        report.elapsed,
                        if report.model_loaded { "loaded" } else { "absent" }
                    );
                }
                None => println!("No frames simulated"),
            }
        }
    }

    Ok(())
}
