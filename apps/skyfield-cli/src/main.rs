use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use skyfield_common::Transform;
use skyfield_frame::{FixedFrames, FrameContext, FrameLoop, ScriptedTime};
use skyfield_render::{DebugTextRenderer, FrameView, Renderer};
use skyfield_scene::{PRESET_NAMES, Scene, SceneConfig, preset};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyfield-cli", about = "Headless tooling for skyfield scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scene presets
    Presets,
    /// Validate a scene YAML file and print what it builds
    Validate {
        /// Path to the scene file
        path: PathBuf,
    },
    /// Dump a scene's instance placement as JSON
    Scatter {
        #[command(flatten)]
        scene: SceneArgs,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drive a scene through scripted frames and print each one
    Run {
        #[command(flatten)]
        scene: SceneArgs,
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Simulated refresh rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,
        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: u32,
    },
}

/// Where a scene comes from: a preset name or a YAML file.
#[derive(Args)]
struct SceneArgs {
    /// Built-in preset name
    #[arg(long, default_value = "grass")]
    scene: String,
    /// Scene YAML file; overrides --scene
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the field placement seed
    #[arg(long)]
    seed: Option<u64>,
}

impl SceneArgs {
    fn load(&self) -> anyhow::Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::from_yaml_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => preset(&self.scene)?,
        };
        if let Some(seed) = self.seed {
            config.reseed(seed);
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct ScatterDump<'a> {
    scene: &'a str,
    mesh: &'a str,
    width: f32,
    depth: f32,
    instances: &'a [Transform],
}

fn scatter_json(scene: &Scene) -> anyhow::Result<String> {
    let field = scene
        .field
        .as_ref()
        .with_context(|| format!("scene '{}' has no field to scatter", scene.name()))?;
    let instances = field.instances();
    let bounds = instances.bounds();
    let dump = ScatterDump {
        scene: scene.name(),
        mesh: field.mesh.as_str(),
        width: bounds.width,
        depth: bounds.depth,
        instances: instances.as_slice(),
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// Keeps every frame's text, not just the latest.
#[derive(Default)]
struct Transcript {
    inner: DebugTextRenderer,
    text: String,
}

impl Renderer for Transcript {
    type Error = std::fmt::Error;

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error> {
        self.inner.render(frame)?;
        self.text.push_str(self.inner.output());
        Ok(())
    }
}

fn run_frames(
    scene: Scene,
    frames: u64,
    fps: f64,
    width: u32,
    height: u32,
) -> anyhow::Result<String> {
    let mut ctx = FrameContext::new(scene);
    ctx.resize(width, height);

    let mut frame_loop = FrameLoop::new(ScriptedTime::at_fps(fps, frames));
    let mut host = FixedFrames::new(frames);
    let mut transcript = Transcript::default();

    let reason = frame_loop.run(&mut host, &mut ctx, &mut transcript)?;
    tracing::info!(%reason, frames = transcript.inner.frames(), "run finished");
    Ok(transcript.text)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Presets => {
            for name in PRESET_NAMES {
                let scene = Scene::build(&preset(name)?)?;
                let layers: Vec<&str> = scene.materials().map(|m| m.name()).collect();
                println!(
                    "{name:<12} time_scale={:<5.2} instances={:<6} layers={}",
                    scene.time().scale(),
                    scene.instance_count(),
                    layers.join(",")
                );
            }
        }
        Commands::Validate { path } => {
            let config = SceneConfig::from_yaml_path(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let scene = Scene::build(&config)?;
            println!("{}: OK", path.display());
            println!("  scene: {}", scene.name());
            println!("  time_scale: {:.3}", scene.time().scale());
            println!("  instances: {}", scene.instance_count());
            for material in scene.materials() {
                let uniforms: Vec<String> = material
                    .uniforms()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                println!("  [{}] {}", material.name(), uniforms.join(" "));
            }
        }
        Commands::Scatter { scene, output } => {
            let scene = Scene::build(&scene.load()?)?;
            let json = scatter_json(&scene)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "Wrote {} instances to {}",
                        scene.instance_count(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Run {
            scene,
            frames,
            fps,
            width,
            height,
        } => {
            let scene = Scene::build(&scene.load()?)?;
            print!("{}", run_frames(scene, frames, fps, width, height)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(name: &str) -> Scene {
        Scene::build(&preset(name).unwrap()).unwrap()
    }

    #[test]
    fn scatter_dump_lists_every_instance() {
        let json = scatter_json(&scene("planes")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scene"], "planes");
        assert_eq!(value["mesh"], "plane");
        assert_eq!(value["instances"].as_array().unwrap().len(), 500);
    }

    #[test]
    fn scatter_needs_a_field() {
        assert!(scatter_json(&scene("sky")).is_err());
    }

    #[test]
    fn run_prints_each_frame() {
        let text = run_frames(scene("sky"), 3, 60.0, 800, 600).unwrap();
        assert_eq!(text.matches("=== Frame").count(), 3);
        assert!(text.contains("=== Frame 2"));
        assert!(text.contains("u_resolution"));
    }

    #[test]
    fn seed_override_applies_to_field() {
        let args = SceneArgs {
            scene: "grass".into(),
            config: None,
            seed: Some(99),
        };
        let config = args.load().unwrap();
        assert_eq!(config.field.map(|f| f.seed), Some(99));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let args = SceneArgs {
            scene: "nope".into(),
            config: None,
            seed: None,
        };
        assert!(args.load().is_err());
    }
}
