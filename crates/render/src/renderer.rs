use std::convert::Infallible;
use std::fmt::Write;

use skyfield_common::{FrameTime, PerspectiveCamera};
use skyfield_scene::Scene;

/// Everything a renderer may read for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub time: FrameTime,
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera and draws. It never mutates the
/// scene: the frame loop owns uniform state.
pub trait Renderer {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Draw one frame.
    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error>;
}

/// Text renderer for headless runs.
///
/// Produces a human-readable summary of each frame: timing, camera, and every
/// material uniform. The latest frame is kept in `output`; `frames` counts calls.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    output: String,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the most recent frame.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn describe(frame: &FrameView<'_>) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let FrameView {
            time,
            scene,
            camera,
        } = frame;

        writeln!(
            out,
            "=== Frame {} (t={:.3}s, dt={:.3}s) scene={} ===",
            time.index,
            time.elapsed,
            time.delta,
            scene.name()
        )?;
        writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees()
        )?;
        if let Some(field) = &scene.field {
            writeln!(
                out,
                "Field: {} x {}",
                field.instances().len(),
                field.mesh.as_str()
            )?;
        }
        for material in scene.materials() {
            write!(out, "  [{}]", material.name())?;
            for (name, value) in material.uniforms() {
                write!(out, " {name}={value}")?;
            }
            writeln!(out)?;
        }
        Ok(out)
    }
}

impl Renderer for DebugTextRenderer {
    type Error = std::fmt::Error;

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error> {
        self.output = Self::describe(frame)?;
        self.frames += 1;
        tracing::trace!(frame = frame.time.index, "debug frame rendered");
        Ok(())
    }
}

/// Renderer that draws nothing; for driving the loop without output.
impl Renderer for () {
    type Error = Infallible;

    fn render(&mut self, _frame: &FrameView<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}
