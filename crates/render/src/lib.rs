//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never write uniforms.
//! - Render failures are returned as-is; the caller decides what to do.
//!
//! `DebugTextRenderer` implements the trait without a GPU, for the headless
//! CLI and for tests. The wgpu backend lives in `skyfield-render-wgpu`.

mod renderer;

pub use renderer::{DebugTextRenderer, FrameView, Renderer};
