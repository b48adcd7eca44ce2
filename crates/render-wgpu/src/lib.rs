//! wgpu render backend for skyfield scenes.
//!
//! Draws the procedural sky as a full-screen pass, then the ground and the
//! instanced field, then the subject.
//!
//! # Invariants
//! - Instance buffers are written once at construction and never updated.
//! - Per frame only the uniform block is uploaded.
//! - The renderer reads the scene; it never mutates it.

mod context;
mod gpu;
mod mesh;
mod shaders;

pub use context::{GpuContext, GpuError, SurfaceAction};
pub use gpu::{FrameTarget, WgpuRenderer};
