//! Shared types for the skyfield workspace.
//!
//! Everything here is plain data: no GPU handles, no window state.

mod camera;
mod types;

pub use camera::PerspectiveCamera;
pub use types::{FrameTime, Transform};
