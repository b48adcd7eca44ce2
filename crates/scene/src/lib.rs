//! Scene description: typed configuration, built-in presets, materials with
//! named uniforms, and the one-shot instance placement for scattered fields.
//!
//! # Invariants
//! - A `Scene` is only ever built from a validated `SceneConfig`.
//! - Instance sets are generated once and never mutated afterwards.
//! - Only the frame loop writes the time uniform; renderers read it.

mod config;
mod error;
mod material;
mod presets;
mod scatter;
mod scene;

pub use config::{CameraConfig, FieldConfig, FieldMesh, SceneConfig, SkyConfig, SubjectConfig};
pub use error::SceneError;
pub use material::{Material, UniformValue, uniform};
pub use presets::{PRESET_NAMES, preset};
pub use scatter::{FieldBounds, InstanceSet, scatter, scatter_seeded};
pub use scene::{FieldLayer, Scene, SkyLayer, SubjectLayer, TimeUniform};
