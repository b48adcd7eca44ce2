//! Camera input: pointer gestures become [`OrbitAction`]s, which
//! [`OrbitControls`] accumulates and eases into the camera once per frame.
//!
//! # Invariants
//! - Window events never touch the camera directly; only `update` does.
//! - With damping enabled, motion decays geometrically and settles to rest.

pub mod action;
pub mod orbit;

pub use action::OrbitAction;
pub use orbit::OrbitControls;
