use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform with a yaw rotation about +Y and a uniform scale.
    pub fn from_yaw_scale(position: Vec3, yaw: f32, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
            scale: Vec3::splat(scale),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Timing snapshot produced by one frame tick.
///
/// `elapsed` never decreases between ticks, so `delta` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameTime {
    /// Zero-based index of the tick.
    pub index: u64,
    /// Seconds since the clock was created.
    pub elapsed: f64,
    /// Seconds since the previous tick.
    pub delta: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn yaw_scale_transform_keeps_ground_height() {
        let t = Transform::from_yaw_scale(Vec3::new(1.0, 0.0, -2.0), 0.5, 0.75);
        let origin = t.matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-6);
        assert_eq!(t.scale, Vec3::splat(0.75));
    }

    #[test]
    fn frame_time_default_is_zero() {
        let ft = FrameTime::default();
        assert_eq!(ft.index, 0);
        assert_eq!(ft.elapsed, 0.0);
        assert_eq!(ft.delta, 0.0);
    }
}
