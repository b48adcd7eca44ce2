use std::f32::consts::{PI, TAU};

use glam::Vec3;
use skyfield_common::PerspectiveCamera;

use crate::action::OrbitAction;

/// Keeps the polar angle off the poles so `look_at` stays defined.
const POLAR_EPSILON: f32 = 1e-4;
/// Remaining motion below this is treated as settled.
const SETTLE_EPSILON: f32 = 1e-6;
/// Closest the eye may get to the target; at zero `look_at` is undefined.
const MIN_RADIUS: f32 = 1e-4;

/// Damped orbit/pan/zoom around the camera target.
///
/// Gestures accumulate into pending deltas. Each [`update`](Self::update)
/// applies a fraction of them (the damping factor) and decays the rest, so the
/// camera glides to a stop over several frames. Without damping the full delta
/// is applied at once.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    // Pending motion
    theta_delta: f32,
    phi_delta: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(enable_damping: bool, damping_factor: f32) -> Self {
        Self {
            enable_damping,
            damping_factor,
            ..Self::default()
        }
    }

    /// True when no pending motion remains.
    pub fn is_settled(&self) -> bool {
        self.theta_delta.abs() < SETTLE_EPSILON
            && self.phi_delta.abs() < SETTLE_EPSILON
            && self.pan_offset.length() < SETTLE_EPSILON
            && (self.scale - 1.0).abs() < SETTLE_EPSILON
    }

    /// Queue a gesture. `viewport_height` is in the same pixels as the drag.
    pub fn apply(&mut self, action: OrbitAction, camera: &PerspectiveCamera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        match action {
            OrbitAction::Rotate { dx, dy } => {
                self.theta_delta -= TAU * dx / height * self.rotate_speed;
                self.phi_delta -= TAU * dy / height * self.rotate_speed;
            }
            OrbitAction::Pan { dx, dy } => {
                // World units per pixel at the target distance
                let distance = (camera.position - camera.target).length();
                let span = distance * (camera.fov * 0.5).tan();
                let view = camera.view_matrix().inverse();
                let right = view.x_axis.truncate();
                let up = view.y_axis.truncate();
                let pan_x = 2.0 * dx * span / height * self.pan_speed;
                let pan_y = 2.0 * dy * span / height * self.pan_speed;
                self.pan_offset += -right * pan_x + up * pan_y;
            }
            OrbitAction::Zoom(steps) => {
                let dolly = 0.95_f32.powf(self.zoom_speed);
                self.scale *= dolly.powf(-steps);
            }
        }
    }

    /// Ease pending motion into `camera`. Call once per frame before drawing.
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.is_settled() {
            return false;
        }

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        let offset = camera.position - camera.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        theta += self.theta_delta * factor;
        phi = (phi + self.phi_delta * factor).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        // Scale eases in logarithmically so zoom in and out damp symmetrically
        let scale = self.scale.powf(factor);
        let zoomed = (radius * scale).clamp(self.min_distance.max(MIN_RADIUS), self.max_distance);
        if zoomed.is_finite() {
            radius = zoomed;
        }

        let pan = self.pan_offset * factor;
        camera.target += pan;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + offset;

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.theta_delta *= keep;
            self.phi_delta *= keep;
            self.pan_offset *= keep;
            self.scale = self.scale.powf(keep);
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
            self.scale = 1.0;
        }

        tracing::trace!(radius, theta, phi, "orbit camera updated");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera {
            position: Vec3::new(0.0, 0.0, 5.0),
            ..PerspectiveCamera::default()
        }
    }

    #[test]
    fn idle_controls_leave_camera_alone() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(true, 0.05);
        assert!(!controls.update(&mut cam));
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn rotate_keeps_distance() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Rotate { dx: 100.0, dy: 40.0 }, &cam, 720.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - 5.0).abs() < 1e-4);
        assert!(cam.position.x.abs() > 0.1);
        assert!(controls.is_settled());
    }

    #[test]
    fn damping_spreads_motion_over_frames() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(true, 0.1);
        controls.apply(OrbitAction::Rotate { dx: 200.0, dy: 0.0 }, &cam, 720.0);

        controls.update(&mut cam);
        let first = cam.position;
        assert!(!controls.is_settled());

        controls.update(&mut cam);
        assert_ne!(cam.position, first);

        for _ in 0..500 {
            controls.update(&mut cam);
        }
        assert!(controls.is_settled());
        assert!((cam.position.length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_in_and_out() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Zoom(-3.0), &cam, 720.0);
        controls.update(&mut cam);
        let near = cam.position.length();
        assert!(near < 5.0);

        controls.apply(OrbitAction::Zoom(6.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!(cam.position.length() > 5.0);
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut cam = camera();
        let mut controls = OrbitControls {
            min_distance: 4.0,
            ..OrbitControls::default()
        };
        controls.apply(OrbitAction::Zoom(-50.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn extreme_zoom_in_recovers() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Zoom(-2000.0), &cam, 720.0);
        controls.update(&mut cam);
        let closest = cam.position.distance(cam.target);
        assert!(closest > 0.0);
        assert!(cam.view_matrix().is_finite());

        controls.apply(OrbitAction::Zoom(50.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!(cam.position.distance(cam.target) > closest);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn extreme_zoom_out_keeps_last_radius() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Zoom(5000.0), &cam, 720.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - 5.0).abs() < 1e-4);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Pan { dx: 50.0, dy: 0.0 }, &cam, 720.0);
        controls.update(&mut cam);
        assert!(cam.target.x < 0.0, "drag right slides the target left");
        assert!((cam.target.y).abs() < 1e-5);
        let offset = cam.position - cam.target;
        assert!((offset - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn polar_angle_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        controls.apply(OrbitAction::Rotate { dx: 0.0, dy: -10_000.0 }, &cam, 720.0);
        controls.update(&mut cam);
        assert!(cam.position.y < 5.0);
        assert!(!cam.view_matrix().is_nan());
    }
}
