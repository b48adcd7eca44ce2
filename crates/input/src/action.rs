/// A camera gesture, in window pixels or wheel steps.
///
/// The desktop app translates raw window events into these; controls consume
/// actions, never raw input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitAction {
    /// Orbit around the target by a pointer drag.
    Rotate { dx: f32, dy: f32 },
    /// Slide the target in the view plane by a pointer drag.
    Pan { dx: f32, dy: f32 },
    /// Dolly towards (negative) or away from (positive) the target.
    Zoom(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_rotate_is_constructible() {
        let a = OrbitAction::Rotate { dx: 1.0, dy: 0.0 };
        assert!(matches!(a, OrbitAction::Rotate { .. }));
    }

    #[test]
    fn action_zoom_sign() {
        assert_eq!(OrbitAction::Zoom(-1.0), OrbitAction::Zoom(-1.0));
        assert_ne!(OrbitAction::Zoom(1.0), OrbitAction::Zoom(-1.0));
    }
}
