use skyfield_input::OrbitAction;
use winit::event::{MouseButton, MouseScrollDelta};

/// Pixel scroll distance that counts as one wheel step.
const PIXELS_PER_STEP: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Turns raw pointer events into orbit gestures.
///
/// Left drag orbits, right or middle drag pans, shift + left drag pans.
#[derive(Debug, Default)]
pub struct Pointer {
    drag: Option<Drag>,
    last: Option<(f32, f32)>,
    shift: bool,
}

impl Pointer {
    pub fn set_shift(&mut self, held: bool) {
        self.shift = held;
    }

    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        let mode = match button {
            MouseButton::Left if self.shift => Drag::Pan,
            MouseButton::Left => Drag::Rotate,
            MouseButton::Right | MouseButton::Middle => Drag::Pan,
            _ => return,
        };
        self.drag = pressed.then_some(mode);
    }

    /// Record the cursor position; returns a gesture while a drag is held.
    pub fn moved(&mut self, x: f32, y: f32) -> Option<OrbitAction> {
        let (px, py) = self.last.replace((x, y))?;
        let (dx, dy) = (x - px, y - py);
        match self.drag? {
            Drag::Rotate => Some(OrbitAction::Rotate { dx, dy }),
            Drag::Pan => Some(OrbitAction::Pan { dx, dy }),
        }
    }

    /// Cursor left the window: forget the position and any drag.
    pub fn left(&mut self) {
        self.last = None;
        self.drag = None;
    }
}

/// Wheel up dollies in.
pub fn wheel(delta: MouseScrollDelta) -> OrbitAction {
    let steps = match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_STEP,
    };
    OrbitAction::Zoom(-steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn no_gesture_without_drag() {
        let mut p = Pointer::default();
        assert_eq!(p.moved(10.0, 10.0), None);
        assert_eq!(p.moved(20.0, 15.0), None);
    }

    #[test]
    fn left_drag_rotates() {
        let mut p = Pointer::default();
        p.moved(10.0, 10.0);
        p.button(MouseButton::Left, true);
        assert_eq!(
            p.moved(14.0, 7.0),
            Some(OrbitAction::Rotate { dx: 4.0, dy: -3.0 })
        );
        p.button(MouseButton::Left, false);
        assert_eq!(p.moved(20.0, 7.0), None);
    }

    #[test]
    fn shift_or_right_drag_pans() {
        let mut p = Pointer::default();
        p.moved(0.0, 0.0);
        p.set_shift(true);
        p.button(MouseButton::Left, true);
        assert_eq!(p.moved(2.0, 0.0), Some(OrbitAction::Pan { dx: 2.0, dy: 0.0 }));

        let mut p = Pointer::default();
        p.moved(0.0, 0.0);
        p.button(MouseButton::Right, true);
        assert_eq!(p.moved(0.0, 5.0), Some(OrbitAction::Pan { dx: 0.0, dy: 5.0 }));
    }

    #[test]
    fn first_move_after_leaving_has_no_delta() {
        let mut p = Pointer::default();
        p.moved(0.0, 0.0);
        p.button(MouseButton::Left, true);
        p.left();
        p.button(MouseButton::Left, true);
        assert_eq!(p.moved(100.0, 100.0), None);
        assert!(p.moved(101.0, 100.0).is_some());
    }

    #[test]
    fn wheel_up_zooms_in() {
        assert_eq!(
            wheel(MouseScrollDelta::LineDelta(0.0, 1.0)),
            OrbitAction::Zoom(-1.0)
        );
        assert_eq!(
            wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0))),
            OrbitAction::Zoom(2.0)
        );
    }
}
