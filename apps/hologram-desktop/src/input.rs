use hologram_render::{OrbitControls, PerspectiveCamera};
use winit::event::{MouseButton, MouseScrollDelta};

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_LINE: f64 = 50.0;

/// A pointer drag resolved to an orbit gesture, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drag {
    Rotate { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
}

/// Mouse state feeding the orbit controls: left drag rotates, right drag pans.
#[derive(Debug, Default)]
pub struct PointerInput {
    rotating: bool,
    panning: bool,
    last: Option<(f64, f64)>,
}

impl PointerInput {
    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right | MouseButton::Middle => self.panning = pressed,
            _ => {}
        }
    }

    /// Record a cursor position and return the drag it produced, if any.
    pub fn moved(&mut self, x: f64, y: f64) -> Option<Drag> {
        let last = self.last.replace((x, y))?;
        let dx = (x - last.0) as f32;
        let dy = (y - last.1) as f32;
        if self.rotating {
            Some(Drag::Rotate { dx, dy })
        } else if self.panning {
            Some(Drag::Pan { dx, dy })
        } else {
            None
        }
    }

    pub fn left(&mut self) {
        self.last = None;
        self.rotating = false;
        self.panning = false;
    }
}

pub fn apply_drag(
    drag: Drag,
    controls: &mut OrbitControls,
    camera: &PerspectiveCamera,
    viewport_height: f32,
) {
    match drag {
        Drag::Rotate { dx, dy } => controls.rotate(dx, dy, viewport_height),
        Drag::Pan { dx, dy } => controls.pan(dx, dy, camera, viewport_height),
    }
}

/// Wheel notches, positive when scrolling up.
pub fn scroll_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn first_move_only_records_position() {
        let mut input = PointerInput::default();
        input.button(MouseButton::Left, true);
        assert_eq!(input.moved(10.0, 10.0), None);
        assert_eq!(
            input.moved(15.0, 8.0),
            Some(Drag::Rotate { dx: 5.0, dy: -2.0 })
        );
    }

    #[test]
    fn right_button_pans_and_release_stops() {
        let mut input = PointerInput::default();
        input.moved(0.0, 0.0);
        input.button(MouseButton::Right, true);
        assert_eq!(input.moved(3.0, 4.0), Some(Drag::Pan { dx: 3.0, dy: 4.0 }));
        input.button(MouseButton::Right, false);
        assert_eq!(input.moved(6.0, 8.0), None);
    }

    #[test]
    fn leaving_the_window_resets_drag() {
        let mut input = PointerInput::default();
        input.button(MouseButton::Left, true);
        input.moved(1.0, 1.0);
        input.left();
        assert_eq!(input.moved(50.0, 50.0), None);
    }

    #[test]
    fn scroll_converts_pixels_to_lines() {
        assert_eq!(scroll_steps(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        assert_eq!(
            scroll_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 100.0))),
            2.0
        );
    }
}
