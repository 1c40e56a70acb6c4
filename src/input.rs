use egui::{Context, Key, PointerButton, Pos2, Rect};

use crate::geometry::Point;
use crate::interaction::EditorKey;

/// Canvas input, with positions relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed over the canvas
    PointerDown(Point),
    PointerMove(Point),
    /// Primary button released, anywhere in the window
    PointerUp(Point),
    /// Pointer left the window while the button was held
    PointerCancel,
    KeyDown(EditorKey),
    KeyUp(EditorKey),
}

pub fn editor_key(key: Key) -> Option<EditorKey> {
    match key {
        Key::Space => Some(EditorKey::Space),
        Key::Delete | Key::Backspace => Some(EditorKey::Delete),
        _ => None,
    }
}

/// Converts raw egui input into [`InputEvent`]s for the canvas.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    button_held: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_canvas(canvas_rect: Rect, pos: Pos2) -> Point {
        Point::new((pos.x - canvas_rect.min.x) as f64, (pos.y - canvas_rect.min.y) as f64)
    }

    /// `canvas_hovered` is false while another egui layer (a floating control)
    /// sits between the pointer and the canvas; presses there are not ours.
    pub fn process_input(&mut self, ctx: &Context, canvas_rect: Rect, canvas_hovered: bool) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let wants_keyboard = ctx.wants_keyboard_input();

        ctx.input(|input| {
            let pointer = &input.pointer;
            match pointer.hover_pos() {
                Some(pos) => {
                    if Some(pos) != self.last_pointer_pos {
                        events.push(InputEvent::PointerMove(Self::to_canvas(canvas_rect, pos)));
                    }
                    self.last_pointer_pos = Some(pos);
                }
                None => {
                    if self.last_pointer_pos.take().is_some() && self.button_held {
                        events.push(InputEvent::PointerCancel);
                        self.button_held = false;
                    }
                }
            }

            if pointer.button_pressed(PointerButton::Primary) && canvas_hovered {
                if let Some(pos) = pointer.interact_pos() {
                    events.push(InputEvent::PointerDown(Self::to_canvas(canvas_rect, pos)));
                    self.button_held = true;
                }
            }
            if pointer.button_released(PointerButton::Primary) && self.button_held {
                let pos = pointer.latest_pos().or(self.last_pointer_pos).unwrap_or(canvas_rect.min);
                events.push(InputEvent::PointerUp(Self::to_canvas(canvas_rect, pos)));
                self.button_held = false;
            }

            if wants_keyboard {
                return;
            }
            for event in &input.raw.events {
                if let egui::Event::Key {
                    key,
                    pressed,
                    repeat: false,
                    ..
                } = event
                {
                    if let Some(key) = editor_key(*key) {
                        events.push(if *pressed {
                            InputEvent::KeyDown(key)
                        } else {
                            InputEvent::KeyUp(key)
                        });
                    }
                }
            }
        });

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_keys() {
        assert_eq!(editor_key(Key::Space), Some(EditorKey::Space));
        assert_eq!(editor_key(Key::Backspace), Some(EditorKey::Delete));
        assert_eq!(editor_key(Key::A), None);
    }

    #[test]
    fn test_canvas_relative_positions() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 40.0), egui::vec2(100.0, 100.0));
        assert_eq!(
            InputHandler::to_canvas(rect, Pos2::new(15.0, 50.0)),
            Point::new(5.0, 10.0)
        );
    }
}
