//! Pointer-driven manipulation of canvas objects.
//!
//! The controller holds at most one [`Interaction`]. Pointer-down decides what
//! starts (replacing whatever was in progress), pointer-move turns the pointer
//! position into store mutations through the transform math, and pointer-up
//! or cancel ends it. Pointer positions are in screen space, relative to the
//! canvas origin; world positions are screen positions minus the viewport.

use log::debug;

use crate::geometry::transform_math::{
    angle_delta_around_center, center_from_top_left, compute_scaled_rect_from_anchor, corner_world,
    opposite_corner_anchor_world, top_left_from_center, DEFAULT_MIN_SIZE,
};
use crate::geometry::{Corner, Point, ScaleParams};
use crate::id_generator::ObjectId;
use crate::object::ObjectPatch;
use crate::render::PointerTarget;
use crate::store::CanvasStore;

/// The single in-progress manipulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Move {
        id: ObjectId,
        /// World pointer position at pointer-down.
        start: Point,
        /// Object top-left at pointer-down.
        origin: Point,
    },
    Scale {
        id: ObjectId,
        handle: Corner,
        /// World position of the corner opposite `handle`; never moves.
        anchor: Point,
        /// Dragged corner minus pointer, captured at pointer-down.
        grab: Point,
        rotation: f64,
    },
    Rotate {
        id: ObjectId,
        start: Point,
        center: Point,
        rotation: f64,
        width: f64,
        height: f64,
    },
    Pan {
        start_screen: Point,
        viewport_origin: Point,
    },
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Scale { .. } => "scale",
            Self::Rotate { .. } => "rotate",
            Self::Pan { .. } => "pan",
        }
    }

    pub fn target(&self) -> Option<&ObjectId> {
        match self {
            Self::Move { id, .. } | Self::Scale { id, .. } | Self::Rotate { id, .. } => Some(id),
            Self::Pan { .. } => None,
        }
    }
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// Held to pan.
    Space,
    /// Removes the selected object.
    Delete,
}

#[derive(Debug)]
pub struct InteractionController {
    active: Option<Interaction>,
    min_size: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SIZE)
    }
}

impl InteractionController {
    pub fn new(min_size: f64) -> Self {
        Self {
            active: None,
            min_size,
        }
    }

    pub fn active(&self) -> Option<&Interaction> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn begin(&mut self, interaction: Interaction) {
        if let Some(previous) = self.active.take() {
            debug!("Replacing {} interaction", previous.name());
        }
        debug!("Starting {} interaction", interaction.name());
        self.active = Some(interaction);
    }

    /// Starts whatever `target` calls for. `target` is the topmost node under
    /// the pointer, `None` for empty canvas.
    pub fn pointer_down(&mut self, store: &mut CanvasStore, target: Option<PointerTarget>, screen: Point) {
        if store.state().panning_mode {
            self.begin(Interaction::Pan {
                start_screen: screen,
                viewport_origin: store.state().viewport,
            });
            return;
        }

        let world = store.state().screen_to_world(screen);
        let Some(target) = target else {
            self.active = None;
            store.clear_selection();
            return;
        };
        let Some(object) = store.state().object(target.object_id()).cloned() else {
            self.active = None;
            return;
        };

        if store.state().selected_id.as_ref() != Some(&object.id) {
            store.select_object(Some(object.id.clone()));
        }

        let interaction = match target {
            PointerTarget::Object(id) => Interaction::Move {
                id,
                start: world,
                origin: object.top_left(),
            },
            PointerTarget::ScaleHandle(id, handle) => {
                let (top_left, w, h, rotation) =
                    (object.top_left(), object.width, object.height, object.rotation);
                Interaction::Scale {
                    id,
                    handle,
                    anchor: opposite_corner_anchor_world(top_left, w, h, rotation, handle),
                    grab: corner_world(top_left, w, h, rotation, handle) - world,
                    rotation,
                }
            }
            PointerTarget::RotateHandle(id) => Interaction::Rotate {
                id,
                start: world,
                center: center_from_top_left(
                    object.top_left(),
                    object.width,
                    object.height,
                    object.rotation,
                ),
                rotation: object.rotation,
                width: object.width,
                height: object.height,
            },
        };
        self.begin(interaction);
    }

    pub fn pointer_move(&mut self, store: &mut CanvasStore, screen: Point) {
        let Some(active) = &self.active else {
            return;
        };
        if let Some(id) = active.target() {
            if store.state().object(id).is_none() {
                debug!("Target {} disappeared; ending {}", id, active.name());
                self.active = None;
                return;
            }
        }

        let world = store.state().screen_to_world(screen);
        match active {
            Interaction::Move { id, start, origin } => {
                let next = *origin + (world - *start);
                store.update_object(id, ObjectPatch::position(next.x, next.y));
            }
            Interaction::Scale {
                id,
                anchor,
                grab,
                rotation,
                ..
            } => {
                let rect = compute_scaled_rect_from_anchor(ScaleParams {
                    anchor: *anchor,
                    pointer: world + *grab,
                    rotation: *rotation,
                    min_size: self.min_size,
                });
                store.update_object(id, ObjectPatch::bounds(rect.x, rect.y, rect.width, rect.height));
            }
            Interaction::Rotate {
                id,
                start,
                center,
                rotation,
                width,
                height,
            } => {
                let next = *rotation + angle_delta_around_center(*start, world, *center);
                let top_left = top_left_from_center(*center, *width, *height, next);
                store.update_object(
                    id,
                    ObjectPatch::position(top_left.x, top_left.y).with_rotation(next),
                );
            }
            Interaction::Pan {
                start_screen,
                viewport_origin,
            } => {
                store.set_viewport(*viewport_origin + (screen - *start_screen));
            }
        }
    }

    /// Ends the active interaction, returning it.
    pub fn pointer_up(&mut self) -> Option<Interaction> {
        let ended = self.active.take();
        if let Some(interaction) = &ended {
            debug!("Finished {} interaction", interaction.name());
        }
        ended
    }

    pub fn pointer_cancel(&mut self) -> Option<Interaction> {
        self.pointer_up()
    }

    pub fn handle_key(&mut self, store: &mut CanvasStore, key: EditorKey, pressed: bool) {
        match (key, pressed) {
            (EditorKey::Space, true) => {
                if !store.state().panning_mode {
                    // Panning takes over; an object drag in progress stops here.
                    if self.active.as_ref().is_some_and(|a| a.target().is_some()) {
                        self.active = None;
                    }
                    store.set_panning_mode(true);
                }
            }
            (EditorKey::Space, false) => {
                if matches!(self.active, Some(Interaction::Pan { .. })) {
                    self.active = None;
                }
                store.set_panning_mode(false);
            }
            (EditorKey::Delete, true) => {
                let Some(id) = store.state().selected_id.clone() else {
                    return;
                };
                if self.active.as_ref().and_then(Interaction::target) == Some(&id) {
                    self.active = None;
                }
                debug!("Deleting selected object {}", id);
                store.remove_object(&id);
            }
            (EditorKey::Delete, false) => {}
        }
    }
}
