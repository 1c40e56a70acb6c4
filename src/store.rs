//! The canvas object store: the single authoritative ordered collection of
//! objects plus viewport, selection and panning state.
//!
//! Every mutator notifies all listeners synchronously, exactly once per call,
//! with `(next, previous)`. The object list lives behind an [`Arc`] that is
//! replaced only when the list actually changes, so listeners can skip work
//! with [`Arc::ptr_eq`].

use std::sync::Arc;

use log::{debug, warn};

use crate::geometry::Point;
use crate::id_generator::ObjectId;
use crate::object::{CanvasObject, NewObject, ObjectKind, ObjectPatch};

#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    /// Paint order: later objects are drawn on top.
    pub objects: Arc<Vec<CanvasObject>>,
    pub selected_id: Option<ObjectId>,
    /// Uniform offset applied to the whole scene when rendering.
    pub viewport: Point,
    pub panning_mode: bool,
}

impl CanvasState {
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| &o.id == id)
    }

    pub fn object(&self, id: &ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn selected(&self) -> Option<&CanvasObject> {
        self.selected_id.as_ref().and_then(|id| self.object(id))
    }

    /// True when `self` holds a different object list than `prev`.
    pub fn objects_changed(&self, prev: &CanvasState) -> bool {
        !Arc::ptr_eq(&self.objects, &prev.objects)
    }

    /// Converts a screen-space pointer position into world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        screen - self.viewport
    }
}

pub type Listener = Box<dyn FnMut(&CanvasState, &CanvasState)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct CanvasStore {
    state: CanvasState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for CanvasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasStore")
            .field("state", &self.state)
            .field("listeners", &format!("<{} listeners>", self.listeners.len()))
            .finish()
    }
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    /// Creates an empty store with no listeners
    pub fn new() -> Self {
        Self {
            state: CanvasState::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current snapshot of the canvas
    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    /// Registers a listener called with `(next, prev)` after every mutator call
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener, returning whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, mutate: impl FnOnce(&mut CanvasState)) {
        let prev = self.state.clone();
        mutate(&mut self.state);
        for (_, listener) in &mut self.listeners {
            listener(&self.state, &prev);
        }
    }

    /// Appends a new object on top of the paint order and returns its id.
    ///
    /// A supplied id that is already taken is replaced with a fresh one.
    pub fn add_object(&mut self, data: &NewObject) -> ObjectId {
        let id = match &data.id {
            Some(id) if self.state.index_of(id).is_some() => {
                let fresh = ObjectId::generate();
                warn!("Object id {} already exists; assigning {}", id, fresh);
                fresh
            }
            Some(id) => id.clone(),
            None => ObjectId::generate(),
        };
        let object = data.build(id.clone());
        debug!("Adding {} object {}", object.tag().as_str(), id);
        self.commit(|state| Arc::make_mut(&mut state.objects).push(object));
        id
    }

    /// Shallow-merges `patch` into an object without moving it in the paint order
    pub fn update_object(&mut self, id: &ObjectId, patch: ObjectPatch) {
        self.update_object_with(id, |_| patch);
    }

    /// Like [`Self::update_object`], with the patch computed from the current object.
    pub fn update_object_with(
        &mut self,
        id: &ObjectId,
        patch: impl FnOnce(&CanvasObject) -> ObjectPatch,
    ) {
        let index = self.state.index_of(id);
        self.commit(|state| {
            if let Some(index) = index {
                let patch = patch(&state.objects[index]);
                Arc::make_mut(&mut state.objects)[index].apply_patch(&patch);
            }
        });
    }

    /// Removes an object, dropping the selection if it pointed at it
    pub fn remove_object(&mut self, id: &ObjectId) {
        let index = self.state.index_of(id);
        self.commit(|state| {
            if let Some(index) = index {
                Arc::make_mut(&mut state.objects).remove(index);
                if state.selected_id.as_ref() == Some(id) {
                    state.selected_id = None;
                }
            }
        });
    }

    /// Moves an object to the top of the paint order
    pub fn bring_to_front(&mut self, id: &ObjectId) {
        let last = self.state.objects.len().saturating_sub(1);
        self.move_object(id, last);
    }

    /// Moves an object to the bottom of the paint order
    pub fn send_to_back(&mut self, id: &ObjectId) {
        self.move_object(id, 0);
    }

    /// Relocates an object to `to_index`, clamped to the valid range.
    pub fn move_object(&mut self, id: &ObjectId, to_index: usize) {
        let from = self.state.index_of(id);
        let last = self.state.objects.len().saturating_sub(1);
        self.commit(|state| {
            let Some(from) = from else { return };
            let to = to_index.min(last);
            if from == to {
                return;
            }
            let objects = Arc::make_mut(&mut state.objects);
            let object = objects.remove(from);
            objects.insert(to, object);
        });
    }

    /// Selects an object, or clears the selection with `None`. Unknown ids are ignored.
    pub fn select_object(&mut self, id: Option<ObjectId>) {
        let known = id.as_ref().is_none_or(|id| self.state.index_of(id).is_some());
        self.commit(|state| {
            if known {
                state.selected_id = id;
            }
        });
    }

    /// Deselects whatever is selected
    pub fn clear_selection(&mut self) {
        self.select_object(None);
    }

    /// Sets the offset applied to the whole scene
    pub fn set_viewport(&mut self, viewport: Point) {
        self.commit(|state| state.viewport = viewport);
    }

    /// Shifts the viewport by `(dx, dy)` screen units
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.commit(|state| state.viewport = state.viewport + Point::new(dx, dy));
    }

    /// Gates object interactions while the canvas is being panned
    pub fn set_panning_mode(&mut self, on: bool) {
        self.commit(|state| state.panning_mode = on);
    }

    /// Marks one video as playing
    pub fn play_video(&mut self, id: &ObjectId) {
        self.set_playing(Some(id), true);
    }

    /// Marks one video as paused
    pub fn pause_video(&mut self, id: &ObjectId) {
        self.set_playing(Some(id), false);
    }

    /// Marks every video as playing
    pub fn play_all_videos(&mut self) {
        self.set_playing(None, true);
    }

    /// Marks every video as paused
    pub fn pause_all_videos(&mut self) {
        self.set_playing(None, false);
    }

    /// Sets the `playing` intent on one video (`Some(id)`) or on all of them.
    fn set_playing(&mut self, target: Option<&ObjectId>, playing: bool) {
        let matches = |object: &CanvasObject| {
            target.is_none_or(|id| &object.id == id)
                && object.video().is_some_and(|video| video.playing != playing)
        };
        let changed = self.state.objects.iter().any(matches);
        self.commit(|state| {
            if !changed {
                return;
            }
            for object in Arc::make_mut(&mut state.objects).iter_mut() {
                if !matches(&*object) {
                    continue;
                }
                if let ObjectKind::Video(video) = &mut object.kind {
                    video.playing = playing;
                }
            }
        });
    }
}
