//! Layer reconcilers keep the render surface in sync with the store, one
//! object kind at a time.
//!
//! Each diff pass removes nodes whose objects disappeared, then creates or
//! updates nodes for the current objects of the layer's kind. Image and video
//! nodes start as placeholders; their resource loads run on the spawner and
//! report back through a channel drained by
//! [`LayerReconciler::process_completions`], so a swap always happens on a
//! later turn than the pass that started the load.
//!
//! Per id the load goes `absent → placeholder → loading → resolved | failed`.
//! There is no automatic retry: a failed object stays a placeholder until it is
//! removed and added again.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::channel::mpsc;
use futures::task::{Spawn, SpawnExt};
use log::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::error::LoadError;
use crate::id_generator::ObjectId;
use crate::object::CanvasObject;
use crate::overlay::{sync_selection_frame, SelectionFrame};
use crate::render::{NodeId, NodeTransform, PointerTarget, RenderSurface};
use crate::resource::{LoadRequest, Resource, ResourceLoader};
use crate::store::CanvasState;

mod kinds;

pub use kinds::{ImageLayer, LayerKind, VectorLayer, VideoLayer};

pub type ImageReconciler = LayerReconciler<ImageLayer>;
pub type VideoReconciler = LayerReconciler<VideoLayer>;
pub type VectorReconciler = LayerReconciler<VectorLayer>;

/// Identifies one load operation, so stale completions can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Resource state of one render-node entry.
#[derive(Debug)]
pub enum LoadState {
    /// Drawn from the object's own fields; nothing to load.
    Static,
    Placeholder,
    Loading { ticket: LoadTicket },
    Resolved(Resource),
    Failed,
}

/// Copyable view of [`LoadState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Static,
    Placeholder,
    Loading,
    Resolved,
    Failed,
}

impl LoadState {
    pub fn phase(&self) -> LoadPhase {
        match self {
            Self::Static => LoadPhase::Static,
            Self::Placeholder => LoadPhase::Placeholder,
            Self::Loading { .. } => LoadPhase::Loading,
            Self::Resolved(_) => LoadPhase::Resolved,
            Self::Failed => LoadPhase::Failed,
        }
    }
}

#[derive(Debug)]
struct Entry {
    node: NodeId,
    frame: Option<SelectionFrame>,
    load: LoadState,
    /// Last playback position requested from the media handle.
    seek_target: Option<f64>,
}

impl Entry {
    fn teardown(self, surface: &mut dyn RenderSurface) {
        if let Some(frame) = self.frame {
            frame.destroy(surface);
        }
        if let LoadState::Resolved(resource) = &self.load {
            resource.release();
        }
        surface.destroy_node(self.node);
    }
}

#[derive(Debug)]
struct InFlight {
    ticket: LoadTicket,
    url: String,
}

struct LoadCompletion {
    id: ObjectId,
    ticket: LoadTicket,
    result: Result<Resource, LoadError>,
}

pub struct LayerReconciler<L: LayerKind> {
    kind: L,
    config: EditorConfig,
    entries: HashMap<ObjectId, Entry>,
    in_flight: HashMap<ObjectId, InFlight>,
    loader: Rc<dyn ResourceLoader>,
    spawner: Rc<dyn Spawn>,
    completions_tx: mpsc::UnboundedSender<LoadCompletion>,
    completions_rx: mpsc::UnboundedReceiver<LoadCompletion>,
    alive: Arc<AtomicBool>,
    next_ticket: u64,
}

impl<L: LayerKind> std::fmt::Debug for LayerReconciler<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerReconciler")
            .field("kind", &L::TAG)
            .field("entries", &self.entries)
            .field("in_flight", &self.in_flight.len())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<L: LayerKind> LayerReconciler<L> {
    /// Creates an empty reconciler; loads are spawned on `spawner`
    pub fn new(
        kind: L,
        config: EditorConfig,
        loader: Rc<dyn ResourceLoader>,
        spawner: Rc<dyn Spawn>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded();
        Self {
            kind,
            config,
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            loader,
            spawner,
            completions_tx,
            completions_rx,
            alive: Arc::new(AtomicBool::new(true)),
            next_ticket: 0,
        }
    }

    /// False once the reconciler has been shut down
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Number of objects currently backed by a node
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render node drawing the object, if it belongs to this layer
    pub fn node_of(&self, id: &ObjectId) -> Option<NodeId> {
        self.entries.get(id).map(|entry| entry.node)
    }

    /// Selection frame of the object, if it is selected
    pub fn frame_of(&self, id: &ObjectId) -> Option<SelectionFrame> {
        self.entries.get(id).and_then(|entry| entry.frame)
    }

    /// Where the object is in its resource lifecycle
    pub fn load_phase(&self, id: &ObjectId) -> Option<LoadPhase> {
        self.entries.get(id).map(|entry| entry.load.phase())
    }

    /// The loaded resource, once the object's load has resolved
    pub fn resource_of(&self, id: &ObjectId) -> Option<&Resource> {
        match self.entries.get(id).map(|entry| &entry.load) {
            Some(LoadState::Resolved(resource)) => Some(resource),
            _ => None,
        }
    }

    /// Loads started but not yet applied
    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    /// One diff pass: make the surface match `state`'s objects of this kind.
    pub fn apply(&mut self, state: &CanvasState, surface: &mut dyn RenderSurface) {
        if !self.is_alive() {
            return;
        }

        let objects: Vec<(usize, &CanvasObject)> = state
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.tag() == L::TAG)
            .collect();
        let next_ids: HashSet<&ObjectId> = objects.iter().map(|(_, object)| &object.id).collect();

        // Cleanup strictly before creation.
        let stale: Vec<ObjectId> = self
            .entries
            .keys()
            .filter(|id| !next_ids.contains(id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(entry) = self.entries.remove(&id) {
                debug!("Removing {} node for {}", L::TAG.as_str(), id);
                entry.teardown(surface);
            }
        }

        for (index, object) in objects {
            // Global paint order, shared by every layer.
            let z_index = i32::try_from(index).unwrap_or(i32::MAX);
            if let Some(entry) = self.entries.get_mut(&object.id) {
                surface.set_transform(entry.node, NodeTransform::of(object));
                surface.set_z_index(entry.node, z_index);
                self.kind.sync_node(object, surface, entry.node);
                if let LoadState::Resolved(resource) = &entry.load {
                    self.kind
                        .sync_resource(object, resource, &self.config, &mut entry.seek_target);
                }
            } else {
                self.create_entry(object, z_index, surface);
            }

            if let Some(entry) = self.entries.get_mut(&object.id) {
                entry.frame = sync_selection_frame(
                    surface,
                    entry.frame.take(),
                    object,
                    state.selected_id.as_ref(),
                    &self.config.selection,
                );
            }
        }
    }

    fn create_entry(&mut self, object: &CanvasObject, z_index: i32, surface: &mut dyn RenderSurface) {
        let node = surface.create_node(self.kind.initial_shape(object, &self.config), None);
        surface.set_transform(node, NodeTransform::of(object));
        surface.set_z_index(node, z_index);
        surface.set_visible(node, true);
        surface.set_pointer_target(node, Some(PointerTarget::Object(object.id.clone())));

        let load = match (self.kind.resource_kind(), object.kind.src()) {
            (Some(_), Some(_)) => LoadState::Placeholder,
            _ => LoadState::Static,
        };
        debug!("Created {} node for {}", L::TAG.as_str(), object.id);
        self.entries.insert(
            object.id.clone(),
            Entry {
                node,
                frame: None,
                load,
                seek_target: None,
            },
        );
        self.start_load(object);
    }

    /// Moves a placeholder entry to `Loading`, reusing a load still in flight
    /// for the same id and url.
    fn start_load(&mut self, object: &CanvasObject) {
        let (Some(resource_kind), Some(url)) = (self.kind.resource_kind(), object.kind.src()) else {
            return;
        };
        let Some(entry) = self.entries.get_mut(&object.id) else {
            return;
        };
        if !matches!(entry.load, LoadState::Placeholder) {
            return;
        }

        if let Some(pending) = self.in_flight.get(&object.id) {
            if pending.url == url {
                debug!("Reusing pending load for {}", object.id);
                entry.load = LoadState::Loading {
                    ticket: pending.ticket,
                };
                return;
            }
        }

        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        let future = self.loader.load(LoadRequest::new(url, resource_kind));
        let id = object.id.clone();
        let alive = Arc::clone(&self.alive);
        let tx = self.completions_tx.clone();
        let task = async move {
            let result = future.await;
            if !alive.load(Ordering::Acquire) {
                if let Ok(resource) = result {
                    resource.release();
                }
                return;
            }
            if let Err(err) = tx.unbounded_send(LoadCompletion { id, ticket, result }) {
                if let Ok(resource) = err.into_inner().result {
                    resource.release();
                }
            }
        };

        match self.spawner.spawn(task) {
            Ok(()) => {
                debug!("Loading {} {} for {}", L::TAG.as_str(), url, object.id);
                self.in_flight.insert(
                    object.id.clone(),
                    InFlight {
                        ticket,
                        url: url.to_owned(),
                    },
                );
                entry.load = LoadState::Loading { ticket };
            }
            Err(err) => {
                error!("Failed to start loading {}: {}", url, err);
                entry.load = LoadState::Failed;
            }
        }
    }

    /// Applies finished loads. Returns how many placeholders were swapped or failed.
    pub fn process_completions(&mut self, state: &CanvasState, surface: &mut dyn RenderSurface) -> usize {
        let mut applied = 0;
        while let Ok(Some(completion)) = self.completions_rx.try_next() {
            let LoadCompletion { id, ticket, result } = completion;
            if self.in_flight.get(&id).is_some_and(|f| f.ticket == ticket) {
                self.in_flight.remove(&id);
            }
            if !self.is_alive() {
                if let Ok(resource) = result {
                    resource.release();
                }
                continue;
            }

            let entry = match self.entries.get_mut(&id) {
                Some(entry) if matches!(entry.load, LoadState::Loading { ticket: t } if t == ticket) => entry,
                _ => {
                    debug!("Discarding stale load for {}", id);
                    if let Ok(resource) = result {
                        resource.release();
                    }
                    continue;
                }
            };

            applied += 1;
            match result {
                Ok(resource) => {
                    info!("Loaded {} for {}", L::TAG.as_str(), id);
                    surface.set_shape(entry.node, self.kind.resolved_shape(&resource));
                    if let Some(object) = state.object(&id) {
                        self.kind
                            .sync_resource(object, &resource, &self.config, &mut entry.seek_target);
                    }
                    entry.load = LoadState::Resolved(resource);
                }
                Err(err) => {
                    error!("Failed to load {} {} for {}: {}", L::TAG.as_str(), err.url(), id, err);
                    entry.load = LoadState::Failed;
                }
            }
        }
        applied
    }

    /// Destroys every node, frame and resource. Loads finishing afterwards are ignored.
    pub fn shutdown(&mut self, surface: &mut dyn RenderSurface) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        for (_, entry) in self.entries.drain() {
            entry.teardown(surface);
        }
        self.in_flight.clear();
        while let Ok(Some(completion)) = self.completions_rx.try_next() {
            if let Ok(resource) = completion.result {
                resource.release();
            }
        }
        info!("{} layer shut down", L::TAG.as_str());
    }
}

impl<L: LayerKind> Drop for LayerReconciler<L> {
    fn drop(&mut self) {
        if self.alive.swap(false, Ordering::AcqRel) && !self.entries.is_empty() {
            warn!(
                "{} layer dropped without shutdown; {} nodes left on the surface",
                L::TAG.as_str(),
                self.entries.len()
            );
        }
    }
}
