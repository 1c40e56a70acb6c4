//! Mounts the layer reconcilers on a store and a render surface.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

use futures::task::Spawn;
use log::{debug, info};

use crate::config::EditorConfig;
use crate::geometry::transform_math::fit_within_max;
use crate::id_generator::ObjectId;
use crate::layer::{
    ImageLayer, ImageReconciler, LayerKind, LayerReconciler, LoadPhase, VectorLayer,
    VectorReconciler, VideoLayer, VideoReconciler,
};
use crate::object::ObjectPatch;
use crate::render::RenderSurface;
use crate::resource::{Resource, ResourceLoader};
use crate::store::{CanvasState, CanvasStore, SubscriptionId};

/// A live scene: three reconcilers subscribed to one store, drawing into one
/// surface. Call [`Scene::unmount`] to detach it.
pub struct Scene<S: RenderSurface + 'static> {
    surface: Rc<RefCell<S>>,
    image: Rc<RefCell<ImageReconciler>>,
    video: Rc<RefCell<VideoReconciler>>,
    vector: Rc<RefCell<VectorReconciler>>,
    subscriptions: Vec<SubscriptionId>,
}

impl<S: RenderSurface + 'static> std::fmt::Debug for Scene<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("images", &self.image.borrow().len())
            .field("videos", &self.video.borrow().len())
            .field("vectors", &self.vector.borrow().len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// Whether a store change touches anything the reconcilers draw.
fn needs_reconcile(next: &CanvasState, prev: &CanvasState) -> bool {
    next.objects_changed(prev) || next.selected_id != prev.selected_id
}

fn mount_layer<L, S>(
    store: &mut CanvasStore,
    surface: &Rc<RefCell<S>>,
    reconciler: LayerReconciler<L>,
) -> (Rc<RefCell<LayerReconciler<L>>>, SubscriptionId)
where
    L: LayerKind + 'static,
    S: RenderSurface + 'static,
{
    let reconciler = Rc::new(RefCell::new(reconciler));
    reconciler
        .borrow_mut()
        .apply(store.state(), &mut *surface.borrow_mut());

    let layer = Rc::clone(&reconciler);
    let surface = Rc::clone(surface);
    let subscription = store.subscribe(Box::new(move |next, prev| {
        if needs_reconcile(next, prev) {
            layer.borrow_mut().apply(next, &mut *surface.borrow_mut());
        }
    }));
    (reconciler, subscription)
}

impl<S: RenderSurface + 'static> Scene<S> {
    pub fn mount(
        store: &mut CanvasStore,
        surface: S,
        config: &EditorConfig,
        loader: Rc<dyn ResourceLoader>,
        spawner: Rc<dyn Spawn>,
    ) -> Self {
        let surface = Rc::new(RefCell::new(surface));
        surface
            .borrow_mut()
            .set_scene_offset(store.state().viewport);

        let (image, image_sub) = mount_layer(
            store,
            &surface,
            LayerReconciler::new(ImageLayer, config.clone(), Rc::clone(&loader), Rc::clone(&spawner)),
        );
        let (video, video_sub) = mount_layer(
            store,
            &surface,
            LayerReconciler::new(VideoLayer, config.clone(), Rc::clone(&loader), Rc::clone(&spawner)),
        );
        let (vector, vector_sub) = mount_layer(
            store,
            &surface,
            LayerReconciler::new(VectorLayer, config.clone(), loader, spawner),
        );

        let viewport_surface = Rc::clone(&surface);
        let viewport_sub = store.subscribe(Box::new(move |next, prev| {
            if next.viewport != prev.viewport {
                viewport_surface.borrow_mut().set_scene_offset(next.viewport);
            }
        }));

        info!("Scene mounted with {} objects", store.state().objects.len());
        Self {
            surface,
            image,
            video,
            vector,
            subscriptions: vec![image_sub, video_sub, vector_sub, viewport_sub],
        }
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    /// Mutable access to the surface. Must not be held across store mutations.
    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }

    pub fn image_layer(&self) -> Ref<'_, ImageReconciler> {
        self.image.borrow()
    }

    pub fn video_layer(&self) -> Ref<'_, VideoReconciler> {
        self.video.borrow()
    }

    pub fn vector_layer(&self) -> Ref<'_, VectorReconciler> {
        self.vector.borrow()
    }

    /// Applies every finished load. Returns how many were applied.
    pub fn process_completions(&self, state: &CanvasState) -> usize {
        let mut surface = self.surface.borrow_mut();
        self.image.borrow_mut().process_completions(state, &mut *surface)
            + self.video.borrow_mut().process_completions(state, &mut *surface)
            + self.vector.borrow_mut().process_completions(state, &mut *surface)
    }

    pub fn pending_loads(&self) -> usize {
        self.image.borrow().pending_loads() + self.video.borrow().pending_loads()
    }

    /// Resizes the images in `pending` to their decoded size, shrunk to fit the
    /// configured maximum, as their loads resolve.
    ///
    /// Settled ids leave `pending`; images that failed or were removed keep
    /// whatever size they had.
    pub fn fit_images_to_content(
        &self,
        store: &mut CanvasStore,
        pending: &mut HashSet<ObjectId>,
        config: &EditorConfig,
    ) {
        let mut sizes = Vec::new();
        {
            let layer = self.image.borrow();
            pending.retain(|id| match layer.load_phase(id) {
                Some(LoadPhase::Placeholder | LoadPhase::Loading) => true,
                Some(LoadPhase::Resolved) => {
                    if let Some(Resource::Image(image)) = layer.resource_of(id) {
                        let size = fit_within_max(
                            f64::from(image.width),
                            f64::from(image.height),
                            config.initial_image_max_width,
                            config.initial_image_max_height,
                        );
                        sizes.push((id.clone(), size));
                    }
                    false
                }
                _ => false,
            });
        }
        // Layer borrows are released: the updates re-enter the reconcilers.
        for (id, (width, height)) in sizes {
            debug!("Fitting {} to {}x{}", id, width, height);
            store.update_object(&id, ObjectPatch::size(width, height));
        }
    }

    /// Unsubscribes from `store` and destroys every node the scene created.
    /// Loads still in flight are discarded when they finish.
    ///
    /// Returns the surface unless something else still holds it.
    pub fn unmount(self, store: &mut CanvasStore) -> Option<S> {
        for subscription in &self.subscriptions {
            store.unsubscribe(*subscription);
        }
        {
            let mut surface = self.surface.borrow_mut();
            self.image.borrow_mut().shutdown(&mut *surface);
            self.video.borrow_mut().shutdown(&mut *surface);
            self.vector.borrow_mut().shutdown(&mut *surface);
        }
        info!("Scene unmounted");
        let Self { surface, .. } = self;
        Rc::try_unwrap(surface).ok().map(RefCell::into_inner)
    }
}
