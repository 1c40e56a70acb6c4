#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use eframe_whiteboard::error::LoadError;
use eframe_whiteboard::geometry::Point;
use eframe_whiteboard::render::{NodeId, NodeShape, NodeTransform, PointerTarget, RenderSurface};
use eframe_whiteboard::resource::native::ClockMedia;
use eframe_whiteboard::resource::{DecodedImage, LoadFuture, LoadRequest, Resource, ResourceLoader};
use eframe_whiteboard::{CanvasStore, EditorConfig, Scene};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::Spawn;
use futures::FutureExt;

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub shape: NodeShape,
    pub transform: NodeTransform,
    pub z_index: i32,
    pub visible: bool,
    pub parent: Option<NodeId>,
    pub target: Option<PointerTarget>,
}

/// Render surface that only records what it was told.
#[derive(Debug, Default)]
pub struct FakeSurface {
    pub nodes: HashMap<NodeId, FakeNode>,
    pub offset: Point,
    pub created: usize,
    pub destroyed: usize,
    next_id: u64,
}

impl FakeSurface {
    pub fn node(&self, id: NodeId) -> &FakeNode {
        &self.nodes[&id]
    }

    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect();
        children.sort();
        children
    }
}

impl RenderSurface for FakeSurface {
    fn create_node(&mut self, shape: NodeShape, parent: Option<NodeId>) -> NodeId {
        self.next_id += 1;
        self.created += 1;
        let id = NodeId::from_raw(self.next_id);
        self.nodes.insert(
            id,
            FakeNode {
                shape,
                transform: NodeTransform::default(),
                z_index: 0,
                visible: true,
                parent,
                target: None,
            },
        );
        id
    }

    fn set_shape(&mut self, node: NodeId, shape: NodeShape) {
        self.nodes.get_mut(&node).expect("set_shape on dead node").shape = shape;
    }

    fn set_transform(&mut self, node: NodeId, transform: NodeTransform) {
        self.nodes.get_mut(&node).expect("set_transform on dead node").transform = transform;
    }

    fn set_z_index(&mut self, node: NodeId, z_index: i32) {
        self.nodes.get_mut(&node).expect("set_z_index on dead node").z_index = z_index;
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.nodes.get_mut(&node).expect("set_visible on dead node").visible = visible;
    }

    fn set_pointer_target(&mut self, node: NodeId, target: Option<PointerTarget>) {
        self.nodes.get_mut(&node).expect("set_pointer_target on dead node").target = target;
    }

    fn destroy_node(&mut self, node: NodeId) {
        assert!(self.nodes.remove(&node).is_some(), "double destroy of {:?}", node);
        self.destroyed += 1;
        for child in self.children(node) {
            self.destroy_node(child);
        }
    }

    fn set_scene_offset(&mut self, offset: Point) {
        self.offset = offset;
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    calls: Vec<LoadRequest>,
    pending: Vec<(String, oneshot::Sender<Result<Resource, LoadError>>)>,
}

/// Loader whose futures stay pending until the test resolves them.
#[derive(Debug, Clone, Default)]
pub struct FakeLoader {
    state: Rc<RefCell<LoaderState>>,
}

impl FakeLoader {
    pub fn calls(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.state.borrow().calls.iter().filter(|r| r.url == url).count()
    }

    pub fn last_request(&self) -> Option<LoadRequest> {
        self.state.borrow().calls.last().cloned()
    }

    /// Completes the oldest pending load of `url`.
    pub fn resolve(&self, url: &str, result: Result<Resource, LoadError>) {
        let mut state = self.state.borrow_mut();
        let index = state
            .pending
            .iter()
            .position(|(u, _)| u == url)
            .unwrap_or_else(|| panic!("no pending load for {url}"));
        let (_, tx) = state.pending.remove(index);
        let _ = tx.send(result);
    }

    pub fn resolve_image(&self, url: &str) -> Arc<DecodedImage> {
        let image = Arc::new(DecodedImage {
            width: 2,
            height: 2,
            rgba: vec![255; 16],
        });
        self.resolve(url, Ok(Resource::Image(image.clone())));
        image
    }

    pub fn resolve_video(&self, url: &str) -> Arc<ClockMedia> {
        let media = Arc::new(ClockMedia::default());
        self.resolve(url, Ok(Resource::Video(media.clone())));
        media
    }

    pub fn fail(&self, url: &str) {
        self.resolve(
            url,
            Err(LoadError::Network {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            }),
        );
    }
}

impl ResourceLoader for FakeLoader {
    fn load(&self, request: LoadRequest) -> LoadFuture {
        let (tx, rx) = oneshot::channel();
        let url = request.url.clone();
        {
            let mut state = self.state.borrow_mut();
            state.calls.push(request);
            state.pending.push((url.clone(), tx));
        }
        async move {
            rx.await.unwrap_or_else(|_| {
                Err(LoadError::Network {
                    url,
                    reason: "loader dropped".to_owned(),
                })
            })
        }
        .boxed()
    }
}

/// A store with a mounted scene over a fake surface and loader.
pub struct Harness {
    pub pool: LocalPool,
    pub store: CanvasStore,
    pub scene: Option<Scene<FakeSurface>>,
    pub loader: FakeLoader,
    pub config: EditorConfig,
}

impl Harness {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawn> = Rc::new(pool.spawner());
        let loader = FakeLoader::default();
        let config = EditorConfig::default();
        let mut store = CanvasStore::new();
        let scene = Scene::mount(
            &mut store,
            FakeSurface::default(),
            &config,
            Rc::new(loader.clone()),
            spawner,
        );
        Self {
            pool,
            store,
            scene: Some(scene),
            loader,
            config,
        }
    }

    pub fn scene(&self) -> &Scene<FakeSurface> {
        self.scene.as_ref().expect("scene unmounted")
    }

    /// Lets load tasks run, then applies their results. Returns how many
    /// completions were applied.
    pub fn pump(&mut self) -> usize {
        self.pool.run_until_stalled();
        match &self.scene {
            Some(scene) => scene.process_completions(self.store.state()),
            None => 0,
        }
    }

    pub fn unmount(&mut self) -> FakeSurface {
        let scene = self.scene.take().expect("scene unmounted");
        scene.unmount(&mut self.store).expect("surface still shared")
    }
}
