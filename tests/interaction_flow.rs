mod common;

use std::rc::Rc;

use common::FakeLoader;
use eframe_whiteboard::render::PointerTarget;
use eframe_whiteboard::{
    CanvasStore, Corner, EditorConfig, EditorKey, EguiSurface, Interaction, InteractionController, NewObject,
    Point, Scene,
};
use futures::executor::LocalPool;
use futures::task::Spawn;

struct Editor {
    _pool: LocalPool,
    store: CanvasStore,
    scene: Scene<EguiSurface>,
    controller: InteractionController,
}

impl Editor {
    fn new() -> Self {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawn> = Rc::new(pool.spawner());
        let mut store = CanvasStore::new();
        let config = EditorConfig::default();
        let scene = Scene::mount(
            &mut store,
            EguiSurface::new(),
            &config,
            Rc::new(FakeLoader::default()),
            spawner,
        );
        Self {
            _pool: pool,
            store,
            scene,
            controller: InteractionController::new(config.min_size),
        }
    }

    fn press(&mut self, x: f64, y: f64) -> Option<PointerTarget> {
        let screen = Point::new(x, y);
        let target = if self.store.state().panning_mode {
            None
        } else {
            self.scene.surface().hit_test(screen)
        };
        self.controller.pointer_down(&mut self.store, target.clone(), screen);
        target
    }

    fn drag_to(&mut self, x: f64, y: f64) {
        self.controller.pointer_move(&mut self.store, Point::new(x, y));
    }

    fn release(&mut self) {
        self.controller.pointer_up();
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        let o = &self.store.state().objects[0];
        (o.x, o.y, o.width, o.height)
    }
}

#[test]
fn test_click_selects_then_drag_moves() {
    let mut editor = Editor::new();
    let id = editor.store.add_object(&NewObject::rect(100.0, 100.0, 50.0, 50.0));

    assert_eq!(editor.press(120.0, 110.0), Some(PointerTarget::Object(id.clone())));
    assert_eq!(editor.store.state().selected_id, Some(id));
    editor.drag_to(130.0, 140.0);
    editor.release();
    assert_eq!(editor.bounds(), (110.0, 130.0, 50.0, 50.0));
}

#[test]
fn test_corner_handle_scales_instead_of_moving() {
    let mut editor = Editor::new();
    let id = editor.store.add_object(&NewObject::rect(0.0, 0.0, 200.0, 100.0));
    editor.store.select_object(Some(id.clone()));

    // The handle sits on top of the object; only the handle sees the press.
    assert_eq!(
        editor.press(200.0, 100.0),
        Some(PointerTarget::ScaleHandle(id, Corner::Se))
    );
    assert!(matches!(editor.controller.active(), Some(Interaction::Scale { .. })));
    editor.drag_to(250.0, 50.0);
    let (x, y, w, h) = editor.bounds();
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    assert!((w - 250.0).abs() < 1e-6 && (h - 50.0).abs() < 1e-6);
}

#[test]
fn test_pan_mode_pans_instead_of_moving() {
    let mut editor = Editor::new();
    editor.store.add_object(&NewObject::rect(0.0, 0.0, 100.0, 100.0));

    editor.controller.handle_key(&mut editor.store, EditorKey::Space, true);
    assert_eq!(editor.press(50.0, 50.0), None);
    editor.drag_to(80.0, 60.0);
    assert!(editor.store.state().selected_id.is_none());
    assert_eq!(editor.bounds(), (0.0, 0.0, 100.0, 100.0));
    assert_eq!(editor.store.state().viewport, Point::new(30.0, 10.0));
    assert_eq!(editor.scene.surface().scene_offset(), Point::new(30.0, 10.0));

    editor.controller.handle_key(&mut editor.store, EditorKey::Space, false);
    assert!(editor.controller.active().is_none());

    // With the scene panned, the object is hit at its shifted screen position.
    assert!(editor.press(35.0, 15.0).is_some());
    editor.drag_to(45.0, 15.0);
    assert_eq!(editor.bounds(), (10.0, 0.0, 100.0, 100.0));
}

#[test]
fn test_rotated_object_is_hit_in_local_space() {
    let mut editor = Editor::new();
    let id = editor
        .store
        .add_object(&NewObject::rect(100.0, 100.0, 100.0, 10.0).with_rotation(std::f64::consts::FRAC_PI_2));
    // Rotated a quarter turn about its top-left, the bar hangs downwards.
    assert_eq!(editor.press(150.0, 105.0), None);
    editor.release();
    assert_eq!(editor.press(95.0, 150.0), Some(PointerTarget::Object(id)));
}

#[test]
fn test_delete_key_removes_selection_and_nodes() {
    let mut editor = Editor::new();
    let id = editor.store.add_object(&NewObject::rect(0.0, 0.0, 10.0, 10.0));
    editor.press(5.0, 5.0);
    editor.release();
    assert!(editor.scene.vector_layer().node_of(&id).is_some());

    editor.controller.handle_key(&mut editor.store, EditorKey::Delete, true);
    assert!(editor.store.state().objects.is_empty());
    assert!(editor.store.state().selected_id.is_none());
    assert_eq!(editor.scene.surface().node_count(), 0);
}
