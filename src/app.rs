use std::collections::HashSet;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::Spawn;

use crate::config::EditorConfig;
use crate::geometry::transform_math::local_to_world_from_top_left;
use crate::geometry::Point;
use crate::id_generator::ObjectId;
use crate::input::{InputEvent, InputHandler};
use crate::interaction::InteractionController;
use crate::object::ObjectKindTag;
use crate::render::{EguiSurface, PointerTarget};
use crate::resource::ResourceLoader;
use crate::scene::Scene;
use crate::store::CanvasStore;

/// Gap between a video's bottom edge and its play/pause button.
const VIDEO_CONTROLS_GAP: f64 = 8.0;

pub struct WhiteboardApp {
    config: EditorConfig,
    store: CanvasStore,
    scene: Option<Scene<EguiSurface>>,
    controller: InteractionController,
    input: InputHandler,
    /// Runs resource loads between frames.
    pool: LocalPool,
    /// Seeded images still waiting to learn their natural size.
    fit_pending: HashSet<ObjectId>,
}

impl std::fmt::Debug for WhiteboardApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhiteboardApp")
            .field("store", &self.store)
            .field("scene", &self.scene)
            .field("controller", &self.controller)
            .finish()
    }
}

impl WhiteboardApp {
    /// Called once before the first frame.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: EditorConfig,
        loader: Rc<dyn ResourceLoader>,
        sources: &[String],
    ) -> Self {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawn> = Rc::new(pool.spawner());
        let mut store = CanvasStore::new();
        let scene = Scene::mount(&mut store, EguiSurface::new(), &config, loader, spawner);

        let mut fit_pending = HashSet::new();
        for source in sources {
            let data = config.new_object_for_source(source);
            let id = store.add_object(&data);
            log::info!("Seeded {} from {}", id, source);
            if data.kind.tag() == ObjectKindTag::Image {
                fit_pending.insert(id);
            }
        }

        Self {
            controller: InteractionController::new(config.min_size),
            config,
            store,
            scene: Some(scene),
            input: InputHandler::new(),
            pool,
            fit_pending,
        }
    }

    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CanvasStore {
        &mut self.store
    }

    fn handle_event(&mut self, event: InputEvent) {
        let Some(scene) = &self.scene else {
            return;
        };
        match event {
            InputEvent::PointerDown(pos) => {
                let target = if self.store.state().panning_mode {
                    None
                } else {
                    scene.surface().hit_test(pos)
                };
                self.controller.pointer_down(&mut self.store, target, pos);
            }
            InputEvent::PointerMove(pos) => self.controller.pointer_move(&mut self.store, pos),
            InputEvent::PointerUp(_) => {
                self.controller.pointer_up();
            }
            InputEvent::PointerCancel => {
                self.controller.pointer_cancel();
            }
            InputEvent::KeyDown(key) => self.controller.handle_key(&mut self.store, key, true),
            InputEvent::KeyUp(key) => self.controller.handle_key(&mut self.store, key, false),
        }
    }

    fn update_cursor(&self, ctx: &egui::Context, hover: Option<PointerTarget>) {
        let icon = if self.store.state().panning_mode {
            if self.controller.is_active() {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::Grab
            }
        } else {
            match hover {
                Some(PointerTarget::ScaleHandle(_, corner)) => corner.cursor_icon(),
                Some(PointerTarget::RotateHandle(_)) => egui::CursorIcon::Alias,
                Some(PointerTarget::Object(_)) => egui::CursorIcon::Move,
                None => return,
            }
        };
        ctx.set_cursor_icon(icon);
    }

    /// Floating play/pause buttons under each video.
    fn video_controls(&mut self, ctx: &egui::Context, canvas_origin: egui::Pos2) {
        let state = self.store.state();
        let mut toggles: Vec<(ObjectId, bool)> = Vec::new();
        for object in state.objects.iter() {
            let Some(video) = object.video() else {
                continue;
            };
            let anchor = local_to_world_from_top_left(
                Point::new(0.0, object.height + VIDEO_CONTROLS_GAP),
                object.top_left(),
                object.rotation,
            ) + state.viewport;
            let pos = canvas_origin + egui::vec2(anchor.x as f32, anchor.y as f32);
            egui::Area::new(egui::Id::new(("video-controls", object.id.as_str())))
                .fixed_pos(pos)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    let label = if video.playing { "⏸ Pause" } else { "▶ Play" };
                    if ui.button(label).clicked() {
                        toggles.push((object.id.clone(), !video.playing));
                    }
                });
        }
        for (id, play) in toggles {
            if play {
                self.store.play_video(&id);
            } else {
                self.store.pause_video(&id);
            }
        }
    }
}

impl eframe::App for WhiteboardApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pool.run_until_stalled();
        if let Some(scene) = &self.scene {
            if scene.process_completions(self.store.state()) > 0 {
                ctx.request_repaint();
            }
            if !self.fit_pending.is_empty() {
                scene.fit_images_to_content(&mut self.store, &mut self.fit_pending, &self.config);
            }
        }

        let frame = egui::Frame::none().fill(self.config.background);
        let canvas_origin = egui::CentralPanel::default()
            .frame(frame)
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;

                for event in self.input.process_input(ctx, rect, response.hovered()) {
                    self.handle_event(event);
                }

                if let Some(scene) = &self.scene {
                    let hover = response
                        .hover_pos()
                        .map(|p| Point::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64))
                        .and_then(|p| scene.surface().hit_test(p));
                    self.update_cursor(ctx, hover);
                    scene.surface_mut().paint(ctx, &painter, rect.min);
                }
                rect.min
            })
            .inner;

        self.video_controls(ctx, canvas_origin);
    }
}

impl Drop for WhiteboardApp {
    fn drop(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.unmount(&mut self.store);
        }
    }
}
