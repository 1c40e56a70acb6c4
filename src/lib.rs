#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod id_generator;
pub mod input;
pub mod interaction;
pub mod layer;
pub mod object;
pub mod overlay;
pub mod render;
pub mod resource;
pub mod scene;
pub mod store;

pub use app::WhiteboardApp;
pub use config::EditorConfig;
pub use error::{ConfigError, LoadError, MediaError};
pub use geometry::{Corner, Point};
pub use id_generator::ObjectId;
pub use interaction::{EditorKey, Interaction, InteractionController};
pub use layer::{LayerReconciler, LoadPhase};
pub use object::{CanvasObject, NewObject, ObjectKind, ObjectPatch};
pub use render::{EguiSurface, RenderSurface};
pub use scene::Scene;
pub use store::{CanvasState, CanvasStore};
