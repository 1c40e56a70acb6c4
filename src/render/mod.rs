//! The render-surface collaborator.
//!
//! A surface is a retained tree of drawable nodes. Reconcilers create, update
//! and destroy nodes through [`RenderSurface`]; the surface paints them and
//! reports which [`PointerTarget`] a press landed on.

use std::sync::Arc;

use egui::Color32;

use crate::geometry::{Corner, Point};
use crate::id_generator::ObjectId;
use crate::object::{CanvasObject, RectStyle};
use crate::resource::{DecodedImage, MediaHandle};

pub mod egui_surface;
pub mod texture_cache;

pub use egui_surface::EguiSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Position, rotation and size of a node, relative to its parent.
///
/// Rotation is applied about the node's origin. `width`/`height` only matter
/// for shapes that fill their node (sprites and rectangles).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeTransform {
    pub fn of(object: &CanvasObject) -> Self {
        Self {
            x: object.x,
            y: object.y,
            rotation: object.rotation,
            width: object.width,
            height: object.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone)]
pub enum NodeContent {
    /// Solid fill, shown until the real content is available.
    Placeholder,
    Image(Arc<DecodedImage>),
    Video(Arc<dyn MediaHandle>),
}

impl std::fmt::Debug for NodeContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder => f.write_str("Placeholder"),
            Self::Image(image) => f.debug_tuple("Image").field(image).finish(),
            Self::Video(_) => f.write_str("Video(<media>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeShape {
    /// Fills the node's size with its content, multiplied by `tint`.
    Sprite {
        content: NodeContent,
        tint: Option<Color32>,
    },
    /// A vector rectangle filling the node's size.
    Rect(RectStyle),
    /// Stroked rectangle in local coordinates.
    Outline {
        min: Point,
        size: Point,
        color: Color32,
        width: f64,
    },
    /// Filled square in local coordinates.
    Square {
        min: Point,
        size: f64,
        color: Color32,
    },
    /// Filled circle in local coordinates.
    Circle {
        center: Point,
        radius: f64,
        color: Color32,
    },
}

impl NodeShape {
    pub fn placeholder(tint: Color32) -> Self {
        Self::Sprite {
            content: NodeContent::Placeholder,
            tint: Some(tint),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Self::Sprite {
                content: NodeContent::Placeholder,
                ..
            }
        )
    }
}

/// What a pointer press on a node means to the interaction controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointerTarget {
    Object(ObjectId),
    ScaleHandle(ObjectId, Corner),
    RotateHandle(ObjectId),
}

impl PointerTarget {
    pub fn object_id(&self) -> &ObjectId {
        match self {
            Self::Object(id) | Self::ScaleHandle(id, _) | Self::RotateHandle(id) => id,
        }
    }
}

pub trait RenderSurface {
    /// Creates a node, as a child of `parent` when given.
    fn create_node(&mut self, shape: NodeShape, parent: Option<NodeId>) -> NodeId;

    /// Replaces a node's visual content in place.
    fn set_shape(&mut self, node: NodeId, shape: NodeShape);

    fn set_transform(&mut self, node: NodeId, transform: NodeTransform);

    /// Draw order among siblings; higher is drawn on top.
    fn set_z_index(&mut self, node: NodeId, z_index: i32);

    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn set_pointer_target(&mut self, node: NodeId, target: Option<PointerTarget>);

    /// Detaches and destroys a node together with its children.
    fn destroy_node(&mut self, node: NodeId);

    /// Uniform offset applied on top of every node (the viewport).
    fn set_scene_offset(&mut self, offset: Point);
}
