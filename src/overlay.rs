//! Selection frame with scale and rotate handles.
//!
//! The frame is drawn in the selected object's unrotated local space and the
//! whole node is then positioned and rotated like the object, so the outline
//! never skews. Handles are children of the frame and follow it.

use crate::config::SelectionStyle;
use crate::geometry::{Corner, Point};
use crate::id_generator::ObjectId;
use crate::object::CanvasObject;
use crate::render::{NodeId, NodeShape, NodeTransform, PointerTarget, RenderSurface};

/// Local-space geometry of a selection frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub outline_min: Point,
    pub outline_size: Point,
    /// Top-left of each corner handle square.
    pub corners: [(Corner, Point); 4],
    pub handle_size: f64,
    pub rotate_center: Point,
    pub rotate_radius: f64,
}

pub fn frame_layout(width: f64, height: f64, style: &SelectionStyle) -> FrameLayout {
    let p = style.padding;
    let half = style.handle_half();
    let corners = Corner::ALL.map(|corner| {
        let at = corner.local_offset(width, height);
        (corner, Point::new(at.x - half, at.y - half))
    });
    FrameLayout {
        outline_min: Point::new(-p, -p),
        outline_size: Point::new(width + p * 2.0, height + p * 2.0),
        corners,
        handle_size: style.handle_size,
        rotate_center: Point::new(width / 2.0, -style.rotate_handle_offset),
        rotate_radius: style.rotate_handle_radius,
    }
}

/// Nodes of a live selection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionFrame {
    pub root: NodeId,
    pub corners: [NodeId; 4],
    pub rotate: NodeId,
}

impl SelectionFrame {
    fn create(surface: &mut dyn RenderSurface, id: &ObjectId, layout: &FrameLayout, style: &SelectionStyle) -> Self {
        let root = surface.create_node(outline_shape(layout, style), None);
        surface.set_z_index(root, style.z_index);
        let corners = layout.corners.map(|(corner, min)| {
            let node = surface.create_node(
                NodeShape::Square {
                    min,
                    size: layout.handle_size,
                    color: style.color,
                },
                Some(root),
            );
            surface.set_pointer_target(node, Some(PointerTarget::ScaleHandle(id.clone(), corner)));
            node
        });
        let rotate = surface.create_node(rotate_shape(layout, style), Some(root));
        surface.set_pointer_target(rotate, Some(PointerTarget::RotateHandle(id.clone())));
        Self {
            root,
            corners,
            rotate,
        }
    }

    fn redraw(&self, surface: &mut dyn RenderSurface, layout: &FrameLayout, style: &SelectionStyle) {
        surface.set_shape(self.root, outline_shape(layout, style));
        for (node, (_, min)) in self.corners.iter().zip(layout.corners) {
            surface.set_shape(
                *node,
                NodeShape::Square {
                    min,
                    size: layout.handle_size,
                    color: style.color,
                },
            );
        }
        surface.set_shape(self.rotate, rotate_shape(layout, style));
    }

    pub fn destroy(self, surface: &mut dyn RenderSurface) {
        surface.destroy_node(self.root);
    }
}

fn outline_shape(layout: &FrameLayout, style: &SelectionStyle) -> NodeShape {
    NodeShape::Outline {
        min: layout.outline_min,
        size: layout.outline_size,
        color: style.color,
        width: style.outline_width,
    }
}

fn rotate_shape(layout: &FrameLayout, style: &SelectionStyle) -> NodeShape {
    NodeShape::Circle {
        center: layout.rotate_center,
        radius: layout.rotate_radius,
        color: style.color,
    }
}

/// Creates, redraws or removes the selection frame of `object`.
///
/// Returns the frame to keep when `object` is selected, `None` otherwise.
pub fn sync_selection_frame(
    surface: &mut dyn RenderSurface,
    frame: Option<SelectionFrame>,
    object: &CanvasObject,
    selected_id: Option<&ObjectId>,
    style: &SelectionStyle,
) -> Option<SelectionFrame> {
    if selected_id != Some(&object.id) {
        if let Some(frame) = frame {
            frame.destroy(surface);
        }
        return None;
    }

    let layout = frame_layout(object.width, object.height, style);
    let frame = match frame {
        Some(frame) => {
            frame.redraw(surface, &layout, style);
            frame
        }
        None => SelectionFrame::create(surface, &object.id, &layout, style),
    };
    surface.set_transform(
        frame.root,
        NodeTransform {
            x: object.x,
            y: object.y,
            rotation: object.rotation,
            width: object.width,
            height: object.height,
        },
    );
    Some(frame)
}
