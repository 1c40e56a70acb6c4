//! Retained node tree painted with egui.

use std::collections::HashMap;

use egui::epaint::Vertex;
use egui::{Color32, Context, Mesh, Painter, Pos2, Shape, Stroke};
use log::debug;

use crate::geometry::hit_testing::{hits_local_circle, hits_local_rect, HANDLE_HIT_SLOP};
use crate::geometry::transform_math::local_to_world_from_anchor;
use crate::geometry::Point;
use crate::render::texture_cache::TextureCache;
use crate::render::{NodeContent, NodeId, NodeShape, NodeTransform, PointerTarget, RenderSurface};

const MAX_TEXTURES: usize = 256;
const VIDEO_BACKDROP: Color32 = Color32::from_gray(24);

#[derive(Debug)]
struct Node {
    shape: NodeShape,
    transform: NodeTransform,
    z_index: i32,
    visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    target: Option<PointerTarget>,
    /// Bumped whenever the shape is replaced; keys the texture cache.
    version: u64,
}

/// World placement of a node after composing its ancestors.
#[derive(Debug, Clone, Copy)]
struct Placement {
    origin: Point,
    rotation: f64,
}

impl Placement {
    fn to_world(self, local: Point) -> Point {
        local_to_world_from_anchor(local, self.origin, self.rotation)
    }
}

#[derive(Debug)]
pub struct EguiSurface {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u64,
    offset: Point,
    textures: TextureCache,
}

impl Default for EguiSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EguiSurface {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            offset: Point::ZERO,
            textures: TextureCache::new(MAX_TEXTURES),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn scene_offset(&self) -> Point {
        self.offset
    }

    /// Siblings in paint order: ascending z-index, creation order among equals.
    fn ordered(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut ordered = ids.to_vec();
        ordered.sort_by_key(|id| (self.nodes.get(id).map_or(0, |n| n.z_index), *id));
        ordered
    }

    fn child_placement(parent: Placement, transform: &NodeTransform) -> Placement {
        Placement {
            origin: parent.to_world(transform.origin()),
            rotation: parent.rotation + transform.rotation,
        }
    }

    /// Paints every visible node. `canvas_origin` is where world `(0,0)` lands
    /// before the scene offset is applied.
    pub fn paint(&mut self, ctx: &Context, painter: &Painter, canvas_origin: Pos2) {
        self.textures.begin_frame();
        let root = Placement {
            origin: self.offset + Point::new(canvas_origin.x as f64, canvas_origin.y as f64),
            rotation: 0.0,
        };
        for id in self.ordered(&self.roots) {
            self.paint_node(ctx, painter, id, root);
        }
    }

    fn paint_node(&mut self, ctx: &Context, painter: &Painter, id: NodeId, parent: Placement) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let placement = Self::child_placement(parent, &node.transform);
        let children = self.ordered(&node.children);
        let (shape, transform, version) = (node.shape.clone(), node.transform, node.version);

        self.paint_shape(ctx, painter, id, version, &shape, &transform, placement);
        for child in children {
            self.paint_node(ctx, painter, child, placement);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_shape(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        id: NodeId,
        version: u64,
        shape: &NodeShape,
        transform: &NodeTransform,
        placement: Placement,
    ) {
        let quad = |min: Point, size: Point| -> Vec<Pos2> {
            [
                min,
                Point::new(min.x + size.x, min.y),
                Point::new(min.x + size.x, min.y + size.y),
                Point::new(min.x, min.y + size.y),
            ]
            .into_iter()
            .map(|p| to_pos(placement.to_world(p)))
            .collect()
        };
        let full = quad(Point::ZERO, Point::new(transform.width, transform.height));

        match shape {
            NodeShape::Sprite { content, tint } => match content {
                NodeContent::Placeholder => {
                    painter.add(Shape::convex_polygon(full, tint.unwrap_or(Color32::GRAY), Stroke::NONE));
                }
                NodeContent::Image(image) => {
                    let texture = self.textures.get_or_upload(ctx, id, version, image);
                    painter.add(textured_quad(texture, &full, tint.unwrap_or(Color32::WHITE)));
                }
                NodeContent::Video(media) => match media.poster() {
                    Some(frame) => {
                        let texture = self.textures.get_or_upload(ctx, id, version, &frame);
                        painter.add(textured_quad(texture, &full, tint.unwrap_or(Color32::WHITE)));
                    }
                    None => {
                        painter.add(Shape::convex_polygon(full, VIDEO_BACKDROP, Stroke::NONE));
                    }
                },
            },
            NodeShape::Rect(style) => {
                let stroke = style.stroke.map_or(Stroke::NONE, |s| {
                    Stroke::new(s.width as f32, s.color.gamma_multiply(s.alpha))
                });
                painter.add(Shape::convex_polygon(
                    full,
                    style.fill.gamma_multiply(style.fill_alpha),
                    stroke,
                ));
            }
            NodeShape::Outline {
                min,
                size,
                color,
                width,
            } => {
                painter.add(Shape::closed_line(quad(*min, *size), Stroke::new(*width as f32, *color)));
            }
            NodeShape::Square { min, size, color } => {
                painter.add(Shape::convex_polygon(
                    quad(*min, Point::new(*size, *size)),
                    *color,
                    Stroke::NONE,
                ));
            }
            NodeShape::Circle {
                center,
                radius,
                color,
            } => {
                painter.circle_filled(to_pos(placement.to_world(*center)), *radius as f32, *color);
            }
        }
    }

    /// Topmost pointer target under `canvas_point`, a position relative to the
    /// canvas origin (scene offset not yet removed).
    ///
    /// Only the topmost hit is reported, so a press on a handle never also
    /// reaches the object beneath it.
    pub fn hit_test(&self, canvas_point: Point) -> Option<PointerTarget> {
        let root = Placement {
            origin: self.offset,
            rotation: 0.0,
        };
        self.ordered(&self.roots)
            .into_iter()
            .rev()
            .find_map(|id| self.hit_node(id, canvas_point, root))
    }

    fn hit_node(&self, id: NodeId, point: Point, parent: Placement) -> Option<PointerTarget> {
        let node = self.nodes.get(&id)?;
        if !node.visible {
            return None;
        }
        let placement = Self::child_placement(parent, &node.transform);

        // Children paint above their parent, so they are tested first.
        let child_hit = self
            .ordered(&node.children)
            .into_iter()
            .rev()
            .find_map(|child| self.hit_node(child, point, placement));
        if child_hit.is_some() {
            return child_hit;
        }

        let target = node.target.as_ref()?;
        let size = Point::new(node.transform.width, node.transform.height);
        let (origin, rotation) = (placement.origin, placement.rotation);
        let hit = match &node.shape {
            NodeShape::Sprite { .. } | NodeShape::Rect(_) => {
                hits_local_rect(point, origin, rotation, Point::ZERO, size, 0.0)
            }
            NodeShape::Outline { min, size, .. } => {
                hits_local_rect(point, origin, rotation, *min, *size, 0.0)
            }
            NodeShape::Square { min, size, .. } => hits_local_rect(
                point,
                origin,
                rotation,
                *min,
                Point::new(*size, *size),
                HANDLE_HIT_SLOP,
            ),
            NodeShape::Circle { center, radius, .. } => {
                hits_local_circle(point, origin, rotation, *center, *radius, HANDLE_HIT_SLOP)
            }
        };
        hit.then(|| target.clone())
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            self.textures.invalidate_node(id);
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

fn to_pos(p: Point) -> Pos2 {
    Pos2::new(p.x as f32, p.y as f32)
}

fn textured_quad(texture: egui::TextureId, corners: &[Pos2], tint: Color32) -> Shape {
    let uvs = [
        Pos2::new(0.0, 0.0),
        Pos2::new(1.0, 0.0),
        Pos2::new(1.0, 1.0),
        Pos2::new(0.0, 1.0),
    ];
    let mut mesh = Mesh::with_texture(texture);
    for (pos, uv) in corners.iter().zip(uvs) {
        mesh.vertices.push(Vertex {
            pos: *pos,
            uv,
            color: tint,
        });
    }
    mesh.indices = vec![0, 1, 2, 0, 2, 3];
    Shape::mesh(mesh)
}

impl RenderSurface for EguiSurface {
    fn create_node(&mut self, shape: NodeShape, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.nodes.insert(
            id,
            Node {
                shape,
                transform: NodeTransform::default(),
                z_index: 0,
                visible: true,
                parent,
                children: Vec::new(),
                target: None,
                version: 0,
            },
        );
        id
    }

    fn set_shape(&mut self, node: NodeId, shape: NodeShape) {
        if let Some(n) = self.nodes.get_mut(&node) {
            let content_changed = match (&n.shape, &shape) {
                (NodeShape::Sprite { content: old, .. }, NodeShape::Sprite { content: new, .. }) => {
                    !same_content(old, new)
                }
                _ => true,
            };
            n.shape = shape;
            if content_changed {
                n.version += 1;
                self.textures.invalidate_node(node);
            }
        }
    }

    fn set_transform(&mut self, node: NodeId, transform: NodeTransform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = transform;
        }
    }

    fn set_z_index(&mut self, node: NodeId, z_index: i32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.z_index = z_index;
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn set_pointer_target(&mut self, node: NodeId, target: Option<PointerTarget>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.target = target;
        }
    }

    fn destroy_node(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).map(|n| n.parent) else {
            debug!("Ignoring destroy of unknown node {:?}", node);
            return;
        };
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.retain(|c| *c != node),
            None => self.roots.retain(|r| *r != node),
        }
        self.remove_subtree(node);
    }

    fn set_scene_offset(&mut self, offset: Point) {
        self.offset = offset;
    }
}

fn same_content(a: &NodeContent, b: &NodeContent) -> bool {
    match (a, b) {
        (NodeContent::Placeholder, NodeContent::Placeholder) => true,
        (NodeContent::Image(a), NodeContent::Image(b)) => std::sync::Arc::ptr_eq(a, b),
        (NodeContent::Video(a), NodeContent::Video(b)) => std::sync::Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionStyle;
    use crate::id_generator::ObjectId;
    use crate::object::NewObject;
    use crate::overlay::sync_selection_frame;

    fn object_node(surface: &mut EguiSurface, id: &str, x: f64, y: f64, z: i32) -> NodeId {
        let node = surface.create_node(NodeShape::placeholder(Color32::GRAY), None);
        surface.set_transform(
            node,
            NodeTransform {
                x,
                y,
                rotation: 0.0,
                width: 100.0,
                height: 100.0,
            },
        );
        surface.set_z_index(node, z);
        surface.set_pointer_target(node, Some(PointerTarget::Object(ObjectId::from(id))));
        node
    }

    #[test]
    fn test_topmost_object_wins() {
        let mut surface = EguiSurface::new();
        object_node(&mut surface, "below", 0.0, 0.0, 0);
        object_node(&mut surface, "above", 50.0, 50.0, 1);
        assert_eq!(
            surface.hit_test(Point::new(75.0, 75.0)),
            Some(PointerTarget::Object(ObjectId::from("above")))
        );
        assert_eq!(
            surface.hit_test(Point::new(10.0, 10.0)),
            Some(PointerTarget::Object(ObjectId::from("below")))
        );
        assert_eq!(surface.hit_test(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_handle_hit_beats_object() {
        let mut surface = EguiSurface::new();
        let object = NewObject::image("a.png", 100.0, 100.0, 300.0, 200.0).build(ObjectId::from("img"));
        object_node(&mut surface, "img", 100.0, 100.0, 0);
        let frame = sync_selection_frame(
            &mut surface,
            None,
            &object,
            Some(&object.id),
            &SelectionStyle::default(),
        );
        assert!(frame.is_some());
        // Inside both the object and its south-east handle.
        assert_eq!(
            surface.hit_test(Point::new(398.0, 298.0)),
            Some(PointerTarget::ScaleHandle(
                ObjectId::from("img"),
                crate::geometry::Corner::Se
            ))
        );
        assert_eq!(
            surface.hit_test(Point::new(250.0, 82.0)),
            Some(PointerTarget::RotateHandle(ObjectId::from("img")))
        );
    }

    #[test]
    fn test_scene_offset_shifts_hits() {
        let mut surface = EguiSurface::new();
        object_node(&mut surface, "a", 0.0, 0.0, 0);
        surface.set_scene_offset(Point::new(200.0, 0.0));
        assert_eq!(surface.hit_test(Point::new(10.0, 10.0)), None);
        assert!(surface.hit_test(Point::new(210.0, 10.0)).is_some());
    }

    #[test]
    fn test_destroy_removes_children() {
        let mut surface = EguiSurface::new();
        let root = surface.create_node(NodeShape::placeholder(Color32::GRAY), None);
        surface.create_node(NodeShape::placeholder(Color32::GRAY), Some(root));
        surface.create_node(NodeShape::placeholder(Color32::GRAY), Some(root));
        assert_eq!(surface.node_count(), 3);
        surface.destroy_node(root);
        assert_eq!(surface.node_count(), 0);
        surface.destroy_node(root);
    }

    #[test]
    fn test_paint_does_not_panic() {
        let ctx = Context::default();
        let painter = Painter::new(
            ctx.clone(),
            egui::LayerId::background(),
            egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0)),
        );
        let mut surface = EguiSurface::new();
        let node = object_node(&mut surface, "a", 10.0, 10.0, 0);
        surface.set_shape(
            node,
            NodeShape::Sprite {
                content: NodeContent::Image(std::sync::Arc::new(crate::resource::DecodedImage {
                    width: 1,
                    height: 1,
                    rgba: vec![0, 0, 0, 255],
                })),
                tint: None,
            },
        );
        surface.paint(&ctx, &painter, Pos2::ZERO);
    }
}
