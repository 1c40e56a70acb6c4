//! Pure 2D geometry behind the move/scale/rotate interactions.
//!
//! Objects store their top-left corner, their size and a rotation (radians)
//! applied about that top-left corner. The world uses a Y-down convention.

use egui::CursorIcon;

/// Smallest width/height an interactive resize may produce.
pub const DEFAULT_MIN_SIZE: f64 = 10.0;

/// A point (or vector) in world or local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Top-left position and size produced by a scale interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One of the four corner scale handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::Nw => "nw",
            Corner::Ne => "ne",
            Corner::Sw => "sw",
            Corner::Se => "se",
        }
    }

    pub fn opposite(&self) -> Corner {
        match self {
            Corner::Nw => Corner::Se,
            Corner::Ne => Corner::Sw,
            Corner::Sw => Corner::Ne,
            Corner::Se => Corner::Nw,
        }
    }

    /// Position of this corner in the object's unrotated local space.
    pub fn local_offset(&self, width: f64, height: f64) -> Point {
        match self {
            Corner::Nw => Point::new(0.0, 0.0),
            Corner::Ne => Point::new(width, 0.0),
            Corner::Sw => Point::new(0.0, height),
            Corner::Se => Point::new(width, height),
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Corner::Nw | Corner::Se => CursorIcon::ResizeNwSe,
            Corner::Ne | Corner::Sw => CursorIcon::ResizeNeSw,
        }
    }
}

/// Rotates a vector by `rotation` radians.
pub fn rotate(v: Point, rotation: f64) -> Point {
    let (sin, cos) = rotation.sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Converts a world point into a frame whose origin is `anchor` and whose axes
/// are rotated by `rotation` (the object's rotation is undone).
pub fn world_to_local_about_anchor(world: Point, anchor: Point, rotation: f64) -> Point {
    let (sin, cos) = rotation.sin_cos();
    let v = world - anchor;
    Point::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

/// Inverse of [`world_to_local_about_anchor`].
pub fn local_to_world_from_anchor(local: Point, anchor: Point, rotation: f64) -> Point {
    anchor + rotate(local, rotation)
}

/// Converts a point in an object's local space (origin at its top-left) to world space.
pub fn local_to_world_from_top_left(local: Point, top_left: Point, rotation: f64) -> Point {
    local_to_world_from_anchor(local, top_left, rotation)
}

/// Absolute size with each dimension raised to at least `min_size`.
pub fn clamp_size(width: f64, height: f64, min_size: f64) -> (f64, f64) {
    (min_size.max(width.abs()), min_size.max(height.abs()))
}

/// Scales `width`/`height` down (never up) to fit within the maximum, keeping
/// the aspect ratio and rounding to whole units.
pub fn fit_within_max(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (max_width.min(width).max(1.0), max_height.min(height).max(1.0));
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    ((width * scale).round(), (height * scale).round())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    /// Fixed corner in world space.
    pub anchor: Point,
    /// Current pointer in world space.
    pub pointer: Point,
    pub rotation: f64,
    pub min_size: f64,
}

/// Corner-handle scaling: the rectangle spanned by the anchor and the pointer in
/// the object's local frame, clamped to `min_size`.
///
/// The anchor stays at the corner of the result opposite the pointer, also when
/// the pointer crosses the anchor on either axis or the size gets clamped.
pub fn compute_scaled_rect_from_anchor(params: ScaleParams) -> ScaledRect {
    let ScaleParams {
        anchor,
        pointer,
        rotation,
        min_size,
    } = params;
    let local = world_to_local_about_anchor(pointer, anchor, rotation);
    let (width, height) = clamp_size(local.x, local.y, min_size);
    // Equals min(0, local) unless the size was clamped on a negative axis.
    let top_left_local = Point::new(
        if local.x < 0.0 { -width } else { 0.0 },
        if local.y < 0.0 { -height } else { 0.0 },
    );
    let top_left = local_to_world_from_anchor(top_left_local, anchor, rotation);
    ScaledRect {
        x: top_left.x,
        y: top_left.y,
        width,
        height,
    }
}

/// World position of `handle`'s corner for a rectangle at `top_left`.
pub fn corner_world(top_left: Point, width: f64, height: f64, rotation: f64, handle: Corner) -> Point {
    local_to_world_from_top_left(handle.local_offset(width, height), top_left, rotation)
}

/// World position of the corner diagonally opposite the dragged `handle`.
pub fn opposite_corner_anchor_world(
    top_left: Point,
    width: f64,
    height: f64,
    rotation: f64,
    handle: Corner,
) -> Point {
    corner_world(top_left, width, height, rotation, handle.opposite())
}

/// Signed angle from (center→start) to (center→current), via an `atan2` difference.
pub fn angle_delta_around_center(start: Point, current: Point, center: Point) -> f64 {
    let a = (start.y - center.y).atan2(start.x - center.x);
    let b = (current.y - center.y).atan2(current.x - center.x);
    b - a
}

/// Center of a rectangle given its top-left, size and rotation.
pub fn center_from_top_left(top_left: Point, width: f64, height: f64, rotation: f64) -> Point {
    top_left + rotate(Point::new(width / 2.0, height / 2.0), rotation)
}

/// Top-left of a rectangle given its center, size and rotation.
pub fn top_left_from_center(center: Point, width: f64, height: f64, rotation: f64) -> Point {
    center + rotate(Point::new(-width / 2.0, -height / 2.0), rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-6;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_local_world_roundtrip() {
        let anchor = Point::new(40.0, -12.5);
        for rotation in [0.0, 0.3, FRAC_PI_2, 2.5, -1.1] {
            let world = Point::new(123.0, 77.0);
            let local = world_to_local_about_anchor(world, anchor, rotation);
            assert_close(local_to_world_from_anchor(local, anchor, rotation), world);
        }
    }

    #[test]
    fn test_world_to_local_undoes_rotation() {
        // A point straight below the anchor lies on the local +x axis after a -90° frame rotation.
        let local = world_to_local_about_anchor(Point::new(0.0, 10.0), Point::ZERO, FRAC_PI_2);
        assert_close(local, Point::new(10.0, 0.0));
    }

    #[test]
    fn test_clamp_size_never_below_min() {
        for (w, h) in [(0.0, 0.0), (-1e9, 3.0), (5.0, -4.0), (250.0, -50.0)] {
            let (cw, ch) = clamp_size(w, h, 10.0);
            assert!(cw >= 10.0 && ch >= 10.0);
        }
        assert_eq!(clamp_size(-250.0, 50.0, 10.0), (250.0, 50.0));
    }

    #[test]
    fn test_se_drag_scenario() {
        let anchor = opposite_corner_anchor_world(Point::ZERO, 200.0, 100.0, 0.0, Corner::Se);
        assert_close(anchor, Point::ZERO);
        let rect = compute_scaled_rect_from_anchor(ScaleParams {
            anchor,
            pointer: Point::new(250.0, 50.0),
            rotation: 0.0,
            min_size: DEFAULT_MIN_SIZE,
        });
        assert_eq!(
            rect,
            ScaledRect {
                x: 0.0,
                y: 0.0,
                width: 250.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn test_anchor_corner_stays_fixed() {
        let top_left = Point::new(30.0, 40.0);
        let (w, h) = (200.0, 120.0);
        let pointers = [
            Point::new(400.0, 300.0),
            Point::new(-200.0, 20.0),
            Point::new(35.0, 41.0),
            Point::new(-90.0, -150.0),
        ];
        for rotation in [0.0, 0.4, FRAC_PI_2, PI, -2.2] {
            for handle in Corner::ALL {
                let anchor = opposite_corner_anchor_world(top_left, w, h, rotation, handle);
                for pointer in pointers {
                    let rect = compute_scaled_rect_from_anchor(ScaleParams {
                        anchor,
                        pointer,
                        rotation,
                        min_size: DEFAULT_MIN_SIZE,
                    });
                    let new_top_left = Point::new(rect.x, rect.y);
                    let corners: Vec<Point> = Corner::ALL
                        .iter()
                        .map(|c| corner_world(new_top_left, rect.width, rect.height, rotation, *c))
                        .collect();
                    assert!(
                        corners.iter().any(|c| c.distance(anchor) < EPS),
                        "anchor moved: rotation={rotation} handle={handle:?} pointer={pointer:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_scale_clamps_on_every_step() {
        let rect = compute_scaled_rect_from_anchor(ScaleParams {
            anchor: Point::new(100.0, 100.0),
            pointer: Point::new(97.0, 101.0),
            rotation: 0.0,
            min_size: 10.0,
        });
        assert_eq!((rect.width, rect.height), (10.0, 10.0));
        assert_close(Point::new(rect.x, rect.y), Point::new(90.0, 100.0));
    }

    #[test]
    fn test_angle_delta() {
        let center = Point::new(10.0, 10.0);
        let start = Point::new(20.0, 10.0);
        assert_eq!(angle_delta_around_center(start, start, center), 0.0);
        let delta = angle_delta_around_center(start, Point::new(10.0, 20.0), center);
        assert!((delta - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_center_roundtrip() {
        for rotation in [0.0, 0.7, -2.9, PI] {
            let top_left = Point::new(-15.0, 88.0);
            let center = center_from_top_left(top_left, 64.0, 48.0, rotation);
            assert_close(top_left_from_center(center, 64.0, 48.0, rotation), top_left);
        }
    }

    #[test]
    fn test_center_unrotated() {
        let center = center_from_top_left(Point::new(100.0, 100.0), 300.0, 200.0, 0.0);
        assert_close(center, Point::new(250.0, 200.0));
    }

    #[test]
    fn test_fit_within_max_only_downscales() {
        assert_eq!(fit_within_max(1600.0, 1200.0, 800.0, 600.0), (800.0, 600.0));
        assert_eq!(fit_within_max(1000.0, 500.0, 800.0, 600.0), (800.0, 400.0));
        assert_eq!(fit_within_max(640.0, 480.0, 800.0, 600.0), (640.0, 480.0));
        assert_eq!(fit_within_max(0.0, 300.0, 800.0, 600.0), (1.0, 300.0));
    }
}
