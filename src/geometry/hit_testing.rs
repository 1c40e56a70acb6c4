use super::transform_math::{world_to_local_about_anchor, Point};

/// Extra tolerance around small targets such as handles, in world units.
pub const HANDLE_HIT_SLOP: f64 = 2.0;

/// Tests a world point against an axis-aligned rectangle given in the local
/// space of a node positioned at `origin` and rotated by `rotation`.
pub fn hits_local_rect(
    point: Point,
    origin: Point,
    rotation: f64,
    min: Point,
    size: Point,
    slop: f64,
) -> bool {
    let local = world_to_local_about_anchor(point, origin, rotation);
    local.x >= min.x - slop
        && local.y >= min.y - slop
        && local.x <= min.x + size.x + slop
        && local.y <= min.y + size.y + slop
}

/// Tests a world point against a circle given in a node's local space.
pub fn hits_local_circle(
    point: Point,
    origin: Point,
    rotation: f64,
    center: Point,
    radius: f64,
    slop: f64,
) -> bool {
    let local = world_to_local_about_anchor(point, origin, rotation);
    local.distance(center) <= radius + slop
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotated_rect_hit() {
        let origin = Point::new(100.0, 100.0);
        let size = Point::new(50.0, 10.0);
        // Unrotated: the rect spans x in [100,150].
        assert!(hits_local_rect(Point::new(140.0, 105.0), origin, 0.0, Point::ZERO, size, 0.0));
        // Rotated 90° the same rect hangs below the origin instead.
        assert!(!hits_local_rect(Point::new(140.0, 105.0), origin, FRAC_PI_2, Point::ZERO, size, 0.0));
        assert!(hits_local_rect(Point::new(95.0, 140.0), origin, FRAC_PI_2, Point::ZERO, size, 0.0));
    }

    #[test]
    fn test_circle_hit_with_slop() {
        let origin = Point::new(0.0, 0.0);
        let center = Point::new(150.0, -18.0);
        assert!(hits_local_circle(Point::new(157.0, -18.0), origin, 0.0, center, 6.0, HANDLE_HIT_SLOP));
        assert!(!hits_local_circle(Point::new(160.0, -18.0), origin, 0.0, center, 6.0, HANDLE_HIT_SLOP));
    }
}
