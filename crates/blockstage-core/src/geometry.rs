//! Canvas bounds and axis-aligned boxes.

use serde::{Deserialize, Serialize};

/// A width/height pair in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Construct a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point in canvas coordinates (origin top-left, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// The fixed canvas plus the box every actor shares.
///
/// An actor's position is its top-left corner, so the legal range for `x` is
/// `[0, canvas.width - actor.width]` and likewise for `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBounds {
    /// Canvas dimensions.
    pub canvas: Size,
    /// Dimensions shared by every actor.
    pub actor: Size,
}

impl StageBounds {
    /// Construct bounds from canvas and actor sizes.
    pub fn new(canvas: Size, actor: Size) -> Self {
        Self { canvas, actor }
    }

    /// Largest legal `x` for an actor's top-left corner.
    pub fn max_x(&self) -> f64 {
        (self.canvas.width - self.actor.width).max(0.0)
    }

    /// Largest legal `y` for an actor's top-left corner.
    pub fn max_y(&self) -> f64 {
        (self.canvas.height - self.actor.height).max(0.0)
    }

    /// Whether `x` lies outside `[0, max_x]`.
    pub fn outside_x(&self, x: f64) -> bool {
        x < 0.0 || x > self.max_x()
    }

    /// Whether `y` lies outside `[0, max_y]`.
    pub fn outside_y(&self, y: f64) -> bool {
        y < 0.0 || y > self.max_y()
    }

    /// Clamp `x` into `[0, max_x]`.
    pub fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(0.0, self.max_x())
    }

    /// Clamp `y` into `[0, max_y]`.
    pub fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(0.0, self.max_y())
    }

    /// The box an actor occupies with its top-left corner at `(x, y)`.
    pub fn actor_box(&self, x: f64, y: f64) -> Aabb {
        Aabb {
            x,
            y,
            width: self.actor.width,
            height: self.actor.height,
        }
    }
}

/// Which side of another box a moving box ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Mover's right edge entered the other's left edge.
    Left,
    /// Mover's left edge entered the other's right edge.
    Right,
    /// Mover's bottom edge entered the other's top edge.
    Top,
    /// Mover's top edge entered the other's bottom edge.
    Bottom,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Aabb {
    /// Strict overlap test; boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Whether the point lies inside the box, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// The side of `other` this box hit, chosen by smallest penetration.
    ///
    /// Ties resolve in the order left, right, top, bottom. Returns `None` when
    /// the boxes do not overlap.
    pub fn contact_side(&self, other: &Aabb) -> Option<Side> {
        if !self.overlaps(other) {
            return None;
        }
        let candidates = [
            (Side::Left, self.x + self.width - other.x),
            (Side::Right, other.x + other.width - self.x),
            (Side::Top, self.y + self.height - other.y),
            (Side::Bottom, other.y + other.height - self.y),
        ];
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        Some(best.0)
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> StageBounds {
        StageBounds::new(Size::new(480.0, 480.0), Size::new(95.0, 100.0))
    }

    #[test]
    fn legal_range_accounts_for_actor_size() {
        let b = bounds();
        assert_eq!(b.max_x(), 385.0);
        assert_eq!(b.max_y(), 380.0);
        assert!(b.outside_x(-0.1));
        assert!(b.outside_x(385.1));
        assert!(!b.outside_x(385.0));
        assert_eq!(b.clamp_y(1000.0), 380.0);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let b = bounds();
        let left = b.actor_box(0.0, 0.0);
        let right = b.actor_box(95.0, 0.0);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&b.actor_box(94.9, 50.0)));
    }

    #[test]
    fn contact_side_uses_minimum_penetration() {
        let b = bounds();
        let other = b.actor_box(100.0, 100.0);
        assert_eq!(b.actor_box(10.0, 100.0).contact_side(&other), Some(Side::Left));
        assert_eq!(b.actor_box(190.0, 100.0).contact_side(&other), Some(Side::Right));
        assert_eq!(b.actor_box(100.0, 5.0).contact_side(&other), Some(Side::Top));
        assert_eq!(b.actor_box(100.0, 195.0).contact_side(&other), Some(Side::Bottom));
        assert_eq!(b.actor_box(300.0, 300.0).contact_side(&other), None);
    }

    #[test]
    fn angles_wrap_into_range() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-15.0), 345.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn point_containment_includes_edges() {
        let aabb = bounds().actor_box(10.0, 10.0);
        assert!(aabb.contains(10.0, 10.0));
        assert!(aabb.contains(105.0, 110.0));
        assert!(!aabb.contains(105.1, 50.0));
    }
}
