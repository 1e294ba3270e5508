//! Points, sizes, and rectangles in diagram space.
//!
//! Coordinates follow SVG: the origin is the top-left corner, `x` grows to
//! the right and `y` grows downward. Units are device-independent; renderers
//! decide what a unit maps to.
//!
//! The layout engines compute in an abstract (cross, main) axis pair and use
//! the `swap_axes` helpers to map results for left-to-right drawings.

use serde::{Deserialize, Serialize};

/// A position in diagram space.
///
/// ```
/// # use astrolabe_core::geometry::Point;
/// let anchor = Point::new(10.0, 20.0).add_point(Point::new(5.0, 5.0));
/// assert_eq!(anchor, Point::new(15.0, 25.0));
/// assert_eq!(anchor.midpoint(Point::new(5.0, 5.0)), Point::new(10.0, 15.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn add_point(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub_point(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn swap_axes(self) -> Self {
        Self::new(self.y, self.x)
    }

    /// A rectangle of `size` centered on this point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Component-wise maximum.
    pub fn max(self, other: Size) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Grows the size by the insets on every side.
    pub fn add_padding(self, insets: Insets) -> Self {
        Self::new(
            self.width + insets.left + insets.right,
            self.height + insets.top + insets.bottom,
        )
    }

    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn swap_axes(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// An axis-aligned rectangle stored as its minimum and maximum corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let (half_width, half_height) = (size.width / 2.0, size.height / 2.0);
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// The smallest rectangle with both points as corners, in any order.
    pub fn new_from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Top-left corner.
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Bottom-right corner.
    pub fn max_point(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// The smallest rectangle covering both.
    ///
    /// ```
    /// # use astrolabe_core::geometry::{Bounds, Point, Size};
    /// let header = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let body = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    /// let frame = header.merge(&body);
    /// assert_eq!((frame.width(), frame.height()), (130.0, 120.0));
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the rectangle outward by the insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left,
            min_y: self.min_y - insets.top,
            max_x: self.max_x + insets.right,
            max_y: self.max_y + insets.bottom,
        }
    }

    pub fn swap_axes(&self) -> Self {
        Self {
            min_x: self.min_y,
            min_y: self.min_x,
            max_x: self.max_y,
            max_y: self.max_x,
        }
    }

    /// Whether the rectangles share interior area. Touching edges do not count.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Whether `point` lies inside or on the outline.
    pub fn contains_point(&self, point: Point) -> bool {
        (self.min_x..=self.max_x).contains(&point.x)
            && (self.min_y..=self.max_y).contains(&point.y)
    }

    /// Whether `other` lies entirely inside, outline included.
    pub fn contains_bounds(&self, other: &Self) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Where a ray from the center toward `target` crosses the outline.
    ///
    /// Edge endpoints are clipped with this so connectors stop at the node
    /// outline. Returns the center when `target` coincides with it.
    pub fn boundary_point_toward(&self, target: Point) -> Point {
        let center = self.center();
        let (half_width, half_height) = (self.width() / 2.0, self.height() / 2.0);

        let delta = target.sub_point(center);
        let length = delta.x.hypot(delta.y);
        if length < 0.001 || half_width <= 0.0 && half_height <= 0.0 {
            return center;
        }
        let (dx, dy) = (delta.x / length, delta.y / length);

        // Ray length until each pair of parallel sides is reached.
        let reach = |half: f32, d: f32| {
            if d.abs() > f32::EPSILON {
                half / d.abs()
            } else {
                f32::MAX
            }
        };
        let t = reach(half_width, dx).min(reach(half_height, dy));
        if !t.is_finite() || t == f32::MAX {
            return center;
        }

        Point::new(dx.mul_add(t, center.x), dy.mul_add(t, center.y))
    }
}

/// Space around the four sides of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_default() {
        let point = Point::default();
        assert_eq!(point.x(), 0.0);
        assert_eq!(point.y(), 0.0);
        assert_eq!(point.midpoint(Point::new(4.0, 2.0)), Point::new(2.0, 1.0));
    }

    #[test]
    fn test_point_add_sub() {
        let p1 = Point::new(5.0, 8.0);
        let p2 = Point::new(2.0, 3.0);
        assert_eq!(p1.add_point(p2), Point::new(7.0, 11.0));
        assert_eq!(p1.sub_point(p2), Point::new(3.0, 5.0));
    }

    #[test]
    fn test_point_swap_axes() {
        let point = Point::new(1.0, 2.0).swap_axes();
        assert_eq!(point, Point::new(2.0, 1.0));
    }

    #[test]
    fn test_size_max_and_swap() {
        let a = Size::new(10.0, 20.0);
        let b = Size::new(30.0, 5.0);
        assert_eq!(a.max(b), Size::new(30.0, 20.0));
        assert_eq!(a.swap_axes(), Size::new(20.0, 10.0));
        assert!(Size::default().is_zero());
    }

    #[test]
    fn test_size_add_padding() {
        let size = Size::new(10.0, 10.0).add_padding(Insets::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(size, Size::new(16.0, 14.0));
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(10.0, 10.0), Size::new(4.0, 6.0));
        assert_eq!(bounds.min_x(), 8.0);
        assert_eq!(bounds.min_y(), 7.0);
        assert_eq!(bounds.max_x(), 12.0);
        assert_eq!(bounds.max_y(), 13.0);
        assert_eq!(bounds.center(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_bounds_from_corners_normalizes() {
        let bounds = Bounds::new_from_corners(Point::new(5.0, 1.0), Point::new(1.0, 5.0));
        assert_eq!(bounds.min_point(), Point::new(1.0, 1.0));
        assert_eq!(bounds.max_point(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_bounds_overlaps() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(10.0, 10.0));
        let touching = Bounds::new_from_top_left(Point::new(10.0, 0.0), Size::new(10.0, 10.0));
        let far = Bounds::new_from_top_left(Point::new(50.0, 50.0), Size::new(1.0, 1.0));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&touching));
        assert!(!a.overlaps(&far));
    }

    #[test]
    fn test_bounds_contains() {
        let outer = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let inner = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        assert!(outer.contains_bounds(&inner));
        assert!(!inner.contains_bounds(&outer));
        assert!(outer.contains_point(Point::new(100.0, 0.0)));
        assert!(!outer.contains_point(Point::new(100.1, 0.0)));
    }

    #[test]
    fn test_bounds_add_padding() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(10.0, 10.0))
            .add_padding(Insets::uniform(5.0));
        assert_eq!(bounds.min_point(), Point::new(5.0, 5.0));
        assert_eq!(bounds.to_size(), Size::new(20.0, 20.0));
    }

    #[test]
    fn test_boundary_point_toward_axis_aligned() {
        let bounds = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(40.0, 20.0));

        let below = bounds.boundary_point_toward(Point::new(0.0, 100.0));
        assert_approx_eq!(f32, below.x(), 0.0);
        assert_approx_eq!(f32, below.y(), 10.0);

        let right = bounds.boundary_point_toward(Point::new(100.0, 0.0));
        assert_approx_eq!(f32, right.x(), 20.0);
        assert_approx_eq!(f32, right.y(), 0.0);
    }

    #[test]
    fn test_boundary_point_toward_diagonal_hits_shorter_side() {
        let bounds = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let corner_ray = bounds.boundary_point_toward(Point::new(100.0, 100.0));
        assert_approx_eq!(f32, corner_ray.x(), 10.0, epsilon = 0.001);
        assert_approx_eq!(f32, corner_ray.y(), 10.0, epsilon = 0.001);
    }

    #[test]
    fn test_boundary_point_toward_center_returns_center() {
        let bounds = Bounds::new_from_center(Point::new(3.0, 4.0), Size::new(10.0, 10.0));
        assert_eq!(bounds.boundary_point_toward(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_bounds_translate() {
        let bounds = Bounds::new_from_top_left(Point::new(1.0, 2.0), Size::new(3.0, 4.0))
            .translate(Point::new(10.0, 20.0));
        assert_eq!(bounds.min_point(), Point::new(11.0, 22.0));
        assert_eq!(bounds.max_point(), Point::new(14.0, 26.0));
    }
}
