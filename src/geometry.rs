//! Integer pixel-space geometry for slot and area polygons.
//!
//! All containment arithmetic is exact (`i64`), so a point that lies on a
//! polygon edge is reported inside regardless of the edge's slope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::OccupancyError;

/// A pixel coordinate. Serialized as an `[x, y]` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What a polygon is used for. Carried in errors so a bad layout entry can be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolygonRole {
    /// 1-based slot index.
    Slot(usize),
    MonitoredArea,
}

impl fmt::Display for PolygonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolygonRole::Slot(index) => write!(f, "slot {}", index),
            PolygonRole::MonitoredArea => f.write_str("monitored area"),
        }
    }
}

/// Closed polygon; the last vertex connects back to the first.
///
/// Construction does not validate. Anything that tests containment or fills a
/// mask calls [`Polygon::ensure_valid`] first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub const MIN_POINTS: usize = 3;

    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn from_pairs(pairs: &[(i32, i32)]) -> Self {
        Self::new(pairs.iter().copied().map(Point::from).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= Self::MIN_POINTS
    }

    pub fn ensure_valid(&self, role: PolygonRole) -> Result<(), OccupancyError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(OccupancyError::InvalidPolygon {
                role,
                points: self.points.len(),
            })
        }
    }

    /// Iterate edges as `(from, to)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[(i + n - 1) % n], self.points[i]))
    }

    /// Point-in-polygon test. Points on an edge or vertex count as inside.
    ///
    /// Uses even-odd ray casting with a half-open crossing rule; the boundary
    /// check runs first so the crossing rule never decides edge points.
    /// Returns `false` for polygons with fewer than 3 points.
    pub fn contains(&self, p: Point) -> bool {
        if !self.is_valid() {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment(a, b, p) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                // Compare p.x with the edge's x at row p.y without dividing.
                // Differences span 33 bits, so products need i128.
                let dy = i128::from(b.y) - i128::from(a.y);
                let lhs = (i128::from(p.x) - i128::from(a.x)) * dy;
                let rhs = (i128::from(p.y) - i128::from(a.y)) * (i128::from(b.x) - i128::from(a.x));
                let left_of_edge = if dy > 0 { lhs < rhs } else { lhs > rhs };
                if left_of_edge {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Area centroid from the polygon's spatial moments (`m10/m00`, `m01/m00`),
    /// truncated toward zero. `None` when the enclosed area is zero.
    pub fn centroid(&self) -> Option<Point> {
        if !self.is_valid() {
            return None;
        }
        // Twice the signed area and the matching first-moment sums, exact for
        // any i32 coordinates.
        let mut a00: i128 = 0;
        let mut a10: i128 = 0;
        let mut a01: i128 = 0;
        for (p0, p1) in self.edges() {
            let (x0, y0) = (i128::from(p0.x), i128::from(p0.y));
            let (x1, y1) = (i128::from(p1.x), i128::from(p1.y));
            let cross = x0 * y1 - x1 * y0;
            a00 += cross;
            a10 += cross * (x0 + x1);
            a01 += cross * (y0 + y1);
        }
        if a00 == 0 {
            return None;
        }
        // m00 = a00 / 2, m10 = a10 / 6, m01 = a01 / 6. Integer division
        // truncates toward zero.
        let denom = 3 * a00;
        let cx = i32::try_from(a10 / denom).ok()?;
        let cy = i32::try_from(a01 / denom).ok()?;
        Some(Point::new(cx, cy))
    }

    /// Marker position for rendering: the centroid, or the first vertex when
    /// the polygon encloses no area.
    pub fn reference_point(&self) -> Option<Point> {
        self.centroid().or_else(|| self.points.first().copied())
    }

    /// Inclusive bounding box as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), p| {
                (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                )
            });
        Some((min, max))
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let (ax, ay) = (i128::from(a.x), i128::from(a.y));
    let (bx, by) = (i128::from(b.x), i128::from(b.y));
    let (px, py) = (i128::from(p.x), i128::from(p.y));
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0 && px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10), (0, 10)])
    }

    #[test]
    fn square_contains_interior_and_boundary() {
        let sq = square();
        assert!(sq.contains(Point::new(5, 5)));
        assert!(sq.contains(Point::new(0, 0)));
        assert!(sq.contains(Point::new(10, 5)));
        assert!(sq.contains(Point::new(5, 10)));
        assert!(!sq.contains(Point::new(11, 5)));
        assert!(!sq.contains(Point::new(-1, -1)));
        assert!(!sq.contains(Point::new(25, 25)));
    }

    #[test]
    fn slanted_edge_points_are_inside() {
        let tri = Polygon::from_pairs(&[(0, 0), (10, 0), (0, 10)]);
        // On the hypotenuse.
        assert!(tri.contains(Point::new(5, 5)));
        assert!(tri.contains(Point::new(3, 7)));
        assert!(!tri.contains(Point::new(6, 5)));
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape opening upwards.
        let u = Polygon::from_pairs(&[(0, 0), (9, 0), (9, 9), (6, 9), (6, 3), (3, 3), (3, 9), (0, 9)]);
        assert!(u.contains(Point::new(1, 8)));
        assert!(u.contains(Point::new(7, 8)));
        assert!(!u.contains(Point::new(4, 6)));
        assert!(u.contains(Point::new(4, 3)));
    }

    #[test]
    fn degenerate_polygons_contain_nothing() {
        let line = Polygon::from_pairs(&[(0, 0), (5, 5)]);
        assert!(!line.contains(Point::new(0, 0)));
        assert!(!Polygon::default().contains(Point::new(0, 0)));
    }

    #[test]
    fn centroid_of_square_and_orientation_independence() {
        assert_eq!(square().centroid(), Some(Point::new(5, 5)));
        let clockwise = Polygon::from_pairs(&[(0, 10), (10, 10), (10, 0), (0, 0)]);
        assert_eq!(clockwise.centroid(), Some(Point::new(5, 5)));
    }

    #[test]
    fn multi_million_pixel_slot_has_exact_centroid() {
        let big = Polygon::from_pairs(&[
            (0, 0),
            (3_000_000, 0),
            (3_000_000, 3_000_000),
            (0, 3_000_000),
        ]);
        assert_eq!(big.centroid(), Some(Point::new(1_500_000, 1_500_000)));
        assert!(big.contains(Point::new(15, 15)));

        let full = Polygon::from_pairs(&[
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN),
            (i32::MAX, i32::MAX),
            (i32::MIN, i32::MAX),
        ]);
        assert_eq!(full.centroid(), Some(Point::new(0, 0)));
    }

    #[test]
    fn containment_near_i32_limits() {
        let tri = Polygon::from_pairs(&[
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN + 1),
            (0, i32::MAX),
        ]);
        assert!(tri.contains(Point::new(0, 0)));
        assert!(tri.contains(Point::new(i32::MIN, i32::MIN)));
        assert!(tri.contains(Point::new(0, i32::MAX)));
        assert!(!tri.contains(Point::new(i32::MAX, 0)));
        assert!(!tri.contains(Point::new(i32::MIN, i32::MAX)));
    }

    #[test]
    fn centroid_truncates_toward_zero() {
        let tri = Polygon::from_pairs(&[(0, 0), (10, 0), (0, 10)]);
        // Exact centroid is (3.33, 3.33).
        assert_eq!(tri.centroid(), Some(Point::new(3, 3)));
    }

    #[test]
    fn collinear_polygon_falls_back_to_first_vertex() {
        let flat = Polygon::from_pairs(&[(2, 2), (4, 4), (6, 6)]);
        assert_eq!(flat.centroid(), None);
        assert_eq!(flat.reference_point(), Some(Point::new(2, 2)));
    }

    #[test]
    fn ensure_valid_reports_role_and_count() {
        let err = Polygon::from_pairs(&[(1, 1), (2, 2)])
            .ensure_valid(PolygonRole::Slot(4))
            .unwrap_err();
        assert_eq!(
            err,
            OccupancyError::InvalidPolygon {
                role: PolygonRole::Slot(4),
                points: 2
            }
        );
        assert!(err.to_string().contains("slot 4"));
    }

    #[test]
    fn points_serialize_as_pairs() {
        let poly = Polygon::from_pairs(&[(1, 2), (3, 4), (5, 6)]);
        let json = serde_json::to_string(&poly).unwrap();
        assert_eq!(json, "[[1,2],[3,4],[5,6]]");
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let poly = Polygon::from_pairs(&[(4, 357), (76, 198), (564, 210), (637, 296)]);
        assert_eq!(
            poly.bounds(),
            Some((Point::new(4, 198), Point::new(637, 357)))
        );
    }
}
