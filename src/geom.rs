//! Geometry kernel for room-scale lighting.
//!
//! Points are metres in a right-handed frame with `z` pointing up and the
//! floor at [`crate::config::FLOOR_Z`]. Everything here is cheap and pure;
//! degenerate inputs produce `None` or zero instead of errors.

use geo::ConvexHull;
use geo_types::{Coord, MultiPoint};
use itertools::Itertools;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};


/// A point in room coordinates (metres).
pub type Point = Point3<f32>;
/// A direction or displacement in room coordinates.
pub type Vector = Vector3<f32>;

/// Euclidean distance between two points.
pub fn distance_3d(a: &Point, b: &Point) -> f32 {
    nalgebra::distance(a, b)
}

/// Distance between the plan (xy) projections of two points.
pub fn distance_2d(a: &Point, b: &Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Unsigned area of a polygon by the shoelace formula.
/// The points are taken in the order given; fewer than three gives zero.
pub fn polygon_area(points: &[Coord<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_signed: f32 = points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice_signed.abs() / 2.0
}

/// Area enclosed by an unordered point cloud, taken as its convex hull.
pub fn hull_area(points: &[Coord<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let hull = MultiPoint::from(points.to_vec()).convex_hull();
    polygon_area(&hull.exterior().0)
}

/// Perpendicular distance from `point` to the line through `start` and `end`,
/// measured in the xy plane. Falls back to the point distance when the line
/// has no length.
pub fn point_to_line_distance_2d(start: &Point, end: &Point, point: &Point) -> f32 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length < f32::EPSILON {
        return distance_2d(start, point);
    }
    ((point.x - start.x) * dy - (point.y - start.y) * dx).abs() / length
}

/// Approximate occlusion test: the obstacle blocks the segment when its
/// height lies strictly between the segment's end heights and it sits
/// within `radius` of the segment's plan projection.
pub fn line_intersects_obstacle(start: &Point, end: &Point, obstacle: &Point, radius: f32) -> bool {
    let (low, high) = if start.z < end.z {
        (start.z, end.z)
    } else {
        (end.z, start.z)
    };
    if obstacle.z <= low || obstacle.z >= high {
        return false;
    }
    point_to_line_distance_2d(start, end, obstacle) < radius
}

/// Intersects the ray `origin + t·direction` with the horizontal plane at
/// `floor_z`. Returns `None` for rays that do not point downward or whose
/// intersection lies behind the origin.
pub fn project_ray_to_floor(origin: &Point, direction: &Vector, floor_z: f32) -> Option<Point> {
    if direction.z >= 0.0 {
        return None;
    }
    let t = (floor_z - origin.z) / direction.z;
    if t < 0.0 {
        return None;
    }
    Some(Point3::new(
        origin.x + t * direction.x,
        origin.y + t * direction.y,
        floor_z,
    ))
}

/// Lambert cosine for a horizontal receiving surface, `|Δz| / d`.
pub fn horizontal_cosine(from: &Point, to: &Point) -> f32 {
    let d = distance_3d(from, to);
    if d < f32::EPSILON {
        return 0.0;
    }
    (to.z - from.z).abs() / d
}

/// Plan projection of a point as a `geo` coordinate.
pub fn plan_coord(point: &Point) -> Coord<f32> {
    Coord {
        x: point.x,
        y: point.y,
    }
}

/// Centroid of a set of points, `None` when empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, point| acc + point.coords);
    Some(Point3::from(sum / points.len() as f32))
}

/// Axis-aligned plan bounds of a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

impl Bounds {
    pub fn new(min: Point2<f32>, max: Point2<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest bounds holding the plan projection of every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(Point2::new(p.x, p.y), Point2::new(p.x, p.y)),
                Some(b) => Self::new(
                    Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                ),
            })
        })
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn length(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.length()
    }

    pub fn center(&self) -> Point2<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Clamps the plan position of `point` into the bounds shrunk by `margin`.
    /// Axes narrower than twice the margin collapse onto the centre line.
    pub fn clamp(&self, point: &Point, margin: f32) -> Point {
        let center = self.center();
        let clamp_axis = |value: f32, low: f32, high: f32, mid: f32| {
            if high - low <= 2.0 * margin {
                mid
            } else {
                value.clamp(low + margin, high - margin)
            }
        };
        Point3::new(
            clamp_axis(point.x, self.min.x, self.max.x, center.x),
            clamp_axis(point.y, self.min.y, self.max.y, center.y),
            point.z,
        )
    }
}
