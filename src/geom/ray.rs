//! Ray casting infrastructure.
//!
//! A ray is an origin with a unit direction. It can be intersected with
//! finite planar polygons and measured against spheres.

use crate::geom::T_MIN;
use crate::geom::polygon::is_point_inside_polygon;
use crate::{Point, Vector};

/// Below this |cos| between ray direction and plane normal the ray is treated as parallel.
pub const PARALLEL_EPS: f64 = 1e-12;

/// A ray defined by an origin point and a unit direction vector.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Point,
    /// Unit direction vector
    pub direction: Vector,
}

/// Closest approach between a ray segment and a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    /// Distance along the segment to the closest point [m], in `[0, length]`.
    pub along: f64,
    /// Distance from the closest point to the target [m].
    pub distance: f64,
}

impl Ray {
    /// Creates a new ray from origin point and direction vector.
    ///
    /// The direction vector is automatically normalized.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let direction = direction.normalize()?;
        if !origin.is_finite() {
            return None;
        }
        Some(Self { origin, direction })
    }

    /// Creates a ray from two points (origin to target).
    pub fn from_points(origin: Point, target: Point) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    /// Returns the point along the ray at parameter t.
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Calculates the intersection of this ray with a finite planar polygon.
    ///
    /// Returns `Some((t, point))` with `t > T_MIN`. Points on the polygon
    /// boundary count as hits. Rays parallel to the plane never hit it.
    pub fn intersect_polygon(&self, pts: &[Point], normal: &Vector) -> Option<(f64, Point)> {
        let p0 = *pts.first()?;
        let denom = normal.dot(&self.direction);
        if denom.abs() < PARALLEL_EPS {
            return None;
        }
        let t = (p0 - self.origin).dot(normal) / denom;
        if !t.is_finite() || t <= T_MIN {
            return None;
        }
        let hit = self.point_at(t);
        if is_point_inside_polygon(hit, pts, normal, true) {
            Some((t, hit))
        } else {
            None
        }
    }

    /// Closest approach of the segment `[0, length]` of this ray to `target`.
    pub fn closest_approach(&self, length: f64, target: Point) -> Approach {
        let along = (target - self.origin)
            .dot(&self.direction)
            .clamp(0.0, length.max(0.0));
        let distance = self.point_at(along).distance(&target);
        Approach { along, distance }
    }
}
