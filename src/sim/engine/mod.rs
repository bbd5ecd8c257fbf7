pub mod absorption;
pub mod reflection;

use crate::geom::T_MIN;
use crate::geom::ray::Ray;
use crate::geom::room::RoomGeometry;
use crate::{Point, Vector};

/// Hits closer together than this are treated as one edge or corner hit [m].
pub const COINCIDENT_HIT_TOLERANCE: f64 = 1e-9;

/// Plane hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Index of the plane in the room geometry.
    pub plane: usize,
    /// Distance from the ray origin [m].
    pub distance: f64,
    /// Reflection point.
    pub point: Point,
}

/// Read-only view of the room used by the tracer and the direct-sound pass.
///
/// Rooms have tens of planes, so the search is a linear scan over all of them.
pub struct FlatScene<'a> {
    room: &'a RoomGeometry,
}

impl<'a> FlatScene<'a> {
    pub fn new(room: &'a RoomGeometry) -> Self {
        Self { room }
    }

    pub fn room(&self) -> &RoomGeometry {
        self.room
    }

    /// Finds the closest planes in the ray's direction.
    ///
    /// Planes in `skip` were just left by the ray and are never reported
    /// again. A ray meeting an edge or a corner hits several planes at the
    /// same distance; all of them are returned, nearest first.
    pub fn find_target_surfaces(&self, ray: &Ray, skip: &[usize]) -> Vec<SurfaceHit> {
        let mut hits: Vec<SurfaceHit> = self
            .room
            .planes()
            .iter()
            .enumerate()
            .filter(|(idx, _)| !skip.contains(idx))
            .filter_map(|(idx, plane)| {
                ray.intersect_polygon(plane.vertices(), &plane.normal())
                    .map(|(distance, point)| SurfaceHit {
                        plane: idx,
                        distance,
                        point,
                    })
            })
            .collect();

        let Some(nearest) = hits.iter().map(|h| h.distance).min_by(f64::total_cmp) else {
            return hits;
        };
        hits.retain(|h| h.distance - nearest <= COINCIDENT_HIT_TOLERANCE);
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.plane.cmp(&b.plane))
        });
        hits
    }

    /// Checks whether any plane crosses the open segment between `from` and `to`.
    ///
    /// Intersections closer than `T_MIN` to either endpoint do not count, so
    /// points lying on a boundary still see each other along the wall.
    pub fn is_segment_blocked(&self, from: Point, to: Point) -> bool {
        let length = from.distance(&to);
        let Some(ray) = Ray::from_points(from, to) else {
            return false;
        };
        self.room.planes().iter().any(|plane| {
            ray.intersect_polygon(plane.vertices(), &plane.normal())
                .is_some_and(|(t, _)| t < length - T_MIN)
        })
    }
}

/// Generate a random unit vector uniformly distributed on the sphere.
pub(crate) fn random_unit_vector(rng: &mut impl rand::Rng) -> Vector {
    loop {
        let x: f64 = rng.gen_range(-1.0..1.0);
        let y: f64 = rng.gen_range(-1.0..1.0);
        let z: f64 = rng.gen_range(-1.0..1.0);
        let len2 = x * x + y * y + z * z;
        if len2 > 1e-6 && len2 <= 1.0 {
            let len = len2.sqrt();
            return Vector::new(x / len, y / len, z / len);
        }
    }
}
