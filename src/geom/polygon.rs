//! Planar polygon utilities used by room boundaries.
//!
//! Polygons are plain vertex slices. Room planes are assumed convex, but the
//! area, centroid and containment routines below work for any simple polygon.

use crate::{Point, Vector};

pub mod containment;

pub use containment::is_point_inside_polygon;

/// Newell's area vector: direction is the polygon normal (right-hand rule
/// on the vertex order), length equals twice the polygon area.
pub fn newell_vector(pts: &[Point]) -> Vector {
    let n = pts.len();
    let mut v = Vector::zero();
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        v.dx += (a.y - b.y) * (a.z + b.z);
        v.dy += (a.z - b.z) * (a.x + b.x);
        v.dz += (a.x - b.x) * (a.y + b.y);
    }
    v
}

/// Area of a planar polygon.
pub fn polygon_area(pts: &[Point]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    0.5 * newell_vector(pts).length()
}

/// Area-weighted centroid of a planar polygon (fan triangulation from the first vertex).
///
/// Fan triangles are weighted by their signed area along the polygon normal,
/// so triangles falling outside a concave polygon cancel out.
/// Falls back to the vertex average for degenerate polygons.
pub fn polygon_centroid(pts: &[Point]) -> Point {
    if pts.is_empty() {
        return Point::new(0., 0., 0.);
    }
    let vn = newell_vector(pts).normalize().unwrap_or(Vector::zero());
    let p0 = pts[0];
    let mut weighted = Vector::zero();
    let mut total = 0.0;
    for w in pts[1..].windows(2) {
        let (p1, p2) = (w[0], w[1]);
        let area = 0.5 * (p1 - p0).cross(&(p2 - p0)).dot(&vn);
        let c = Vector::new(
            (p0.x + p1.x + p2.x) / 3.,
            (p0.y + p1.y + p2.y) / 3.,
            (p0.z + p1.z + p2.z) / 3.,
        );
        weighted = weighted + c * area;
        total += area;
    }
    if total > 0.0 {
        Point::new(0., 0., 0.) + weighted * (1.0 / total)
    } else {
        let n = pts.len() as f64;
        let sum = pts
            .iter()
            .fold(Vector::zero(), |acc, p| acc + (*p - Point::new(0., 0., 0.)));
        Point::new(0., 0., 0.) + sum * (1.0 / n)
    }
}

/// Largest distance of any vertex from the plane through `pts[0]` with unit normal `vn`.
pub fn max_distance_from_plane(pts: &[Point], vn: &Vector) -> f64 {
    let Some(p0) = pts.first() else {
        return 0.0;
    };
    pts.iter()
        .map(|p| (*p - *p0).dot(vn).abs())
        .fold(0.0, f64::max)
}

/// Checks if any two non-adjacent edges of the polygon cross each other.
///
/// The test is done in the coordinate plane orthogonal to the dominant axis of `vn`.
pub fn is_self_intersecting(pts: &[Point], vn: &Vector) -> bool {
    let n = pts.len();
    if n < 4 {
        return false;
    }
    let (iu, iv) = match vn.dominant_axis() {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let proj = |p: &Point| (p.coord(iu), p.coord(iv));
    let orient = |a: (f64, f64), b: (f64, f64), c: (f64, f64)| {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    };

    for i in 0..n {
        let a1 = proj(&pts[i]);
        let a2 = proj(&pts[(i + 1) % n]);
        for j in (i + 2)..n {
            // First and last edge share a vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = proj(&pts[j]);
            let b2 = proj(&pts[(j + 1) % n]);
            let d1 = orient(b1, b2, a1);
            let d2 = orient(b1, b2, a2);
            let d3 = orient(a1, a2, b1);
            let d4 = orient(a1, a2, b2);
            if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_intersecting_bowtie() {
        let vn = Vector::new(0., 0., 1.);
        let bowtie = vec![
            Point::new(0., 0., 0.),
            Point::new(1., 1., 0.),
            Point::new(1., 0., 0.),
            Point::new(0., 1., 0.),
        ];
        assert!(is_self_intersecting(&bowtie, &vn));
        assert!(!is_self_intersecting(&square(1.0), &vn));
    }

    fn square(size: f64) -> Vec<Point> {
        vec![
            Point::new(0., 0., 0.),
            Point::new(size, 0., 0.),
            Point::new(size, size, 0.),
            Point::new(0., size, 0.),
        ]
    }

    #[test]
    fn test_area_square() {
        assert!((polygon_area(&square(2.0)) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_newell_direction_follows_winding() {
        let pts = square(1.0);
        let vn = newell_vector(&pts).normalize().unwrap();
        assert!(vn.is_close(&Vector::new(0., 0., 1.)));
        let rev: Vec<Point> = pts.iter().rev().copied().collect();
        let vn = newell_vector(&rev).normalize().unwrap();
        assert!(vn.is_close(&Vector::new(0., 0., -1.)));
    }

    #[test]
    fn test_centroid_square() {
        let c = polygon_centroid(&square(2.0));
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
        assert!(c.z.abs() < 1e-12);
    }

    #[test]
    fn test_centroid_concave() {
        // L-shape starting at a vertex whose first fan triangle lies outside
        let pts = vec![
            Point::new(2., 1., 0.),
            Point::new(1., 1., 0.),
            Point::new(1., 2., 0.),
            Point::new(0., 2., 0.),
            Point::new(0., 0., 0.),
            Point::new(2., 0., 0.),
        ];
        assert!((polygon_area(&pts) - 3.0).abs() < 1e-12);
        let rev: Vec<Point> = pts.iter().rev().copied().collect();
        for poly in [pts, rev] {
            let c = polygon_centroid(&poly);
            assert!((c.x - 5.0 / 6.0).abs() < 1e-12, "{c:?}");
            assert!((c.y - 5.0 / 6.0).abs() < 1e-12, "{c:?}");
        }
    }

    #[test]
    fn test_area_degenerate() {
        let pts = vec![Point::new(0., 0., 0.), Point::new(1., 0., 0.)];
        assert_eq!(polygon_area(&pts), 0.0);
        let collinear = vec![
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(2., 0., 0.),
        ];
        assert!(polygon_area(&collinear) < 1e-12);
    }

    #[test]
    fn test_max_distance_from_plane() {
        let mut pts = square(1.0);
        let vn = Vector::new(0., 0., 1.);
        assert!(max_distance_from_plane(&pts, &vn) < 1e-12);
        pts[2].z = 0.1;
        assert!((max_distance_from_plane(&pts, &vn) - 0.1).abs() < 1e-12);
    }
}
