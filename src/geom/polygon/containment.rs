use crate::Point;
use crate::Vector;
use crate::geom::PLANARITY_TOLERANCE;

/// Distance below which a point is considered to lie on a polygon edge [m].
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Checks if a point lies inside a planar polygon.
///
/// The polygon is defined by its vertices `pts` and unit normal `vn`.
/// If `boundary_in` is true, points on the boundary (edges or vertices) are considered inside.
///
/// The test point must lie on the polygon's plane (within `PLANARITY_TOLERANCE`).
/// Both the point and the polygon are projected onto the coordinate plane
/// orthogonal to the dominant axis of `vn`, and the winding number of the
/// polygon around the projected point decides containment.
pub fn is_point_inside_polygon(ptest: Point, pts: &[Point], vn: &Vector, boundary_in: bool) -> bool {
    if pts.len() < 3 {
        return false;
    }
    if !is_point_on_plane(ptest, pts, vn) {
        return false;
    }
    if is_point_on_boundary(ptest, pts) {
        return boundary_in;
    }
    winding_number(ptest, pts, vn) != 0
}

/// Winding number of the polygon around the projection of `ptest`.
///
/// Non-zero means inside. Uses the crossing rule from Sunday (2001), which
/// handles either vertex orientation.
pub fn winding_number(ptest: Point, pts: &[Point], vn: &Vector) -> i32 {
    let drop = vn.dominant_axis();
    let (iu, iv) = match drop {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let (pu, pv) = (ptest.coord(iu), ptest.coord(iv));

    let n = pts.len();
    let mut wn = 0;
    for i in 0..n {
        let (au, av) = (pts[i].coord(iu), pts[i].coord(iv));
        let b = pts[(i + 1) % n];
        let (bu, bv) = (b.coord(iu), b.coord(iv));
        let is_left = (bu - au) * (pv - av) - (pu - au) * (bv - av);
        if av <= pv {
            if bv > pv && is_left > 0.0 {
                wn += 1;
            }
        } else if bv <= pv && is_left < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Checks if a point lies on the plane defined by the polygon.
fn is_point_on_plane(ptest: Point, pts: &[Point], vn: &Vector) -> bool {
    (ptest - pts[0]).dot(vn).abs() <= PLANARITY_TOLERANCE
}

/// Checks if a point lies on the boundary of the polygon (vertices or edges).
fn is_point_on_boundary(ptest: Point, pts: &[Point]) -> bool {
    let n = pts.len();
    (0..n).any(|i| distance_to_segment(ptest, pts[i], pts[(i + 1) % n]) <= BOUNDARY_TOLERANCE)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(&ab);
    if len2 == 0.0 {
        return p.distance(&a);
    }
    let s = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    p.distance(&(a + ab * s))
}
