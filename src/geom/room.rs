//! Room boundaries: planar polygons with acoustic coefficients and
//! room-level aggregates (total area, enclosed volume).

use crate::error::{Error, Result};
use crate::geom::PLANARITY_TOLERANCE;
use crate::geom::polygon::{
    is_self_intersecting, max_distance_from_plane, newell_vector, polygon_area, polygon_centroid,
};
use crate::{Point, Vector};

/// Planes with smaller area are treated as degenerate [m^2].
pub const MIN_PLANE_AREA: f64 = 1e-10;

/// Minimum |cos| between a declared normal and the vertex-winding normal.
const NORMAL_ALIGNMENT: f64 = 1.0 - 1e-6;

/// A planar boundary polygon of the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub name: String,
    pts: Vec<Point>,
    vn: Vector,
    absorption: Vec<f64>,
    scattering: Vec<f64>,
    area: f64,
    centroid: Point,
}

impl Plane {
    /// Creates a plane from its vertices.
    ///
    /// `normal` must point out of the room. If it is `None`, the normal is
    /// derived from the vertex order (counter-clockwise seen from outside).
    /// `absorption` and `scattering` hold one coefficient per frequency band.
    pub fn new(
        name: &str,
        pts: Vec<Point>,
        normal: Option<Vector>,
        absorption: Vec<f64>,
        scattering: Vec<f64>,
    ) -> Result<Self> {
        if pts.len() < 3 {
            return Err(Error::Geometry(format!(
                "plane '{name}' needs at least 3 vertices, got {}",
                pts.len()
            )));
        }
        if pts.iter().any(|p| !p.is_finite()) {
            return Err(Error::Geometry(format!(
                "plane '{name}' has non-finite vertex coordinates"
            )));
        }

        let area = polygon_area(&pts);
        if area < MIN_PLANE_AREA {
            return Err(Error::Geometry(format!(
                "plane '{name}' has zero area"
            )));
        }

        let winding_normal = newell_vector(&pts)
            .normalize()
            .ok_or_else(|| Error::Geometry(format!("plane '{name}' has no normal")))?;
        let vn = match normal {
            Some(n) => {
                let n = n.normalize().ok_or_else(|| {
                    Error::Geometry(format!("plane '{name}' has a zero-length normal"))
                })?;
                if n.dot(&winding_normal).abs() < NORMAL_ALIGNMENT {
                    return Err(Error::Geometry(format!(
                        "plane '{name}': normal {n:.3} is not orthogonal to its polygon"
                    )));
                }
                n
            }
            None => winding_normal,
        };

        let off_plane = max_distance_from_plane(&pts, &vn);
        if off_plane > PLANARITY_TOLERANCE {
            return Err(Error::Geometry(format!(
                "plane '{name}' is not planar (vertex {off_plane:.3e} m off the plane)"
            )));
        }
        if is_self_intersecting(&pts, &vn) {
            return Err(Error::Geometry(format!(
                "plane '{name}' is self-intersecting"
            )));
        }

        check_coefficients(name, "absorption", &absorption)?;
        check_coefficients(name, "scattering", &scattering)?;
        if absorption.len() != scattering.len() {
            return Err(Error::Config(format!(
                "plane '{name}': {} absorption bands but {} scattering bands",
                absorption.len(),
                scattering.len()
            )));
        }

        let centroid = polygon_centroid(&pts);
        Ok(Self {
            name: name.to_string(),
            pts,
            vn,
            absorption,
            scattering,
            area,
            centroid,
        })
    }

    /// Returns a copy of this plane with new absorption coefficients.
    pub fn with_absorption(&self, absorption: Vec<f64>) -> Result<Self> {
        check_coefficients(&self.name, "absorption", &absorption)?;
        if absorption.len() != self.absorption.len() {
            return Err(Error::Config(format!(
                "plane '{}': expected {} absorption bands, got {}",
                self.name,
                self.absorption.len(),
                absorption.len()
            )));
        }
        Ok(Self {
            absorption,
            ..self.clone()
        })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.pts
    }

    /// Unit normal pointing out of the room.
    pub fn normal(&self) -> Vector {
        self.vn
    }

    pub fn absorption(&self) -> &[f64] {
        &self.absorption
    }

    pub fn scattering(&self) -> &[f64] {
        &self.scattering
    }

    /// Scattering coefficient averaged over bands.
    pub fn mean_scattering(&self) -> f64 {
        if self.scattering.is_empty() {
            return 0.0;
        }
        self.scattering.iter().sum::<f64>() / self.scattering.len() as f64
    }

    /// Reflection coefficient per band: `1 - absorption`.
    pub fn reflection_coefficients(&self) -> Vec<f64> {
        self.absorption.iter().map(|a| 1.0 - a).collect()
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn num_bands(&self) -> usize {
        self.absorption.len()
    }
}

fn check_coefficients(name: &str, what: &str, values: &[f64]) -> Result<()> {
    if let Some(v) = values
        .iter()
        .find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0)
    {
        return Err(Error::Config(format!(
            "plane '{name}': {what} coefficient {v} outside [0, 1]"
        )));
    }
    Ok(())
}

/// Closed room made of planar boundaries with outward normals.
#[derive(Debug, Clone)]
pub struct RoomGeometry {
    planes: Vec<Plane>,
    total_area: f64,
    volume: f64,
}

impl RoomGeometry {
    /// Creates the room and computes its aggregates.
    ///
    /// The volume follows from the divergence theorem,
    /// `V = 1/3 * sum(A_i * n_i . c_i)`, which requires outward normals and
    /// a closed boundary. A non-positive volume is reported as a geometry error.
    pub fn new(planes: Vec<Plane>) -> Result<Self> {
        let Some(first) = planes.first() else {
            return Err(Error::Geometry("room has no planes".to_string()));
        };
        let num_bands = first.num_bands();
        if num_bands == 0 {
            return Err(Error::Config(
                "planes need at least one frequency band".to_string(),
            ));
        }
        if let Some(p) = planes.iter().find(|p| p.num_bands() != num_bands) {
            return Err(Error::Config(format!(
                "plane '{}' has {} bands, expected {num_bands}",
                p.name,
                p.num_bands()
            )));
        }

        let total_area: f64 = planes.iter().map(|p| p.area()).sum();
        let origin = Point::new(0., 0., 0.);
        let volume: f64 = planes
            .iter()
            .map(|p| p.area() * p.normal().dot(&(p.centroid() - origin)))
            .sum::<f64>()
            / 3.0;

        if !(volume > 0.0) {
            return Err(Error::Geometry(format!(
                "room volume must be positive (got {volume:.3e} m^3); \
                 check that the boundary is closed and normals point outward"
            )));
        }

        log::debug!(
            "Room geometry: {} planes, area = {total_area:.3} m^2, volume = {volume:.3} m^3",
            planes.len()
        );

        Ok(Self {
            planes,
            total_area,
            volume,
        })
    }

    /// Rectangular room spanning `(0,0,0)`-`(lx,ly,lz)` with identical coefficients on all six planes.
    pub fn shoebox(
        lx: f64,
        ly: f64,
        lz: f64,
        absorption: Vec<f64>,
        scattering: Vec<f64>,
    ) -> Result<Self> {
        let p = |x: f64, y: f64, z: f64| Point::new(x, y, z);
        let faces = [
            (
                "floor",
                vec![p(0., 0., 0.), p(0., ly, 0.), p(lx, ly, 0.), p(lx, 0., 0.)],
                Vector::new(0., 0., -1.),
            ),
            (
                "ceiling",
                vec![p(0., 0., lz), p(lx, 0., lz), p(lx, ly, lz), p(0., ly, lz)],
                Vector::new(0., 0., 1.),
            ),
            (
                "wall_y0",
                vec![p(0., 0., 0.), p(lx, 0., 0.), p(lx, 0., lz), p(0., 0., lz)],
                Vector::new(0., -1., 0.),
            ),
            (
                "wall_y1",
                vec![p(0., ly, 0.), p(0., ly, lz), p(lx, ly, lz), p(lx, ly, 0.)],
                Vector::new(0., 1., 0.),
            ),
            (
                "wall_x0",
                vec![p(0., 0., 0.), p(0., 0., lz), p(0., ly, lz), p(0., ly, 0.)],
                Vector::new(-1., 0., 0.),
            ),
            (
                "wall_x1",
                vec![p(lx, 0., 0.), p(lx, ly, 0.), p(lx, ly, lz), p(lx, 0., lz)],
                Vector::new(1., 0., 0.),
            ),
        ];
        let planes = faces
            .into_iter()
            .map(|(name, pts, vn)| {
                Plane::new(name, pts, Some(vn), absorption.clone(), scattering.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(planes)
    }

    /// Returns a copy of the room with new absorption coefficients, one row per plane.
    pub fn with_absorption(&self, absorption: &[Vec<f64>]) -> Result<Self> {
        if absorption.len() != self.planes.len() {
            return Err(Error::Config(format!(
                "expected absorption for {} planes, got {}",
                self.planes.len(),
                absorption.len()
            )));
        }
        let planes = self
            .planes
            .iter()
            .zip(absorption)
            .map(|(p, a)| p.with_absorption(a.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            planes,
            total_area: self.total_area,
            volume: self.volume,
        })
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn total_area(&self) -> f64 {
        self.total_area
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn num_bands(&self) -> usize {
        self.planes[0].num_bands()
    }

    /// Mean free path between reflections, `4V/S`.
    pub fn mean_free_path(&self) -> f64 {
        4.0 * self.volume / self.total_area
    }

    /// Upper bound on reflections per ray within `history_length` seconds.
    ///
    /// `ceil(1.5 * c0 * history_length * S / (4 V))`, at least 1.
    pub fn max_reflection_order(&self, c0: f64, history_length: f64) -> usize {
        let n = (1.5 * c0 * history_length / self.mean_free_path()).ceil();
        if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
    }
}
