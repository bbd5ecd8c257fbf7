use rand::Rng;

use crate::Vector;

/// Defines how rays reflect off surfaces.
///
/// Models draw random numbers from the caller's generator so that a ray
/// traced with a given seed always follows the same path.
pub trait ReflectionModel {
    /// Computes the reflected direction given incident direction and surface normal.
    fn reflect<R: Rng + ?Sized>(&self, incident: Vector, normal: Vector, rng: &mut R) -> Vector;
}

/// Perfect specular (mirror) reflection.
pub struct Specular;

impl Specular {
    pub fn mirror(incident: Vector, normal: Vector) -> Vector {
        let dot = incident.dot(&normal);
        incident - 2.0 * dot * normal
    }
}

impl ReflectionModel for Specular {
    fn reflect<R: Rng + ?Sized>(&self, incident: Vector, normal: Vector, _rng: &mut R) -> Vector {
        Self::mirror(incident, normal)
    }
}

/// Lambertian diffuse reflection (cosine-weighted hemisphere sampling via Malley's method).
pub struct Diffuse;

impl ReflectionModel for Diffuse {
    fn reflect<R: Rng + ?Sized>(&self, incident: Vector, normal: Vector, rng: &mut R) -> Vector {
        // The reflected ray stays on the incident side of the surface.
        // With outward normals this is the room interior.
        let n = if incident.dot(&normal) >= 0.0 {
            -normal
        } else {
            normal
        };

        // Orthonormal basis (tangent, bitangent) around the hemisphere normal.
        let arbitrary = if n.dx.abs() < 0.9 {
            Vector::new(1.0, 0.0, 0.0)
        } else {
            Vector::new(0.0, 1.0, 0.0)
        };
        let tangent = n
            .cross(&arbitrary)
            .normalize()
            .unwrap_or(Vector::new(1.0, 0.0, 0.0));
        let bitangent = n.cross(&tangent);

        // Uniform sample on the unit disk projected onto the hemisphere: pdf = cos(theta) / pi
        let u1: f64 = rng.r#gen();
        let u2: f64 = rng.r#gen();
        let r = u1.sqrt();
        let phi = 2.0 * std::f64::consts::PI * u2;
        let x = r * phi.cos();
        let y = r * phi.sin();
        let z = (1.0 - u1).sqrt();

        tangent * x + bitangent * y + n * z
    }
}

/// Hybrid reflection mixing specular and diffuse based on a scattering coefficient.
pub struct Hybrid {
    /// Scattering coefficient [0, 1]: 0 = pure specular, 1 = pure diffuse.
    pub scattering: f64,
}

impl Hybrid {
    pub fn new(scattering: f64) -> Self {
        Self {
            scattering: scattering.clamp(0.0, 1.0),
        }
    }
}

impl ReflectionModel for Hybrid {
    fn reflect<R: Rng + ?Sized>(&self, incident: Vector, normal: Vector, rng: &mut R) -> Vector {
        let r: f64 = rng.r#gen();
        if r < self.scattering {
            Diffuse.reflect(incident, normal, rng)
        } else {
            Specular::mirror(incident, normal)
        }
    }
}
