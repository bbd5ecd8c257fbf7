use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::Vector;
use crate::error::{Error, Result};
use crate::sim::engine::random_unit_vector;

/// Initial ray directions shared by all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct RayDirections {
    dirs: Vec<Vector>,
}

impl RayDirections {
    /// A single ray along `direction`.
    pub fn single(direction: Vector) -> Result<Self> {
        let dir = direction.normalize().ok_or_else(|| {
            Error::Config(format!("ray direction {direction} cannot be normalized"))
        })?;
        Ok(Self { dirs: vec![dir] })
    }

    /// `n` directions drawn uniformly from the unit sphere.
    pub fn random(n: usize, seed: u64) -> Result<Self> {
        check_count(n)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let dirs = (0..n).map(|_| random_unit_vector(&mut rng)).collect();
        Ok(Self { dirs })
    }

    /// Exactly `n` near-uniform directions on a golden-angle (Fibonacci) spiral.
    ///
    /// Direction `i` sits at height `z = 1 - (2i + 1) / n` and azimuth
    /// `i * golden_angle`, so every band of equal height holds the same
    /// number of rays.
    pub fn isotropic(n: usize) -> Result<Self> {
        check_count(n)?;
        let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        let dirs = (0..n)
            .map(|i| {
                let z = 1.0 - (2.0 * i as f64 + 1.0) / n as f64;
                let r = (1.0 - z * z).max(0.0).sqrt();
                let phi = golden_angle * i as f64;
                Vector::new(r * phi.cos(), r * phi.sin(), z)
            })
            .collect();
        Ok(Self { dirs })
    }

    /// Uses caller-supplied directions, normalizing each one.
    pub fn from_vectors(vectors: &[Vector]) -> Result<Self> {
        check_count(vectors.len())?;
        let dirs = vectors
            .iter()
            .map(|v| {
                v.normalize()
                    .ok_or_else(|| Error::Config(format!("ray direction {v} cannot be normalized")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dirs })
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn as_slice(&self) -> &[Vector] {
        &self.dirs
    }
}

fn check_count(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::Config("number of rays must be positive".to_string()));
    }
    Ok(())
}
