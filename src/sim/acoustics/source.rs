use crate::error::{Error, Result};
use crate::{Point, Vector};

/// Reference sound power [W].
pub const REFERENCE_POWER: f64 = 1e-12;

/// Omnidirectional point source.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub position: Point,
    pub orientation: Vector,
    /// Sound power level per band [dB re 1 pW].
    pub power_db: Vec<f64>,
    /// Equalization per band [dB].
    pub eq_db: Vec<f64>,
    /// Sound power per band [W].
    pub power_lin: Vec<f64>,
    /// Emission delay [s]. Arrival times are measured from emission,
    /// downstream processing shifts them by this delay.
    pub delay: f64,
}

impl Source {
    pub fn new(
        position: Point,
        orientation: Vector,
        power_db: Vec<f64>,
        eq_db: Vec<f64>,
        delay: f64,
    ) -> Result<Self> {
        if !position.is_finite() {
            return Err(Error::Config(format!(
                "source position {position} is not finite"
            )));
        }
        if power_db.is_empty() {
            return Err(Error::Config("source needs at least one power band".to_string()));
        }
        if eq_db.len() != power_db.len() {
            return Err(Error::Config(format!(
                "source has {} power bands but {} equalization bands",
                power_db.len(),
                eq_db.len()
            )));
        }
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(Error::Config(format!(
                "source delay must be non-negative, got {delay}"
            )));
        }

        let power_lin = power_db
            .iter()
            .zip(&eq_db)
            .map(|(p, eq)| db_to_watts(p + eq))
            .collect::<Vec<_>>();
        if power_lin.iter().any(|w| !w.is_finite()) {
            return Err(Error::Config(format!(
                "source power {power_db:?} dB is out of range"
            )));
        }

        Ok(Self {
            position,
            orientation: orientation.normalize().unwrap_or(Vector::zero()),
            power_db,
            eq_db,
            power_lin,
            delay,
        })
    }

    /// Source with a flat power spectrum and no equalization.
    pub fn omni(position: Point, power_db: f64, num_bands: usize) -> Result<Self> {
        Self::new(
            position,
            Vector::zero(),
            vec![power_db; num_bands],
            vec![0.0; num_bands],
            0.0,
        )
    }

    pub fn num_bands(&self) -> usize {
        self.power_lin.len()
    }
}

/// Converts a sound power level [dB re 1 pW] to watts.
pub fn db_to_watts(level: f64) -> f64 {
    REFERENCE_POWER * 10f64.powf(level / 10.0)
}
