use crate::error::{Error, Result};
use crate::{Point, Vector};

/// Capture-radius law of a spherical receiver.
///
/// Rays spread apart as they travel, so a fixed sphere catches fewer of them
/// late in the response. With growth enabled the radius increases linearly
/// from `init` at emission to `final_radius` at `horizon` and stays there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRadius {
    /// Radius at time zero [m].
    pub init: f64,
    /// Radius at the growth horizon [m].
    pub final_radius: f64,
    pub allow_growth: bool,
    /// Time at which the radius reaches `final_radius` [s].
    pub horizon: f64,
}

impl CaptureRadius {
    pub fn fixed(radius: f64) -> Self {
        Self {
            init: radius,
            final_radius: radius,
            allow_growth: false,
            horizon: 0.0,
        }
    }

    pub fn growing(init: f64, final_radius: f64, horizon: f64) -> Self {
        Self {
            init,
            final_radius,
            allow_growth: true,
            horizon,
        }
    }

    /// Radius of the capture sphere at time `t` [s].
    pub fn radius_at(&self, t: f64) -> f64 {
        if !self.allow_growth || self.horizon <= 0.0 {
            return self.init;
        }
        let frac = (t / self.horizon).clamp(0.0, 1.0);
        self.init + (self.final_radius - self.init) * frac
    }

    fn validate(&self) -> Result<()> {
        if !(self.init.is_finite() && self.init > 0.0) {
            return Err(Error::Config(format!(
                "receiver radius must be positive, got {}",
                self.init
            )));
        }
        if self.allow_growth {
            if !(self.final_radius.is_finite() && self.final_radius > 0.0) {
                return Err(Error::Config(format!(
                    "final receiver radius must be positive, got {}",
                    self.final_radius
                )));
            }
            if !(self.horizon.is_finite() && self.horizon >= 0.0) {
                return Err(Error::Config(format!(
                    "radius growth horizon must be non-negative, got {}",
                    self.horizon
                )));
            }
        }
        Ok(())
    }
}

/// A spherical receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    /// Center of the capture sphere.
    pub position: Point,
    /// Unit vector the receiver faces, or zero if it has no orientation.
    pub orientation: Vector,
    pub radius: CaptureRadius,
}

impl Receiver {
    pub fn new(position: Point, orientation: Vector, radius: CaptureRadius) -> Result<Self> {
        if !position.is_finite() {
            return Err(Error::Config(format!(
                "receiver position {position} is not finite"
            )));
        }
        if !orientation.is_finite() {
            return Err(Error::Config(format!(
                "receiver orientation {orientation} is not finite"
            )));
        }
        radius.validate()?;
        Ok(Self {
            position,
            orientation: orientation.normalize().unwrap_or(Vector::zero()),
            radius,
        })
    }

    pub fn radius_at(&self, t: f64) -> f64 {
        self.radius.radius_at(t)
    }

    /// Returns a copy of the receiver facing `target`.
    ///
    /// The orientation is left unchanged when `target` coincides with the position.
    pub fn point_to(&self, target: Point) -> Self {
        let orientation = (target - self.position)
            .normalize()
            .unwrap_or(self.orientation);
        Self {
            orientation,
            ..self.clone()
        }
    }

    /// Cosine between the direction a ray arrives from and the receiver orientation.
    ///
    /// `travel` is the ray's direction of travel. A ray coming straight at a
    /// receiver that faces it gives 1. Receivers without orientation report 1.
    pub fn arrival_cosine(&self, travel: Vector) -> f64 {
        match (self.orientation.normalize(), travel.normalize()) {
            (Some(o), Some(d)) => (-d).dot(&o).clamp(-1.0, 1.0),
            (None, _) => 1.0,
            (Some(_), None) => 0.0,
        }
    }
}
