use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::room::{Plane, RoomGeometry};
use crate::sim::acoustics::receiver::{CaptureRadius, Receiver};
use crate::sim::acoustics::source::Source;
use crate::sim::air::AirProperties;
use crate::sim::rays::directions::RayDirections;
use crate::{Point, Vector};

/// Octave band centre frequencies [Hz].
pub const OCTAVE_BAND_FREQUENCIES: [f64; 6] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];

/// How initial ray directions are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayMode {
    /// Golden-angle spiral, exactly `n_rays` directions.
    Isotropic,
    /// `n_rays` uniformly random directions drawn with `seed`.
    Random,
    /// One ray in the given direction. `n_rays` is ignored.
    Single { direction: [f64; 3] },
}

/// Algorithm controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmControls {
    /// Band centre frequencies [Hz].
    pub freq: Vec<f64>,
    pub n_rays: usize,
    pub ray_mode: RayMode,
    /// Length of the simulated response [s].
    pub ht_length: f64,
    /// Time-bin width of the reflectogram built downstream [s].
    pub dt: f64,
    pub allow_scattering: bool,
    /// Reflection order from which scattering is applied.
    pub transition_order: usize,
    /// Receiver radius at time zero [m].
    pub rec_radius_init: f64,
    pub allow_growth: bool,
    /// Receiver radius at `ht_length` when growth is enabled [m].
    pub rec_radius_final: f64,
    pub seed: u64,
}

impl AlgorithmControls {
    pub fn new() -> Self {
        Self {
            freq: OCTAVE_BAND_FREQUENCIES.to_vec(),
            n_rays: 1000,
            ray_mode: RayMode::Isotropic,
            ht_length: 1.0,
            dt: 1e-3,
            allow_scattering: true,
            transition_order: 1,
            rec_radius_init: 0.1,
            allow_growth: true,
            rec_radius_final: 1.0,
            seed: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.freq.is_empty() {
            return Err(Error::Config("at least one frequency band is required".to_string()));
        }
        if let Some(f) = self.freq.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(Error::Config(format!("invalid band frequency {f} Hz")));
        }
        if self.n_rays == 0 && !matches!(self.ray_mode, RayMode::Single { .. }) {
            return Err(Error::Config("n_rays must be positive".to_string()));
        }
        if !(self.ht_length.is_finite() && self.ht_length > 0.0) {
            return Err(Error::Config(format!(
                "ht_length must be positive, got {}",
                self.ht_length
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::Config(format!("dt must be positive, got {}", self.dt)));
        }
        Ok(())
    }

    /// Capture-radius law shared by all receivers.
    pub fn capture_radius(&self) -> CaptureRadius {
        if self.allow_growth {
            CaptureRadius::growing(self.rec_radius_init, self.rec_radius_final, self.ht_length)
        } else {
            CaptureRadius::fixed(self.rec_radius_init)
        }
    }

    pub fn directions(&self) -> Result<RayDirections> {
        match &self.ray_mode {
            RayMode::Isotropic => RayDirections::isotropic(self.n_rays),
            RayMode::Random => RayDirections::random(self.n_rays, self.seed),
            RayMode::Single { direction } => RayDirections::single(Vector::from(*direction)),
        }
    }
}

impl Default for AlgorithmControls {
    fn default() -> Self {
        Self::new()
    }
}

/// Air given either by ambient conditions or by its derived properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AirConfig {
    Conditions {
        /// [°C]
        temperature: f64,
        /// Relative humidity [%]
        hr: f64,
        /// [Pa]
        p_atm: f64,
    },
    Explicit {
        c0: f64,
        rho0: f64,
        /// Attenuation per band [1/m]
        m: Vec<f64>,
    },
}

impl AirConfig {
    pub fn properties(&self, freqs: &[f64]) -> Result<AirProperties> {
        match self {
            Self::Conditions {
                temperature,
                hr,
                p_atm,
            } => AirProperties::from_conditions(*temperature, *hr, *p_atm, freqs),
            Self::Explicit { c0, rho0, m } => AirProperties::new(*c0, *rho0, m.clone()),
        }
    }
}

impl Default for AirConfig {
    fn default() -> Self {
        Self::Conditions {
            temperature: 20.0,
            hr: 50.0,
            p_atm: 101_325.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneConfig {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    /// Outward normal. Derived from the vertex order when missing.
    #[serde(default)]
    pub normal: Option<[f64; 3]>,
    /// Absorption per band.
    pub alpha: Vec<f64>,
    /// Scattering per band.
    pub s: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub planes: Vec<PlaneConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub coord: [f64; 3],
    #[serde(default)]
    pub orientation: [f64; 3],
    #[serde(rename = "power_dB")]
    pub power_db: Vec<f64>,
    /// Equalization per band [dB]. Zero when missing.
    #[serde(rename = "eq_dB", default)]
    pub eq_db: Vec<f64>,
    /// Emission delay [ms].
    #[serde(default)]
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    pub coord: [f64; 3],
    #[serde(default)]
    pub orientation: [f64; 3],
    /// Index of a source the receiver should face. Overrides `orientation`.
    #[serde(default)]
    pub point_to_source: Option<usize>,
}

/// Complete simulation setup, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub controls: AlgorithmControls,
    pub air: AirConfig,
    pub geometry: GeometryConfig,
    pub sources: Vec<SourceConfig>,
    pub receivers: Vec<ReceiverConfig>,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn num_bands(&self) -> usize {
        self.controls.freq.len()
    }

    /// Validates everything that does not need geometry construction.
    pub fn validate(&self) -> Result<()> {
        self.controls.validate()?;
        if self.geometry.planes.is_empty() {
            return Err(Error::Config("geometry has no planes".to_string()));
        }
        if self.sources.is_empty() {
            return Err(Error::Config("at least one source is required".to_string()));
        }
        if self.receivers.is_empty() {
            return Err(Error::Config("at least one receiver is required".to_string()));
        }
        let nb = self.num_bands();
        for plane in &self.geometry.planes {
            if plane.alpha.len() != nb || plane.s.len() != nb {
                return Err(Error::Config(format!(
                    "plane '{}' needs {nb} absorption and scattering values, got {} and {}",
                    plane.name,
                    plane.alpha.len(),
                    plane.s.len()
                )));
            }
        }
        for (i, src) in self.sources.iter().enumerate() {
            if src.power_db.len() != nb {
                return Err(Error::Config(format!(
                    "source {i} needs {nb} power bands, got {}",
                    src.power_db.len()
                )));
            }
            if !src.eq_db.is_empty() && src.eq_db.len() != nb {
                return Err(Error::Config(format!(
                    "source {i} needs {nb} equalization bands, got {}",
                    src.eq_db.len()
                )));
            }
        }
        for (i, rec) in self.receivers.iter().enumerate() {
            if let Some(s) = rec.point_to_source
                && s >= self.sources.len()
            {
                return Err(Error::Config(format!(
                    "receiver {i} points to missing source {s}"
                )));
            }
        }
        if let AirConfig::Explicit { m, .. } = &self.air
            && m.len() != nb
        {
            return Err(Error::Config(format!(
                "air absorption needs {nb} bands, got {}",
                m.len()
            )));
        }
        Ok(())
    }

    pub fn build_geometry(&self) -> Result<RoomGeometry> {
        let planes = self
            .geometry
            .planes
            .iter()
            .map(|p| {
                Plane::new(
                    &p.name,
                    p.vertices.iter().map(|v| Point::from(*v)).collect(),
                    p.normal.map(Vector::from),
                    p.alpha.clone(),
                    p.s.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        RoomGeometry::new(planes)
    }

    pub fn build_air(&self) -> Result<AirProperties> {
        self.air.properties(&self.controls.freq)
    }

    pub fn build_sources(&self) -> Result<Vec<Source>> {
        let nb = self.num_bands();
        self.sources
            .iter()
            .map(|s| {
                let eq_db = if s.eq_db.is_empty() {
                    vec![0.0; nb]
                } else {
                    s.eq_db.clone()
                };
                Source::new(
                    Point::from(s.coord),
                    Vector::from(s.orientation),
                    s.power_db.clone(),
                    eq_db,
                    s.delay / 1000.0,
                )
            })
            .collect()
    }

    pub fn build_receivers(&self, sources: &[Source]) -> Result<Vec<Receiver>> {
        let radius = self.controls.capture_radius();
        self.receivers
            .iter()
            .map(|r| {
                let receiver =
                    Receiver::new(Point::from(r.coord), Vector::from(r.orientation), radius)?;
                match r.point_to_source {
                    Some(idx) => {
                        let source = sources.get(idx).ok_or_else(|| {
                            Error::Config(format!("receiver points to missing source {idx}"))
                        })?;
                        Ok(receiver.point_to(source.position))
                    }
                    None => Ok(receiver),
                }
            })
            .collect()
    }
}
