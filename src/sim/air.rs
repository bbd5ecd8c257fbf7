//! Properties of air: speed of sound, density and frequency-dependent absorption.
//!
//! Derived from temperature, relative humidity and atmospheric pressure.
//! Absorption follows ISO 9613-1 (oxygen and nitrogen relaxation).

use crate::error::{Error, Result};
use crate::sim::engine::absorption::AirAbsorption;

/// Specific gas constant of dry air [J/(kg K)]
const R_AIR: f64 = 287.031;
/// Specific gas constant of water vapour [J/(kg K)]
const R_VAPOUR: f64 = 461.521;
/// Reference pressure [Pa]
const P_REF: f64 = 101_325.0;
/// Reference temperature [K]
const T_REF: f64 = 293.15;
/// Triple-point isotherm temperature [K]
const T_TRIPLE: f64 = 273.15;

#[derive(Debug, Clone, PartialEq)]
pub struct AirProperties {
    /// Speed of sound [m/s]
    pub c0: f64,
    /// Air density [kg/m^3]
    pub rho0: f64,
    /// Energy attenuation per band [1/m]
    pub m: Vec<f64>,
}

impl AirProperties {
    pub fn new(c0: f64, rho0: f64, m: Vec<f64>) -> Result<Self> {
        if !(c0.is_finite() && c0 > 0.0) {
            return Err(Error::Config(format!("sound speed must be positive, got {c0}")));
        }
        if !(rho0.is_finite() && rho0 > 0.0) {
            return Err(Error::Config(format!("air density must be positive, got {rho0}")));
        }
        if let Some(v) = m.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::Config(format!(
                "air absorption must be non-negative, got {v}"
            )));
        }
        Ok(Self { c0, rho0, m })
    }

    /// Computes air properties from ambient conditions.
    ///
    /// - `temperature`: air temperature [°C]
    /// - `humidity`: relative humidity [%]
    /// - `p_atm`: atmospheric pressure [Pa]
    /// - `freqs`: band centre frequencies [Hz]
    pub fn from_conditions(
        temperature: f64,
        humidity: f64,
        p_atm: f64,
        freqs: &[f64],
    ) -> Result<Self> {
        if !temperature.is_finite() || temperature <= -T_TRIPLE {
            return Err(Error::Config(format!(
                "invalid air temperature {temperature} °C"
            )));
        }
        if !(0.0..=100.0).contains(&humidity) {
            return Err(Error::Config(format!(
                "relative humidity must be in [0, 100] %, got {humidity}"
            )));
        }
        if !(p_atm.is_finite() && p_atm > 0.0) {
            return Err(Error::Config(format!(
                "atmospheric pressure must be positive, got {p_atm}"
            )));
        }
        if let Some(f) = freqs.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(Error::Config(format!("invalid band frequency {f} Hz")));
        }

        let t = temperature + 273.16;
        // Saturation vapour pressure, polynomial fit [Pa]
        let pvp = 0.0658 * t.powi(3) - 53.7558 * t.powi(2) + 14703.8127 * t - 1345485.0465;
        // Specific heats of air
        let cp = 4168.8
            * (0.249679 - 7.55179e-5 * t + 1.69194e-7 * t.powi(2) - 6.46128e-11 * t.powi(3));
        let cv = cp - R_AIR;
        let gamma = cp / cv;
        let rho0 = p_atm / (R_AIR * t) - (1.0 / R_AIR - 1.0 / R_VAPOUR) * humidity / 100.0 * pvp / t;
        let c0 = (gamma * p_atm / rho0).sqrt();

        let m = freqs
            .iter()
            .map(|&f| absorption_coefficient(temperature, humidity, p_atm, f))
            .collect::<Vec<_>>();

        log::debug!("Air at {temperature} °C, {humidity} % RH: c0 = {c0:.3} m/s, rho0 = {rho0:.4} kg/m^3");

        Self::new(c0, rho0, m)
    }

    pub fn absorption(&self) -> AirAbsorption {
        AirAbsorption::new(self.m.clone())
    }

    pub fn num_bands(&self) -> usize {
        self.m.len()
    }
}

/// Energy attenuation coefficient [1/m] at a single frequency.
fn absorption_coefficient(temperature: f64, humidity: f64, p_atm: f64, freq: f64) -> f64 {
    let t = temperature + T_TRIPLE;
    let pa = p_atm / P_REF;
    let f = freq / pa;

    // Molar concentration of water vapour
    let psat = pa * 10f64.powf(-6.8346 * (T_TRIPLE / t).powf(1.261) + 4.6151);
    let h = pa * humidity * (psat / pa);

    // Relaxation frequencies of oxygen and nitrogen
    let fr_o = 1.0 / pa * (24.0 + 4.04e4 * h * (0.02 + h) / (0.391 + h));
    let fr_n = 1.0 / pa
        * (T_REF / t).sqrt()
        * (9.0 + 280.0 * h * (-4.17 * ((T_REF / t).powf(1.0 / 3.0) - 1.0)).exp());

    let alpha = 100.0 * f.powi(2) / pa
        * (1.84e-11 * (t / T_REF).sqrt()
            + (t / T_REF).powf(-2.5)
                * (0.01278 * (-2239.1 / t).exp() / (fr_o + f.powi(2) / fr_o)
                    + 0.1068 * (-3352.0 / t).exp() / (fr_n + f.powi(2) / fr_n)));

    // Pressure amplitude [dB/100 m] to energy [1/m]
    let db_per_100m = alpha * 20.0 / std::f64::consts::LN_10;
    db_per_100m / 100.0 * pa / (10.0 * std::f64::consts::LOG10_E)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const OCTAVES: [f64; 6] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];

    #[test]
    fn test_standard_conditions() -> Result<()> {
        let air = AirProperties::from_conditions(20.0, 50.0, 101_325.0, &OCTAVES)?;
        assert!((air.c0 - 344.34).abs() < 0.01, "c0 = {}", air.c0);
        assert!((air.rho0 - 1.1974).abs() < 1e-3, "rho0 = {}", air.rho0);
        assert_eq!(air.num_bands(), 6);
        assert!((air.m[3] - 1.0750e-3).abs() < 1e-6, "m(1 kHz) = {}", air.m[3]);
        assert!((air.m[5] - 6.8396e-3).abs() < 1e-6, "m(4 kHz) = {}", air.m[5]);
        // Attenuation grows with frequency
        for w in air.m.windows(2) {
            assert!(w[1] > w[0]);
        }
        Ok(())
    }

    #[test]
    fn test_cold_dry_air() -> Result<()> {
        let air = AirProperties::from_conditions(0.0, 0.0, 101_325.0, &[1000.0])?;
        assert!((air.c0 - 331.48).abs() < 0.01, "c0 = {}", air.c0);
        assert!((air.rho0 - 1.2923).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_invalid_conditions() {
        assert!(AirProperties::from_conditions(20.0, 150.0, 101_325.0, &OCTAVES).is_err());
        assert!(AirProperties::from_conditions(20.0, 50.0, 0.0, &OCTAVES).is_err());
        assert!(AirProperties::from_conditions(20.0, 50.0, 101_325.0, &[0.0]).is_err());
        assert!(AirProperties::new(-1.0, 1.2, vec![0.0]).is_err());
        assert!(AirProperties::new(343.0, 1.2, vec![-0.1]).is_err());
    }

    #[test]
    fn test_absorption_model() -> Result<()> {
        let air = AirProperties::new(343.0, 1.21, vec![0.0, 0.01])?;
        let f = air.absorption().apply_distance(10.0);
        assert!((f[0] - 1.0).abs() < 1e-12);
        assert!((f[1] - (-0.1f64).exp()).abs() < 1e-12);
        Ok(())
    }
}
