use crate::geom::room::RoomGeometry;

/// Per-band reflection coefficients (`1 - absorption`) of every plane.
///
/// Stored flat, row `plane`, column `band`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionTable {
    num_bands: usize,
    values: Vec<f64>,
}

impl ReflectionTable {
    pub fn new(room: &RoomGeometry) -> Self {
        let num_bands = room.num_bands();
        let values = room
            .planes()
            .iter()
            .flat_map(|p| p.reflection_coefficients())
            .collect();
        Self { num_bands, values }
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Reflection coefficients of one plane.
    pub fn plane(&self, plane: usize) -> &[f64] {
        let start = plane * self.num_bands;
        &self.values[start..start + self.num_bands]
    }

    /// Cumulative product of reflection coefficients along a plane history.
    ///
    /// Row `k` (flat, `k * num_bands + band`) is the energy fraction left after
    /// the first `k` reflections. Row 0 is all ones, so the result has
    /// `history.len() + 1` rows.
    pub fn cumulative_product(&self, history: &[usize]) -> Vec<f64> {
        let nb = self.num_bands;
        let mut out = Vec::with_capacity((history.len() + 1) * nb);
        out.resize(nb, 1.0);
        for (k, &plane) in history.iter().enumerate() {
            let prev = k * nb;
            for band in 0..nb {
                let r = self.plane(plane)[band];
                out.push(out[prev + band] * r);
            }
        }
        out
    }
}

/// Distance-dependent air attenuation.
///
/// `m` is the energy attenuation coefficient per band [1/m], so the
/// energy fraction left after `d` metres is `exp(-m * d)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AirAbsorption {
    pub m: Vec<f64>,
}

impl AirAbsorption {
    pub fn new(m: Vec<f64>) -> Self {
        Self { m }
    }

    /// Air absorption disabled on every band.
    pub fn none(num_bands: usize) -> Self {
        Self {
            m: vec![0.0; num_bands],
        }
    }

    /// Energy multiplier for one band over `distance` metres.
    pub fn factor(&self, band: usize, distance: f64) -> f64 {
        (-self.m[band] * distance).exp()
    }

    /// Energy multiplier per band over `distance` metres.
    pub fn apply_distance(&self, distance: f64) -> Vec<f64> {
        self.m.iter().map(|m| (-m * distance).exp()).collect()
    }
}
