//! Intensity pass.
//!
//! Converts the geometry and timing recorded by the tracer into per-band
//! intensities. It only reads plane histories and crossing times, so it can
//! be re-run after the absorption coefficients change without re-tracing.

use rayon::prelude::*;

use crate::sim::acoustics::direct::{DirectSound, direct_intensity};
use crate::sim::acoustics::source::Source;
use crate::sim::engine::absorption::{AirAbsorption, ReflectionTable};
use crate::sim::rays::tracer::RayTrace;

/// Intensity of one ray crossing per band.
///
/// `I = (W / N) * exp(-m c0 t) / (4 pi r^2) * reflection`
pub fn ray_intensity(
    power: &[f64],
    num_rays: usize,
    air: &AirAbsorption,
    c0: f64,
    time: f64,
    radius: f64,
    reflection: &[f64],
) -> Vec<f64> {
    let area = 4.0 * std::f64::consts::PI * radius * radius;
    let distance = c0 * time;
    power
        .iter()
        .zip(reflection)
        .enumerate()
        .map(|(band, (w, r))| w / num_rays as f64 * air.factor(band, distance) / area * r)
        .collect()
}

/// Fills in crossing intensities of one ray.
///
/// The cumulative reflection product is computed once per ray and indexed by
/// the crossing order. Returns the number of values that were not finite and
/// have been replaced by zero.
pub fn compute_ray_intensities(
    trace: &mut RayTrace,
    source: &Source,
    num_rays: usize,
    table: &ReflectionTable,
    air: &AirAbsorption,
    c0: f64,
) -> usize {
    let nb = table.num_bands();
    let cumprod = table.cumulative_product(&trace.planes);
    let mut replaced = 0;
    for crossing in trace.crossings.iter_mut() {
        let row = &cumprod[crossing.order * nb..(crossing.order + 1) * nb];
        crossing.intensity = ray_intensity(
            &source.power_lin,
            num_rays,
            air,
            c0,
            crossing.time,
            crossing.radius,
            row,
        );
        replaced += sanitize(&mut crossing.intensity);
    }
    replaced
}

/// Runs the intensity pass over all traces and direct records.
///
/// `traces` is indexed `source * num_rays + ray` and `direct` is indexed
/// `source * num_receivers + receiver`.
pub fn compute_intensities(
    traces: &mut [RayTrace],
    direct: &mut [Option<DirectSound>],
    sources: &[Source],
    num_rays: usize,
    table: &ReflectionTable,
    air: &AirAbsorption,
    c0: f64,
) {
    let replaced: usize = traces
        .par_iter_mut()
        .map(|trace| {
            let source = &sources[trace.source];
            compute_ray_intensities(trace, source, num_rays, table, air, c0)
        })
        .sum();

    let num_receivers = if sources.is_empty() {
        0
    } else {
        direct.len() / sources.len()
    };
    let mut replaced_direct = 0;
    for (idx, record) in direct.iter_mut().enumerate() {
        if let Some(d) = record {
            let source = &sources[idx / num_receivers.max(1)];
            d.intensity = direct_intensity(&source.power_lin, air, d.distance);
            replaced_direct += sanitize(&mut d.intensity);
        }
    }

    if replaced + replaced_direct > 0 {
        log::warn!(
            "Replaced {} non-finite intensity values with zero",
            replaced + replaced_direct
        );
    }
}

fn sanitize(values: &mut [f64]) -> usize {
    let mut n = 0;
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
            n += 1;
        }
    }
    n
}
