//! Stochastic ray tracer.
//!
//! Every (source, initial direction) pair is traced independently: the ray
//! bounces from plane to plane until it runs out of time, reaches the
//! maximum reflection order or leaves the room. Along each segment it is
//! tested against every receiver sphere. The tracer only records geometry
//! and timing; energies are filled in later by the intensity pass.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::geom::ray::Ray;
use crate::sim::acoustics::receiver::Receiver;
use crate::sim::acoustics::source::Source;
use crate::sim::engine::{FlatScene, SurfaceHit};
use crate::sim::engine::reflection::{Hybrid, ReflectionModel, Specular};
use crate::sim::rays::directions::RayDirections;
use crate::{Point, Vector};

/// Parameters shared by all rays.
#[derive(Debug, Clone, PartialEq)]
pub struct TracingControls {
    /// Speed of sound [m/s].
    pub c0: f64,
    /// Length of the simulated response [s].
    pub history_length: f64,
    /// Maximum number of reflections per ray.
    pub max_order: usize,
    pub allow_scattering: bool,
    /// Reflection order from which scattering is applied.
    pub transition_order: usize,
    /// Base seed for the per-ray random generators.
    pub seed: u64,
}

/// Why a ray stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No plane in the ray's direction (numerical gap in the boundary or a ray started outside).
    Escaped,
    /// The next reflection would happen after the history length.
    TimeLimit,
    OrderLimit,
    /// Non-finite position or direction.
    Degenerate,
}

/// A ray passing through a receiver sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub receiver: usize,
    /// Time of closest approach to the receiver center [s].
    pub time: f64,
    /// Receiver radius at `time` [m].
    pub radius: f64,
    /// Number of reflections before the crossing.
    pub order: usize,
    pub cos: f64,
    /// Intensity per band [W/m^2]. Empty until the intensity pass has run.
    pub intensity: Vec<f64>,
}

/// Full history of one ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RayTrace {
    pub source: usize,
    pub ray: usize,
    pub direction: Vector,
    /// Index of every plane hit, in order.
    pub planes: Vec<usize>,
    /// Reflection points, parallel to `planes`.
    pub points: Vec<Point>,
    /// Time at which the ray stopped [s].
    pub elapsed: f64,
    pub termination: Termination,
    /// Grouped by receiver, time-ordered within each receiver.
    pub crossings: Vec<Crossing>,
}

impl RayTrace {
    /// Reflection order reached by the ray.
    pub fn order(&self) -> usize {
        self.planes.len()
    }

    pub fn crossings_for(&self, receiver: usize) -> impl Iterator<Item = &Crossing> {
        self.crossings.iter().filter(move |c| c.receiver == receiver)
    }
}

/// Seeds the generator of one ray so results do not depend on scheduling.
pub fn ray_seed(seed: u64, source: usize, ray: usize) -> u64 {
    // splitmix64 finalizer over the combined index
    let mut z = seed
        .wrapping_add((source as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((ray as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Traces one ray from `origin` along `direction`.
pub fn trace_ray(
    scene: &FlatScene,
    receivers: &[Receiver],
    controls: &TracingControls,
    source: usize,
    ray: usize,
    origin: Point,
    direction: Vector,
) -> RayTrace {
    let mut rng = StdRng::seed_from_u64(ray_seed(controls.seed, source, ray));
    let mut trace = RayTrace {
        source,
        ray,
        direction,
        planes: Vec::with_capacity(controls.max_order),
        points: Vec::with_capacity(controls.max_order),
        elapsed: 0.0,
        termination: Termination::Degenerate,
        crossings: Vec::new(),
    };

    let c0 = controls.c0;
    let mut pos = origin;
    let mut dir = direction;
    let mut time = 0.0;
    // Planes met at the last reflection point
    let mut skip: Vec<usize> = Vec::new();

    let termination = loop {
        let Some(segment) = Ray::new(pos, dir) else {
            break Termination::Degenerate;
        };
        let hits = scene.find_target_surfaces(&segment, &skip);
        let Some(&hit) = hits.first() else {
            break Termination::Escaped;
        };

        let order = trace.planes.len();
        let end_time = time + hit.distance / c0;
        if !end_time.is_finite() || !hit.point.is_finite() {
            break Termination::Degenerate;
        }
        if end_time > controls.history_length {
            let remaining = ((controls.history_length - time) * c0).max(0.0);
            record_crossings(&mut trace, &segment, remaining, time, order, receivers, c0);
            time = controls.history_length;
            break Termination::TimeLimit;
        }
        record_crossings(&mut trace, &segment, hit.distance, time, order, receivers, c0);
        time = end_time;

        // At an edge or a corner the ray reflects off every plane it is
        // still heading out through, like a corner reflector.
        let mut dir_out = segment.direction;
        for (i, h) in hits.iter().enumerate() {
            if trace.planes.len() >= controls.max_order {
                break;
            }
            let normal = scene.room().planes()[h.plane].normal();
            if i > 0 && dir_out.dot(&normal) <= 0.0 {
                continue;
            }
            dir_out = reflect(scene, controls, h.plane, trace.planes.len(), dir_out, &mut rng);
            trace.planes.push(h.plane);
            trace.points.push(h.point);
        }
        dir = keep_inside(scene, &hits, dir_out);
        pos = hit.point;
        skip.clear();
        skip.extend(hits.iter().map(|h| h.plane));

        if trace.planes.len() >= controls.max_order {
            break Termination::OrderLimit;
        }
    };
    trace.termination = termination;
    trace.elapsed = time;

    // Group by receiver; the sort is stable so each group stays time-ordered.
    trace.crossings.sort_by_key(|c| c.receiver);
    trace
}

/// Reflects `incident` off plane `plane` at reflection order `order`.
///
/// Reflections are specular below the transition order. From it onward the
/// plane's mean scattering coefficient picks between specular and diffuse.
fn reflect(
    scene: &FlatScene,
    controls: &TracingControls,
    plane: usize,
    order: usize,
    incident: Vector,
    rng: &mut StdRng,
) -> Vector {
    let plane = &scene.room().planes()[plane];
    if controls.allow_scattering && order >= controls.transition_order {
        Hybrid::new(plane.mean_scattering()).reflect(incident, plane.normal(), rng)
    } else {
        Specular.reflect(incident, plane.normal(), rng)
    }
}

/// Turns a direction leaving an edge or corner back into the room.
///
/// Diffuse reflections off one plane of an edge may still point out through
/// its neighbour. Such a direction is mirrored off the summed normal of the
/// planes it would leave through.
fn keep_inside(scene: &FlatScene, hits: &[SurfaceHit], dir: Vector) -> Vector {
    if hits.len() < 2 {
        return dir;
    }
    let outward = hits
        .iter()
        .map(|h| scene.room().planes()[h.plane].normal())
        .filter(|n| dir.dot(n) > 0.0)
        .fold(Vector::zero(), |acc, n| acc + n);
    match outward.normalize() {
        Some(n) if dir.dot(&n) > 0.0 => Specular::mirror(dir, n),
        _ => dir,
    }
}

/// Tests one segment against every receiver and records the crossings.
///
/// A crossing is registered at the point of closest approach to the receiver
/// center when that point lies within the radius valid at that moment. An
/// approach clamped to the segment start is skipped, since it belongs to the
/// end of the previous segment.
fn record_crossings(
    trace: &mut RayTrace,
    segment: &Ray,
    length: f64,
    start_time: f64,
    order: usize,
    receivers: &[Receiver],
    c0: f64,
) {
    if length <= 0.0 {
        return;
    }
    for (idx, receiver) in receivers.iter().enumerate() {
        let approach = segment.closest_approach(length, receiver.position);
        if approach.along <= 0.0 {
            continue;
        }
        let time = start_time + approach.along / c0;
        let radius = receiver.radius_at(time);
        if approach.distance <= radius && time.is_finite() && radius.is_finite() {
            trace.crossings.push(Crossing {
                receiver: idx,
                time,
                radius,
                order,
                cos: receiver.arrival_cosine(segment.direction),
                intensity: Vec::new(),
            });
        }
    }
}

/// Traces every ray of every source in parallel.
///
/// The result is indexed `source * directions.len() + ray`.
pub fn trace_all(
    scene: &FlatScene,
    sources: &[Source],
    receivers: &[Receiver],
    directions: &RayDirections,
    controls: &TracingControls,
) -> Vec<RayTrace> {
    trace_range(scene, sources, receivers, directions, controls, 0..sources.len() * directions.len())
}

/// Traces the tasks with flat indices in `tasks`, in index order.
pub fn trace_range(
    scene: &FlatScene,
    sources: &[Source],
    receivers: &[Receiver],
    directions: &RayDirections,
    controls: &TracingControls,
    tasks: std::ops::Range<usize>,
) -> Vec<RayTrace> {
    let num_rays = directions.len();
    let dirs = directions.as_slice();
    tasks
        .into_par_iter()
        .map(|task| {
            let source = task / num_rays;
            let ray = task % num_rays;
            trace_ray(
                scene,
                receivers,
                controls,
                source,
                ray,
                sources[source].position,
                dirs[ray],
            )
        })
        .collect()
}
