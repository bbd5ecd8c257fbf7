use std::time::Instant;

use crate::error::{Error, Result};
use crate::geom::room::RoomGeometry;
use crate::sim::acoustics::direct::{DirectSound, direct_sound_all};
use crate::sim::acoustics::intensity::compute_intensities;
use crate::sim::acoustics::receiver::Receiver;
use crate::sim::acoustics::source::Source;
use crate::sim::air::AirProperties;
use crate::sim::engine::FlatScene;
use crate::sim::engine::absorption::ReflectionTable;
use crate::sim::rays::directions::RayDirections;
use crate::sim::rays::tracer::{RayTrace, Termination, TracingControls, trace_range};

use super::config::{AlgorithmControls, SimulationConfig};

#[derive(Debug, Clone, Copy)]
pub struct SimulationProgress {
    /// Number of traced rays over all sources.
    pub rays_done: usize,
    /// Total number of rays to trace (sources x directions).
    pub total_rays: usize,
    /// Receiver crossings recorded so far.
    pub crossings: usize,
}

/// Energy arrival at a receiver from one reflected ray.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    /// Time after emission [s].
    pub time: f64,
    pub ray: usize,
    pub order: usize,
    pub cos: f64,
    /// Intensity per band [W/m^2].
    pub intensity: Vec<f64>,
}

/// Result of a ray tracing simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub num_sources: usize,
    pub num_receivers: usize,
    pub num_rays: usize,
    pub max_reflection_order: usize,
    /// Reflectogram bin width for downstream processing [s].
    pub dt: f64,
    /// Emission delay per source [s]. Not applied to any time stored here.
    pub delays: Vec<f64>,
    /// Ray histories, indexed `source * num_rays + ray`.
    pub traces: Vec<RayTrace>,
    /// Direct sound, indexed `source * num_receivers + receiver`.
    pub direct: Vec<Option<DirectSound>>,
}

impl SimulationResult {
    pub fn trace(&self, source: usize, ray: usize) -> Option<&RayTrace> {
        if ray >= self.num_rays {
            return None;
        }
        self.traces.get(source * self.num_rays + ray)
    }

    pub fn source_traces(&self, source: usize) -> &[RayTrace] {
        let start = (source * self.num_rays).min(self.traces.len());
        let end = (start + self.num_rays).min(self.traces.len());
        &self.traces[start..end]
    }

    pub fn direct(&self, source: usize, receiver: usize) -> Option<&DirectSound> {
        if receiver >= self.num_receivers {
            return None;
        }
        self.direct
            .get(source * self.num_receivers + receiver)
            .and_then(|d| d.as_ref())
    }

    /// Reflected energy arrivals for one source-receiver pair, sorted by time and ray index.
    ///
    /// Order-0 crossings are left out: the direct record covers them.
    pub fn arrivals(&self, source: usize, receiver: usize) -> Vec<Arrival> {
        let mut arrivals: Vec<Arrival> = self
            .source_traces(source)
            .iter()
            .flat_map(|t| {
                t.crossings_for(receiver)
                    .filter(|c| c.order >= 1)
                    .map(|c| Arrival {
                        time: c.time,
                        ray: t.ray,
                        order: c.order,
                        cos: c.cos,
                        intensity: c.intensity.clone(),
                    })
            })
            .collect();
        arrivals.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.ray.cmp(&b.ray)));
        arrivals
    }

    /// Number of rays per termination reason.
    pub fn termination_counts(&self) -> [(Termination, usize); 4] {
        let mut counts = [
            (Termination::Escaped, 0),
            (Termination::TimeLimit, 0),
            (Termination::OrderLimit, 0),
            (Termination::Degenerate, 0),
        ];
        for trace in &self.traces {
            if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == trace.termination) {
                entry.1 += 1;
            }
        }
        counts
    }

    pub fn num_crossings(&self) -> usize {
        self.traces.iter().map(|t| t.crossings.len()).sum()
    }
}

pub struct Simulation {
    room: RoomGeometry,
    air: AirProperties,
    sources: Vec<Source>,
    receivers: Vec<Receiver>,
    directions: RayDirections,
    tracing: TracingControls,
    dt: f64,
}

trait ProgressReporter {
    fn every_rays(&self) -> usize;
    fn report(&mut self, progress: &SimulationProgress);
}

struct NoProgress;
impl ProgressReporter for NoProgress {
    fn every_rays(&self) -> usize {
        0
    }
    fn report(&mut self, _progress: &SimulationProgress) {}
}

struct FnProgress<F> {
    every_rays: usize,
    f: F,
}
impl<F> ProgressReporter for FnProgress<F>
where
    F: FnMut(&SimulationProgress),
{
    fn every_rays(&self) -> usize {
        self.every_rays
    }
    fn report(&mut self, progress: &SimulationProgress) {
        (self.f)(progress);
    }
}

impl Simulation {
    /// Validates the configuration and builds the room, air, sources, receivers and directions.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let room = config.build_geometry()?;
        let air = config.build_air()?;
        let sources = config.build_sources()?;
        let receivers = config.build_receivers(&sources)?;
        let directions = config.controls.directions()?;
        Self::from_parts(room, air, sources, receivers, directions, &config.controls)
    }

    /// Assembles a simulation from already built components.
    ///
    /// Receivers keep their own capture radius; the radius fields of
    /// `controls` are not used here.
    pub fn from_parts(
        room: RoomGeometry,
        air: AirProperties,
        sources: Vec<Source>,
        receivers: Vec<Receiver>,
        directions: RayDirections,
        controls: &AlgorithmControls,
    ) -> Result<Self> {
        let nb = room.num_bands();
        if air.num_bands() != nb {
            return Err(Error::Config(format!(
                "air absorption has {} bands, room has {nb}",
                air.num_bands()
            )));
        }
        if let Some((i, s)) = sources.iter().enumerate().find(|(_, s)| s.num_bands() != nb) {
            return Err(Error::Config(format!(
                "source {i} has {} bands, room has {nb}",
                s.num_bands()
            )));
        }
        if sources.is_empty() {
            return Err(Error::Config("at least one source is required".to_string()));
        }
        if !(controls.ht_length.is_finite() && controls.ht_length > 0.0) {
            return Err(Error::Config(format!(
                "ht_length must be positive, got {}",
                controls.ht_length
            )));
        }

        let max_order = room.max_reflection_order(air.c0, controls.ht_length);
        let tracing = TracingControls {
            c0: air.c0,
            history_length: controls.ht_length,
            max_order,
            allow_scattering: controls.allow_scattering,
            transition_order: controls.transition_order,
            seed: controls.seed,
        };

        log::info!(
            "Simulation: {} planes, {} sources, {} receivers, {} rays, max order {max_order}",
            room.planes().len(),
            sources.len(),
            receivers.len(),
            directions.len()
        );

        Ok(Self {
            room,
            air,
            sources,
            receivers,
            directions,
            tracing,
            dt: controls.dt,
        })
    }

    pub fn room(&self) -> &RoomGeometry {
        &self.room
    }

    pub fn air(&self) -> &AirProperties {
        &self.air
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    pub fn directions(&self) -> &RayDirections {
        &self.directions
    }

    pub fn run(&self) -> SimulationResult {
        self.run_with_reporter(NoProgress)
    }

    /// Runs the simulation while periodically reporting progress.
    ///
    /// - `every_rays=0` disables progress reporting.
    /// - The reporter is called once at start (`rays_done=0`), then after
    ///   every `every_rays` traced rays and once at the end.
    pub fn run_with_progress<F>(&self, every_rays: usize, report: F) -> SimulationResult
    where
        F: FnMut(&SimulationProgress),
    {
        self.run_with_reporter(FnProgress {
            every_rays,
            f: report,
        })
    }

    fn run_with_reporter<R: ProgressReporter>(&self, mut reporter: R) -> SimulationResult {
        let scene = FlatScene::new(&self.room);
        let c0 = self.air.c0;
        let num_rays = self.directions.len();
        let total_rays = self.sources.len() * num_rays;

        let start = Instant::now();
        let direct = direct_sound_all(&scene, &self.sources, &self.receivers, c0);
        log::debug!(
            "Direct sound: {} of {} paths visible",
            direct.iter().filter(|d| d.is_some()).count(),
            direct.len()
        );

        let every = reporter.every_rays();
        let chunk = if every == 0 { total_rays.max(1) } else { every };
        if every > 0 {
            reporter.report(&SimulationProgress {
                rays_done: 0,
                total_rays,
                crossings: 0,
            });
        }

        let mut traces: Vec<RayTrace> = Vec::with_capacity(total_rays);
        let mut crossings = 0;
        let mut done = 0;
        while done < total_rays {
            let end = (done + chunk).min(total_rays);
            let batch = trace_range(
                &scene,
                &self.sources,
                &self.receivers,
                &self.directions,
                &self.tracing,
                done..end,
            );
            crossings += batch.iter().map(|t| t.crossings.len()).sum::<usize>();
            traces.extend(batch);
            done = end;
            if every > 0 {
                reporter.report(&SimulationProgress {
                    rays_done: done,
                    total_rays,
                    crossings,
                });
            }
        }
        log::info!(
            "Traced {total_rays} rays in {:.2?}, {crossings} receiver crossings",
            start.elapsed()
        );

        let mut result = SimulationResult {
            num_sources: self.sources.len(),
            num_receivers: self.receivers.len(),
            num_rays,
            max_reflection_order: self.tracing.max_order,
            dt: self.dt,
            delays: self.sources.iter().map(|s| s.delay).collect(),
            traces,
            direct,
        };
        self.compute_intensities(&mut result);
        result
    }

    /// Fills in all intensities of `result` from the current absorption.
    pub fn compute_intensities(&self, result: &mut SimulationResult) {
        let start = Instant::now();
        let table = ReflectionTable::new(&self.room);
        compute_intensities(
            &mut result.traces,
            &mut result.direct,
            &self.sources,
            result.num_rays,
            &table,
            &self.air.absorption(),
            self.air.c0,
        );
        log::debug!("Intensity pass took {:.2?}", start.elapsed());
    }

    /// Replaces the absorption of every plane and re-runs only the intensity pass.
    ///
    /// `absorption` holds one row of band coefficients per plane. Paths and
    /// crossing times in `result` are kept.
    pub fn recompute_intensities(
        &mut self,
        result: &mut SimulationResult,
        absorption: &[Vec<f64>],
    ) -> Result<()> {
        self.room = self.room.with_absorption(absorption)?;
        self.compute_intensities(result);
        Ok(())
    }
}
