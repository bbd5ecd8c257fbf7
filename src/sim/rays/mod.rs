mod config;
pub mod directions;
mod simulation;
pub mod tracer;

pub use config::{
    AirConfig, AlgorithmControls, GeometryConfig, OCTAVE_BAND_FREQUENCIES, PlaneConfig, RayMode,
    ReceiverConfig, SimulationConfig, SourceConfig,
};
pub use directions::RayDirections;
pub use simulation::{Arrival, Simulation, SimulationProgress, SimulationResult};
pub use tracer::{Crossing, RayTrace, Termination, TracingControls};
