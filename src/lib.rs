//! Stochastic ray-tracing room acoustics.
//!
//! Rays leave each source, reflect off the room boundaries and are caught by
//! spherical receivers whose radius grows with time. The result is a
//! time-ordered list of energy arrivals per source, receiver and band.

pub mod error;
pub mod geom;
pub mod sim;

// Prelude
pub use error::{Error, Result};
pub use geom::point::Point;
pub use geom::room::{Plane, RoomGeometry};
pub use geom::vector::Vector;
pub use sim::acoustics::direct::DirectSound;
pub use sim::acoustics::receiver::{CaptureRadius, Receiver};
pub use sim::acoustics::source::Source;
pub use sim::air::AirProperties;
pub use sim::rays::{
    AlgorithmControls, Arrival, RayDirections, RayMode, Simulation, SimulationConfig,
    SimulationProgress, SimulationResult, Termination,
};
