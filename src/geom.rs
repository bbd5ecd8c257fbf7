pub mod point;
pub mod polygon;
pub mod ray;
pub mod room;
pub mod vector;

/// Geometric precision
pub const EPS: f64 = 1e-13;

/// Maximum distance of a vertex from the plane of its polygon [m].
pub const PLANARITY_TOLERANCE: f64 = 1e-6;

/// Minimum ray parameter accepted as a hit (avoids self-intersection) [m].
pub const T_MIN: f64 = 1e-9;
