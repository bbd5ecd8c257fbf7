pub mod acoustics;
pub mod air;
pub mod engine;
pub mod rays;
