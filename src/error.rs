//! Error types for the room acoustics engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or inconsistent configuration (controls, air, sources, receivers).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Degenerate room geometry (non-planar polygon, zero area, non-positive volume).
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
