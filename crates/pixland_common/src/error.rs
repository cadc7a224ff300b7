//! Error types for Pixland.

use crate::poller::TransportError;
use crate::progression::LevelTableError;
use crate::spatial_key::KeyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixlandError {
    #[error("Spatial key error: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    LevelTable(#[from] LevelTableError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
