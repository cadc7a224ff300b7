//! Shared core for Pixland components.
//!
//! Canvas cell keys, player progression, and job polling. Everything here is
//! transport-agnostic; the HTTP status check in `poller::http` is the only
//! piece that talks to the network.

pub mod config;
pub mod error;
pub mod poller;
pub mod progression;
pub mod spatial_key;

pub use config::{
    ApiSettings, GridSettings, LogSettings, PixlandConfig, PollerSettings, ProgressionSettings,
};
pub use error::PixlandError;
pub use poller::{
    Delay, HttpJobStatus, JobOperation, JobPoller, JobResponse, PollOutcome, RecordingDelay,
    TokioDelay, TransportError,
};
pub use progression::{
    Level, LevelResult, LevelTable, LevelTableError, NextThreshold, RewardStatus,
};
pub use spatial_key::{Cell, KeyError, SpatialKeyCodec};

// Cancellation handle accepted by `JobPoller::poll_until_complete`
pub use tokio_util::sync::CancellationToken;
