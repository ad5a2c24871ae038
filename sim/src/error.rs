//! Error types for session setup and teardown.
//!
//! Per-frame failures never surface here: a failed batch is logged and
//! counted by the worker pool, and the frame carries on without it.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while creating or tearing down a simulation session.
#[derive(Error, Debug)]
pub enum SimError {
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// Workers were still running when the shutdown grace period ran out.
    #[error("{remaining} worker(s) still running after {grace:?}; abandoning them")]
    ShutdownTimeout { remaining: usize, grace: Duration },

    /// Configuration JSON could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
