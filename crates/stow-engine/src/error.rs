//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop so
//! `main` can propagate with `?` and attach context.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: stow_core::ConfigError,
    },

    /// World construction or scenario seeding failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: stow_world::WorldError,
    },

    /// A job could not be started.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: stow_core::SchedulerError,
    },

    /// The scenario could not be laid out.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of the failure.
        message: String,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
