//! Engine error types.

use thiserror::Error;

/// Errors raised synchronously to producers and at construction.
///
/// Nothing in here is ever produced by the render path; a render callback
/// always completes and degrades to silence instead.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The written data does not match the configured shape or encoding.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid construction options.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A write arrived after the stream was asked to drain.
    #[error("Write after drain request")]
    Ended,

    /// The renderer has been dropped, nothing will consume further writes.
    #[error("Renderer disconnected")]
    Disconnected,

    /// The configured queue limit would be exceeded.
    #[error("Queue full: {queued} frames queued, limit is {limit}")]
    QueueFull { queued: usize, limit: usize },

    /// The JSON configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = StreamError> = std::result::Result<T, E>;
