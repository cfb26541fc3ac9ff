//! Error types for the remote builder.
//!
//! All errors are strongly typed using thiserror so callers can pattern
//! match on the exact failure. None of them ever reach the bus collaborator:
//! the listener logs payload errors and drops the message.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning an inbound message into a [`crate::BuildRequest`].
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The message is not JSON. Not a failure; the message is skipped silently.
    #[error("Unsupported content type '{content_type}'")]
    UnsupportedContentType {
        /// Content type the message arrived with.
        content_type: String,
    },

    /// The body is not UTF-8 text.
    #[error("Message body is not valid UTF-8: {source}")]
    InvalidEncoding {
        /// Decoder error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// The text is not well-formed JSON.
    #[error("Invalid JSON format string: {source}")]
    InvalidJson {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document is valid but not an object.
    #[error("Expected a JSON object, found {found}")]
    NotAnObject {
        /// Kind of the top-level JSON value.
        found: &'static str,
    },
}

impl PayloadError {
    /// Returns true if the message should be skipped without a warning.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::UnsupportedContentType { .. })
    }

    /// Returns true if the body could not be decoded as text.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::InvalidEncoding { .. })
    }

    /// Returns true if the text could not be parsed as a JSON object.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::InvalidJson { .. } | Self::NotAnObject { .. })
    }
}

/// Errors returned by a [`crate::BuildScheduler`] that refused a build.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The build queue has no room left.
    #[error("Build queue is full; dropped build for project '{project}'")]
    QueueFull {
        /// Project of the refused build.
        project: String,
    },

    /// Nothing consumes the build queue any more. Reported by schedulers
    /// whose consumer can shut down independently of the producer.
    #[error("Build queue is disconnected")]
    Disconnected,
}

/// Errors loading or validating [`crate::RemoteBuilderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid JSON or has unknown fields.
    #[error("Failed to parse config: {source}")]
    Parse {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A trigger has a blank project name.
    #[error("Trigger #{index} has an empty project name")]
    EmptyProjectName {
        /// Position of the trigger in the `triggers` list.
        index: usize,
    },

    /// The build queue capacity is zero.
    #[error("schedule_queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
}
