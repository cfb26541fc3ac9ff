//! # Remote Builder
//!
//! Bridges a message bus to a build host's trigger registry. JSON messages
//! naming a project and carrying a shared-secret token are matched against
//! the registered build triggers, and every match is asked to schedule a build.
//!
//! ## Core Concepts
//!
//! - **Trigger**: a build job willing to be started remotely, identified by
//!   project name and guarded by a token ([`BuildTrigger`])
//! - **Listener**: receives bus messages and dispatches them to matching
//!   triggers ([`RemoteBuildListener`])
//! - **Scheduler**: the host side that accepts builds ([`BuildScheduler`])
//!
//! Connection handling, queue topology and acknowledgement belong to the bus
//! client that drives the [`ApplicationMessageListener`] callbacks.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use remote_builder::{
//!     ApplicationMessageListener, ChannelScheduler, RemoteBuildListener, RemoteBuildTrigger,
//! };
//!
//! let scheduler = Arc::new(ChannelScheduler::new(16));
//! let listener = RemoteBuildListener::new();
//! listener.add_trigger(Arc::new(RemoteBuildTrigger::new(
//!     "app",
//!     Some("secret".to_string()),
//!     scheduler.clone(),
//! )));
//!
//! listener.on_receive(
//!     "builds",
//!     "application/json",
//!     br#"{"project":"app","token":"secret","parameter":[]}"#,
//! );
//! assert_eq!(scheduler.drain().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extension;
pub mod listener;
pub mod matcher;
pub mod payload;
pub mod registry;
pub mod scheduler;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use config::{RemoteBuilderConfig, TriggerConfig};
pub use error::{ConfigError, PayloadError, ScheduleError};
pub use extension::ExtensionRegistry;
pub use listener::{
	ApplicationMessageListener, DispatchOutcome, RemoteBuildListener, PLUGIN_APP_ID, PLUGIN_NAME,
};
pub use matcher::MatchOutput;
pub use payload::{BuildParameter, BuildRequest, CONTENT_TYPE_JSON};
pub use registry::{SnapshotSet, TriggerRegistry};
pub use scheduler::{BuildScheduler, ChannelScheduler, ScheduledBuild};
pub use trigger::{BuildTrigger, RemoteBuildTrigger, TriggerId};
