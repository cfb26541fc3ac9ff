//! Host scheduler seam.
//!
//! A matched [`crate::RemoteBuildTrigger`] hands a [`ScheduledBuild`] to its
//! [`BuildScheduler`]. What happens next (queueing, executors, retries) is the
//! host's business. [`ChannelScheduler`] is an in-process implementation that
//! parks builds on a bounded channel for a consumer to pick up.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::payload::BuildParameter;
use crate::trigger::TriggerId;

/// A build request accepted from the message bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBuild {
    /// Fresh id for this build.
    pub build_id: Uuid,
    /// Trigger that fired.
    pub trigger_id: TriggerId,
    /// Project to build.
    pub project: String,
    /// Queue the message arrived on.
    pub queue_name: String,
    /// See [`remote_build_cause`].
    pub cause: String,
    /// Build parameters from the message.
    pub parameters: Vec<BuildParameter>,
    /// When the message was accepted.
    pub requested_at: DateTime<Utc>,
}

impl ScheduledBuild {
    /// Stamp a new build for `project`, caused by a message on `queue_name`.
    #[must_use]
    pub fn new(
        trigger_id: TriggerId,
        project: impl Into<String>,
        queue_name: impl Into<String>,
        parameters: Vec<BuildParameter>,
    ) -> Self {
        let queue_name = queue_name.into();
        Self {
            build_id: Uuid::new_v4(),
            trigger_id,
            project: project.into(),
            cause: remote_build_cause(&queue_name),
            queue_name,
            parameters,
            requested_at: Utc::now(),
        }
    }
}

/// Human-readable cause attached to every remotely triggered build.
#[must_use]
pub fn remote_build_cause(queue_name: &str) -> String {
    format!("Triggered by remote build message from queue: {queue_name}")
}

/// Accepts builds for execution.
///
/// Implementations must not block for long: `schedule` runs on the bus
/// collaborator's delivery thread.
pub trait BuildScheduler: Send + Sync {
    /// Enqueue a build.
    fn schedule(&self, build: ScheduledBuild) -> Result<(), ScheduleError>;
}

/// Scheduler backed by a bounded crossbeam channel.
///
/// Scheduling uses `try_send` and never blocks; builds that do not fit are
/// counted and reported as [`ScheduleError::QueueFull`].
#[derive(Debug)]
pub struct ChannelScheduler {
    tx: Sender<ScheduledBuild>,
    rx: Receiver<ScheduledBuild>,
    dropped_builds: AtomicU64,
}

impl ChannelScheduler {
    /// Create a scheduler holding at most `capacity` builds (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            dropped_builds: AtomicU64::new(0),
        }
    }

    /// A receiving handle for a consumer running elsewhere.
    #[must_use]
    pub fn receiver(&self) -> Receiver<ScheduledBuild> {
        self.rx.clone()
    }

    /// Take the next queued build, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<ScheduledBuild> {
        match self.rx.try_recv() {
            Ok(build) => Some(build),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Take every queued build.
    #[must_use]
    pub fn drain(&self) -> Vec<ScheduledBuild> {
        self.rx.try_iter().collect()
    }

    /// Number of builds waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Builds refused since creation.
    #[must_use]
    pub fn dropped_builds(&self) -> u64 {
        self.dropped_builds.load(Ordering::Relaxed)
    }
}

impl BuildScheduler for ChannelScheduler {
    fn schedule(&self, build: ScheduledBuild) -> Result<(), ScheduleError> {
        match self.tx.try_send(build) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(build)) => {
                self.dropped_builds.fetch_add(1, Ordering::Relaxed);
                Err(ScheduleError::QueueFull { project: build.project })
            }
            // `rx` lives as long as `self`, so this cannot happen here. The
            // variant is for schedulers whose consumer can go away.
            Err(TrySendError::Disconnected(_)) => {
                self.dropped_builds.fetch_add(1, Ordering::Relaxed);
                Err(ScheduleError::Disconnected)
            }
        }
    }
}
