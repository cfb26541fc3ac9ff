//! Build triggers that can be started by a remote build message.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::payload::BuildParameter;
use crate::scheduler::{BuildScheduler, ScheduledBuild};

/// Unique identifier for a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(Uuid);

impl TriggerId {
    /// Create a new random trigger id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A build job willing to be started remotely.
///
/// Hosts implement this for their own job types. The listener only reads the
/// project name and token and calls `schedule_build` on a match.
pub trait BuildTrigger: Send + Sync {
    /// Project this trigger starts builds for.
    fn project_name(&self) -> &str;

    /// Shared secret a message must carry. `None` or empty disables the trigger.
    fn remote_build_token(&self) -> Option<&str>;

    /// Request a build. `parameters` is the payload's `parameter` array, verbatim.
    fn schedule_build(&self, queue_name: &str, parameters: &[Value]);
}

/// Trigger configured with a project name and token, handing builds to a
/// [`BuildScheduler`].
pub struct RemoteBuildTrigger {
    id: TriggerId,
    project_name: String,
    token: Option<String>,
    scheduler: Arc<dyn BuildScheduler>,
}

impl RemoteBuildTrigger {
    /// Create a trigger with a fresh id.
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        token: Option<String>,
        scheduler: Arc<dyn BuildScheduler>,
    ) -> Self {
        Self {
            id: TriggerId::new(),
            project_name: project_name.into(),
            token,
            scheduler,
        }
    }

    /// This trigger's id, copied into every build it schedules.
    #[must_use]
    pub const fn id(&self) -> TriggerId {
        self.id
    }
}

impl fmt::Debug for RemoteBuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token.
        f.debug_struct("RemoteBuildTrigger")
            .field("id", &self.id)
            .field("project_name", &self.project_name)
            .field("has_token", &self.token.as_deref().is_some_and(|t| !t.is_empty()))
            .finish_non_exhaustive()
    }
}

impl BuildTrigger for RemoteBuildTrigger {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn remote_build_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn schedule_build(&self, queue_name: &str, parameters: &[Value]) {
        let build = ScheduledBuild::new(
            self.id,
            self.project_name.as_str(),
            queue_name,
            BuildParameter::from_values(parameters),
        );
        let build_id = build.build_id;

        match self.scheduler.schedule(build) {
            Ok(()) => debug!(
                project = %self.project_name,
                queue = queue_name,
                %build_id,
                "scheduled remote build"
            ),
            Err(err) => warn!(
                project = %self.project_name,
                queue = queue_name,
                error = %err,
                "failed to schedule remote build"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::scheduler::ChannelScheduler;

    #[test]
    fn trigger_id_is_unique_and_serializes_transparently() {
        let a = TriggerId::new();
        let b = TriggerId::new();
        assert_ne!(a, b);

        let uuid = Uuid::new_v4();
        let id = TriggerId::from_uuid(uuid);
        assert_eq!(serde_json::to_value(id).unwrap(), json!(uuid.to_string()));
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn schedule_build_hands_parameters_to_scheduler() {
        let scheduler = Arc::new(ChannelScheduler::new(4));
        let trigger = RemoteBuildTrigger::new("app", Some("secret".to_string()), scheduler.clone());

        trigger.schedule_build(
            "queueX",
            &[json!({"name": "BRANCH", "value": "main"}), json!("ignored")],
        );

        let build = scheduler.try_recv().expect("build queued");
        assert_eq!(build.trigger_id, trigger.id());
        assert_eq!(build.project, "app");
        assert_eq!(build.queue_name, "queueX");
        assert_eq!(build.parameters, vec![BuildParameter::new("BRANCH", "main")]);
    }

    #[test]
    fn schedule_build_survives_full_queue() {
        let scheduler = Arc::new(ChannelScheduler::new(1));
        let trigger = RemoteBuildTrigger::new("app", Some("secret".to_string()), scheduler.clone());

        trigger.schedule_build("q", &[]);
        trigger.schedule_build("q", &[]);

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.dropped_builds(), 1);
    }

    #[test]
    fn debug_output_hides_token() {
        let scheduler = Arc::new(ChannelScheduler::new(1));
        let trigger = RemoteBuildTrigger::new("app", Some("hunter2".to_string()), scheduler);
        let dbg = format!("{trigger:?}");
        assert!(dbg.contains("app"));
        assert!(!dbg.contains("hunter2"));
    }
}
