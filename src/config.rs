//! JSON configuration for a standalone remote builder.
//!
//! ```json
//! {
//!   "schedule_queue_capacity": 256,
//!   "triggers": [
//!     {"project": "app", "token": "secret"},
//!     {"project": "docs"}
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheduler::BuildScheduler;
use crate::trigger::RemoteBuildTrigger;

/// One configured trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    /// Project the trigger starts builds for.
    pub project: String,
    /// Left unset, the trigger is registered but never fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Standalone remote builder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteBuilderConfig {
    /// Capacity of the in-process build queue.
    pub schedule_queue_capacity: usize,
    /// Triggers to register.
    pub triggers: Vec<TriggerConfig>,
}

impl Default for RemoteBuilderConfig {
    fn default() -> Self {
        Self {
            schedule_queue_capacity: 1024,
            triggers: Vec::new(),
        }
    }
}

impl RemoteBuilderConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Check capacity and project names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if let Some(index) = self.triggers.iter().position(|t| t.project.trim().is_empty()) {
            return Err(ConfigError::EmptyProjectName { index });
        }
        Ok(())
    }

    /// Instantiate the configured triggers, all scheduling through `scheduler`.
    #[must_use]
    pub fn build_triggers(
        &self,
        scheduler: &Arc<dyn BuildScheduler>,
    ) -> Vec<Arc<RemoteBuildTrigger>> {
        self.triggers
            .iter()
            .map(|t| {
                Arc::new(RemoteBuildTrigger::new(
                    t.project.clone(),
                    t.token.clone(),
                    Arc::clone(scheduler),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::scheduler::ChannelScheduler;
    use crate::trigger::BuildTrigger;

    #[test]
    fn defaults_apply_to_empty_document() {
        let cfg = RemoteBuilderConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, RemoteBuilderConfig::default());
        assert_eq!(cfg.schedule_queue_capacity, 1024);
    }

    #[test]
    fn parses_triggers_with_optional_token() {
        let cfg = RemoteBuilderConfig::from_json_str(
            r#"{"triggers":[{"project":"app","token":"secret"},{"project":"docs"}]}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.triggers,
            vec![
                TriggerConfig {
                    project: "app".into(),
                    token: Some("secret".into()),
                },
                TriggerConfig {
                    project: "docs".into(),
                    token: None,
                },
            ]
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = RemoteBuilderConfig::from_json_str(r#"{"trigers":[]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_empty_project_and_zero_capacity() {
        let err = RemoteBuilderConfig::from_json_str(
            r#"{"triggers":[{"project":"a"},{"project":"  "}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyProjectName { index: 1 }));

        let err =
            RemoteBuilderConfig::from_json_str(r#"{"schedule_queue_capacity":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroQueueCapacity));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"schedule_queue_capacity": 8, "triggers": [{{"project": "app", "token": "t"}}]}}"#
        )
        .unwrap();

        let cfg = RemoteBuilderConfig::load(file.path()).unwrap();
        assert_eq!(cfg.schedule_queue_capacity, 8);
        assert_eq!(cfg.triggers.len(), 1);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = RemoteBuilderConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn build_triggers_shares_scheduler() {
        let cfg = RemoteBuilderConfig::from_json_str(
            r#"{"triggers":[{"project":"app","token":"secret"},{"project":"docs"}]}"#,
        )
        .unwrap();
        let channel = Arc::new(ChannelScheduler::new(cfg.schedule_queue_capacity));
        let scheduler: Arc<dyn BuildScheduler> = channel.clone();

        let triggers = cfg.build_triggers(&scheduler);
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[0].project_name(), "app");
        assert_eq!(triggers[0].remote_build_token(), Some("secret"));
        assert_eq!(triggers[1].remote_build_token(), None);

        triggers[0].schedule_build("q", &[]);
        assert_eq!(channel.pending(), 1);
    }
}
