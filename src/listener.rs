//! Remote build listener.
//!
//! [`RemoteBuildListener`] receives application messages from the bus
//! collaborator, decodes remote build requests and schedules every matching
//! trigger. A malformed message or a misconfigured trigger is logged and
//! never stops processing of other triggers or later messages.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PayloadError;
use crate::matcher::{evaluate, MatchOutput};
use crate::payload::BuildRequest;
use crate::registry::TriggerRegistry;
use crate::trigger::BuildTrigger;

/// Display name of the listener.
pub const PLUGIN_NAME: &str = "Remote Builder";

/// Application id whose messages are routed to this listener.
pub const PLUGIN_APP_ID: &str = "remote-build";

/// Callbacks the bus collaborator invokes on an application listener.
///
/// Implementations must be callable from several delivery threads at once.
pub trait ApplicationMessageListener: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Application id of the messages this listener wants.
    fn app_id(&self) -> &str;

    /// A subscription to `queue_name` was established.
    fn on_bind(&self, queue_name: &str);

    /// A subscription to `queue_name` was torn down.
    fn on_unbind(&self, queue_name: &str);

    /// A message arrived on `queue_name`.
    fn on_receive(&self, queue_name: &str, content_type: &str, body: &[u8]);
}

/// What a single dispatch did.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Content type is not JSON; nothing was looked at.
    Ignored,
    /// The body could not be decoded or parsed; the message was dropped.
    Rejected(PayloadError),
    /// The request was matched against the registry.
    Dispatched {
        /// Number of `schedule_build` calls made.
        scheduled: usize,
    },
}

impl DispatchOutcome {
    /// Number of builds scheduled, zero unless dispatched.
    #[must_use]
    pub const fn scheduled(&self) -> usize {
        match self {
            Self::Dispatched { scheduled } => *scheduled,
            Self::Ignored | Self::Rejected(_) => 0,
        }
    }
}

/// Routes remote build messages to registered triggers.
#[derive(Debug, Default)]
pub struct RemoteBuildListener {
    triggers: TriggerRegistry,
}

impl RemoteBuildListener {
    /// Create a listener with no triggers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Returns false if it was already registered.
    pub fn add_trigger(&self, trigger: Arc<dyn BuildTrigger>) -> bool {
        self.triggers.insert(trigger)
    }

    /// Deregister a trigger. Returns false if it was not registered.
    pub fn remove_trigger(&self, trigger: &Arc<dyn BuildTrigger>) -> bool {
        self.triggers.remove(trigger)
    }

    /// The live trigger set.
    #[must_use]
    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// Decode one message and schedule every matching trigger.
    pub fn dispatch(&self, queue_name: &str, content_type: &str, body: &[u8]) -> DispatchOutcome {
        let request = match BuildRequest::decode(content_type, body) {
            Ok(request) => request,
            Err(err) if err.is_ignored() => {
                debug!(queue = queue_name, content_type, "ignoring non-JSON message");
                return DispatchOutcome::Ignored;
            }
            Err(err) => {
                if err.is_decode() {
                    warn!(
                        queue = queue_name,
                        error = %err,
                        "Unsupported encoding. Is message body not a string?"
                    );
                } else {
                    warn!(queue = queue_name, error = %err, "Invalid JSON format string");
                }
                return DispatchOutcome::Rejected(err);
            }
        };

        DispatchOutcome::Dispatched {
            scheduled: self.schedule_matching(queue_name, &request),
        }
    }

    fn schedule_matching(&self, queue_name: &str, request: &BuildRequest) -> usize {
        let mut scheduled = 0;
        for trigger in self.triggers.snapshot().iter() {
            match evaluate(&**trigger, request) {
                MatchOutput::Match => {
                    trigger.schedule_build(queue_name, request.parameters());
                    scheduled += 1;
                }
                MatchOutput::NoMatch => {}
                MatchOutput::Unconfigured => {
                    warn!(
                        project = trigger.project_name(),
                        "ignoring remote build trigger: no token set"
                    );
                }
                MatchOutput::MissingField(field) => {
                    debug!(
                        project = trigger.project_name(),
                        field,
                        "remote build request lacks field; not matching"
                    );
                }
            }
        }
        scheduled
    }
}

impl ApplicationMessageListener for RemoteBuildListener {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn app_id(&self) -> &str {
        PLUGIN_APP_ID
    }

    fn on_bind(&self, queue_name: &str) {
        info!(queue = queue_name, "Bind to: {queue_name}");
    }

    fn on_unbind(&self, queue_name: &str) {
        info!(queue = queue_name, "Unbind from: {queue_name}");
    }

    fn on_receive(&self, queue_name: &str, content_type: &str, body: &[u8]) {
        let _ = self.dispatch(queue_name, content_type, body);
    }
}
