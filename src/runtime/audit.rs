//! Controller lifecycle audit hooks.
//!
//! Every lifecycle transition and reconciliation decision is reported as a
//! stage plus structured details, so callers can log, buffer, or assert on the
//! controller's progression without touching the event loop.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by `Cli`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAuditStage {
    /// The `cli` setting was registered with the host.
    SettingRegistered,
    /// The settings listener was attached.
    Initialized,
    /// `start` ran while the `cli` setting was disabled.
    StartSkipped,
    Started,
    Stopped,
    /// A queued event finished dispatching.
    EventDispatched,
    PromptIssued,
    AnswerAccepted,
    /// An answer arrived for a prompt that had already been superseded.
    AnswerDiscarded,
    /// The controller's own `log` write came back and was ignored.
    EchoConsumed,
    LogLevelCached,
    LogsSilenced,
    LogLevelRestored,
    MainRedrawn,
    LogsEntered,
    LogsExited,
    /// A host action (restart, variant selection, restore) was invoked.
    ActionInvoked,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct ControllerAuditEvent {
    pub timestamp: SystemTime,
    pub stage: ControllerAuditStage,
    pub details: Vec<(String, Value)>,
}

impl ControllerAuditEvent {
    fn new(stage: ControllerAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct ControllerAuditEventBuilder {
    event: ControllerAuditEvent,
}

impl ControllerAuditEventBuilder {
    pub fn new(stage: ControllerAuditStage) -> Self {
        Self {
            event: ControllerAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> ControllerAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait ControllerAudit: Send + Sync {
    fn record(&self, event: ControllerAuditEvent);
}

/// Keeps every audit event. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudit {
    events: Arc<Mutex<Vec<ControllerAuditEvent>>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ControllerAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<ControllerAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn count(&self, stage: ControllerAuditStage) -> usize {
        self.events()
            .iter()
            .filter(|event| event.stage == stage)
            .count()
    }
}

impl ControllerAudit for RecordingAudit {
    fn record(&self, event: ControllerAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
