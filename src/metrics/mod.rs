use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated by the controller while it is attached to a host.
#[derive(Debug, Default, Clone)]
pub struct CliMetrics {
    events: u64,
    prompts: u64,
    redraws: u64,
    screen_clears: u64,
    echoes_consumed: u64,
    silences: u64,
}

impl CliMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_prompt(&mut self) {
        self.prompts = self.prompts.saturating_add(1);
    }

    pub fn record_redraw(&mut self) {
        self.redraws = self.redraws.saturating_add(1);
    }

    pub fn record_clear(&mut self) {
        self.screen_clears = self.screen_clears.saturating_add(1);
    }

    pub fn record_echo(&mut self) {
        self.echoes_consumed = self.echoes_consumed.saturating_add(1);
    }

    pub fn record_silence(&mut self) {
        self.silences = self.silences.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            prompts: self.prompts,
            redraws: self.redraws,
            screen_clears: self.screen_clears,
            echoes_consumed: self.echoes_consumed,
            silences: self.silences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub prompts: u64,
    pub redraws: u64,
    pub screen_clears: u64,
    pub echoes_consumed: u64,
    pub silences: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::new(LogLevel::Info, target, "cli_metrics").with_fields(self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("prompts".to_string(), json!(self.prompts));
        map.insert("redraws".to_string(), json!(self.redraws));
        map.insert("screen_clears".to_string(), json!(self.screen_clears));
        map.insert("echoes_consumed".to_string(), json!(self.echoes_consumed));
        map.insert("silences".to_string(), json!(self.silences));
        map
    }
}
