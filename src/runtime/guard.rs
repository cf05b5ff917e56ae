use serde_json::Value;

/// Tells the controller's own `log` writes apart from everyone else's.
///
/// The guard is armed with the value the controller is about to write and
/// consumed by the change notification carrying that value. A notification
/// with any other value was queued by someone else and leaves the guard armed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogLevelGuard {
    pending: Option<String>,
}

impl LogLevelGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, level: impl Into<String>) {
        self.pending = Some(level.into());
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_echo(&self, incoming: &str) -> bool {
        self.pending.as_deref() == Some(incoming)
    }

    /// Returns `true` when `incoming` is the controller's own echo.
    pub fn consume(&mut self, incoming: &str) -> bool {
        if self.is_echo(incoming) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Settings the controller wrote and whose change notification has not come
/// back yet. One pending value per key; a newer write replaces the older one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriteEchoes {
    pending: Vec<(String, Value)>,
}

impl WriteEchoes {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn arm(&mut self, key: &str, value: Value) {
        self.pending.retain(|(pending, _)| pending != key);
        self.pending.push((key.to_string(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_echo(&self, key: &str, incoming: &Value) -> bool {
        self.pending
            .iter()
            .any(|(pending, value)| pending == key && value == incoming)
    }

    pub fn consume(&mut self, key: &str, incoming: &Value) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|(pending, value)| !(pending == key && value == incoming));
        self.pending.len() != before
    }
}
