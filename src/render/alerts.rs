use std::fmt;

use crate::host::Alert;

use super::Tone;

const STACK_LINES: usize = 3;
const STACK_INDENT: &str = "\n         ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Warning,
    Error,
}

impl AlertKind {
    fn label(self) -> &'static str {
        match self {
            AlertKind::Warning => "Warning",
            AlertKind::Error => "Error",
        }
    }

    fn tone(self) -> Tone {
        match self {
            AlertKind::Warning => Tone::Warn,
            AlertKind::Error => Tone::Alert,
        }
    }
}

/// One rendered alert. `text` may span several lines when a stack is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertLine {
    pub kind: AlertKind,
    pub text: String,
}

impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.kind.label(),
            self.kind.tone().paint(&self.text)
        )
    }
}

pub fn render_alerts(alerts: &[Alert]) -> Vec<AlertLine> {
    alerts.iter().map(render_alert).collect()
}

fn render_alert(alert: &Alert) -> AlertLine {
    let Some(error) = alert.error.as_ref() else {
        return AlertLine {
            kind: AlertKind::Warning,
            text: alert.message.clone(),
        };
    };

    let mut text = format!("{}: {}", alert.message, error.message);
    if let Some(stack) = error.stack.as_deref() {
        let mut lines = stack.lines();
        for line in lines.by_ref().take(STACK_LINES) {
            text.push_str(STACK_INDENT);
            text.push_str(line);
        }
        if lines.next().is_some() {
            text.push_str("...");
        }
    }

    AlertLine {
        kind: AlertKind::Error,
        text,
    }
}
