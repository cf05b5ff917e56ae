//! Pure header derivation.
//!
//! Nothing in here touches the terminal: the controller captures a snapshot
//! of the host, these functions turn it into styled lines, and the inquirer
//! prints them above the current question.

mod alerts;
mod status;

pub use alerts::{AlertKind, AlertLine, render_alerts};
pub use status::{LegacySnapshot, StatusLine, StatusSnapshot, render_status};

use std::fmt;

use crossterm::style::{Color, Stylize};

pub const HEADER_TITLE: &str = ">> Mocks server";
pub const ALERTS_TITLE: &str = "ALERTS";

/// Visual weight given to a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Warn,
    Alert,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Ok => Color::Green,
            Tone::Warn => Color::Yellow,
            Tone::Alert => Color::Red,
        }
    }

    pub fn paint(self, text: &str) -> String {
        text.with(self.color()).to_string()
    }
}

/// Everything printed above a question when the screen is cleared with a header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub alerts: Vec<AlertLine>,
    pub status: Vec<StatusLine>,
}

impl Header {
    pub fn new(status: Vec<StatusLine>, alerts: Vec<AlertLine>) -> Self {
        Self { alerts, status }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.status.len() + self.alerts.len() + 4);
        if !self.alerts.is_empty() {
            lines.push(ALERTS_TITLE.bold().to_string());
            lines.extend(self.alerts.iter().map(ToString::to_string));
            lines.push(String::new());
        }
        lines.push(HEADER_TITLE.bold().to_string());
        lines.extend(self.status.iter().map(|line| format!("   {line}")));
        lines.push(String::new());
        lines
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Alert;

    #[test]
    fn alerts_block_precedes_status() {
        let header = Header::new(
            vec![StatusLine::new("Delay", "0", Tone::Ok)],
            render_alerts(&[Alert::warning("Defined behavior \"foo\" was not found")]),
        );
        let lines = header.lines();
        assert!(lines[0].contains(ALERTS_TITLE));
        assert!(lines[1].contains("was not found"));
        assert!(lines.iter().any(|line| line.contains("Delay: ")));
    }

    #[test]
    fn no_alerts_block_without_alerts() {
        let header = Header::new(vec![StatusLine::new("Mocks", "1", Tone::Ok)], Vec::new());
        assert!(!header.to_string().contains(ALERTS_TITLE));
    }

    #[test]
    fn tone_paint_wraps_text_in_color() {
        assert_eq!(Tone::Alert.paint("0"), "0".with(Color::Red).to_string());
        assert_ne!(Tone::Ok.paint("0"), Tone::Warn.paint("0"));
    }
}
