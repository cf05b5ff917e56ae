use std::fmt;

use crate::host::Core;

use super::Tone;

const EMPTY_SELECTION: &str = "-";

/// Labelled header value with its tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.tone.paint(&self.value))
    }
}

/// Legacy-mode values, present only when `pathLegacy` is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacySnapshot {
    pub watch: bool,
    pub behaviors: usize,
    pub current_behavior: Option<String>,
    pub fixtures: usize,
}

/// Point-in-time copy of everything the header shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub host: String,
    pub port: u64,
    pub delay: u64,
    pub current_mock: Option<String>,
    pub custom_variants: Vec<String>,
    pub mocks: usize,
    pub routes: usize,
    pub variants: usize,
    pub log_level: Option<String>,
    pub watch: bool,
    pub legacy: Option<LegacySnapshot>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3100,
            delay: 0,
            current_mock: None,
            custom_variants: Vec::new(),
            mocks: 0,
            routes: 0,
            variants: 0,
            log_level: None,
            watch: false,
            legacy: None,
        }
    }
}

impl StatusSnapshot {
    /// Read the header values from the host. `log_level` is the level the
    /// controller restores when logs are displayed, not the silenced one.
    pub fn capture<C: Core + ?Sized>(core: &C, log_level: Option<&str>) -> Self {
        let settings = core.settings();
        let mocks = core.mocks();
        let legacy = settings.get_bool("pathLegacy").then(|| LegacySnapshot {
            watch: settings.get_bool("watchLegacy"),
            behaviors: core.behaviors().count(),
            current_behavior: core.behaviors().current_id(),
            fixtures: core.fixtures().count(),
        });

        Self {
            host: settings
                .get_str("host")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: settings.get("port").and_then(|v| v.as_u64()).unwrap_or(3100),
            delay: settings.get_u64("delay"),
            current_mock: mocks.current(),
            custom_variants: mocks.custom_routes_variants(),
            mocks: mocks.plain_mocks().len(),
            routes: mocks.plain_routes().len(),
            variants: mocks.plain_routes_variants().len(),
            log_level: log_level.map(str::to_string),
            watch: settings.get_bool("watch"),
            legacy,
        }
    }

    pub fn server_url(&self) -> String {
        let host = if self.host == "0.0.0.0" {
            "localhost"
        } else {
            self.host.as_str()
        };
        format!("http://{}:{}", host, self.port)
    }
}

fn count_line(label: &str, count: usize) -> StatusLine {
    let tone = if count < 1 { Tone::Alert } else { Tone::Ok };
    StatusLine::new(label, count.to_string(), tone)
}

fn selection_line(label: &str, selection: Option<&str>) -> StatusLine {
    match selection {
        Some(id) => StatusLine::new(label, id, Tone::Ok),
        None => StatusLine::new(label, EMPTY_SELECTION, Tone::Alert),
    }
}

fn flag_line(label: &str, enabled: bool) -> StatusLine {
    StatusLine::new(label, enabled.to_string(), Tone::Warn)
}

/// Derive the ordered header lines. Positions are stable: the legacy block is
/// only ever appended after the watch flag.
pub fn render_status(snapshot: &StatusSnapshot) -> Vec<StatusLine> {
    let mut lines = Vec::with_capacity(12);

    lines.push(StatusLine::new(
        "Mocks server listening at",
        snapshot.server_url(),
        Tone::Ok,
    ));

    let delay_tone = if snapshot.delay > 0 {
        Tone::Warn
    } else {
        Tone::Ok
    };
    lines.push(StatusLine::new(
        "Delay",
        snapshot.delay.to_string(),
        delay_tone,
    ));

    lines.push(match snapshot.current_mock.as_deref() {
        Some(id) if !snapshot.custom_variants.is_empty() => StatusLine::new(
            "Current mock",
            format!(
                "{} (custom variants: {})",
                id,
                snapshot.custom_variants.join(",")
            ),
            Tone::Warn,
        ),
        other => selection_line("Current mock", other),
    });

    lines.push(count_line("Mocks", snapshot.mocks));
    lines.push(count_line("Routes", snapshot.routes));
    lines.push(count_line("Routes variants", snapshot.variants));
    lines.push(StatusLine::new(
        "Log level",
        snapshot.log_level.as_deref().unwrap_or(EMPTY_SELECTION),
        Tone::Ok,
    ));
    lines.push(flag_line("Watch enabled", snapshot.watch));

    if let Some(legacy) = snapshot.legacy.as_ref() {
        lines.push(flag_line("Watch legacy enabled", legacy.watch));
        lines.push(count_line("Behaviors", legacy.behaviors));
        lines.push(selection_line(
            "Current behavior",
            legacy.current_behavior.as_deref(),
        ));
        lines.push(count_line("Fixtures", legacy.fixtures));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryCore;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            mocks: 2,
            routes: 1,
            variants: 2,
            current_mock: Some("base".into()),
            ..StatusSnapshot::default()
        }
    }

    #[test]
    fn server_url_is_first_and_normalizes_any_address() {
        let lines = render_status(&snapshot());
        assert_eq!(lines[0].label, "Mocks server listening at");
        assert_eq!(lines[0].value, "http://localhost:3100");
    }

    #[test]
    fn custom_host_is_kept() {
        let lines = render_status(&StatusSnapshot {
            host: "foo-host".into(),
            ..snapshot()
        });
        assert!(lines[0].to_string().contains("http://foo-host"));
    }

    #[test]
    fn delay_tone_depends_on_value() {
        let idle = render_status(&snapshot());
        assert_eq!(idle[1].tone, Tone::Ok);
        assert!(idle[1].to_string().contains(&Tone::Ok.paint("0")));

        let delayed = render_status(&StatusSnapshot {
            delay: 1000,
            ..snapshot()
        });
        assert_eq!(delayed[1].tone, Tone::Warn);
        assert!(delayed[1].to_string().contains(&Tone::Warn.paint("1000")));
    }

    #[test]
    fn missing_mock_is_flagged() {
        let lines = render_status(&StatusSnapshot {
            current_mock: None,
            ..snapshot()
        });
        assert_eq!(lines[2].value, "-");
        assert_eq!(lines[2].tone, Tone::Alert);
    }

    #[test]
    fn current_mock_with_custom_variants_lists_them() {
        let lines = render_status(&StatusSnapshot {
            current_mock: Some("foo".into()),
            custom_variants: vec!["a".into(), "b".into()],
            ..snapshot()
        });
        assert_eq!(lines[2].tone, Tone::Warn);
        assert!(
            lines[2]
                .to_string()
                .contains(&Tone::Warn.paint("foo (custom variants: a,b)"))
        );
    }

    #[test]
    fn zero_counts_are_flagged() {
        let lines = render_status(&StatusSnapshot {
            mocks: 0,
            routes: 0,
            variants: 0,
            ..snapshot()
        });
        assert!(lines[3..6].iter().all(|line| line.tone == Tone::Alert));

        let populated = render_status(&StatusSnapshot {
            mocks: 4,
            ..snapshot()
        });
        assert_eq!(populated[3].value, "4");
        assert_eq!(populated[3].tone, Tone::Ok);
    }

    #[test]
    fn watch_flag_draws_attention_either_way() {
        for watch in [true, false] {
            let lines = render_status(&StatusSnapshot {
                watch,
                ..snapshot()
            });
            assert_eq!(lines[7].value, watch.to_string());
            assert_eq!(lines[7].tone, Tone::Warn);
        }
    }

    #[test]
    fn legacy_block_is_appended_only_in_legacy_mode() {
        assert_eq!(render_status(&snapshot()).len(), 8);

        let lines = render_status(&StatusSnapshot {
            legacy: Some(LegacySnapshot {
                watch: true,
                behaviors: 0,
                current_behavior: None,
                fixtures: 10,
            }),
            ..snapshot()
        });
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[8].tone, Tone::Warn);
        assert_eq!(lines[9].tone, Tone::Alert);
        assert_eq!(lines[10].value, "-");
        assert_eq!(lines[11].value, "10");
        assert_eq!(lines[11].tone, Tone::Ok);
    }

    #[test]
    fn capture_reads_host_state() {
        let core = InMemoryCore::builder()
            .setting("host", "0.0.0.0")
            .setting("port", 3200)
            .setting("delay", 250)
            .setting("pathLegacy", true)
            .behaviors(["standard", "dynamic"])
            .mock("base", &[])
            .route("users", "/api/users", &["success", "error"])
            .custom_variant("users:error")
            .fixtures(3)
            .build();
        let snapshot = StatusSnapshot::capture(&core, Some("info"));
        assert_eq!(snapshot.server_url(), "http://localhost:3200");
        assert_eq!(snapshot.delay, 250);
        assert_eq!(snapshot.current_mock.as_deref(), Some("base"));
        assert_eq!(snapshot.custom_variants, vec!["users:error"]);
        assert_eq!(snapshot.variants, 2);
        assert_eq!(snapshot.log_level.as_deref(), Some("info"));
        let legacy = snapshot.legacy.unwrap();
        assert_eq!(legacy.behaviors, 2);
        assert_eq!(legacy.current_behavior.as_deref(), Some("standard"));
        assert_eq!(legacy.fixtures, 3);
    }
}
