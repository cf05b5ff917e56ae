//! Decides how the controller reacts to host change notifications.
//!
//! The decision is pure: it only looks at the notification and a
//! [`ReconcileView`] of the controller. Applying the reactions is left to the
//! controller, in the order they are returned.

use serde_json::Value;

use crate::host::SettingsChange;

use super::guard::{LogLevelGuard, WriteEchoes};
use super::screens::Screen;

/// Settings whose change refreshes the main menu.
pub const REDRAW_KEYS: [&str; 6] = ["behavior", "delay", "host", "log", "watch", "watchLegacy"];

pub const CLI_SETTING: &str = "cli";
pub const LOG_SETTING: &str = "log";

#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    Start,
    Stop,
    /// The `log` change is the controller's own write coming back.
    ConsumeEcho(String),
    /// Any other setting the controller wrote itself.
    ConsumeWrite { key: String, value: Value },
    CacheLogLevel(String),
    Silence,
    RedrawMain,
    LeaveLogs,
}

/// Controller state the reconciler needs.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileView<'a> {
    pub screen: Screen,
    pub started: bool,
    pub guard: &'a LogLevelGuard,
    pub writes: &'a WriteEchoes,
}

pub struct ChangeReconciler;

impl ChangeReconciler {
    pub fn on_settings(view: &ReconcileView<'_>, change: &SettingsChange) -> Vec<Reaction> {
        let mut reactions = Vec::new();
        // Keys whose notification is the controller's own write coming back.
        let mut own: Vec<&str> = Vec::new();
        let log = change.get(LOG_SETTING);
        let echo = match log.and_then(Value::as_str) {
            Some(level) if view.guard.is_echo(level) => {
                reactions.push(Reaction::ConsumeEcho(level.to_string()));
                own.push(LOG_SETTING);
                true
            }
            _ => false,
        };
        for (key, value) in change {
            if echo && key == LOG_SETTING {
                continue;
            }
            if view.writes.is_echo(key, value) {
                reactions.push(Reaction::ConsumeWrite {
                    key: key.clone(),
                    value: value.clone(),
                });
                own.push(key.as_str());
            }
        }

        match change.get(CLI_SETTING).and_then(Value::as_bool) {
            Some(true) if !view.started => {
                reactions.push(Reaction::Start);
                return reactions;
            }
            Some(false) if view.started => {
                reactions.push(Reaction::Stop);
                return reactions;
            }
            _ => {}
        }

        if !view.started {
            return reactions;
        }

        if let (Some(level), false) = (log, echo) {
            if let Some(level) = level.as_str() {
                reactions.push(Reaction::CacheLogLevel(level.to_string()));
            }
            if view.screen != Screen::Logs {
                reactions.push(Reaction::Silence);
            }
        }

        if view.screen == Screen::Main
            && change.keys().any(|key| {
                REDRAW_KEYS.contains(&key.as_str()) && !own.contains(&key.as_str())
            })
        {
            reactions.push(Reaction::RedrawMain);
        }

        reactions
    }

    pub fn on_alerts(view: &ReconcileView<'_>) -> Vec<Reaction> {
        if view.started && view.screen == Screen::Main {
            vec![Reaction::RedrawMain]
        } else {
            Vec::new()
        }
    }

    /// A mocks reload only matters in logs mode; the main menu re-reads the
    /// collections the next time it is drawn.
    pub fn on_mocks(view: &ReconcileView<'_>) -> Vec<Reaction> {
        if view.started && view.screen == Screen::Logs {
            vec![Reaction::LeaveLogs]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(pairs: &[(&str, Value)]) -> SettingsChange {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    static NO_WRITES: WriteEchoes = WriteEchoes::new();

    fn view(screen: Screen, started: bool, guard: &LogLevelGuard) -> ReconcileView<'_> {
        ReconcileView {
            screen,
            started,
            guard,
            writes: &NO_WRITES,
        }
    }

    #[test]
    fn recognised_keys_redraw_main() {
        let guard = LogLevelGuard::new();
        for key in ["behavior", "delay", "host", "watch", "watchLegacy"] {
            let reactions =
                ChangeReconciler::on_settings(&view(Screen::Main, true, &guard), &change(&[(key, json!("foo"))]));
            assert_eq!(reactions, vec![Reaction::RedrawMain], "key {key}");
        }
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let guard = LogLevelGuard::new();
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Main, true, &guard),
            &change(&[("foo", json!(false))]),
        );
        assert!(reactions.is_empty());
    }

    #[test]
    fn other_screens_never_redraw() {
        let guard = LogLevelGuard::new();
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Mock, true, &guard),
            &change(&[("behavior", json!("foo"))]),
        );
        assert!(reactions.is_empty());
    }

    #[test]
    fn external_log_change_is_cached_and_silenced() {
        let guard = LogLevelGuard::new();
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Delay, true, &guard),
            &change(&[("log", json!("debug"))]),
        );
        assert_eq!(
            reactions,
            vec![Reaction::CacheLogLevel("debug".into()), Reaction::Silence]
        );
    }

    #[test]
    fn log_change_in_logs_mode_is_not_silenced() {
        let guard = LogLevelGuard::new();
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Logs, true, &guard),
            &change(&[("log", json!("debug"))]),
        );
        assert_eq!(reactions, vec![Reaction::CacheLogLevel("debug".into())]);
    }

    #[test]
    fn own_echo_is_consumed_without_silencing() {
        let mut guard = LogLevelGuard::new();
        guard.arm("silent");
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Main, true, &guard),
            &change(&[("log", json!("silent"))]),
        );
        assert_eq!(reactions, vec![Reaction::ConsumeEcho("silent".into())]);
    }

    #[test]
    fn combined_log_and_delay_apply_both_rules() {
        let guard = LogLevelGuard::new();
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Main, true, &guard),
            &change(&[("log", json!("warn")), ("delay", json!(100))]),
        );
        assert_eq!(
            reactions,
            vec![
                Reaction::CacheLogLevel("warn".into()),
                Reaction::Silence,
                Reaction::RedrawMain
            ]
        );
    }

    #[test]
    fn cli_flag_toggles_lifecycle() {
        let guard = LogLevelGuard::new();
        let enable = change(&[("cli", json!(true))]);
        let disable = change(&[("cli", json!(false))]);

        assert_eq!(
            ChangeReconciler::on_settings(&view(Screen::Main, false, &guard), &enable),
            vec![Reaction::Start]
        );
        assert!(ChangeReconciler::on_settings(&view(Screen::Main, true, &guard), &enable).is_empty());
        assert_eq!(
            ChangeReconciler::on_settings(&view(Screen::Main, true, &guard), &disable),
            vec![Reaction::Stop]
        );
        assert!(ChangeReconciler::on_settings(&view(Screen::Main, false, &guard), &disable).is_empty());
    }

    #[test]
    fn dormant_controller_only_consumes_echoes() {
        let mut guard = LogLevelGuard::new();
        guard.arm("info");
        let echo = ChangeReconciler::on_settings(
            &view(Screen::Main, false, &guard),
            &change(&[("log", json!("info")), ("delay", json!(5))]),
        );
        assert_eq!(echo, vec![Reaction::ConsumeEcho("info".into())]);

        let idle = LogLevelGuard::new();
        let external = ChangeReconciler::on_settings(
            &view(Screen::Main, false, &idle),
            &change(&[("log", json!("debug"))]),
        );
        assert!(external.is_empty());
    }

    #[test]
    fn alerts_redraw_only_on_main() {
        let guard = LogLevelGuard::new();
        assert_eq!(
            ChangeReconciler::on_alerts(&view(Screen::Main, true, &guard)),
            vec![Reaction::RedrawMain]
        );
        assert!(ChangeReconciler::on_alerts(&view(Screen::Behavior, true, &guard)).is_empty());
        assert!(ChangeReconciler::on_alerts(&view(Screen::Main, false, &guard)).is_empty());
    }

    #[test]
    fn mocks_reload_leaves_logs() {
        let guard = LogLevelGuard::new();
        assert_eq!(
            ChangeReconciler::on_mocks(&view(Screen::Logs, true, &guard)),
            vec![Reaction::LeaveLogs]
        );
        assert!(ChangeReconciler::on_mocks(&view(Screen::Main, true, &guard)).is_empty());
        assert!(ChangeReconciler::on_mocks(&view(Screen::Variant, true, &guard)).is_empty());
        assert!(ChangeReconciler::on_mocks(&view(Screen::Logs, false, &guard)).is_empty());
    }

    #[test]
    fn echo_next_to_foreign_key_still_redraws() {
        let mut guard = LogLevelGuard::new();
        guard.arm("silent");
        let reactions = ChangeReconciler::on_settings(
            &view(Screen::Main, true, &guard),
            &change(&[("log", json!("silent")), ("host", json!("localhost"))]),
        );
        assert_eq!(
            reactions,
            vec![Reaction::ConsumeEcho("silent".into()), Reaction::RedrawMain]
        );
    }

    #[test]
    fn own_write_is_consumed_without_redraw() {
        let guard = LogLevelGuard::new();
        let mut writes = WriteEchoes::new();
        writes.arm("behavior", json!("foo"));
        let main = ReconcileView {
            screen: Screen::Main,
            started: true,
            guard: &guard,
            writes: &writes,
        };

        let own = ChangeReconciler::on_settings(&main, &change(&[("behavior", json!("foo"))]));
        assert_eq!(
            own,
            vec![Reaction::ConsumeWrite {
                key: "behavior".into(),
                value: json!("foo")
            }]
        );

        let foreign = ChangeReconciler::on_settings(&main, &change(&[("behavior", json!("bar"))]));
        assert_eq!(foreign, vec![Reaction::RedrawMain]);

        let mixed = ChangeReconciler::on_settings(
            &main,
            &change(&[("behavior", json!("foo")), ("delay", json!(10))]),
        );
        assert_eq!(mixed.last(), Some(&Reaction::RedrawMain));
    }

    #[test]
    fn own_log_write_is_cached_without_redraw() {
        let mut guard = LogLevelGuard::new();
        guard.arm("silent");
        let mut writes = WriteEchoes::new();
        writes.arm("log", json!("debug"));
        let reactions = ChangeReconciler::on_settings(
            &ReconcileView {
                screen: Screen::Main,
                started: true,
                guard: &guard,
                writes: &writes,
            },
            &change(&[("log", json!("debug"))]),
        );
        assert_eq!(
            reactions,
            vec![
                Reaction::ConsumeWrite {
                    key: "log".into(),
                    value: json!("debug")
                },
                Reaction::CacheLogLevel("debug".into()),
                Reaction::Silence
            ]
        );
    }
}
