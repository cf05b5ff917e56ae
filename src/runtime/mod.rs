//! The interactive controller.
//!
//! [`Cli`] owns the screen state machine, the log level cache and the echo
//! guard. Host notifications and operator answers are funnelled through one
//! [`EventQueue`] and dispatched strictly one at a time, so a transition always
//! completes before the next event is looked at.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::host::{Core, SettingDescriptor, SettingKind, SettingsChange, Subscription};
use crate::logging::{LogEvent, LogLevel, Logger, json_kv};
use crate::metrics::{CliMetrics, MetricSnapshot};
use crate::render::{Header, StatusSnapshot, render_alerts, render_status};
use crate::{CliError, Result};

pub mod audit;
pub mod driver;
pub mod guard;
pub mod prompt;
pub mod reconcile;
pub mod screens;

use audit::{ControllerAudit, ControllerAuditEventBuilder, ControllerAuditStage};
use guard::{LogLevelGuard, WriteEchoes};
use prompt::{
    Answer, Choice, ClearScreen, DelayQuestion, Inquirer, Prompt, PromptId, Question,
    ScriptedInquirer,
};
use reconcile::{CLI_SETTING, ChangeReconciler, LOG_SETTING, Reaction, ReconcileView};
use screens::{LOG_LEVELS, MenuContext, Screen, ScreenState, main_choices};

pub const DISPLAY_NAME: &str = "@mocks-server/plugin-inquirer-cli";
pub const SILENT_LEVEL: &str = "silent";

const CONTROLLER_TARGET: &str = "mocks_cli::controller";
const MAIN_MESSAGE: &str = "Select action:";

/// Descriptor of the `cli` option registered with the host.
pub fn cli_setting() -> SettingDescriptor {
    SettingDescriptor {
        name: CLI_SETTING.to_string(),
        kind: SettingKind::Boolean,
        description: "Start interactive CLI plugin".to_string(),
        default: json!(true),
    }
}

/// Configuration knobs for the controller.
#[derive(Clone)]
pub struct CliConfig {
    /// How long the terminal driver waits for input before pumping the queue.
    pub tick_interval: Duration,
    /// Optional structured logger used by the controller.
    pub logger: Option<Logger>,
    /// Metrics accumulator, snapshotted when the controller stops.
    pub metrics: Option<Arc<Mutex<CliMetrics>>>,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
    /// Receives every lifecycle and reconciliation decision.
    pub audit: Option<Arc<dyn ControllerAudit>>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            logger: None,
            metrics: None,
            metrics_target: "mocks_cli::metrics".to_string(),
            audit: None,
        }
    }
}

impl CliConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(CliMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<CliMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Everything the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum CliEvent {
    Answer { prompt: PromptId, answer: Answer },
    SettingsChanged(SettingsChange),
    AlertsChanged,
    MocksChanged,
    /// The operator left logs mode.
    LogsModeExited,
}

impl CliEvent {
    fn describe(&self) -> &'static str {
        match self {
            CliEvent::Answer { .. } => "answer",
            CliEvent::SettingsChanged(_) => "settings_changed",
            CliEvent::AlertsChanged => "alerts_changed",
            CliEvent::MocksChanged => "mocks_changed",
            CliEvent::LogsModeExited => "logs_mode_exited",
        }
    }
}

/// FIFO of pending [`CliEvent`]s, owned by the controller.
pub struct EventQueue {
    sender: Sender<CliEvent>,
    receiver: Receiver<CliEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: self.sender.clone(),
        }
    }

    /// Take the oldest queued event without blocking.
    pub fn try_next(&self) -> Option<CliEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle used by host listeners and inquirers to queue events.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: Sender<CliEvent>,
}

impl EventSender {
    pub fn send(&self, event: CliEvent) -> Result<()> {
        self.inner.send(event).map_err(|_| CliError::QueueClosed)
    }
}

pub struct Cli<C: Core + ?Sized, I: Inquirer> {
    core: Arc<C>,
    inquirer: I,
    queue: EventQueue,
    config: CliConfig,
    screens: ScreenState,
    guard: LogLevelGuard,
    echoes: WriteEchoes,
    log_level: Option<String>,
    initialized: bool,
    started: bool,
    settings_subscription: Option<Subscription>,
    subscriptions: Vec<Subscription>,
    start_instant: Option<Instant>,
}

impl<C: Core + ?Sized, I: Inquirer> Cli<C, I> {
    pub fn new(core: Arc<C>, inquirer: I, queue: EventQueue) -> Self {
        Self::with_config(core, inquirer, queue, CliConfig::default())
    }

    /// Build the controller and register the `cli` option with the host.
    pub fn with_config(core: Arc<C>, inquirer: I, queue: EventQueue, config: CliConfig) -> Self {
        let cli = Self {
            core,
            inquirer,
            queue,
            config,
            screens: ScreenState::new(),
            guard: LogLevelGuard::new(),
            echoes: WriteEchoes::new(),
            log_level: None,
            initialized: false,
            started: false,
            settings_subscription: None,
            subscriptions: Vec::new(),
            start_instant: None,
        };
        cli.core.add_setting(cli_setting());
        cli.record_audit(
            ControllerAuditStage::SettingRegistered,
            [json_kv("name", CLI_SETTING)],
        );
        cli
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    /// Attach the settings listener. It stays attached across stop/start so
    /// the controller can react to `cli` being switched back on.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let sender = self.queue.sender();
        self.settings_subscription = Some(self.core.on_change_settings(Box::new(move |change| {
            let _ = sender.send(CliEvent::SettingsChanged(change));
        })));
        self.initialized = true;
        let enabled = self.core.settings().get_bool(CLI_SETTING);
        self.log_event(
            LogLevel::Info,
            "cli_initialized",
            [json_kv("enabled", enabled)],
        );
        self.record_audit(ControllerAuditStage::Initialized, [json_kv("enabled", enabled)]);
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.init()?;
        if !self.core.settings().get_bool(CLI_SETTING) {
            self.log_event(LogLevel::Debug, "start_skipped", std::iter::empty());
            self.record_audit(ControllerAuditStage::StartSkipped, std::iter::empty());
            return Ok(());
        }

        self.started = true;
        self.start_instant = Some(Instant::now());
        self.attach_listeners();
        self.log_level = self.core.settings().get_str(LOG_SETTING);
        self.record_audit(
            ControllerAuditStage::LogLevelCached,
            [json_kv("level", self.log_level.clone())],
        );
        self.silence();
        self.log_event(
            LogLevel::Info,
            "cli_started",
            [json_kv("log_level", self.log_level.clone())],
        );
        self.record_audit(ControllerAuditStage::Started, std::iter::empty());
        self.display_main()
    }

    /// Detach the alerts and mocks listeners, hand the log level back to the
    /// host and clear the screen. Does nothing while dormant.
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        let released = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.release();
        }
        if self.screens.current() == Screen::Logs {
            self.inquirer.exit_logs_mode()?;
        }
        self.screens.enter(Screen::Main);
        self.restore_log_level();
        self.clear(ClearScreen::Plain)?;

        let uptime_ms = self
            .start_instant
            .take()
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.log_event(
            LogLevel::Info,
            "cli_stopped",
            [
                json_kv("uptime_ms", uptime_ms),
                json_kv("listeners_released", released),
            ],
        );
        self.record_audit(
            ControllerAuditStage::Stopped,
            [json_kv("listeners_released", released)],
        );
        self.emit_metrics(Duration::from_millis(uptime_ms));
        Ok(())
    }

    /// Handle one event to completion.
    pub fn dispatch(&mut self, event: CliEvent) -> Result<()> {
        self.record_metric(CliMetrics::record_event);
        let label = event.describe();
        match event {
            CliEvent::Answer { prompt, answer } => self.handle_answer(prompt, answer)?,
            CliEvent::SettingsChanged(change) => {
                let reactions = ChangeReconciler::on_settings(&self.view(), &change);
                self.apply(reactions)?;
            }
            CliEvent::AlertsChanged => {
                let reactions = ChangeReconciler::on_alerts(&self.view());
                self.apply(reactions)?;
            }
            CliEvent::MocksChanged => {
                let reactions = ChangeReconciler::on_mocks(&self.view());
                self.apply(reactions)?;
            }
            CliEvent::LogsModeExited => self.leave_logs()?,
        }
        self.log_event(
            LogLevel::Debug,
            "event_dispatched",
            [
                json_kv("event", label),
                json_kv("screen", self.screens.current().as_str()),
            ],
        );
        self.record_audit(
            ControllerAuditStage::EventDispatched,
            [json_kv("event", label)],
        );
        Ok(())
    }

    /// Dispatch every queued event, including the ones queued while
    /// dispatching. Returns how many were handled.
    pub fn pump(&mut self) -> Result<usize> {
        let mut dispatched = 0;
        while let Some(event) = self.queue.try_next() {
            self.dispatch(event)?;
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// Start, then feed a fixed sequence of events, draining the queue after
    /// each one.
    pub fn run_scripted<E>(&mut self, events: E) -> Result<()>
    where
        E: IntoIterator<Item = CliEvent>,
    {
        self.start()?;
        self.pump()?;
        for event in events {
            self.dispatch(event)?;
            self.pump()?;
        }
        Ok(())
    }

    /// Header shown above every prompt.
    pub fn header(&self) -> Header {
        let snapshot = StatusSnapshot::capture(self.core.as_ref(), self.log_level.as_deref());
        Header::new(render_status(&snapshot), render_alerts(&self.core.alerts()))
    }

    pub fn events(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn core(&self) -> &Arc<C> {
        &self.core
    }

    pub fn inquirer(&self) -> &I {
        &self.inquirer
    }

    pub fn inquirer_mut(&mut self) -> &mut I {
        &mut self.inquirer
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn current_screen(&self) -> Screen {
        self.screens.current()
    }

    pub fn pending_prompt(&self) -> Option<PromptId> {
        self.screens.pending()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Level restored on the host while logs are displayed.
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    /// Whether a notification for one of the controller's own writes is
    /// still expected.
    pub fn is_echo_pending(&self) -> bool {
        self.guard.is_armed() || !self.echoes.is_empty()
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let uptime = self
            .start_instant
            .map(|start| start.elapsed())
            .unwrap_or_default();
        self.config
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.lock().ok().map(|guard| guard.snapshot(uptime)))
    }

    fn view(&self) -> ReconcileView<'_> {
        ReconcileView {
            screen: self.screens.current(),
            started: self.started,
            guard: &self.guard,
            writes: &self.echoes,
        }
    }

    fn apply(&mut self, reactions: Vec<Reaction>) -> Result<()> {
        for reaction in reactions {
            match reaction {
                Reaction::Start => self.start()?,
                Reaction::Stop => self.stop()?,
                Reaction::ConsumeEcho(level) => {
                    if self.guard.consume(&level) {
                        self.record_metric(CliMetrics::record_echo);
                        self.log_event(
                            LogLevel::Debug,
                            "echo_consumed",
                            [json_kv("level", level.as_str())],
                        );
                        self.record_audit(
                            ControllerAuditStage::EchoConsumed,
                            [json_kv("level", level)],
                        );
                    }
                }
                Reaction::ConsumeWrite { key, value } => {
                    if self.echoes.consume(&key, &value) {
                        self.record_metric(CliMetrics::record_echo);
                        self.record_audit(
                            ControllerAuditStage::EchoConsumed,
                            [json_kv("setting", key.as_str()), json_kv("value", value)],
                        );
                    }
                }
                Reaction::CacheLogLevel(level) => {
                    self.record_audit(
                        ControllerAuditStage::LogLevelCached,
                        [json_kv("level", level.as_str())],
                    );
                    self.log_level = Some(level);
                }
                Reaction::Silence => self.silence(),
                Reaction::RedrawMain => {
                    self.record_metric(CliMetrics::record_redraw);
                    self.record_audit(ControllerAuditStage::MainRedrawn, std::iter::empty());
                    self.display_main()?;
                }
                Reaction::LeaveLogs => {
                    self.inquirer.exit_logs_mode()?;
                    self.leave_logs()?;
                }
            }
        }
        Ok(())
    }

    fn attach_listeners(&mut self) {
        let alerts = self.queue.sender();
        self.subscriptions
            .push(self.core.on_change_alerts(Box::new(move |()| {
                let _ = alerts.send(CliEvent::AlertsChanged);
            })));
        let mocks = self.queue.sender();
        self.subscriptions
            .push(self.core.on_change_mocks(Box::new(move |()| {
                let _ = mocks.send(CliEvent::MocksChanged);
            })));
    }

    fn handle_answer(&mut self, prompt: PromptId, answer: Answer) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        if !self.screens.settle(prompt) {
            self.log_event(
                LogLevel::Debug,
                "answer_discarded",
                [json_kv("prompt", prompt.get())],
            );
            self.record_audit(
                ControllerAuditStage::AnswerDiscarded,
                [json_kv("prompt", prompt.get())],
            );
            return Ok(());
        }

        let screen = self.screens.current();
        self.record_audit(
            ControllerAuditStage::AnswerAccepted,
            [
                json_kv("screen", screen.as_str()),
                json_kv("prompt", prompt.get()),
            ],
        );

        match (screen, answer) {
            (Screen::Main, Answer::Choice(value)) => match Screen::from_id(&value) {
                Some(Screen::Main) | None => self.display_main(),
                Some(next) => self.open_screen(next),
            },
            (Screen::Behavior | Screen::Mock | Screen::Variant, Answer::Choice(id)) => {
                if self.candidates(screen).is_empty() {
                    return self.display_main();
                }
                match screen {
                    Screen::Behavior => self.write_setting("behavior", json!(id)),
                    Screen::Mock => self.write_setting("mock", json!(id)),
                    _ => {
                        self.core.mocks().use_route_variant(&id);
                        self.record_action("use_route_variant", Some(id.as_str()));
                    }
                }
                self.display_main()
            }
            (Screen::Delay, Answer::Number(ms)) => {
                self.write_setting("delay", json!(ms));
                self.display_main()
            }
            (Screen::Delay, Answer::Choice(raw)) => {
                let parsed = DelayQuestion::filter(&raw);
                match parsed {
                    Some(ms) if DelayQuestion::validate(parsed) => {
                        self.write_setting("delay", json!(ms));
                        self.display_main()
                    }
                    _ => self.open_screen(Screen::Delay),
                }
            }
            (Screen::LogLevel, Answer::Choice(level)) => {
                self.log_level = Some(level.clone());
                self.record_audit(
                    ControllerAuditStage::LogLevelCached,
                    [json_kv("level", level.as_str())],
                );
                self.write_setting(LOG_SETTING, json!(level));
                self.display_main()
            }
            _ => self.display_main(),
        }
    }

    fn open_screen(&mut self, screen: Screen) -> Result<()> {
        self.screens.enter(screen);
        self.clear_with_header()?;
        match screen {
            Screen::Main => self.display_main(),
            Screen::Behavior => self.prompt_list(screen, "Please choose behavior"),
            Screen::Mock => self.prompt_list(screen, "Please choose mock"),
            Screen::Variant => self.prompt_list(screen, "Please choose route variant"),
            Screen::Delay => {
                let current = self.core.settings().get_u64("delay");
                self.prompt(
                    screen,
                    Question::Number {
                        message: DelayQuestion::MESSAGE.to_string(),
                        default: Some(current),
                    },
                )
            }
            Screen::LogLevel => self.prompt(
                screen,
                Question::Select {
                    message: "Please choose log level".to_string(),
                    choices: LOG_LEVELS
                        .iter()
                        .map(|level| Choice::new(*level, level))
                        .collect(),
                },
            ),
            Screen::Logs => self.enter_logs(),
            transient if transient.is_transient() => {
                self.run_action(transient);
                self.display_main()
            }
            _ => self.display_main(),
        }
    }

    fn run_action(&mut self, screen: Screen) {
        match screen {
            Screen::Restart => {
                self.core.restart_server();
                self.record_action("restart_server", None);
            }
            Screen::RestoreVariants => {
                self.core.mocks().restore_routes_variants();
                self.record_action("restore_routes_variants", None);
            }
            Screen::Watch => self.toggle("watch"),
            Screen::WatchLegacy => self.toggle("watchLegacy"),
            _ => {}
        }
    }

    fn candidates(&self, screen: Screen) -> Vec<String> {
        match screen {
            Screen::Behavior => self.core.behaviors().ids(),
            Screen::Mock => self.core.mocks().ids(),
            Screen::Variant => self
                .core
                .mocks()
                .plain_routes_variants()
                .into_iter()
                .map(|variant| variant.id)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn prompt_list(&mut self, screen: Screen, message: &str) -> Result<()> {
        let source = self.candidates(screen);
        if source.is_empty() {
            self.log_event(
                LogLevel::Warn,
                "empty_list",
                [json_kv("screen", screen.as_str())],
            );
            return self.display_main();
        }
        self.prompt(
            screen,
            Question::Autocomplete {
                message: message.to_string(),
                source,
            },
        )
    }

    fn toggle(&mut self, name: &str) {
        let enabled = !self.core.settings().get_bool(name);
        self.write_setting(name, json!(enabled));
    }

    fn display_main(&mut self) -> Result<()> {
        let settings = self.core.settings();
        let ctx = MenuContext {
            legacy: settings.get_bool("pathLegacy"),
            behaviors: self.core.behaviors().count(),
            mocks: self.core.mocks().ids().len(),
            variants: self.core.mocks().plain_routes_variants().len(),
        };
        self.screens.enter(Screen::Main);
        self.clear_with_header()?;
        self.prompt(
            Screen::Main,
            Question::Select {
                message: MAIN_MESSAGE.to_string(),
                choices: main_choices(&ctx),
            },
        )
    }

    fn prompt(&mut self, screen: Screen, question: Question) -> Result<()> {
        let id = self.screens.issue(screen);
        self.record_metric(CliMetrics::record_prompt);
        self.record_audit(
            ControllerAuditStage::PromptIssued,
            [
                json_kv("screen", screen.as_str()),
                json_kv("prompt", id.get()),
            ],
        );
        self.inquirer.inquire(Prompt {
            id,
            screen,
            question,
        })
    }

    fn enter_logs(&mut self) -> Result<()> {
        self.inquirer.logs_mode()?;
        self.restore_log_level();
        self.log_event(
            LogLevel::Info,
            "logs_entered",
            [json_kv("level", self.log_level.clone())],
        );
        self.record_audit(ControllerAuditStage::LogsEntered, std::iter::empty());
        Ok(())
    }

    fn leave_logs(&mut self) -> Result<()> {
        if !self.started || self.screens.current() != Screen::Logs {
            return Ok(());
        }
        self.silence();
        self.log_event(LogLevel::Info, "logs_exited", std::iter::empty());
        self.record_audit(ControllerAuditStage::LogsExited, std::iter::empty());
        self.display_main()
    }

    fn clear_with_header(&mut self) -> Result<()> {
        let header = self.header();
        self.clear(ClearScreen::WithHeader(header))
    }

    fn clear(&mut self, clear: ClearScreen) -> Result<()> {
        self.record_metric(CliMetrics::record_clear);
        self.inquirer.clear_screen(clear)
    }

    fn silence(&mut self) {
        if self.write_log_level(SILENT_LEVEL) {
            self.record_metric(CliMetrics::record_silence);
            self.log_event(LogLevel::Debug, "logs_silenced", std::iter::empty());
            self.record_audit(ControllerAuditStage::LogsSilenced, std::iter::empty());
        }
    }

    fn restore_log_level(&mut self) {
        let Some(level) = self.log_level.clone() else {
            return;
        };
        if self.write_log_level(&level) {
            self.record_audit(
                ControllerAuditStage::LogLevelRestored,
                [json_kv("level", level)],
            );
        }
    }

    // The guard is only armed for writes that change the host value: a no-op
    // write produces no notification to consume it.
    fn write_log_level(&mut self, level: &str) -> bool {
        let settings = self.core.settings();
        if settings.get_str(LOG_SETTING).as_deref() == Some(level) {
            return false;
        }
        self.guard.arm(level);
        settings.set(LOG_SETTING, json!(level));
        true
    }

    // Only writes that change the host value produce a notification to match.
    fn write_setting(&mut self, name: &str, value: Value) {
        self.log_event(
            LogLevel::Info,
            "setting_written",
            [json_kv("name", name), json_kv("value", value.clone())],
        );
        let settings = self.core.settings();
        if settings.get(name).as_ref() != Some(&value) {
            self.echoes.arm(name, value.clone());
        }
        settings.set(name, value);
    }

    fn record_action(&self, action: &str, target: Option<&str>) {
        self.log_event(
            LogLevel::Info,
            "action_invoked",
            [json_kv("action", action), json_kv("target", target)],
        );
        self.record_audit(
            ControllerAuditStage::ActionInvoked,
            [json_kv("action", action), json_kv("target", target)],
        );
    }

    fn log_event<F>(&self, level: LogLevel, message: &str, fields: F)
    where
        F: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = LogEvent::new(level, CONTROLLER_TARGET, message).with_fields(fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_audit<F>(&self, stage: ControllerAuditStage, details: F)
    where
        F: IntoIterator<Item = (String, Value)>,
    {
        if let Some(audit) = self.config.audit.as_ref() {
            let mut builder = ControllerAuditEventBuilder::new(stage);
            for (key, value) in details {
                builder.detail(key, value);
            }
            audit.record(builder.finish());
        }
    }

    fn record_metric(&self, record: impl FnOnce(&mut CliMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn emit_metrics(&self, uptime: Duration) {
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(uptime)
                    .to_log_event(self.config.metrics_target.as_str());
                let _ = logger.log_event(event);
            }
        }
    }
}

impl<C: Core + ?Sized> Cli<C, ScriptedInquirer> {
    /// Drain the queue and replay scripted operator input until neither has
    /// anything left to deliver. Returns how many events were dispatched.
    pub fn settle(&mut self) -> Result<usize> {
        let mut dispatched = 0;
        loop {
            dispatched += self.pump()?;
            match self.inquirer.next_event() {
                Some(event) => {
                    self.dispatch(event)?;
                    dispatched += 1;
                }
                None => return Ok(dispatched),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostChannel, InMemoryCore};
    use crate::logging::MemorySink;
    use crate::runtime::audit::RecordingAudit;
    use crate::runtime::prompt::{InquirerCall, ScriptStep};

    fn core() -> Arc<InMemoryCore> {
        Arc::new(
            InMemoryCore::builder()
                .setting("cli", true)
                .setting("log", "info")
                .setting("delay", 0)
                .mock("base", &["users:success"])
                .route("users", "/api/users", &["success", "error"])
                .build(),
        )
    }

    fn cli(core: &Arc<InMemoryCore>) -> Cli<InMemoryCore, ScriptedInquirer> {
        Cli::new(Arc::clone(core), ScriptedInquirer::new(), EventQueue::new())
    }

    #[test]
    fn registers_cli_setting_on_construction() {
        let core = core();
        let cli = cli(&core);
        let registered = core.registered_settings();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].name, "cli");
        assert_eq!(registered[0].default, json!(true));
        assert_eq!(cli.display_name(), "@mocks-server/plugin-inquirer-cli");
    }

    #[test]
    fn init_listens_to_settings_once() {
        let core = core();
        let mut cli = cli(&core);
        cli.init().unwrap();
        cli.init().unwrap();
        assert_eq!(core.listener_count(HostChannel::Settings), 1);
    }

    #[test]
    fn start_silences_host_and_shows_main() {
        let core = core();
        let mut cli = cli(&core);
        cli.start().unwrap();
        assert_eq!(cli.log_level(), Some("info"));
        assert_eq!(core.writes_to("log"), vec![json!("silent")]);
        assert_eq!(cli.inquirer().inquired_screens(), vec![Screen::Main]);
        assert!(cli.is_echo_pending());

        cli.pump().unwrap();
        assert!(!cli.is_echo_pending());
        assert_eq!(core.writes_to("log").len(), 1);
    }

    #[test]
    fn silence_echo_keeps_single_main_prompt() {
        let core = core();
        let mut cli = cli(&core);
        cli.start().unwrap();
        cli.pump().unwrap();
        assert_eq!(cli.inquirer().inquired_screens(), vec![Screen::Main]);
    }

    #[test]
    fn own_delay_write_does_not_redraw() {
        let core = core();
        let mut cli = cli(&core);
        cli.inquirer_mut().answer(Answer::choice("delay"));
        cli.inquirer_mut().answer(Answer::choice("250"));
        cli.start().unwrap();
        cli.settle().unwrap();
        assert_eq!(
            cli.inquirer().inquired_screens(),
            vec![Screen::Main, Screen::Delay, Screen::Main]
        );
        assert!(!cli.is_echo_pending());
    }

    #[test]
    fn start_is_skipped_when_disabled() {
        let core = core();
        core.set_quietly("cli", json!(false));
        let mut cli = cli(&core);
        cli.start().unwrap();
        assert!(cli.is_initialized());
        assert!(!cli.is_started());
        assert!(cli.inquirer().prompts().is_empty());
    }

    #[test]
    fn already_silent_host_is_not_written() {
        let core = core();
        core.set_quietly("log", json!("silent"));
        let mut cli = cli(&core);
        cli.start().unwrap();
        assert!(core.writes_to("log").is_empty());
        assert!(!cli.is_echo_pending());
    }

    #[test]
    fn stale_answers_are_discarded() {
        let core = core();
        let mut cli = cli(&core);
        cli.start().unwrap();
        let first = cli.pending_prompt().unwrap();
        cli.dispatch(CliEvent::AlertsChanged).unwrap();
        let second = cli.pending_prompt().unwrap();
        assert!(second > first);

        cli.dispatch(CliEvent::Answer {
            prompt: first,
            answer: Answer::choice("restart"),
        })
        .unwrap();
        assert_eq!(core.restart_count(), 0);

        cli.dispatch(CliEvent::Answer {
            prompt: second,
            answer: Answer::choice("restart"),
        })
        .unwrap();
        assert_eq!(core.restart_count(), 1);
        assert_eq!(cli.current_screen(), Screen::Main);
    }

    #[test]
    fn invalid_delay_text_prompts_again() {
        let core = core();
        let mut cli = cli(&core);
        cli.inquirer_mut().answer(Answer::choice("delay"));
        cli.inquirer_mut().answer(Answer::choice("asdads"));
        cli.inquirer_mut().answer(Answer::choice("1500"));
        cli.start().unwrap();
        cli.settle().unwrap();
        assert_eq!(core.writes_to("delay"), vec![json!(1500)]);
        let screens = cli.inquirer().inquired_screens();
        assert_eq!(
            screens.iter().filter(|screen| **screen == Screen::Delay).count(),
            2
        );
    }

    #[test]
    fn stop_releases_listeners_except_settings() {
        let core = core();
        let mut cli = cli(&core);
        cli.start().unwrap();
        cli.stop().unwrap();
        cli.stop().unwrap();
        assert_eq!(core.removed_listeners(HostChannel::Alerts), 1);
        assert_eq!(core.removed_listeners(HostChannel::Mocks), 1);
        assert_eq!(core.removed_listeners(HostChannel::Settings), 0);
        assert_eq!(cli.inquirer().clears(), vec![true, false]);
        assert_eq!(core.settings().get_str("log").as_deref(), Some("info"));
        assert_eq!(
            core.writes_to("log"),
            vec![json!("silent"), json!("info")]
        );
    }

    #[test]
    fn dropping_the_controller_releases_every_listener() {
        let core = core();
        {
            let mut cli = cli(&core);
            cli.start().unwrap();
        }
        assert_eq!(core.listener_count(HostChannel::Settings), 0);
        assert_eq!(core.listener_count(HostChannel::Alerts), 0);
        assert_eq!(core.listener_count(HostChannel::Mocks), 0);
    }

    #[test]
    fn logger_audit_and_metrics_observe_lifecycle() {
        let core = core();
        let sink = MemorySink::new();
        let audit = RecordingAudit::new();
        let mut config = CliConfig::default();
        config.logger = Some(Logger::new(sink.clone()));
        config.audit = Some(Arc::new(audit.clone()));
        config.enable_metrics();
        let mut cli = Cli::with_config(
            Arc::clone(&core),
            ScriptedInquirer::new(),
            EventQueue::new(),
            config,
        );

        cli.start().unwrap();
        cli.pump().unwrap();
        let snapshot = cli.metrics_snapshot().unwrap();
        assert_eq!(snapshot.silences, 1);
        assert_eq!(snapshot.echoes_consumed, 1);
        cli.stop().unwrap();

        let messages = sink.messages();
        assert!(messages.contains(&"cli_started".to_string()));
        assert!(messages.contains(&"echo_consumed".to_string()));
        assert!(messages.contains(&"cli_stopped".to_string()));
        assert!(messages.contains(&"cli_metrics".to_string()));
        assert_eq!(audit.count(ControllerAuditStage::SettingRegistered), 1);
        assert_eq!(audit.count(ControllerAuditStage::EchoConsumed), 1);
        assert_eq!(audit.count(ControllerAuditStage::Stopped), 1);
    }

    #[test]
    fn leaving_logs_by_script_resilences() {
        let core = core();
        let mut cli = cli(&core);
        cli.inquirer_mut().answer(Answer::choice("logs"));
        cli.inquirer_mut().push(ScriptStep::LeaveLogs);
        cli.start().unwrap();
        cli.settle().unwrap();
        assert_eq!(
            core.writes_to("log"),
            vec![json!("silent"), json!("info"), json!("silent")]
        );
        assert_eq!(cli.current_screen(), Screen::Main);
        assert!(cli.inquirer().calls().contains(&InquirerCall::LogsMode));
        assert!(!cli.is_echo_pending());
    }
}
