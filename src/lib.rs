//! Interactive terminal control surface for a running mock server.
//!
//! The [`Cli`] controller attaches to a host through the [`Core`] trait,
//! keeps a menu on screen that mirrors the host's live settings, and writes
//! the operator's choices back. Drawing is delegated to an [`Inquirer`];
//! [`TerminalInquirer`] is the crossterm one and [`ScriptedInquirer`] replays
//! canned answers.

pub mod error;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod runtime;
pub mod terminal;
pub mod width;

pub use error::{CliError, Result};
pub use host::{
    Alert, AlertError, Behaviors, Core, Fixtures, HostChannel, InMemoryCore, InMemoryCoreBuilder,
    Mocks, PlainMock, PlainRoute, PlainRouteVariant, SettingDescriptor, SettingKind, Settings,
    SettingsChange, Subscription,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{CliMetrics, MetricSnapshot};
pub use render::{
    AlertKind, AlertLine, Header, LegacySnapshot, StatusLine, StatusSnapshot, Tone, render_alerts,
    render_status,
};
pub use runtime::audit::{
    ControllerAudit, ControllerAuditEvent, ControllerAuditEventBuilder, ControllerAuditStage,
    RecordingAudit,
};
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::guard::{LogLevelGuard, WriteEchoes};
pub use runtime::prompt::{
    Answer, Choice, ClearScreen, DelayQuestion, Inquirer, InquirerCall, Prompt, PromptId,
    Question, ScriptStep, ScriptedInquirer,
};
pub use runtime::reconcile::{ChangeReconciler, REDRAW_KEYS, Reaction, ReconcileView};
pub use runtime::screens::{LOG_LEVELS, MenuContext, Screen, ScreenState, filter_choices, main_choices};
pub use runtime::{
    Cli, CliConfig, CliEvent, DISPLAY_NAME, EventQueue, EventSender, SILENT_LEVEL, cli_setting,
};
pub use terminal::{KeyOutcome, PromptAction, TerminalInquirer, prompt_action_from_key};
pub use width::{display_width, truncate_display};
