//! Screen identities and the menu tree.
//!
//! Exactly one [`Screen`] is current at any time. [`ScreenState`] tracks it
//! together with the id of the prompt the controller is waiting on, so an
//! answer to a superseded prompt can be recognised and dropped.

mod filter;

pub use filter::filter_choices;

use std::fmt;

use super::prompt::{Choice, PromptId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Main,
    Behavior,
    Mock,
    Variant,
    Delay,
    LogLevel,
    Logs,
    Restart,
    RestoreVariants,
    Watch,
    WatchLegacy,
}

impl Screen {
    pub const ALL: [Screen; 11] = [
        Screen::Main,
        Screen::Behavior,
        Screen::Mock,
        Screen::Variant,
        Screen::Delay,
        Screen::LogLevel,
        Screen::Logs,
        Screen::Restart,
        Screen::RestoreVariants,
        Screen::Watch,
        Screen::WatchLegacy,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Screen::Main => "main",
            Screen::Behavior => "behavior",
            Screen::Mock => "mock",
            Screen::Variant => "variant",
            Screen::Delay => "delay",
            Screen::LogLevel => "logLevel",
            Screen::Logs => "logs",
            Screen::Restart => "restart",
            Screen::RestoreVariants => "restoreVariants",
            Screen::Watch => "watch",
            Screen::WatchLegacy => "watchLegacy",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.as_str() == id)
    }

    /// Action screens run their action and fall straight back to the main menu.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Screen::Restart | Screen::RestoreVariants | Screen::Watch | Screen::WatchLegacy
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values the main menu depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuContext {
    pub legacy: bool,
    pub behaviors: usize,
    pub mocks: usize,
    pub variants: usize,
}

/// Build the main menu entries for the current host state.
pub fn main_choices(ctx: &MenuContext) -> Vec<Choice> {
    let mut choices = Vec::with_capacity(10);
    if ctx.legacy && ctx.behaviors > 0 {
        choices.push(Choice::new("Change current behavior", Screen::Behavior));
    }
    if ctx.mocks > 0 {
        choices.push(Choice::new("Change current mock", Screen::Mock));
    }
    if ctx.variants > 0 {
        choices.push(Choice::new("Change route variant", Screen::Variant));
    }
    choices.push(Choice::new("Restore routes variants", Screen::RestoreVariants));
    choices.push(Choice::new("Change delay", Screen::Delay));
    choices.push(Choice::new("Restart server", Screen::Restart));
    choices.push(Choice::new("Change log level", Screen::LogLevel));
    choices.push(Choice::new("Switch watch", Screen::Watch));
    if ctx.legacy {
        choices.push(Choice::new("Switch watch legacy", Screen::WatchLegacy));
    }
    choices.push(Choice::new("Display server logs", Screen::Logs));
    choices
}

/// Current screen plus the prompt awaiting an answer.
#[derive(Debug, Clone)]
pub struct ScreenState {
    current: Screen,
    pending: Option<PromptId>,
    next_id: u64,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            current: Screen::Main,
            pending: None,
            next_id: 1,
        }
    }
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn pending(&self) -> Option<PromptId> {
        self.pending
    }

    /// Switch screens without prompting. Any pending prompt is superseded.
    pub fn enter(&mut self, screen: Screen) {
        self.current = screen;
        self.pending = None;
    }

    /// Switch to `screen` and allocate the id of the prompt shown on it.
    pub fn issue(&mut self, screen: Screen) -> PromptId {
        let id = PromptId::new(self.next_id);
        self.next_id += 1;
        self.current = screen;
        self.pending = Some(id);
        id
    }

    /// Accept an answer for `id`. Returns `false` for superseded prompts.
    pub fn settle(&mut self, id: PromptId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.pending = None;
    }
}

/// Levels offered by the log level menu.
pub const LOG_LEVELS: [&str; 6] = ["silly", "debug", "verbose", "info", "warn", "error"];
