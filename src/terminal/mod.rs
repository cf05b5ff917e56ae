//! crossterm front-end implementing [`Inquirer`].
//!
//! Questions are drawn below the header the controller last cleared the
//! screen with. Key presses are fed in through
//! [`TerminalInquirer::handle_key`]; a completed answer is queued on the
//! controller's [`EventSender`] rather than returned.

use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

use crate::runtime::prompt::{Answer, ClearScreen, DelayQuestion, Inquirer, Prompt, Question};
use crate::runtime::{CliEvent, EventSender};
use crate::width::truncate_display;
use crate::{CliError, Result};

pub const LOGS_HINT: &str = "Displaying logs. Press Enter to display main menu";
pub const INVALID_NUMBER: &str = "Please enter a valid number";

const DEFAULT_WIDTH: u16 = 80;
const POINTER: &str = "❯";

/// Prompt-level meaning of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    MovePrev,
    MoveNext,
    Submit,
    Backspace,
    Input(char),
    Interrupt,
}

pub fn prompt_action_from_key(key: KeyEvent) -> Option<PromptAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(PromptAction::Interrupt);
    }
    match key.code {
        KeyCode::Up => Some(PromptAction::MovePrev),
        KeyCode::Down | KeyCode::Tab => Some(PromptAction::MoveNext),
        KeyCode::Enter | KeyCode::Char('\n') | KeyCode::Char('\r') => Some(PromptAction::Submit),
        KeyCode::Backspace => Some(PromptAction::Backspace),
        KeyCode::Char(ch) => Some(PromptAction::Input(ch)),
        _ => None,
    }
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Updated,
    Submitted,
    LeftLogs,
    Interrupted,
}

struct ActivePrompt {
    prompt: Prompt,
    cursor: usize,
    input: String,
    invalid: bool,
}

pub struct TerminalInquirer<W: Write> {
    out: W,
    events: EventSender,
    width: u16,
    header: Vec<String>,
    active: Option<ActivePrompt>,
    logs: bool,
}

impl<W: Write> TerminalInquirer<W> {
    pub fn new(out: W, events: EventSender) -> Self {
        Self {
            out,
            events,
            width: DEFAULT_WIDTH,
            header: Vec::new(),
            active: None,
            logs: false,
        }
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width.max(1);
    }

    pub fn in_logs_mode(&self) -> bool {
        self.logs
    }

    pub fn active_prompt(&self) -> Option<&Prompt> {
        self.active.as_ref().map(|active| &active.prompt)
    }

    pub fn input(&self) -> &str {
        self.active
            .as_ref()
            .map(|active| active.input.as_str())
            .unwrap_or("")
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<KeyOutcome> {
        let Some(action) = prompt_action_from_key(key) else {
            return Ok(KeyOutcome::Ignored);
        };
        if action == PromptAction::Interrupt {
            return Ok(KeyOutcome::Interrupted);
        }
        if self.logs {
            if action != PromptAction::Submit {
                return Ok(KeyOutcome::Ignored);
            }
            self.logs = false;
            self.events.send(CliEvent::LogsModeExited)?;
            return Ok(KeyOutcome::LeftLogs);
        }

        let options = self.options();
        let Some(active) = self.active.as_mut() else {
            return Ok(KeyOutcome::Ignored);
        };
        let is_select = matches!(active.prompt.question, Question::Select { .. });
        match action {
            PromptAction::MovePrev => {
                active.cursor = active.cursor.saturating_sub(1);
            }
            PromptAction::MoveNext => {
                if active.cursor + 1 < options.len() {
                    active.cursor += 1;
                }
            }
            PromptAction::Input(_) | PromptAction::Backspace if is_select => {
                return Ok(KeyOutcome::Ignored);
            }
            PromptAction::Input(ch) => {
                active.input.push(ch);
                active.cursor = 0;
                active.invalid = false;
            }
            PromptAction::Backspace => {
                active.input.pop();
                active.cursor = 0;
                active.invalid = false;
            }
            PromptAction::Submit => return self.submit(options),
            PromptAction::Interrupt => return Ok(KeyOutcome::Interrupted),
        }
        self.draw()?;
        Ok(KeyOutcome::Updated)
    }

    fn submit(&mut self, options: Vec<(String, String)>) -> Result<KeyOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Ok(KeyOutcome::Ignored);
        };
        let answer = match &active.prompt.question {
            Question::Number { default, .. } => {
                let parsed = if active.input.trim().is_empty() {
                    *default
                } else {
                    DelayQuestion::filter(&active.input)
                };
                match parsed {
                    Some(ms) if DelayQuestion::validate(parsed) => Answer::Number(ms),
                    _ => {
                        active.invalid = true;
                        self.draw()?;
                        return Ok(KeyOutcome::Updated);
                    }
                }
            }
            Question::Select { .. } | Question::Autocomplete { .. } => {
                match options.into_iter().nth(active.cursor) {
                    Some((_, value)) => Answer::Choice(value),
                    None => return Ok(KeyOutcome::Ignored),
                }
            }
        };
        let prompt = active.prompt.id;
        self.active = None;
        self.events.send(CliEvent::Answer { prompt, answer })?;
        Ok(KeyOutcome::Submitted)
    }

    /// Label and value of every option currently offered.
    fn options(&self) -> Vec<(String, String)> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        match &active.prompt.question {
            Question::Select { choices, .. } => choices
                .iter()
                .map(|choice| (choice.label.clone(), choice.value.clone()))
                .collect(),
            question @ Question::Autocomplete { .. } => question
                .suggestions(Some(&active.input))
                .into_iter()
                .map(|id| (id.clone(), id))
                .collect(),
            Question::Number { .. } => Vec::new(),
        }
    }

    /// Lines currently on screen, already fitted to the terminal width.
    pub fn frame(&self) -> Vec<String> {
        let mut lines = self.header.clone();
        if self.logs {
            lines.push(LOGS_HINT.dim().to_string());
        } else if let Some(active) = self.active.as_ref() {
            let question = &active.prompt.question;
            let mut prompt_line = format!("{} {}", "?".green(), question.message().bold());
            match question {
                Question::Number {
                    default: Some(default),
                    ..
                } if active.input.is_empty() => {
                    prompt_line.push_str(&format!(" ({default})"));
                }
                _ => {}
            }
            if !active.input.is_empty() {
                prompt_line.push(' ');
                prompt_line.push_str(&active.input);
            }
            lines.push(prompt_line);
            for (index, (label, _)) in self.options().iter().enumerate() {
                if index == active.cursor {
                    lines.push(format!("{} {}", POINTER.cyan(), label.as_str().cyan()));
                } else {
                    lines.push(format!("  {label}"));
                }
            }
            if active.invalid {
                lines.push(format!(">> {}", INVALID_NUMBER.red()));
            }
        }
        let width = usize::from(self.width);
        lines
            .iter()
            .map(|line| truncate_display(line, width))
            .collect()
    }

    fn draw(&mut self) -> Result<()> {
        let lines = self.frame();
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        for line in lines {
            write!(self.out, "{line}\r\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Inquirer for TerminalInquirer<W> {
    fn inquire(&mut self, prompt: Prompt) -> Result<()> {
        if let Question::Select { choices, .. } = &prompt.question {
            if choices.is_empty() {
                return Err(CliError::Inquirer(format!(
                    "select question on {} has no choices",
                    prompt.screen
                )));
            }
        }
        self.active = Some(ActivePrompt {
            prompt,
            cursor: 0,
            input: String::new(),
            invalid: false,
        });
        self.draw()
    }

    fn clear_screen(&mut self, clear: ClearScreen) -> Result<()> {
        self.header = match clear {
            ClearScreen::WithHeader(header) => header
                .lines()
                .iter()
                .flat_map(|line| line.split('\n').map(str::to_string).collect::<Vec<_>>())
                .collect(),
            ClearScreen::Plain => Vec::new(),
        };
        self.active = None;
        self.draw()
    }

    fn logs_mode(&mut self) -> Result<()> {
        self.active = None;
        self.logs = true;
        self.draw()
    }

    fn exit_logs_mode(&mut self) -> Result<()> {
        self.logs = false;
        Ok(())
    }
}
