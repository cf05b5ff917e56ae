//! Contract between the controller and whatever draws the questions.
//!
//! Prompts are fire-and-forget: [`Inquirer::inquire`] returns as soon as the
//! question is on screen and the answer comes back later as a
//! [`CliEvent::Answer`] on the controller's queue.

use std::collections::VecDeque;
use std::fmt;

use crate::Result;
use crate::render::Header;

use super::CliEvent;
use super::screens::{Screen, filter_choices};

/// Identifies one issued prompt. Later prompts always carry larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PromptId(u64);

impl PromptId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(String),
    Number(u64),
}

impl Answer {
    pub fn choice(value: impl Into<String>) -> Self {
        Answer::Choice(value.into())
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Answer::Choice(value) => Some(value),
            Answer::Number(_) => None,
        }
    }
}

/// Entry of a select question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    Select {
        message: String,
        choices: Vec<Choice>,
    },
    /// Free-text filter over `source`; the answer is one of the suggestions.
    Autocomplete {
        message: String,
        source: Vec<String>,
    },
    Number {
        message: String,
        default: Option<u64>,
    },
}

impl Question {
    pub fn message(&self) -> &str {
        match self {
            Question::Select { message, .. }
            | Question::Autocomplete { message, .. }
            | Question::Number { message, .. } => message,
        }
    }

    /// Candidates to show for the text typed so far.
    pub fn suggestions(&self, input: Option<&str>) -> Vec<String> {
        match self {
            Question::Select { choices, .. } => {
                choices.iter().map(|choice| choice.value.clone()).collect()
            }
            Question::Autocomplete { source, .. } => filter_choices(source, input),
            Question::Number { .. } => Vec::new(),
        }
    }
}

/// Parsing and validation applied to the delay input.
pub struct DelayQuestion;

impl DelayQuestion {
    pub const MESSAGE: &'static str = "Enter delay time in ms:";

    pub fn filter(input: &str) -> Option<u64> {
        input.trim().parse().ok()
    }

    pub fn validate(parsed: Option<u64>) -> bool {
        parsed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: PromptId,
    pub screen: Screen,
    pub question: Question,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClearScreen {
    WithHeader(Header),
    Plain,
}

impl ClearScreen {
    pub fn has_header(&self) -> bool {
        matches!(self, ClearScreen::WithHeader(_))
    }
}

/// Renderer collaborator driven by the controller.
///
/// After [`Inquirer::logs_mode`] the implementation reports the operator
/// leaving logs by queueing [`CliEvent::LogsModeExited`].
/// [`Inquirer::exit_logs_mode`] is the controller leaving on its own and must
/// not queue that event.
pub trait Inquirer {
    fn inquire(&mut self, prompt: Prompt) -> Result<()>;
    fn clear_screen(&mut self, clear: ClearScreen) -> Result<()>;
    fn logs_mode(&mut self) -> Result<()>;
    fn exit_logs_mode(&mut self) -> Result<()>;
}

/// Call observed by a [`ScriptedInquirer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquirerCall {
    Inquire(Screen),
    Clear { header: bool },
    LogsMode,
    ExitLogsMode,
}

/// Operator input replayed by a [`ScriptedInquirer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Answer(Answer),
    LeaveLogs,
}

/// Inquirer that records every call and answers from a fixed script.
///
/// Answers are handed out lazily through [`ScriptedInquirer::next_event`], so
/// each one targets whatever prompt is on screen once the queue is drained.
#[derive(Debug, Default)]
pub struct ScriptedInquirer {
    calls: Vec<InquirerCall>,
    prompts: Vec<Prompt>,
    script: VecDeque<ScriptStep>,
    open: Option<PromptId>,
    in_logs: bool,
}

impl ScriptedInquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = ScriptStep>,
    {
        Self {
            script: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, step: ScriptStep) {
        self.script.push_back(step);
    }

    pub fn answer(&mut self, answer: Answer) {
        self.push(ScriptStep::Answer(answer));
    }

    /// Produce the next operator event, if the script has one that fits the
    /// current screen.
    pub fn next_event(&mut self) -> Option<CliEvent> {
        match self.script.front()? {
            ScriptStep::Answer(_) => {
                let prompt = self.open.take()?;
                match self.script.pop_front() {
                    Some(ScriptStep::Answer(answer)) => Some(CliEvent::Answer { prompt, answer }),
                    _ => None,
                }
            }
            ScriptStep::LeaveLogs if self.in_logs => {
                self.script.pop_front();
                self.in_logs = false;
                Some(CliEvent::LogsModeExited)
            }
            ScriptStep::LeaveLogs => None,
        }
    }

    pub fn calls(&self) -> &[InquirerCall] {
        &self.calls
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn last_prompt(&self) -> Option<&Prompt> {
        self.prompts.last()
    }

    pub fn inquired_screens(&self) -> Vec<Screen> {
        self.prompts.iter().map(|prompt| prompt.screen).collect()
    }

    pub fn clears(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                InquirerCall::Clear { header } => Some(*header),
                _ => None,
            })
            .collect()
    }

    pub fn logs_mode_calls(&self) -> usize {
        self.count(&InquirerCall::LogsMode)
    }

    pub fn exit_logs_calls(&self) -> usize {
        self.count(&InquirerCall::ExitLogsMode)
    }

    pub fn pending_steps(&self) -> usize {
        self.script.len()
    }

    pub fn reset_calls(&mut self) {
        self.calls.clear();
        self.prompts.clear();
    }

    fn count(&self, wanted: &InquirerCall) -> usize {
        self.calls.iter().filter(|call| *call == wanted).count()
    }
}

impl Inquirer for ScriptedInquirer {
    fn inquire(&mut self, prompt: Prompt) -> Result<()> {
        self.calls.push(InquirerCall::Inquire(prompt.screen));
        self.open = Some(prompt.id);
        self.prompts.push(prompt);
        Ok(())
    }

    fn clear_screen(&mut self, clear: ClearScreen) -> Result<()> {
        self.calls.push(InquirerCall::Clear {
            header: clear.has_header(),
        });
        Ok(())
    }

    fn logs_mode(&mut self) -> Result<()> {
        self.calls.push(InquirerCall::LogsMode);
        self.open = None;
        self.in_logs = true;
        Ok(())
    }

    fn exit_logs_mode(&mut self) -> Result<()> {
        self.calls.push(InquirerCall::ExitLogsMode);
        self.in_logs = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: u64, screen: Screen) -> Prompt {
        Prompt {
            id: PromptId::new(id),
            screen,
            question: Question::Number {
                message: DelayQuestion::MESSAGE.into(),
                default: None,
            },
        }
    }

    #[test]
    fn delay_validation_rejects_non_numeric_input() {
        assert!(!DelayQuestion::validate(DelayQuestion::filter("asdads")));
        assert!(DelayQuestion::validate(DelayQuestion::filter("123230")));
        assert_eq!(DelayQuestion::filter(" 42 "), Some(42));
    }

    #[test]
    fn autocomplete_suggestions_follow_input() {
        let question = Question::Autocomplete {
            message: "Please choose mock".into(),
            source: vec!["foo1".into(), "foo2".into(), "not-included".into()],
        };
        assert_eq!(question.suggestions(Some("foo")), vec!["foo1", "foo2"]);
        assert_eq!(question.suggestions(None).len(), 3);
    }

    #[test]
    fn scripted_answers_wait_for_a_prompt() {
        let mut inquirer = ScriptedInquirer::with_script([ScriptStep::Answer(Answer::choice("delay"))]);
        assert!(inquirer.next_event().is_none());

        inquirer.inquire(prompt(1, Screen::Main)).unwrap();
        inquirer.inquire(prompt(2, Screen::Main)).unwrap();
        match inquirer.next_event() {
            Some(CliEvent::Answer { prompt, answer }) => {
                assert_eq!(prompt, PromptId::new(2));
                assert_eq!(answer, Answer::choice("delay"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(inquirer.next_event().is_none());
    }

    #[test]
    fn leaving_logs_requires_logs_mode() {
        let mut inquirer = ScriptedInquirer::with_script([ScriptStep::LeaveLogs]);
        assert!(inquirer.next_event().is_none());
        inquirer.logs_mode().unwrap();
        assert!(matches!(inquirer.next_event(), Some(CliEvent::LogsModeExited)));
        assert_eq!(inquirer.logs_mode_calls(), 1);
    }

    #[test]
    fn clears_record_header_flag() {
        let mut inquirer = ScriptedInquirer::new();
        inquirer.clear_screen(ClearScreen::Plain).unwrap();
        inquirer
            .clear_screen(ClearScreen::WithHeader(Header::default()))
            .unwrap();
        assert_eq!(inquirer.clears(), vec![false, true]);
    }
}
