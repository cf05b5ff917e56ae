use std::io::{self, Stdout, Write};

use crossterm::event::{self, Event};
use crossterm::terminal;
use thiserror::Error;

use crate::CliError;
use crate::host::Core;
use crate::runtime::Cli;
use crate::runtime::screens::Screen;
use crate::terminal::{KeyOutcome, TerminalInquirer};

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("controller error: {0}")]
    Controller(#[from] CliError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver that owns a `Cli` wired to a [`TerminalInquirer`].
///
/// Raw mode is on while a question is displayed and off in logs mode so host
/// output reaches the terminal untouched. Ctrl+C stops the controller and
/// returns.
pub struct CliDriver<C: Core + ?Sized, W: Write = Stdout> {
    cli: Cli<C, TerminalInquirer<W>>,
    raw: bool,
}

impl<C: Core + ?Sized, W: Write> CliDriver<C, W> {
    pub fn new(cli: Cli<C, TerminalInquirer<W>>) -> Self {
        Self { cli, raw: false }
    }

    pub fn cli(&self) -> &Cli<C, TerminalInquirer<W>> {
        &self.cli
    }

    pub fn run(mut self) -> DriverResult<()> {
        let result = self.run_inner();
        self.exit();
        result
    }

    fn run_inner(&mut self) -> DriverResult<()> {
        let (width, _) = terminal::size()?;
        self.cli.inquirer_mut().set_width(width);
        self.cli.start()?;
        let tick = self.cli.config().tick_interval;

        loop {
            self.cli.pump()?;
            self.sync_raw_mode()?;

            if !event::poll(tick)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if self.cli.inquirer_mut().handle_key(key)? == KeyOutcome::Interrupted {
                        self.cli.stop()?;
                        return Ok(());
                    }
                }
                Event::Resize(width, _) => self.cli.inquirer_mut().set_width(width),
                _ => {}
            }
        }
    }

    fn sync_raw_mode(&mut self) -> DriverResult<()> {
        let wanted = self.cli.is_started() && self.cli.current_screen() != Screen::Logs;
        if wanted && !self.raw {
            terminal::enable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
            self.raw = true;
        } else if !wanted && self.raw {
            terminal::disable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
            self.raw = false;
        }
        Ok(())
    }

    fn exit(&mut self) {
        if self.raw {
            terminal::disable_raw_mode().ok();
            self.raw = false;
        }
    }
}
