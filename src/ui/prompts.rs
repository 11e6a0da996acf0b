//! ui::prompts
//!
//! Operator confirmations and choices.
//!
//! # Design
//!
//! Workflows never read stdin themselves. They receive a [`Prompter`] and
//! ask it. Three implementations exist:
//!
//! - [`TerminalPrompter`] - reads answers from a terminal (or any reader)
//! - [`PolicyPrompter`] - answers every confirmation with a fixed policy,
//!   for `--non-interactive` runs
//! - [`ScriptedPrompter`] - replays queued answers and records what was
//!   asked, for tests
//!
//! A declined confirmation is a normal answer (`Ok(false)`), never an error.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::info;

/// Errors from prompts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("input required but running non-interactively: {0}")]
    NotInteractive(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Asks the operator.
pub trait Prompter {
    /// Yes/no question. Anything but an explicit yes declines.
    fn confirm(&self, message: &str) -> Result<bool, PromptError>;

    /// Choose one of `options`; returns its index.
    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError>;

    /// Free-text answer, trimmed.
    fn input(&self, message: &str) -> Result<String, PromptError>;

    /// Block until the operator is ready.
    fn pause(&self, message: &str) -> Result<(), PromptError>;
}

/// Whether an answer is a yes (`y`, `Y`, `yes`, ...).
pub fn is_yes(answer: &str) -> bool {
    answer.trim_start().starts_with(['y', 'Y'])
}

/// Prompts on a terminal.
pub struct TerminalPrompter<R, W> {
    io: RefCell<(R, W)>,
}

impl TerminalPrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: RefCell::new((reader, writer)),
        }
    }

    /// Consume the prompter, returning the writer (for inspecting output).
    pub fn into_writer(self) -> W {
        self.io.into_inner().1
    }

    /// Print `prompt` and read one line. `None` on end of input.
    fn ask(&self, prompt: &str) -> Result<Option<String>, PromptError> {
        let mut io = self.io.borrow_mut();
        let (reader, writer) = &mut *io;
        write!(writer, "{}", prompt).map_err(|e| PromptError::IoError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&self, line: &str) -> Result<(), PromptError> {
        let mut io = self.io.borrow_mut();
        writeln!(io.1, "{}", line).map_err(|e| PromptError::IoError(e.to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&self, message: &str) -> Result<bool, PromptError> {
        Ok(self
            .ask(&format!("{} [yN] ", message))?
            .is_some_and(|a| is_yes(&a)))
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        if options.is_empty() {
            return Err(PromptError::Cancelled);
        }
        self.say(message)?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("{}. {}", i + 1, option))?;
        }

        loop {
            let answer = self
                .ask("Enter the number of your choice: ")?
                .ok_or(PromptError::Cancelled)?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                Ok(_) => self.say(&format!(
                    "Please enter a number between 1 and {}",
                    options.len()
                ))?,
                Err(_) => self.say("Please enter a valid number")?,
            }
        }
    }

    fn input(&self, message: &str) -> Result<String, PromptError> {
        self.ask(&format!("{} ", message))?
            .ok_or(PromptError::Cancelled)
    }

    fn pause(&self, message: &str) -> Result<(), PromptError> {
        self.ask(message).map(drop)
    }
}

/// Answers confirmations with a fixed policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyPrompter {
    assume_yes: bool,
}

impl PolicyPrompter {
    pub fn assume_yes() -> Self {
        Self { assume_yes: true }
    }

    pub fn assume_no() -> Self {
        Self { assume_yes: false }
    }
}

impl Prompter for PolicyPrompter {
    fn confirm(&self, message: &str) -> Result<bool, PromptError> {
        info!(
            "{} [{}]",
            message,
            if self.assume_yes { "auto-yes" } else { "auto-no" }
        );
        Ok(self.assume_yes)
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        match options.first() {
            Some(first) if self.assume_yes => {
                info!("{} [auto-selected {}]", message, first);
                Ok(0)
            }
            _ => Err(PromptError::NotInteractive(message.to_string())),
        }
    }

    fn input(&self, message: &str) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive(message.to_string()))
    }

    fn pause(&self, _message: &str) -> Result<(), PromptError> {
        Ok(())
    }
}

/// A queued answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Select(usize),
    Text(String),
}

/// Replays queued answers and records every prompt. Test double.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Every prompt shown so far, pauses included.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, message: &str) -> Result<Answer, PromptError> {
        self.asked.borrow_mut().push(message.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or(PromptError::Cancelled)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> Result<bool, PromptError> {
        match self.next(message)? {
            Answer::Yes => Ok(true),
            Answer::No => Ok(false),
            other => Err(PromptError::IoError(format!(
                "expected yes/no for '{}', got {:?}",
                message, other
            ))),
        }
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        match self.next(message)? {
            Answer::Select(i) if i < options.len() => Ok(i),
            other => Err(PromptError::IoError(format!(
                "expected a choice among {} options for '{}', got {:?}",
                options.len(),
                message,
                other
            ))),
        }
    }

    fn input(&self, message: &str) -> Result<String, PromptError> {
        match self.next(message)? {
            Answer::Text(t) => Ok(t),
            other => Err(PromptError::IoError(format!(
                "expected text for '{}', got {:?}",
                message, other
            ))),
        }
    }

    fn pause(&self, message: &str) -> Result<(), PromptError> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(())
    }
}
