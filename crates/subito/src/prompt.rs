//! Operator interaction.
//!
//! The engine never reads stdin directly. Anything that needs a human goes
//! through a [`Prompter`], so the same code runs against a terminal, a
//! pipe, or a scripted list of answers in tests.

use crate::{Error, Result};
use std::collections::VecDeque;

/// Source of operator answers and sink for operator-facing messages.
pub trait Prompter {
    /// Show a line to the operator.
    fn say(&mut self, line: &str);

    /// Ask a question and block for the answer.
    ///
    /// Returns `Ok(None)` when the operator has closed input; callers decide
    /// whether that means "give up" or "take the default".
    fn ask(&mut self, question: &str) -> Result<Option<String>>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn say(&mut self, line: &str) {
        (**self).say(line)
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        (**self).ask(question)
    }
}

/// Ask and insist on an answer. Closed input becomes [`Error::Aborted`].
pub(crate) fn ask_required(prompter: &mut dyn Prompter, question: &str) -> Result<String> {
    match prompter.ask(question)? {
        Some(answer) => Ok(answer.trim().to_string()),
        None => Err(Error::Aborted(question.trim().to_string())),
    }
}

/// Answers from a fixed queue, recording everything that was shown.
///
/// Once the queue is empty every question gets `None`, as if the operator
/// had closed input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Prompter that never has an answer.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Every line shown and question asked, in order.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// True if any transcript line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        self.transcript.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}
