//! Output seam so importer progress can be captured in tests.

use crate::output::{self, Tone};

#[cfg(test)]
use std::sync::Mutex;

/// One line captured by MockOutput
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMessage {
    Success(String),
    Error(String),
    Warning(String),
    Info(String),
    Section(String),
    KeyValue(String, String),
    Dimmed(String),
    Blank,
}

/// Progress reporting used by every family import
pub trait Output: Send + Sync {
    fn success(&self, message: &str);

    /// Per-record or per-family failure; the run carries on
    fn error(&self, message: &str);

    fn warning(&self, message: &str);

    fn info(&self, message: &str);

    /// Banner printed before each family and before the summary
    fn section(&self, title: &str);

    /// Summary row, e.g. a family title with its counts
    fn key_value(&self, key: &str, value: &str);

    fn dimmed(&self, message: &str);

    fn blank(&self);
}

/// Writes coloured lines to the terminal
pub struct TerminalOutput;

impl Output for TerminalOutput {
    fn success(&self, message: &str) {
        output::status(Tone::Done, message);
    }

    fn error(&self, message: &str) {
        output::status(Tone::Failed, message);
    }

    fn warning(&self, message: &str) {
        output::status(Tone::Caution, message);
    }

    fn info(&self, message: &str) {
        output::status(Tone::Note, message);
    }

    fn section(&self, title: &str) {
        output::section(title);
    }

    fn key_value(&self, key: &str, value: &str) {
        output::key_value(key, value);
    }

    fn dimmed(&self, message: &str) {
        output::dimmed(message);
    }

    fn blank(&self) {
        output::blank();
    }
}

/// Records every line instead of printing it
#[cfg(test)]
#[derive(Default)]
pub struct MockOutput {
    messages: Mutex<Vec<OutputMessage>>,
}

#[cfg(test)]
impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_message(&self, message: &OutputMessage) -> bool {
        self.messages.lock().unwrap().contains(message)
    }

    pub fn get_successes(&self) -> Vec<String> {
        self.collect(|m| match m {
            OutputMessage::Success(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn get_warnings(&self) -> Vec<String> {
        self.collect(|m| match m {
            OutputMessage::Warning(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    fn collect(&self, pick: impl Fn(&OutputMessage) -> Option<String>) -> Vec<String> {
        self.messages.lock().unwrap().iter().filter_map(pick).collect()
    }

    fn push(&self, message: OutputMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

#[cfg(test)]
impl Output for MockOutput {
    fn success(&self, message: &str) {
        self.push(OutputMessage::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(OutputMessage::Error(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(OutputMessage::Warning(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(OutputMessage::Info(message.to_string()));
    }

    fn section(&self, title: &str) {
        self.push(OutputMessage::Section(title.to_string()));
    }

    fn key_value(&self, key: &str, value: &str) {
        self.push(OutputMessage::KeyValue(key.to_string(), value.to_string()));
    }

    fn dimmed(&self, message: &str) {
        self.push(OutputMessage::Dimmed(message.to_string()));
    }

    fn blank(&self) {
        self.push(OutputMessage::Blank);
    }
}
