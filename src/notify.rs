use colored::Colorize;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// Transient, user-visible notifications (toasts in a GUI, a line on
/// stderr in the terminal).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Info => eprintln!("{} {}", "•".blue(), message),
            Level::Error => eprintln!("{} {}", "✗".red().bold(), message.red()),
        }
    }
}

/// Keeps every notification; handy for asserting on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
