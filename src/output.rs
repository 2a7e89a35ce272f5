//! Colored status lines for the terminal.
//!
//! These go to stdout for the user; diagnostics go through `tracing` to the log file.

use std::fmt::Display;

use crossterm::style::Stylize;

use crate::model::progress::CopyProgress;

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

pub fn info(message: impl Display) {
    emit(Level::Info, message.to_string());
}

pub fn success(message: impl Display) {
    emit(Level::Success, message.to_string());
}

pub fn warning(message: impl Display) {
    emit(Level::Warning, message.to_string());
}

pub fn error(message: impl Display) {
    emit(Level::Error, message.to_string());
}

fn emit(level: Level, message: String) {
    #[cfg(test)]
    capture::record(level, &message);

    match level {
        Level::Info => println!("{}", message.blue()),
        Level::Success => println!("{}", message.green()),
        Level::Warning => println!("{}", message.yellow()),
        Level::Error => eprintln!("{}", message.red()),
    }
}


pub fn progress_line(progress: &CopyProgress) -> String {
    format!(
        "Progress: {}/{} files ({:.1}%) - {:.1} MB/{:.1} MB",
        progress.copied_files,
        progress.total_files,
        progress.file_percent(),
        progress.copied_size as f64 / MIB,
        progress.total_size as f64 / MIB,
    )
}
