//! Error types for the copy engine, descriptor loading, external commands
//! and the install orchestrator.
//!
//! Every variant carries the path or command it failed on so the single
//! top-level handler in `main` can print one self-contained line.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::plugin::step::StepKind;

/// Failures raised while walking or copying a directory tree.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("{operation} failed for {}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to walk {}", .root.display())]
    Walk {
        root: PathBuf,
        source: ignore::Error,
    },
    #[error("{} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("{} is outside the copy root", .path.display())]
    OutsideRoot { path: PathBuf },
    /// The tree grew between the census and the copy pass.
    #[error("source tree changed while copying (census counted {files} files, {bytes} bytes)")]
    TreeChanged { files: u64, bytes: u64 },
    #[error("progress receiver dropped before the copy finished")]
    Disconnected,
    #[error("copy worker panicked")]
    WorkerPanicked,
}

impl CopyError {
    pub(crate) fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn walk(root: &Path, source: ignore::Error) -> Self {
        Self::Walk {
            root: root.to_path_buf(),
            source,
        }
    }
}

/// Failures raised while loading a plugin descriptor.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} has an empty KPlugin.Id", .path.display())]
    MissingId { path: PathBuf },
}

/// Failures raised by an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{command}`")]
    Launch { command: String, source: io::Error },
    #[error("`{command}` exited with {}{}", describe_code(.code), describe_stderr(.stderr))]
    ExitStatus {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Failures that stop a plugin install run.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("{operation} failed for {}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("{step} step failed")]
    Step {
        step: StepKind,
        source: ProcessError,
    },
}
