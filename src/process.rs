use std::process::Command;

use crate::error::ProcessError;

/// Runs one command line to completion and returns its standard output.
pub trait CommandRunner {
    fn run(&self, command_line: &str) -> Result<String, ProcessError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command_line: &str) -> Result<String, ProcessError> {
        (**self).run(command_line)
    }
}

/// Hands command lines to the platform shell: `sh -c` on Unix, `cmd /C` on Windows.
///
/// Blocks until the command exits. There is no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell() -> (&'static str, &'static str) {
        if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> Result<String, ProcessError> {
        let (shell, flag) = Self::shell();
        tracing::debug!(shell, command = command_line, "running command");

        let output = Command::new(shell)
            .arg(flag)
            .arg(command_line)
            .output()
            .map_err(|source| ProcessError::Launch {
                command: command_line.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(ProcessError::ExitStatus {
                command: command_line.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::trace!(command = command_line, stdout = %stdout.trim_end(), "command finished");
        Ok(stdout)
    }
}

/// Quotes `arg` for `sh` when it contains anything beyond a conservative safe set.
pub fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+@%,~".contains(c));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::CommandRunner;
    use crate::error::ProcessError;

    /// Records every command line and fails those starting with a configured prefix.
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub commands: RefCell<Vec<String>>,
        pub failing: Vec<String>,
    }

    impl RecordingRunner {
        pub fn failing_on(prefix: &str) -> Self {
            Self {
                failing: vec![prefix.to_string()],
                ..Self::default()
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command_line: &str) -> Result<String, ProcessError> {
            self.commands.borrow_mut().push(command_line.to_string());
            if self
                .failing
                .iter()
                .any(|prefix| command_line.starts_with(prefix.as_str()))
            {
                return Err(ProcessError::ExitStatus {
                    command: command_line.to_string(),
                    code: Some(1),
                    stderr: "simulated failure".to_string(),
                });
            }
            Ok(String::new())
        }
    }
}
