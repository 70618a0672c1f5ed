//! Run-level error taxonomy and process exit status.
//!
//! Errors that end a whole run are [`TaskError`]s. Anything local to one
//! class lives in [`crate::classfile::EngineError`] and is mapped to a
//! diagnostic plus an [`ExitStatus`] by the task driver.

use thiserror::Error;

/// Exit status of a run, as reported to the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Completed with no errors.
    Ok = 0,
    /// Completed but reported errors.
    Error = 1,
    /// Bad command-line arguments.
    CmdErr = 2,
    /// System error or resource exhaustion.
    SysErr = 3,
    /// Terminated abnormally.
    Abnormal = 4,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Errors that terminate a run.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The command line is unusable.
    #[error("bad arguments: {key} {args:?}")]
    BadArgs {
        key: &'static str,
        args: Vec<String>,
        show_usage: bool,
    },

    /// An invariant of the engine itself was violated.
    ///
    /// `key` names a message describing the violation; `args` are its
    /// positional arguments.
    #[error("internal error: {key} {args:?}")]
    Internal { key: String, args: Vec<String> },
}

impl TaskError {
    pub fn bad_args(key: &'static str, args: Vec<String>) -> Self {
        TaskError::BadArgs {
            key,
            args,
            show_usage: false,
        }
    }

    /// Ask for the usage summary to be printed after the error.
    pub fn with_usage(self) -> Self {
        match self {
            TaskError::BadArgs { key, args, .. } => TaskError::BadArgs {
                key,
                args,
                show_usage: true,
            },
            other => other,
        }
    }

    pub fn internal(key: impl Into<String>, args: Vec<String>) -> Self {
        TaskError::Internal {
            key: key.into(),
            args,
        }
    }

    /// Exit status this error terminates the run with.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            TaskError::BadArgs { .. } => ExitStatus::CmdErr,
            TaskError::Internal { .. } => ExitStatus::Abnormal,
        }
    }
}
