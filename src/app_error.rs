use crate::config::ValidationErrors;
use crate::events::EventLogError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    RuntimeFailure = 1,
    Usage = 2,
    Internal = 3,
}

/// Error surfaced by the command line, carrying its process exit code.
#[derive(Debug)]
pub struct AppError {
    code: ExitCode,
    message: String,
}

impl AppError {
    pub fn usage<T: Into<String>>(message: T) -> Self {
        Self::with_code(ExitCode::Usage, message)
    }

    pub fn runtime<T: Into<String>>(message: T) -> Self {
        Self::with_code(ExitCode::RuntimeFailure, message)
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::with_code(ExitCode::Internal, message)
    }

    fn with_code<T: Into<String>>(code: ExitCode, message: T) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.code as i32
    }

    pub fn exit_code(&self) -> ExitCode {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<EventLogError> for AppError {
    fn from(err: EventLogError) -> Self {
        match &err {
            EventLogError::InvalidPath(_) => AppError::usage(err.to_string()),
            _ => AppError::runtime(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::usage(err.to_string())
    }
}
