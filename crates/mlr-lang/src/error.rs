use miette::Diagnostic;

use crate::{CompileError, RuntimeError};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(PartialEq, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// `NR` of the record being processed when a runtime error occurred.
    pub record_number: Option<i64>,
}

impl Error {
    pub fn runtime(cause: RuntimeError, record_number: Option<i64>) -> Self {
        Self {
            cause: InnerError::Runtime(cause),
            record_number,
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self {
            cause: InnerError::Compile(err),
            record_number: None,
        }
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Self::runtime(err, None)
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match &self.cause {
            InnerError::Compile(err) => err.code(),
            InnerError::Runtime(err) => err.code(),
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.record_number
            .map(|nr| Box::new(format!("while processing record {}", nr)) as Box<dyn std::fmt::Display>)
    }
}
