use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Failures of the record readers and writers.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("couldn't open {}: {source}", path.display())]
    #[diagnostic(code(mlr::open))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{filename}: {source}")]
    #[diagnostic(code(mlr::csv), help("every data line must have as many fields as the header"))]
    Csv {
        filename: String,
        #[source]
        source: csv::Error,
    },

    #[error("{filename}: {source}")]
    #[diagnostic(code(mlr::json))]
    Json {
        filename: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{filename}: expected a JSON object; got {got}")]
    #[diagnostic(code(mlr::json_record))]
    NotAnObject { filename: String, got: &'static str },

    #[error("write failed: {0}")]
    #[diagnostic(code(mlr::write))]
    Write(#[from] io::Error),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Write(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Write(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
