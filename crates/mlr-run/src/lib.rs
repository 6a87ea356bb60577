//! The I/O layer around [`mlr_lang`]: record readers and writers, the
//! channel pipeline between them, and the `mlr` command line.
pub mod cli;
pub mod error;
pub mod input;
pub mod output;
pub mod stream;

pub use cli::Cli;
pub use error::Error;
