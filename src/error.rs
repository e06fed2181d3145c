use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures reading or writing the document file.
///
/// These never end the session; the UI shows them in the header and the
/// next save attempt retries naturally.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no line at index {0}")]
    NoSuchLine(usize),
}

/// Startup problems that stop the program before the UI is shown.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Specified {description} file is a directory.")]
    TargetIsDirectory { description: &'static str },
    #[error(
        "The directory: '{}' does not exist\n\nPlease create the directory or specify a different\n{description} file on the command line.",
        directory.display()
    )]
    MissingDirectory {
        directory: PathBuf,
        description: &'static str,
    },
    #[error("unable to create {}: {source}", path.display())]
    CreateTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to read config file {}: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config file {}: {message}", path.display())]
    ConfigMalformed { path: PathBuf, message: String },
}
