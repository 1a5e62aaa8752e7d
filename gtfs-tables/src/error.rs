//! Errors raised while reading a feed directory
use std::path::PathBuf;
use thiserror::Error;

/// Why a feed directory could not be read
#[derive(Error, Debug)]
pub enum Error {
    /// The given path does not exist or is not a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// A mandatory table is absent from the feed
    #[error("mandatory table {0} is missing")]
    MissingFile(String),
    /// The feed directory could not be listed
    #[error("could not list {}", .path.display())]
    ReadDir {
        /// Directory being searched for a feed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// A table exists but could not be opened or read
    #[error("could not read {file_name}")]
    Io {
        /// Name of the table, e.g. `trips.txt`
        file_name: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// A row of a table is not valid CSV or does not match the expected columns
    #[error("could not parse {file_name}")]
    Csv {
        /// Name of the table, e.g. `trips.txt`
        file_name: String,
        /// Line of the offending row, when known
        line: Option<u64>,
        /// Error of the csv library
        #[source]
        source: csv::Error,
    },
}
