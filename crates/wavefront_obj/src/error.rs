use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A line did not match any recognized OBJ or MTL grammar. The line is skipped and parsing
/// continues; this is recorded rather than returned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidLine {
    pub line_text: String,
    pub line_index: usize,
}

impl std::fmt::Display for InvalidLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to parse line {}: {:?}",
            self.line_index, self.line_text
        )
    }
}

/// Errors that can surface from [`crate::import::Importer`] and [`crate::export::Exporter`].
///
/// Per-line grammar problems never reach this type directly; they are collected by the
/// tokenizers and reported with `log::warn!` as they're skipped. Only failures that abort a
/// whole phase become an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },

    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },

    #[error("mtllib referenced but not openable: {path}")]
    MtlMissing { path: PathBuf },

    #[error("no source file has been read yet")]
    NotLoaded,
}
