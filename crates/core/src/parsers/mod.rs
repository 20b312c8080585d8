mod go;

pub use go::GoParser;

use crate::models::FileHeader;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to initialize parser: {0}")]
    InitError(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Reads the package clause and import declarations of one source file
pub trait HeaderReader: Send + Sync {
    fn read_header(&self, path: &Path) -> Result<FileHeader, ParserError>;
}

/// [`HeaderReader`] backed by the tree-sitter Go grammar
#[derive(Debug, Default, Clone, Copy)]
pub struct GoHeaderReader;

impl HeaderReader for GoHeaderReader {
    fn read_header(&self, path: &Path) -> Result<FileHeader, ParserError> {
        let source = fs::read_to_string(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // tree-sitter parsers are not Sync, one per file
        let mut parser = GoParser::new()?;
        parser.parse(&source)
    }
}
