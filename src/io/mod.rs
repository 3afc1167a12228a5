use std::fmt;

pub mod cache;
pub mod csv;
pub mod json;
mod tests;

pub use cache::Cache;

#[derive(Debug)]
pub enum ImportError {
    Malformed { detail: String },
    Io(std::io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Malformed { detail } => write!(f, "malformed CSV input: {detail}"),
            ImportError::Io(inner) => write!(f, "failed to read input: {inner}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

#[derive(Debug)]
pub enum ExportError {
    EmptyData,
    Serialize { detail: String },
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptyData => write!(f, "no data to export"),
            ExportError::Serialize { detail } => write!(f, "failed to serialize data: {detail}"),
            ExportError::Io(inner) => write!(f, "failed to write output: {inner}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}
