use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse outcome of an import call, as reported to callers that only need
/// pass/fail information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportStatus {
    Pass,
    Fail,
    FormatError,
}

/// Errors that abort a COLLADA import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid COLLADA XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("COLLADA file does not have a standard header: {0}")]
    Header(String),

    #[error("{semantic} index {index} is outside source of {len} element(s) in geometry {geometry}")]
    IndexOutOfRange {
        geometry: String,
        semantic: String,
        index: usize,
        len: usize,
    },

    #[error("out of memory while allocating {what}")]
    Allocation { what: &'static str },
}

impl ImportError {
    /// Maps the error onto the status taxonomy.
    pub fn status(&self) -> ImportStatus {
        match self {
            Self::Xml(_) | Self::Header(_) => ImportStatus::FormatError,
            Self::Io { .. } | Self::IndexOutOfRange { .. } | Self::Allocation { .. } => {
                ImportStatus::Fail
            }
        }
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_xml_errors_are_format_errors() {
        let header = ImportError::Header("version 1.3.0".into());
        assert_eq!(header.status(), ImportStatus::FormatError);

        let Err(xml) = roxmltree::Document::parse("<COLLADA>") else {
            panic!("unterminated root must not parse");
        };
        assert_eq!(ImportError::from(xml).status(), ImportStatus::FormatError);
    }

    #[test]
    fn resource_errors_are_failures() {
        let err = ImportError::Allocation { what: "vertex buffer" };
        assert_eq!(err.status(), ImportStatus::Fail);
        assert_eq!(err.to_string(), "out of memory while allocating vertex buffer");
    }
}
