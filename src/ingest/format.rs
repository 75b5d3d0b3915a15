//! Upload format detection by file extension

use std::fmt;
use std::path::Path;

use super::error::{IngestError, Result};
use crate::archive::models::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    TabDelimited,
    Tmx,
    Docx,
}

impl Format {
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(Format::TabDelimited),
            "tmx" => Ok(Format::Tmx),
            "docx" => Ok(Format::Docx),
            _ => Err(IngestError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Glossaries are imported from text files, translations from
    /// translation memories and documents.
    pub fn default_kind(&self) -> ResourceKind {
        match self {
            Format::TabDelimited => ResourceKind::Glossary,
            Format::Tmx | Format::Docx => ResourceKind::Translation,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::TabDelimited => write!(f, "tab-delimited text"),
            Format::Tmx => write!(f, "TMX"),
            Format::Docx => write!(f, "DOCX"),
        }
    }
}
