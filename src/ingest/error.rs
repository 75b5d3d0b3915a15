use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported file type: {0} (expected .txt, .tmx or .docx)")]
    UnsupportedFormat(String),

    #[error("No content found in {0}")]
    NoContent(String),

    #[error("File is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("Not a word-processing document: {0}")]
    Docx(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Resource not found: {0}")]
    ResourceNotFound(i64),

    #[error(transparent)]
    Archive(#[from] anyhow::Error),
}

impl From<quick_xml::Error> for IngestError {
    fn from(e: quick_xml::Error) -> Self {
        IngestError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Non-fatal conditions reported alongside a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestWarning {
    /// Only the first of `count` tables was read.
    MultipleTables { count: usize },
}

impl std::fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestWarning::MultipleTables { count } => write!(
                f,
                "Multiple tables found ({}), only the first table was read",
                count
            ),
        }
    }
}
