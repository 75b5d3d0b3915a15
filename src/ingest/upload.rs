//! Staged upload files
//!
//! An upload is copied into the upload directory before parsing. The staged
//! copy belongs to a single ingestion call, which removes it once the parsed
//! records are committed.

use chrono::Utc;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::error::Result;

#[derive(Debug)]
pub struct UploadArtifact {
    path: PathBuf,
    name: String,
}

impl UploadArtifact {
    /// Copies `source` into `upload_dir` under a unique name that keeps the
    /// original extension.
    pub fn stage(source: &Path, upload_dir: &Path) -> Result<Self> {
        fs::create_dir_all(upload_dir)?;

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let staged_name = format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            std::process::id(),
            name
        );
        let path = upload_dir.join(staged_name);

        fs::copy(source, &path)?;
        tracing::debug!("Staged {} as {}", source.display(), path.display());

        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the original upload.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    pub fn open(&self) -> Result<File> {
        Ok(File::open(&self.path)?)
    }

    pub fn delete(self) -> Result<()> {
        fs::remove_file(&self.path)?;
        tracing::debug!("Removed staged upload {}", self.path.display());
        Ok(())
    }
}
