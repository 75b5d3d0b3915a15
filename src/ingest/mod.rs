pub mod docx;
pub mod error;
pub mod format;
pub mod tabbed;
pub mod tmx;
pub mod upload;

use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::BufReader;

use crate::archive::models::{RecordDraft, Resource, ResourceKind, ResourceMeta};
use crate::archive::{Archive, UploadTarget};
use crate::cli::{GlobalArgs, UploadArgs};
use crate::config::Config;
use error::{IngestError, IngestWarning, Result};
use format::Format;
use upload::UploadArtifact;

/// Which resource an upload goes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Append(i64),
    Create { title: String, kind: ResourceKind },
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub resource: Resource,
    pub record_count: usize,
    /// Tab-delimited lines dropped for having the wrong number of fields.
    pub skipped_lines: usize,
    pub warnings: Vec<IngestWarning>,
}

#[derive(Debug, Default)]
struct Parsed {
    drafts: Vec<RecordDraft>,
    skipped_lines: usize,
    warnings: Vec<IngestWarning>,
}

pub struct Ingestor<'a> {
    archive: &'a mut Archive,
}

impl<'a> Ingestor<'a> {
    pub fn new(archive: &'a mut Archive) -> Self {
        Self { archive }
    }

    /// Parses the staged upload and commits the resource with its records.
    /// The staged copy is removed afterwards whether or not the commit
    /// happened; on failure nothing is written.
    pub fn ingest(
        &mut self,
        upload: UploadArtifact,
        selector: TargetSelector,
        meta: ResourceMeta,
        actor: &str,
    ) -> Result<IngestOutcome> {
        let result = self.ingest_staged(&upload, selector, meta, actor);
        discard_staged(upload);
        result
    }

    fn ingest_staged(
        &mut self,
        upload: &UploadArtifact,
        selector: TargetSelector,
        meta: ResourceMeta,
        actor: &str,
    ) -> Result<IngestOutcome> {
        let target = self.resolve_target(selector, meta)?;
        let format = Format::detect(upload.path())?;
        tracing::info!("Parsing {} as {}", upload.name(), format);

        let parsed = parse(format, upload)?;
        if parsed.drafts.is_empty() {
            return Err(IngestError::NoContent(upload.name().to_string()));
        }

        let resource = self
            .archive
            .commit_upload(&target, &parsed.drafts, actor)?;
        tracing::info!(
            "Committed {} record(s) to resource {} ({})",
            parsed.drafts.len(),
            resource.id,
            resource.title
        );

        Ok(IngestOutcome {
            resource,
            record_count: parsed.drafts.len(),
            skipped_lines: parsed.skipped_lines,
            warnings: parsed.warnings,
        })
    }

    fn resolve_target(&self, selector: TargetSelector, meta: ResourceMeta) -> Result<UploadTarget> {
        match selector {
            TargetSelector::Append(id) => {
                let mut resource = self
                    .archive
                    .get_resource(id)?
                    .ok_or(IngestError::ResourceNotFound(id))?;
                resource.merge_notes(&meta.notes);
                Ok(UploadTarget::Existing(resource))
            }
            TargetSelector::Create { title, kind } => Ok(UploadTarget::New { title, kind, meta }),
        }
    }
}

/// A leftover staged file is only logged: once records are committed the
/// upload has succeeded and must not be retried.
fn discard_staged(upload: UploadArtifact) {
    let path = upload.path().to_path_buf();
    if let Err(e) = upload.delete() {
        tracing::warn!("Failed to remove staged upload {}: {}", path.display(), e);
    }
}

fn parse(format: Format, upload: &UploadArtifact) -> Result<Parsed> {
    match format {
        Format::TabDelimited => {
            let parsed = tabbed::parse_tabbed(upload.read()?)?;
            if parsed.skipped_lines > 0 {
                tracing::debug!("Skipped {} malformed line(s)", parsed.skipped_lines);
            }
            Ok(Parsed {
                drafts: parsed.drafts,
                skipped_lines: parsed.skipped_lines,
                warnings: Vec::new(),
            })
        }
        Format::Tmx => Ok(Parsed {
            drafts: tmx::parse_tmx(&upload.read()?)?,
            ..Default::default()
        }),
        Format::Docx => {
            let parsed = docx::parse_docx(BufReader::new(upload.open()?))?;
            let mut warnings = Vec::new();
            if parsed.table_count > 1 {
                warnings.push(IngestWarning::MultipleTables {
                    count: parsed.table_count,
                });
            }
            Ok(Parsed {
                drafts: parsed.drafts,
                skipped_lines: 0,
                warnings,
            })
        }
    }
}

pub fn run(args: UploadArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let actor = cfg.actor(global.actor.as_deref());
    let mut archive = Archive::open(cfg.database_path(global.db.as_deref())?)?;

    let input = &args.file;
    if !input.is_file() {
        anyhow::bail!("Upload file does not exist: {}", input.display());
    }
    let upload_format = Format::detect(input)?;
    let selector = validate_selector(&archive, &args, upload_format)?;

    println!("{}", format!("[Upload] {}", input.display()).green());

    let meta = ResourceMeta {
        notes: args.notes.unwrap_or_default(),
        field: args.field.unwrap_or_default(),
        client: args.client.unwrap_or_default(),
        translator: args.translator.unwrap_or_default(),
    };

    let upload = UploadArtifact::stage(input, &cfg.upload_dir()?)
        .context("Failed to stage upload")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Importing {}...", upload_format));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = Ingestor::new(&mut archive).ingest(upload, selector, meta, &actor);
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(IngestError::NoContent(what)) => {
            anyhow::bail!("Upload failed: no content found in {}", what)
        }
        Err(e) => return Err(e).context("Upload failed"),
    };

    for warning in &outcome.warnings {
        println!("{}", format!("[WARN] {}", warning).yellow());
    }
    if outcome.skipped_lines > 0 {
        println!(
            "{}",
            format!(
                "[WARN] Skipped {} line(s) without 2 or 3 tab-separated fields",
                outcome.skipped_lines
            )
            .yellow()
        );
    }

    println!(
        "{}",
        format!(
            "[OK] Imported {} record(s) into {} #{} \"{}\"",
            outcome.record_count, outcome.resource.kind, outcome.resource.id, outcome.resource.title
        )
        .green()
    );

    Ok(())
}

/// Exactly one of `--into` and `--title`; a new title must not collide with
/// an existing resource of the same kind.
fn validate_selector(
    archive: &Archive,
    args: &UploadArgs,
    format: Format,
) -> anyhow::Result<TargetSelector> {
    let title = args.title.as_deref().map(str::trim).filter(|t| !t.is_empty());

    match (args.into, title) {
        (Some(_), Some(_)) => {
            anyhow::bail!("Choose either --into (existing resource) or --title (new resource), not both")
        }
        (None, None) => {
            anyhow::bail!("Choose either --into (existing resource) or --title (new resource)")
        }
        (Some(id), None) => {
            if archive.get_resource(id)?.is_none() {
                anyhow::bail!("Resource not found: {}", id);
            }
            Ok(TargetSelector::Append(id))
        }
        (None, Some(title)) => {
            let kind = args
                .kind
                .map(ResourceKind::from)
                .unwrap_or_else(|| format.default_kind());
            if archive.find_resource(title, kind)?.is_some() {
                anyhow::bail!("A {} titled \"{}\" already exists", kind, title);
            }
            Ok(TargetSelector::Create {
                title: title.to_string(),
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use super::docx::tests::{docx_bytes, table};

    fn stage(temp: &TempDir, name: &str, content: &[u8]) -> UploadArtifact {
        let source = temp.path().join(name);
        fs::write(&source, content).unwrap();
        UploadArtifact::stage(&source, &temp.path().join("uploads")).unwrap()
    }

    fn staged_files(temp: &TempDir) -> usize {
        let dir = temp.path().join("uploads");
        if !Path::new(&dir).exists() {
            return 0;
        }
        fs::read_dir(dir).unwrap().count()
    }

    fn create(title: &str, kind: ResourceKind) -> TargetSelector {
        TargetSelector::Create {
            title: title.to_string(),
            kind,
        }
    }

    #[test]
    fn test_tab_upload_creates_resource_and_removes_staged_file() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "terms.txt", "鍵情報\tkey information\nbad line\nA\tB\tnote\n".as_bytes());

        let outcome = Ingestor::new(&mut archive)
            .ingest(upload, create("Keys", ResourceKind::Glossary), ResourceMeta::default(), "alice")
            .unwrap();

        assert_eq!(outcome.record_count, 2);
        assert_eq!(outcome.skipped_lines, 1);
        assert_eq!(staged_files(&temp), 0);

        let items = archive.items(outcome.resource.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "鍵情報");
        assert_eq!(items[1].notes, "note");
        assert_eq!(items[1].created_by, "alice");
        assert_eq!(outcome.resource.created_by, "alice");
    }

    #[test]
    fn test_committed_upload_survives_cleanup_failure() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "terms.txt", b"contract\tkeiyaku\n");

        let outcome = Ingestor::new(&mut archive)
            .ingest_staged(&upload, create("Legal", ResourceKind::Glossary), ResourceMeta::default(), "t")
            .unwrap();

        // Staged copy already gone, so removing it fails.
        fs::remove_file(upload.path()).unwrap();
        discard_staged(upload);

        assert_eq!(archive.count_items(outcome.resource.id).unwrap(), 1);
        assert_eq!(staged_files(&temp), 0);
    }

    #[test]
    fn test_append_merges_notes() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let existing = archive
            .create_resource(
                "Legal",
                ResourceKind::Glossary,
                &ResourceMeta {
                    notes: "first".to_string(),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();
        archive
            .add_item(existing.id, &RecordDraft::new("contract", "契約"), "alice")
            .unwrap();

        let upload = stage(&temp, "more.txt", b"claim\tclaim\n");
        let meta = ResourceMeta {
            notes: "second".to_string(),
            ..Default::default()
        };
        let outcome = Ingestor::new(&mut archive)
            .ingest(upload, TargetSelector::Append(existing.id), meta, "bob")
            .unwrap();

        assert_eq!(outcome.resource.id, existing.id);
        assert_eq!(outcome.resource.notes, "first\nsecond");
        assert_eq!(outcome.resource.updated_by, "bob");
        assert_eq!(outcome.resource.created_by, "alice");
        assert_eq!(archive.count_items(existing.id).unwrap(), 2);
    }

    #[test]
    fn test_tmx_upload() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let tmx = "<tmx><body>\
            <tu><tuv xml:lang=\"en\"><seg>apple</seg></tuv><tuv xml:lang=\"ja\"><seg>りんご</seg></tuv></tu>\
            <tu><tuv xml:lang=\"en\"><seg>pear</seg></tuv><tuv xml:lang=\"ja\"><seg>\u{1A}</seg></tuv></tu>\
            </body></tmx>";
        let upload = stage(&temp, "fruit.tmx", tmx.as_bytes());

        let outcome = Ingestor::new(&mut archive)
            .ingest(upload, create("Fruit", ResourceKind::Translation), ResourceMeta::default(), "t")
            .unwrap();

        let items = archive.items(outcome.resource.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source, "pear");
        assert_eq!(items[1].target, "");
    }

    #[test]
    fn test_docx_multiple_tables_warns() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let body = format!(
            "{}{}",
            table(&[("a", "1"), ("b", "2"), ("c", "3")]),
            table(&[("d", "4"), ("e", "5"), ("f", "6"), ("g", "7"), ("h", "8")])
        );
        let upload = stage(&temp, "tables.docx", &docx_bytes(&body));

        let outcome = Ingestor::new(&mut archive)
            .ingest(upload, create("Tables", ResourceKind::Translation), ResourceMeta::default(), "t")
            .unwrap();

        assert_eq!(outcome.record_count, 3);
        assert_eq!(outcome.warnings, vec![IngestWarning::MultipleTables { count: 2 }]);
        assert_eq!(archive.count_items(outcome.resource.id).unwrap(), 3);
    }

    #[test]
    fn test_docx_without_table_commits_nothing() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "prose.docx", &docx_bytes("<w:p><w:r><w:t>text</w:t></w:r></w:p>"));

        let result = Ingestor::new(&mut archive).ingest(
            upload,
            create("Prose", ResourceKind::Translation),
            ResourceMeta::default(),
            "t",
        );

        assert!(matches!(result, Err(IngestError::NoContent(_))));
        assert!(archive.list_resources(None).unwrap().is_empty());
        assert_eq!(staged_files(&temp), 0);
    }

    #[test]
    fn test_empty_tab_file_commits_nothing() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "empty.txt", b"no tabs here\n");

        let result = Ingestor::new(&mut archive).ingest(
            upload,
            create("Empty", ResourceKind::Glossary),
            ResourceMeta::default(),
            "t",
        );

        assert!(matches!(result, Err(IngestError::NoContent(_))));
        assert!(
            archive
                .find_resource("Empty", ResourceKind::Glossary)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_encoding_failure_commits_nothing() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "sjis.txt", &[0x8F, 0xEE, b'\t', b'x']);

        let result = Ingestor::new(&mut archive).ingest(
            upload,
            create("Sjis", ResourceKind::Glossary),
            ResourceMeta::default(),
            "t",
        );

        assert!(matches!(result, Err(IngestError::Encoding(_))));
        assert!(archive.list_resources(None).unwrap().is_empty());
    }

    #[test]
    fn test_append_to_missing_resource() {
        let temp = TempDir::new().unwrap();
        let mut archive = Archive::open_in_memory().unwrap();
        let upload = stage(&temp, "terms.txt", b"a\tb\n");

        let result = Ingestor::new(&mut archive).ingest(
            upload,
            TargetSelector::Append(42),
            ResourceMeta::default(),
            "t",
        );
        assert!(matches!(result, Err(IngestError::ResourceNotFound(42))));
    }
}
