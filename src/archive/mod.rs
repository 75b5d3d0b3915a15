//! Resource and record storage using SQLite

pub mod models;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

use crate::search::Scope;
use crate::search::highlight::Matcher;
use models::{
    Record, RecordDraft, RecordUpdate, Resource, ResourceKind, ResourceMeta, ResourceUpdate,
};

const RESOURCE_COLUMNS: &str = "id, title, kind, field, client, translator, notes, \
     created_on, created_by, updated_on, updated_by";

const ITEM_COLUMNS: &str = "items.id, items.resource_id, items.source, items.target, items.notes, \
     items.created_on, items.created_by, items.updated_on, items.updated_by";

/// Where an upload's records go once they have been parsed.
#[derive(Debug, Clone)]
pub enum UploadTarget {
    /// An existing resource, already carrying its merged notes.
    Existing(Resource),
    New {
        title: String,
        kind: ResourceKind,
        meta: ResourceMeta,
    },
}

/// A search candidate joined with its owning resource.
#[derive(Debug, Clone)]
pub struct ScopedRecord {
    pub record: Record,
    pub resource_title: String,
    pub resource_kind: ResourceKind,
}

pub struct Archive {
    conn: Connection,
}

impl Archive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create archive directory")?;
            }
        }

        let conn = Connection::open(path)
            .context(format!("Failed to open archive: {}", path.display()))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

             CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('GLOSSARY', 'TRANSLATION')),
                field TEXT NOT NULL DEFAULT '',
                client TEXT NOT NULL DEFAULT '',
                translator TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                created_on TEXT NOT NULL,
                created_by TEXT NOT NULL,
                updated_on TEXT NOT NULL,
                updated_by TEXT NOT NULL
             );

             CREATE UNIQUE INDEX IF NOT EXISTS idx_resource_title
             ON resources(kind, title COLLATE NOCASE);

             CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY,
                resource_id INTEGER NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
                source TEXT NOT NULL DEFAULT '',
                target TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                created_on TEXT NOT NULL,
                created_by TEXT NOT NULL,
                updated_on TEXT NOT NULL,
                updated_by TEXT NOT NULL
             );

             CREATE INDEX IF NOT EXISTS idx_items_resource ON items(resource_id);",
        )
        .context("Failed to initialize archive schema")?;

        Ok(Self { conn })
    }

    pub fn create_resource(
        &self,
        title: &str,
        kind: ResourceKind,
        meta: &ResourceMeta,
        actor: &str,
    ) -> Result<Resource> {
        let id = insert_resource(&self.conn, title, kind, meta, actor)
            .context(format!("Failed to create resource: {}", title))?;
        self.get_resource(id)?
            .context("Resource vanished after insert")
    }

    pub fn get_resource(&self, id: i64) -> Result<Option<Resource>> {
        let resource = self
            .conn
            .query_row(
                &format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS),
                params![id],
                resource_from_row,
            )
            .optional()?;
        Ok(resource)
    }

    /// Case-insensitive title lookup within one kind.
    pub fn find_resource(&self, title: &str, kind: ResourceKind) -> Result<Option<Resource>> {
        let wanted = title.to_lowercase();
        Ok(self
            .list_resources(Some(kind))?
            .into_iter()
            .find(|r| r.title.to_lowercase() == wanted))
    }

    pub fn list_resources(&self, kind: Option<ResourceKind>) -> Result<Vec<Resource>> {
        let sql = format!(
            "SELECT {} FROM resources WHERE (?1 IS NULL OR kind = ?1) ORDER BY title",
            RESOURCE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let resources = stmt
            .query_map(params![kind.map(|k| k.as_str())], resource_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(resources)
    }

    /// Deletes a resource together with all of its items.
    pub fn delete_resource(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Applies `update` and stamps the editor. Returns `None` when there is
    /// no such resource.
    pub fn update_resource(
        &self,
        id: i64,
        update: &ResourceUpdate,
        actor: &str,
    ) -> Result<Option<Resource>> {
        let Some(mut resource) = self.get_resource(id)? else {
            return Ok(None);
        };
        update.apply(&mut resource);

        self.conn
            .execute(
                "UPDATE resources
                 SET title = ?1, notes = ?2, field = ?3, client = ?4, translator = ?5,
                     updated_on = ?6, updated_by = ?7
                 WHERE id = ?8",
                params![
                    resource.title,
                    resource.notes,
                    resource.field,
                    resource.client,
                    resource.translator,
                    Utc::now(),
                    actor,
                    id
                ],
            )
            .context(format!("Failed to update resource {}", id))?;

        self.get_resource(id)
    }

    pub fn add_item(&self, resource_id: i64, draft: &RecordDraft, actor: &str) -> Result<Record> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO items (resource_id, source, target, notes,
                                    created_on, created_by, updated_on, updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6)",
                params![resource_id, draft.source, draft.target, draft.notes, now, actor],
            )
            .context(format!("Failed to add item to resource {}", resource_id))?;

        let id = self.conn.last_insert_rowid();
        self.touch_resource(resource_id, actor)?;
        self.get_item(id)?.context("Item vanished after insert")
    }

    pub fn get_item(&self, id: i64) -> Result<Option<Record>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM items WHERE items.id = ?1", ITEM_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Edits an item; the owning resource is marked as updated too.
    pub fn update_item(&self, id: i64, update: &RecordUpdate, actor: &str) -> Result<Option<Record>> {
        let Some(mut record) = self.get_item(id)? else {
            return Ok(None);
        };
        update.apply(&mut record);

        self.conn
            .execute(
                "UPDATE items SET source = ?1, target = ?2, notes = ?3,
                                  updated_on = ?4, updated_by = ?5
                 WHERE id = ?6",
                params![record.source, record.target, record.notes, Utc::now(), actor, id],
            )
            .context(format!("Failed to update item {}", id))?;
        self.touch_resource(record.resource_id, actor)?;

        self.get_item(id)
    }

    pub fn delete_item(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn count_items(&self, resource_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE resource_id = ?1",
            params![resource_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn items(&self, resource_id: i64) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE items.resource_id = ?1 ORDER BY items.id",
            ITEM_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![resource_id], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Writes the resource and all drafts in one transaction. The resource is
    /// inserted or updated first so that every item can reference its id.
    pub fn commit_upload(
        &mut self,
        target: &UploadTarget,
        drafts: &[RecordDraft],
        actor: &str,
    ) -> rusqlite::Result<Resource> {
        let tx = self.conn.transaction()?;

        let resource_id = match target {
            UploadTarget::Existing(resource) => {
                tx.execute(
                    "UPDATE resources SET notes = ?1, updated_on = ?2, updated_by = ?3
                     WHERE id = ?4",
                    params![resource.notes, Utc::now(), actor, resource.id],
                )?;
                resource.id
            }
            UploadTarget::New { title, kind, meta } => {
                insert_resource(&tx, title, *kind, meta, actor)?
            }
        };

        {
            let now = Utc::now();
            let mut stmt = tx.prepare(
                "INSERT INTO items (resource_id, source, target, notes,
                                    created_on, created_by, updated_on, updated_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6)",
            )?;
            for draft in drafts {
                stmt.execute(params![
                    resource_id,
                    draft.source,
                    draft.target,
                    draft.notes,
                    now,
                    actor
                ])?;
            }
        }

        let resource = tx.query_row(
            &format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS),
            params![resource_id],
            resource_from_row,
        )?;

        tx.commit()?;
        Ok(resource)
    }

    /// Records in `scope` that `matcher` accepts in source or target (and
    /// notes when `include_notes`), in insertion order. Matching runs inside
    /// SQLite so rejected rows are never materialized.
    pub fn matching_records(
        &self,
        scope: &Scope,
        matcher: Matcher,
        include_notes: bool,
    ) -> Result<Vec<ScopedRecord>> {
        self.conn
            .create_scalar_function(
                "matches_query",
                1,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                move |ctx| {
                    let text: String = ctx.get(0)?;
                    Ok(matcher.is_match(&text))
                },
            )
            .context("Failed to register search function")?;

        let (filter, arg) = match scope {
            Scope::All => ("1 = 1", None),
            Scope::Glossaries => ("resources.kind = ?1", Some(ResourceKind::Glossary.as_str())),
            Scope::Translations => (
                "resources.kind = ?1",
                Some(ResourceKind::Translation.as_str()),
            ),
            Scope::Resource(title) => ("resources.title = ?1", Some(title.as_str())),
        };
        let notes = if include_notes {
            " OR matches_query(items.notes)"
        } else {
            ""
        };

        let sql = format!(
            "SELECT {}, resources.title, resources.kind
             FROM items JOIN resources ON resources.id = items.resource_id
             WHERE {}
               AND (matches_query(items.source) OR matches_query(items.target){})
             ORDER BY items.id",
            ITEM_COLUMNS, filter, notes
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &Row<'_>| {
            Ok(ScopedRecord {
                record: record_from_row(row)?,
                resource_title: row.get(9)?,
                resource_kind: kind_from_column(row, 10)?,
            })
        };

        let rows = match arg {
            Some(arg) => stmt.query_map(params![arg], map_row)?,
            None => stmt.query_map([], map_row)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn touch_resource(&self, id: i64, actor: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE resources SET updated_on = ?1, updated_by = ?2 WHERE id = ?3",
            params![Utc::now(), actor, id],
        )?;
        Ok(())
    }
}

fn insert_resource(
    conn: &Connection,
    title: &str,
    kind: ResourceKind,
    meta: &ResourceMeta,
    actor: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO resources (title, kind, field, client, translator, notes,
                                created_on, created_by, updated_on, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7, ?8)",
        params![
            title,
            kind.as_str(),
            meta.field,
            meta.client,
            meta.translator,
            meta.notes,
            Utc::now(),
            actor
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn kind_from_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ResourceKind> {
    let raw: String = row.get(idx)?;
    match raw.as_str() {
        "GLOSSARY" => Ok(ResourceKind::Glossary),
        "TRANSLATION" => Ok(ResourceKind::Translation),
        _ => Err(rusqlite::Error::InvalidColumnType(idx, "kind".to_string(), Type::Text)),
    }
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: kind_from_column(row, 2)?,
        field: row.get(3)?,
        client: row.get(4)?,
        translator: row.get(5)?,
        notes: row.get(6)?,
        created_on: row.get(7)?,
        created_by: row.get(8)?,
        updated_on: row.get(9)?,
        updated_by: row.get(10)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        source: row.get(2)?,
        target: row.get(3)?,
        notes: row.get(4)?,
        created_on: row.get(5)?,
        created_by: row.get(6)?,
        updated_on: row.get(7)?,
        updated_by: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary(archive: &Archive, title: &str) -> Resource {
        archive
            .create_resource(title, ResourceKind::Glossary, &ResourceMeta::default(), "alice")
            .unwrap()
    }

    #[test]
    fn test_create_and_find_case_insensitive() {
        let archive = Archive::open_in_memory().unwrap();
        let created = glossary(&archive, "Medical Terms");

        let found = archive
            .find_resource("medical terms", ResourceKind::Glossary)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.created_by, "alice");
        assert!(
            archive
                .find_resource("medical terms", ResourceKind::Translation)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_duplicate_title_rejected_per_kind() {
        let archive = Archive::open_in_memory().unwrap();
        glossary(&archive, "Patents");

        let duplicate = archive.create_resource(
            "PATENTS",
            ResourceKind::Glossary,
            &ResourceMeta::default(),
            "bob",
        );
        assert!(duplicate.is_err());

        let other_kind = archive.create_resource(
            "Patents",
            ResourceKind::Translation,
            &ResourceMeta::default(),
            "bob",
        );
        assert!(other_kind.is_ok());
    }

    #[test]
    fn test_delete_resource_cascades_items() {
        let archive = Archive::open_in_memory().unwrap();
        let resource = glossary(&archive, "Cascade");
        for i in 0..5 {
            archive
                .add_item(resource.id, &RecordDraft::new(format!("s{}", i), "t"), "alice")
                .unwrap();
        }
        assert_eq!(archive.count_items(resource.id).unwrap(), 5);

        assert!(archive.delete_resource(resource.id).unwrap());
        assert_eq!(archive.count_items(resource.id).unwrap(), 0);
        assert!(archive.get_resource(resource.id).unwrap().is_none());
    }

    #[test]
    fn test_commit_upload_new_resource() {
        let mut archive = Archive::open_in_memory().unwrap();
        let target = UploadTarget::New {
            title: "Batch".to_string(),
            kind: ResourceKind::Translation,
            meta: ResourceMeta {
                client: "ACME".to_string(),
                ..Default::default()
            },
        };
        let drafts = vec![RecordDraft::new("a", "b"), RecordDraft::new("c", "")];

        let resource = archive.commit_upload(&target, &drafts, "carol").unwrap();
        assert_eq!(resource.client, "ACME");
        assert_eq!(resource.created_by, "carol");

        let items = archive.items(resource.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source, "c");
        assert_eq!(items[1].target, "");
        assert_eq!(items[0].created_by, "carol");
    }

    #[test]
    fn test_update_resource_stamps_editor() {
        let archive = Archive::open_in_memory().unwrap();
        let resource = glossary(&archive, "Drafts");

        let update = ResourceUpdate {
            title: Some("Final".to_string()),
            client: Some("ACME".to_string()),
            ..Default::default()
        };
        let updated = archive.update_resource(resource.id, &update, "bob").unwrap().unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.client, "ACME");
        assert_eq!(updated.kind, ResourceKind::Glossary);
        assert_eq!(updated.created_by, "alice");
        assert_eq!(updated.updated_by, "bob");
        assert!(updated.updated_on >= resource.updated_on);

        assert!(archive.update_resource(999, &update, "bob").unwrap().is_none());
    }

    #[test]
    fn test_rename_to_taken_title_rejected() {
        let archive = Archive::open_in_memory().unwrap();
        glossary(&archive, "Patents");
        let other = glossary(&archive, "Trademarks");

        let update = ResourceUpdate {
            title: Some("PATENTS".to_string()),
            ..Default::default()
        };
        assert!(archive.update_resource(other.id, &update, "bob").is_err());
        assert_eq!(archive.get_resource(other.id).unwrap().unwrap().title, "Trademarks");
    }

    #[test]
    fn test_update_item_touches_resource() {
        let archive = Archive::open_in_memory().unwrap();
        let resource = glossary(&archive, "Edits");
        let item = archive
            .add_item(resource.id, &RecordDraft::new("lever", "rebaa").with_notes("old"), "alice")
            .unwrap();

        let update = RecordUpdate {
            target: Some("レバー".to_string()),
            notes: Some(String::new()),
            ..Default::default()
        };
        let edited = archive.update_item(item.id, &update, "bob").unwrap().unwrap();

        assert_eq!(edited.source, "lever");
        assert_eq!(edited.target, "レバー");
        assert_eq!(edited.notes, "");
        assert_eq!(edited.created_by, "alice");
        assert_eq!(edited.updated_by, "bob");
        assert_eq!(archive.get_resource(resource.id).unwrap().unwrap().updated_by, "bob");

        assert!(archive.update_item(999, &update, "bob").unwrap().is_none());
    }

    #[test]
    fn test_matching_records_filters_by_scope_and_query() {
        let archive = Archive::open_in_memory().unwrap();
        let g = glossary(&archive, "G");
        let t = archive
            .create_resource("T", ResourceKind::Translation, &ResourceMeta::default(), "a")
            .unwrap();
        archive.add_item(g.id, &RecordDraft::new("情報処理装置", "device"), "a").unwrap();
        archive.add_item(t.id, &RecordDraft::new("装置", "Device"), "a").unwrap();
        archive
            .add_item(g.id, &RecordDraft::new("窓", "window").with_notes("not a DEVICE"), "a")
            .unwrap();
        archive.add_item(g.id, &RecordDraft::new("鍵", "key"), "a").unwrap();

        let all = archive
            .matching_records(&Scope::All, Matcher::new("device").unwrap(), true)
            .unwrap();
        let sources: Vec<_> = all.iter().map(|r| r.record.source.as_str()).collect();
        assert_eq!(sources, vec!["情報処理装置", "装置", "窓"]);

        let without_notes = archive
            .matching_records(&Scope::All, Matcher::new("device").unwrap(), false)
            .unwrap();
        assert_eq!(without_notes.len(), 2);

        let glossaries = archive
            .matching_records(&Scope::Glossaries, Matcher::new("").unwrap(), true)
            .unwrap();
        assert_eq!(glossaries.len(), 3);
        assert!(glossaries.iter().all(|r| r.resource_kind == ResourceKind::Glossary));

        let named = archive
            .matching_records(&Scope::Resource("T".to_string()), Matcher::new("dev").unwrap(), true)
            .unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].resource_title, "T");
    }
}
