use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use favgen_core::{DocId, GroupKey, Selection, SettingsDoc};
use favgen_store::DocStore;

/// Durable settings-document store on sqlite. The selection is stored as a
/// JSON column; markup and fingerprint are written together in one statement.
pub struct SqliteDocStore {
    conn: Mutex<Connection>,
}

impl SqliteDocStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db {}", db_path.display()))?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Insert or replace a whole document. Used when seeding the primary doc
    /// and when the editor changes the selection.
    pub fn save_settings(&self, doc: &SettingsDoc) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let selection_json = serde_json::to_string(&doc.selection)?;
        conn.execute(
            "INSERT INTO settings_docs(id, group_key, selection_json, favicon_links, favicon_fingerprint)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
               group_key = excluded.group_key,
               selection_json = excluded.selection_json,
               favicon_links = excluded.favicon_links,
               favicon_fingerprint = excluded.favicon_fingerprint",
            params![
                doc.id.as_str(),
                doc.group_key.as_ref().map(|g| g.as_str()),
                selection_json,
                doc.favicon_links,
                doc.favicon_fingerprint,
            ],
        )?;
        Ok(())
    }

    /// Update only the selection column, leaving generated fields alone. This
    /// is what an editorial save does; the pipeline catches up afterwards.
    pub fn save_selection(&self, id: &DocId, selection: &Selection) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let selection_json = serde_json::to_string(selection)?;
        let n = conn.execute(
            "UPDATE settings_docs SET selection_json = ?2 WHERE id = ?1",
            params![id.as_str(), selection_json],
        )?;
        if n == 0 {
            return Err(anyhow!("settings doc {} not found", id.as_str()));
        }
        Ok(())
    }

    fn row_to_doc(
        id: String,
        group_key: Option<String>,
        selection_json: String,
        favicon_links: String,
        favicon_fingerprint: String,
    ) -> Result<SettingsDoc> {
        let selection: Selection = serde_json::from_str(&selection_json)
            .with_context(|| format!("parse selection for doc {}", id))?;
        Ok(SettingsDoc {
            id: DocId::from_str(id),
            group_key: group_key.map(GroupKey::from_str),
            selection,
            favicon_links,
            favicon_fingerprint,
        })
    }
}

impl DocStore for SqliteDocStore {
    fn load_settings(&self, id: &DocId) -> Result<SettingsDoc> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, group_key, selection_json, favicon_links, favicon_fingerprint
                 FROM settings_docs WHERE id = ?1",
                params![id.as_str()],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, Option<String>>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        let (id, group_key, selection_json, links, fingerprint) =
            row.ok_or_else(|| anyhow!("settings doc {} not found", id.as_str()))?;
        Self::row_to_doc(id, group_key, selection_json, links, fingerprint)
    }

    fn update_favicon_fields(&self, id: &DocId, links: &str, fingerprint: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE settings_docs SET favicon_links = ?2, favicon_fingerprint = ?3 WHERE id = ?1",
            params![id.as_str(), links, fingerprint],
        )?;
        if n == 0 {
            return Err(anyhow!("settings doc {} not found", id.as_str()));
        }
        Ok(())
    }

    fn update_group(&self, key: &GroupKey, links: &str, fingerprint: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE settings_docs SET favicon_links = ?2, favicon_fingerprint = ?3 WHERE group_key = ?1",
            params![key.as_str(), links, fingerprint],
        )?;
        Ok(n)
    }
}
