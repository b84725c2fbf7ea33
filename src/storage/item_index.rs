//! SQLite index of known item ids
//!
//! One database per dataset root, named `items_index_<hash>.sqlite` where
//! `<hash>` is the first 12 hex characters of the BLAKE3 hash of the absolute
//! root path. Items are searchable by name and id through FTS5, with a plain
//! `LIKE` scan when the SQLite build lacks FTS5.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{humanize, ItemId};

#[derive(Debug, Error)]
pub enum ItemIndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create index directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedItem {
    pub id: String,
    pub name: String,
}

/// What the index currently holds
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub path: PathBuf,
    pub items: usize,
    pub built_at: Option<String>,
    pub source_path: Option<String>,
    pub full_text: bool,
}

/// Item search index for one dataset root
pub struct ItemIndex {
    db_path: PathBuf,
    source_path: PathBuf,
    conn: Connection,
    fts: bool,
}

impl ItemIndex {
    /// Schema version - bump when schema changes to force rebuild
    const SCHEMA_VERSION: i32 = 1;

    /// Database file for `dataset_root` inside `index_dir`
    pub fn path_for(index_dir: &Path, dataset_root: &Path) -> PathBuf {
        let absolute = absolute(dataset_root);
        let hash = blake3::hash(absolute.to_string_lossy().as_bytes()).to_hex();
        index_dir.join(format!("items_index_{}.sqlite", &hash.as_str()[..12]))
    }

    /// Opens (creating if needed) the index for `dataset_root`
    pub fn open(index_dir: &Path, dataset_root: &Path) -> Result<Self, ItemIndexError> {
        fs::create_dir_all(index_dir).map_err(|source| ItemIndexError::CreateDir {
            path: index_dir.to_path_buf(),
            source,
        })?;

        let db_path = Self::path_for(index_dir, dataset_root);
        let conn = Connection::open(&db_path)?;
        // WAL misbehaves on some network and container mounts
        conn.execute_batch("PRAGMA journal_mode=DELETE; PRAGMA synchronous=NORMAL;")?;

        let mut index = Self {
            db_path,
            source_path: absolute(dataset_root),
            conn,
            fts: false,
        };
        index.ensure_schema()?;

        Ok(index)
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<(), ItemIndexError> {
        if self.get_schema_version()? != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }
        self.fts = self.has_table("items_fts")?;
        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32, ItemIndexError> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn has_table(&self, name: &str) -> Result<bool, ItemIndexError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Creates the schema from scratch
    fn create_schema(&mut self) -> Result<(), ItemIndexError> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS items_fts;
            DROP TABLE IF EXISTS items;
            DROP TABLE IF EXISTS meta;

            CREATE TABLE items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                ns TEXT NOT NULL,
                search_text TEXT NOT NULL
            );

            CREATE INDEX idx_items_name ON items(name);
            CREATE INDEX idx_items_ns ON items(ns);

            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Not every SQLite build has FTS5
        if let Err(e) = self.conn.execute_batch(
            "CREATE VIRTUAL TABLE items_fts USING fts5(name, id, tokenize='porter unicode61');",
        ) {
            tracing::warn!(error = %e, "FTS5 unavailable; item search falls back to LIKE");
        }

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Replaces the indexed items; returns how many were written
    pub fn rebuild(&mut self, items: &BTreeSet<ItemId>) -> Result<usize, ItemIndexError> {
        let fts = self.fts;
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM items", [])?;
        if fts {
            tx.execute("DELETE FROM items_fts", [])?;
        }

        {
            let mut insert_item = tx.prepare(
                "INSERT OR REPLACE INTO items (id, name, ns, search_text) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_fts = if fts {
                Some(tx.prepare("INSERT INTO items_fts (name, id) VALUES (?1, ?2)")?)
            } else {
                None
            };

            for item in items {
                let id = item.to_string();
                let name = humanize(item);
                let search_text = format!("{} {}", id.to_lowercase(), name.to_lowercase());
                insert_item.execute(params![id, name, item.namespace(), search_text])?;
                if let Some(stmt) = insert_fts.as_mut() {
                    stmt.execute(params![name, id])?;
                }
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('built_at', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('source_path', ?1)",
            params![self.source_path.display().to_string()],
        )?;
        tx.commit()?;

        tracing::debug!(items = items.len(), path = %self.db_path.display(), "item index rebuilt");
        Ok(items.len())
    }

    /// Number of indexed items
    pub fn count(&self) -> Result<usize, ItemIndexError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, ItemIndexError> {
        Ok(self.count()? == 0)
    }

    /// Finds items matching every term of `query` as a prefix
    ///
    /// A blank query lists items by name.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<IndexedItem>, ItemIndexError> {
        let query = query.trim();
        let limit = limit as i64;

        if query.is_empty() {
            return self.collect(
                "SELECT id, name FROM items ORDER BY name, id LIMIT ?1",
                params![limit],
            );
        }

        if self.fts {
            return self.collect(
                "SELECT i.id, i.name FROM items i
                 JOIN items_fts ON items_fts.id = i.id
                 WHERE items_fts MATCH ?1
                 ORDER BY i.name, i.id LIMIT ?2",
                params![fts_query(query), limit],
            );
        }

        self.collect(
            "SELECT id, name FROM items WHERE search_text LIKE ?1 ORDER BY name, id LIMIT ?2",
            params![format!("%{}%", query.to_lowercase()), limit],
        )
    }

    fn collect(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<IndexedItem>, ItemIndexError> {
        let mut stmt = self.conn.prepare(sql)?;
        let items = stmt
            .query_map(params, |row| {
                Ok(IndexedItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn meta(&self, key: &str) -> Result<Option<String>, ItemIndexError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn status(&self) -> Result<IndexStatus, ItemIndexError> {
        Ok(IndexStatus {
            path: self.db_path.clone(),
            items: self.count()?,
            built_at: self.meta("built_at")?,
            source_path: self.meta("source_path")?,
            full_text: self.fts,
        })
    }

    /// Returns the path to the index database
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

/// `oak lo` becomes `"oak"* AND "lo"*`
fn fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn items(ids: &[&str]) -> BTreeSet<ItemId> {
        ids.iter().map(|id| id.parse().unwrap()).collect()
    }

    fn open_index(dir: &TempDir) -> ItemIndex {
        ItemIndex::open(&dir.path().join("index"), &dir.path().join("instance")).unwrap()
    }

    fn sample() -> BTreeSet<ItemId> {
        items(&[
            "minecraft:oak_log",
            "minecraft:oak_planks",
            "minecraft:stick",
            "create:andesite_alloy",
        ])
    }

    #[test]
    fn index_path_is_stable_per_root() {
        let a = ItemIndex::path_for(Path::new("/idx"), Path::new("/games/atm10"));
        let b = ItemIndex::path_for(Path::new("/idx"), Path::new("/games/atm10"));
        let c = ItemIndex::path_for(Path::new("/idx"), Path::new("/games/other"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("items_index_"));
        assert_eq!(name.len(), "items_index_".len() + 12 + ".sqlite".len());
    }

    #[test]
    fn new_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = open_index(&dir);

        assert!(index.path().exists());
        assert!(index.is_empty().unwrap());
        assert_eq!(index.get_schema_version().unwrap(), ItemIndex::SCHEMA_VERSION);
    }

    #[test]
    fn rebuild_and_search() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        assert_eq!(index.rebuild(&sample()).unwrap(), 4);

        let hits = index.search("oak", 10).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["minecraft:oak_log", "minecraft:oak_planks"]);
        assert_eq!(hits[0].name, "Oak Log");

        let hits = index.search("oak pla", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "minecraft:oak_planks");
    }

    #[test]
    fn blank_query_lists_by_name() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        index.rebuild(&sample()).unwrap();

        let names: Vec<_> = index
            .search("  ", 3)
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["Andesite Alloy", "Oak Log", "Oak Planks"]);
    }

    #[test]
    fn like_fallback_matches_substrings() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        index.rebuild(&sample()).unwrap();
        index.fts = false;

        let hits = index.search("andesite", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "create:andesite_alloy");
    }

    #[test]
    fn quotes_in_query_do_not_break_fts() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        index.rebuild(&sample()).unwrap();

        assert!(index.search("\"oak", 10).is_ok());
    }

    #[test]
    fn status_reports_meta() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        index.rebuild(&sample()).unwrap();

        let status = index.status().unwrap();
        assert_eq!(status.items, 4);
        assert!(status.built_at.is_some());
        assert!(status.source_path.unwrap().ends_with("instance"));
    }

    #[test]
    fn rebuild_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let mut index = open_index(&dir);
        index.rebuild(&sample()).unwrap();
        index.rebuild(&items(&["minecraft:stick"])).unwrap();

        assert_eq!(index.count().unwrap(), 1);
        assert!(index.search("oak", 10).unwrap().is_empty());
    }
}
