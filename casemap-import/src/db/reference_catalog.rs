//! Reference catalog lookups

use async_trait::async_trait;
use casemap_common::Result;
use sqlx::SqlitePool;

use crate::types::{ReferenceCatalog, ReferenceLookup};

/// `ReferenceCatalog` backed by the `reference_entities` table
#[derive(Clone)]
pub struct SqliteReferenceCatalog {
    db: SqlitePool,
}

impl SqliteReferenceCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn active_entries(&self, category: &str) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, name FROM reference_entities WHERE category = ? AND active = 1 ORDER BY id",
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ReferenceCatalog for SqliteReferenceCatalog {
    async fn find_active_by_fuzzy_name(
        &self,
        category: &str,
        text: &str,
    ) -> Result<ReferenceLookup> {
        // Matched in Rust: SQLite LOWER() only folds ASCII
        let entries = self.active_entries(category).await?;
        Ok(match_reference(&entries, text))
    }

    async fn find_active_by_name(&self, category: &str, name: &str) -> Result<Option<i64>> {
        let wanted = name.trim().to_lowercase();
        let entries = self.active_entries(category).await?;
        Ok(entries
            .into_iter()
            .find(|(_, n)| n.trim().to_lowercase() == wanted)
            .map(|(id, _)| id))
    }
}

/// Fuzzy-match `text` against `(id, name)` entries
///
/// An exact case-insensitive match wins outright. Otherwise a single entry
/// whose name contains the text (or is contained in it) is a match; several
/// such entries are ambiguous.
pub fn match_reference(entries: &[(i64, String)], text: &str) -> ReferenceLookup {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return ReferenceLookup::NotFound;
    }

    let normalized: Vec<(i64, &str, String)> = entries
        .iter()
        .map(|(id, name)| (*id, name.as_str(), name.trim().to_lowercase()))
        .filter(|(_, _, n)| !n.is_empty())
        .collect();

    if let Some((id, _, _)) = normalized.iter().find(|(_, _, n)| *n == needle) {
        return ReferenceLookup::Found(*id);
    }

    let matches: Vec<&(i64, &str, String)> = normalized
        .iter()
        .filter(|(_, _, n)| n.contains(&needle) || needle.contains(n.as_str()))
        .collect();

    match matches.as_slice() {
        [] => ReferenceLookup::NotFound,
        [(id, _, _)] => ReferenceLookup::Found(*id),
        many => ReferenceLookup::Ambiguous(many.iter().map(|(_, name, _)| name.to_string()).collect()),
    }
}
