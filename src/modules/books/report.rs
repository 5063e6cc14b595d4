//! Catalogue report printed by `bookshelf check`.
//!
//! Reads the `books` table loosely, so records written by older versions
//! (for example without a `publishYear`) still show up and get counted.

use std::fmt;

use bookshelf_db::{Database, DbResult};
use serde::Deserialize;
use time::OffsetDateTime;

use super::repository::COLLECTION;

/// Characters of the description shown per entry.
pub const PREVIEW_LENGTH: usize = 50;

const ENTRY_FIELDS: &str = "record::id(id) AS id, title, author, publishYear, description, createdAt";

/// One stored record, with every content field optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publish_year: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CatalogueReport {
    /// Newest first; records without a creation time last
    pub entries: Vec<CatalogueEntry>,
    pub with_year: usize,
    pub without_year: usize,
}

impl CatalogueReport {
    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

/// Read every book record and tally publish-year coverage.
pub async fn inspect(database: &Database) -> DbResult<CatalogueReport> {
    let mut response = database
        .client()?
        .query(format!("SELECT {ENTRY_FIELDS} FROM {COLLECTION}"))
        .await?
        .check()?;
    let mut entries: Vec<CatalogueEntry> = response.take(0)?;
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let with_year = entries.iter().filter(|e| e.publish_year.is_some()).count();
    let without_year = entries.len() - with_year;

    Ok(CatalogueReport {
        entries,
        with_year,
        without_year,
    })
}

fn preview(description: &str) -> String {
    let cut = description
        .char_indices()
        .nth(PREVIEW_LENGTH)
        .map_or(description.len(), |(i, _)| i);
    format!("{}...", &description[..cut])
}

impl fmt::Display for CatalogueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Books in database:")?;
        if self.entries.is_empty() {
            writeln!(f, "No books found in database.")?;
        }

        for (position, entry) in self.entries.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "{}. {}", position + 1, entry.title.as_deref().unwrap_or("-"))?;
            writeln!(f, "   Author: {}", entry.author.as_deref().unwrap_or("-"))?;
            match entry.publish_year {
                Some(year) => writeln!(f, "   Publish year: {year}")?,
                None => writeln!(f, "   Publish year: -")?,
            }
            writeln!(
                f,
                "   Description: {}",
                preview(entry.description.as_deref().unwrap_or_default())
            )?;
            match entry.created_at {
                Some(created) => writeln!(f, "   Created: {}", created.date())?,
                None => writeln!(f, "   Created: -")?,
            }
            writeln!(f, "   ID: {}", entry.id)?;
        }

        writeln!(f)?;
        writeln!(f, "Total books: {}", self.total())?;
        writeln!(f, "Books with publish year: {}", self.with_year)?;
        write!(f, "Books without publish year: {}", self.without_year)
    }
}
