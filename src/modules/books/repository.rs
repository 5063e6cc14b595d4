use async_trait::async_trait;
use bookshelf_db::{Database, DbError, DbResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::models::{Book, BookInput};
use super::schema::{self, ValidationErrors};

/// Table holding book records.
pub const COLLECTION: &str = "books";

/// Projection that surfaces the record key as a plain `id` string.
const BOOK_FIELDS: &str =
    "record::id(id) AS id, title, author, publishYear, description, createdAt, updatedAt";

const SEARCH_FILTER: &str = " WHERE string::contains(string::lowercase(title), $needle) \
    OR string::contains(string::lowercase(author), $needle) \
    OR string::contains(string::lowercase(description), $needle) \
    OR string::contains(<string> publishYear, $needle)";

#[derive(Debug, Error)]
pub enum BookError {
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("book {0} not found")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// Persistence gateway for books.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, newest first
    async fn list_all(&self) -> Result<Vec<Book>, BookError>;

    /// `NotFound` covers both unknown and malformed ids
    async fn get_by_id(&self, id: &str) -> Result<Book, BookError>;

    async fn create(&self, input: BookInput) -> Result<Book, BookError>;

    /// Replace the four content fields and refresh `updatedAt`
    async fn update_by_id(&self, id: &str, input: BookInput) -> Result<Book, BookError>;

    /// Remove a book and hand back what was removed
    async fn delete_by_id(&self, id: &str) -> Result<Book, BookError>;

    /// Case-insensitive substring search over title, author, description,
    /// and the publish year's decimal text. The empty query matches all.
    async fn search(&self, query: &str) -> Result<Vec<Book>, BookError>;
}

/// Record body as stored; the id lives in the record key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBook {
    title: String,
    author: String,
    publish_year: i32,
    description: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl StoredBook {
    fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            publish_year: self.publish_year,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<&Book> for StoredBook {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            publish_year: book.publish_year,
            description: book.description.clone(),
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// [`BookRepository`] backed by the `books` table of a SurrealDB database.
pub struct SurrealBookRepository {
    database: Database,
}

impl SurrealBookRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            database: database.clone(),
        }
    }

    async fn select(&self, filter: &str, needle: String) -> DbResult<Vec<Book>> {
        let mut response = self
            .database
            .client()?
            .query(format!("SELECT {BOOK_FIELDS} FROM {COLLECTION}{filter}"))
            .bind(("needle", needle))
            .await?
            .check()?;
        let mut books: Vec<Book> = response.take(0)?;
        sort_newest_first(&mut books);
        Ok(books)
    }

    async fn fetch(&self, id: Uuid) -> DbResult<Option<Book>> {
        let stored: Option<StoredBook> = self
            .database
            .client()?
            .select((COLLECTION, id.to_string()))
            .await?;
        Ok(stored.map(|stored| stored.into_book(id)))
    }

    async fn insert(&self, book: &Book) -> DbResult<()> {
        let _: Option<StoredBook> = self
            .database
            .client()?
            .create((COLLECTION, book.id.to_string()))
            .content(StoredBook::from(book))
            .await?;
        Ok(())
    }

    /// False when the record vanished before the write landed.
    async fn replace(&self, book: &Book) -> DbResult<bool> {
        let stored: Option<StoredBook> = self
            .database
            .client()?
            .update((COLLECTION, book.id.to_string()))
            .content(StoredBook::from(book))
            .await?;
        Ok(stored.is_some())
    }

    async fn remove(&self, id: Uuid) -> DbResult<Option<Book>> {
        let stored: Option<StoredBook> = self
            .database
            .client()?
            .delete((COLLECTION, id.to_string()))
            .await?;
        Ok(stored.map(|stored| stored.into_book(id)))
    }
}

fn parse_id(id: &str) -> Result<Uuid, BookError> {
    Uuid::parse_str(id).map_err(|_| BookError::NotFound(id.to_string()))
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

/// `now`, or one microsecond past `previous` if the clock has not moved on.
fn next_timestamp(previous: OffsetDateTime) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Newest first. Ids are time-ordered, so same-instant books keep reverse
/// creation order.
fn sort_newest_first(books: &mut [Book]) {
    books.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl BookRepository for SurrealBookRepository {
    async fn list_all(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.select("", String::new()).await?)
    }

    async fn get_by_id(&self, id: &str) -> Result<Book, BookError> {
        let uuid = parse_id(id)?;
        self.fetch(uuid)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    async fn create(&self, input: BookInput) -> Result<Book, BookError> {
        let draft = input.into_draft().map_err(BookError::MissingFields)?;
        let content =
            schema::validate(draft, current_year()).map_err(BookError::ValidationFailed)?;

        let now = OffsetDateTime::now_utc();
        let book = Book {
            id: Uuid::now_v7(),
            title: content.title,
            author: content.author,
            publish_year: content.publish_year,
            description: content.description,
            created_at: now,
            updated_at: now,
        };

        self.insert(&book).await?;
        tracing::info!(book_id = %book.id, title = %book.title, "book created");
        Ok(book)
    }

    async fn update_by_id(&self, id: &str, input: BookInput) -> Result<Book, BookError> {
        let draft = input.into_draft().map_err(BookError::MissingFields)?;
        let uuid = parse_id(id)?;
        let existing = self
            .fetch(uuid)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))?;

        let content =
            schema::validate(draft, current_year()).map_err(BookError::ValidationFailed)?;
        let updated = Book {
            id: existing.id,
            title: content.title,
            author: content.author,
            publish_year: content.publish_year,
            description: content.description,
            created_at: existing.created_at,
            updated_at: next_timestamp(existing.updated_at),
        };

        if !self.replace(&updated).await? {
            return Err(BookError::NotFound(id.to_string()));
        }

        tracing::info!(book_id = %updated.id, "book updated");
        Ok(updated)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Book, BookError> {
        let uuid = parse_id(id)?;
        let deleted = self
            .remove(uuid)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))?;

        tracing::info!(book_id = %deleted.id, "book deleted");
        Ok(deleted)
    }

    // TODO: decide whether publishYear should match exactly instead of by substring.
    async fn search(&self, query: &str) -> Result<Vec<Book>, BookError> {
        let books = self.select(SEARCH_FILTER, query.to_lowercase()).await?;

        tracing::debug!(query = %query, hits = books.len(), "book search");
        Ok(books)
    }
}
