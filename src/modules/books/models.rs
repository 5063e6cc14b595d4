use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Characters of the description kept in a summary.
pub const SUMMARY_LENGTH: usize = 100;

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier assigned on creation
    pub id: Uuid,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Year of first publication
    pub publish_year: i32,
    /// Free-form description
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    pub fn summary(&self) -> String {
        summarize(&self.description)
    }
}

/// First [`SUMMARY_LENGTH`] characters of `description`, with `...` appended
/// when anything was cut.
pub fn summarize(description: &str) -> String {
    match description.char_indices().nth(SUMMARY_LENGTH) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

/// Wire representation of a book, including the derived summary.
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub summary: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let summary = book.summary();
        Self { book, summary }
    }
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBook {
    pub message: &'static str,
    pub deleted_book: BookResponse,
}

/// Request body for create and update.
///
/// Fields stay untyped JSON until the schema coerces them, so that a wrong
/// type surfaces as a validation message rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub publish_year: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn book(description: &str) -> Book {
        Book {
            id: Uuid::now_v7(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publish_year: 1965,
            description: description.to_string(),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-02 0:00 UTC),
        }
    }

    #[test]
    fn short_description_is_its_own_summary() {
        assert_eq!(summarize("A desert planet..."), "A desert planet...");
        assert_eq!(summarize(&"x".repeat(100)), "x".repeat(100));
    }

    #[test]
    fn long_description_is_cut_at_100_characters() {
        let summary = summarize(&"é".repeat(101));
        assert_eq!(summary, format!("{}...", "é".repeat(100)));
    }

    #[test]
    fn response_uses_camel_case_and_carries_summary() {
        let value = serde_json::to_value(BookResponse::from(book("short"))).unwrap();
        assert_eq!(value["publishYear"], 1965);
        assert_eq!(value["summary"], "short");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["updatedAt"], "2024-01-02T00:00:00Z");
        assert!(value["id"].is_string());
    }

    #[test]
    fn input_treats_null_as_absent() {
        let input: BookInput =
            serde_json::from_value(json!({"title": null, "publishYear": "1965"})).unwrap();
        assert!(input.title.is_none());
        assert_eq!(input.publish_year, Some(json!("1965")));
        assert!(input.author.is_none());
    }
}
