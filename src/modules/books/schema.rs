//! Book field rules: presence, coercion, and validation.
//!
//! Writes go through three steps. [`BookInput::into_draft`] rejects requests
//! that omit a field, [`BookDraft`] holds values coerced to their stored
//! types, and [`validate`] checks trimming, lengths, and year bounds,
//! reporting every violated field.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::models::BookInput;

pub const TITLE_MAX_CHARS: usize = 100;
pub const AUTHOR_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const MIN_PUBLISH_YEAR: i64 = 1000;

/// Field names in request order, as they appear on the wire.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "author", "publishYear", "description"];

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint a write violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Values coerced to their stored types. `None` means the request value
/// could not be converted at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publish_year: Option<i64>,
    pub description: Option<String>,
}

/// The four content fields after validation: trimmed and in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookContent {
    pub title: String,
    pub author: String,
    pub publish_year: i32,
    pub description: String,
}

impl BookInput {
    /// Fields the request omitted, in wire order.
    ///
    /// Absent, `null`, `""`, `0` and `false` all count as missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            &self.title,
            &self.author,
            &self.publish_year,
            &self.description,
        ]
        .into_iter()
        .zip(REQUIRED_FIELDS)
        .filter(|(value, _)| !is_present(Option::as_ref(value)))
        .map(|(_, name)| name)
        .collect()
    }

    /// Check presence, then coerce every field.
    pub fn into_draft(self) -> Result<BookDraft, Vec<&'static str>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(BookDraft {
            title: self.title.as_ref().and_then(coerce_text),
            author: self.author.as_ref().and_then(coerce_text),
            publish_year: self.publish_year.as_ref().and_then(coerce_publish_year),
            description: self.description.as_ref().and_then(coerce_text),
        })
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Strings pass through and numbers become their decimal text.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer coercion for `publishYear`.
///
/// Numbers truncate toward zero. Strings take their leading integer, so
/// `" 1965abc"` is 1965 and `"abc"` is not a number.
pub fn coerce_publish_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    // Only overflow can fail here; clamp so the range check reports it.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Validate a draft against the book schema.
///
/// `current_year` bounds `publishYear` from above (one year of lead time).
pub fn validate(draft: BookDraft, current_year: i32) -> Result<BookContent, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = check_text(
        &mut errors,
        "title",
        draft.title,
        TextRule {
            label: "Title",
            required: "Book title is required",
            too_long: "Title cannot exceed 100 characters",
            max_chars: TITLE_MAX_CHARS,
        },
    );
    let author = check_text(
        &mut errors,
        "author",
        draft.author,
        TextRule {
            label: "Author name",
            required: "Author name is required",
            too_long: "Author name cannot exceed 50 characters",
            max_chars: AUTHOR_MAX_CHARS,
        },
    );
    let publish_year = check_publish_year(&mut errors, draft.publish_year, current_year);
    let description = check_text(
        &mut errors,
        "description",
        draft.description,
        TextRule {
            label: "Description",
            required: "Book description is required",
            too_long: "Description cannot exceed 500 characters",
            max_chars: DESCRIPTION_MAX_CHARS,
        },
    );

    match (title, author, publish_year, description) {
        (Some(title), Some(author), Some(publish_year), Some(description)) if errors.is_empty() => {
            Ok(BookContent {
                title,
                author,
                publish_year,
                description,
            })
        }
        _ => Err(errors),
    }
}

struct TextRule {
    label: &'static str,
    required: &'static str,
    too_long: &'static str,
    max_chars: usize,
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<String>,
    rule: TextRule,
) -> Option<String> {
    let Some(value) = value else {
        errors.push(field, format!("{} must be a string", rule.label));
        return None;
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, rule.required);
        return None;
    }
    if trimmed.chars().count() > rule.max_chars {
        errors.push(field, rule.too_long);
        return None;
    }

    Some(trimmed.to_string())
}

fn check_publish_year(
    errors: &mut ValidationErrors,
    value: Option<i64>,
    current_year: i32,
) -> Option<i32> {
    let Some(year) = value else {
        errors.push("publishYear", "Publish year must be a number");
        return None;
    };

    if year < MIN_PUBLISH_YEAR {
        errors.push("publishYear", "Publish year must be at least 1000");
        return None;
    }
    if year > i64::from(current_year) + 1 {
        errors.push("publishYear", "Publish year cannot be in the future");
        return None;
    }

    i32::try_from(year).ok()
}
