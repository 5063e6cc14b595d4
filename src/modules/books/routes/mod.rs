//! HTTP handlers for the Books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde_json::json;

use super::models::{BookInput, BookResponse, DeletedBook};
use super::repository::{BookError, BookRepository};

type Repository = State<Arc<dyn BookRepository>>;

/// Build the Books router around an injected repository.
pub fn router(repository: Arc<dyn BookRepository>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search/", get(search_all))
        .route("/search/{query}", get(search_books))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repository)
}

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::ValidationFailed(errors) => AppError::validation(
                errors
                    .errors()
                    .iter()
                    .map(|e| json!({"field": e.field, "message": e.message}))
                    .collect(),
                errors.to_string(),
            ),
            BookError::MissingFields(fields) => AppError::missing_fields(&fields),
            BookError::NotFound(_) => AppError::not_found("Book not found"),
            store @ BookError::Store(_) => {
                AppError::Internal(anyhow::Error::new(store).context("book store operation failed"))
            }
        }
    }
}

fn json_body(
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<BookInput, AppError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn list_books(State(repo): Repository) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = repo.list_all().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

async fn get_book(
    State(repo): Repository,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = repo.get_by_id(&id).await?;
    Ok(Json(book.into()))
}

async fn create_book(
    State(repo): Repository,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = repo.create(json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

async fn update_book(
    State(repo): Repository,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let book = repo.update_by_id(&id, json_body(payload)?).await?;
    Ok(Json(book.into()))
}

async fn delete_book(
    State(repo): Repository,
    Path(id): Path<String>,
) -> Result<Json<DeletedBook>, AppError> {
    let book = repo.delete_by_id(&id).await?;
    Ok(Json(DeletedBook {
        message: "Book deleted successfully",
        deleted_book: book.into(),
    }))
}

async fn search_books(
    State(repo): Repository,
    Path(query): Path<String>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = repo.search(&query).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

async fn search_all(State(repo): Repository) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = repo.search("").await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}
