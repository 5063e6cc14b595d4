pub mod models;
pub mod report;
pub mod repository;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::{Database, IndexDef};
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use repository::{BookRepository, SurrealBookRepository};

/// Books catalogue module
pub struct BooksModule {
    repository: Arc<dyn BookRepository>,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.database.name(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn indexes(&self) -> Vec<IndexDef> {
        vec![IndexDef {
            collection: repository::COLLECTION,
            name: "books_title_author",
            fields: &["title", "author"],
            unique: false,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the `books` table of `database`
pub fn create_module(database: &Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(SurrealBookRepository::new(
        database,
    ))))
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn book_list_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/Book" }
                }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books, newest first",
                    "operationId": "getAll",
                    "tags": ["Books"],
                    "responses": {
                        "200": book_list_response("List of books"),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "operationId": "create",
                    "tags": ["Books"],
                    "requestBody": book_body,
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Missing fields or validation error"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "operationId": "getOne",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "operationId": "update",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "requestBody": book_body,
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Missing fields or validation error"),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "operationId": "delete",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "200": {
                            "description": "Deleted book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/DeletedBook" }
                                }
                            }
                        },
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/search/{query}": {
                "get": {
                    "summary": "Search title, author, description, and year",
                    "operationId": "search",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "query",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": book_list_response("Matching books"),
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "title": { "type": "string", "maxLength": 100 },
                        "author": { "type": "string", "maxLength": 50 },
                        "publishYear": { "type": "integer", "minimum": 1000 },
                        "description": { "type": "string", "maxLength": 500 },
                        "summary": {
                            "type": "string",
                            "description": "First 100 characters of the description"
                        },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "publishYear", "description",
                        "summary", "createdAt", "updatedAt"
                    ]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "maxLength": 100 },
                        "author": { "type": "string", "maxLength": 50 },
                        "publishYear": {
                            "oneOf": [{ "type": "integer" }, { "type": "string" }],
                            "description": "Coerced to an integer"
                        },
                        "description": { "type": "string", "maxLength": 500 }
                    },
                    "required": ["title", "author", "publishYear", "description"]
                },
                "DeletedBook": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "deletedBook": { "$ref": "#/components/schemas/Book" }
                    },
                    "required": ["message", "deletedBook"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_has_an_operation_id() {
        let spec = openapi_fragment();
        let operations: Vec<&str> = spec["paths"]
            .as_object()
            .unwrap()
            .values()
            .flat_map(|item| item.as_object().unwrap().values())
            .map(|op| op["operationId"].as_str().unwrap())
            .collect();

        for expected in ["getAll", "create", "getOne", "update", "delete", "search"] {
            assert!(operations.contains(&expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn module_declares_title_author_index() {
        let database = Database::in_memory().await.unwrap();
        let module = create_module(&database);
        assert_eq!(module.name(), "books");
        assert_eq!(module.indexes()[0].fields, &["title", "author"]);
    }
}
