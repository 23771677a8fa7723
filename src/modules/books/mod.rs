pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

/// Reading-list module: the `books` table and its CRUD endpoints
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
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
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(routes::BooksState {
            db: ctx.db.clone(),
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id     INTEGER PRIMARY KEY AUTOINCREMENT,
                    title  TEXT NOT NULL,
                    author TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'want_to_read'
                           CHECK (status IN ('want_to_read', 'reading', 'completed')),
                    genre  TEXT,
                    notes  TEXT
                );
                "#,
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

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
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

fn id_param() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let status_ref = json!({ "$ref": "#/components/schemas/ReadingStatus" });

    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "skip",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "integer", "minimum": 0, "default": 0 }
                        },
                        {
                            "name": "limit",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "integer", "minimum": 0, "default": 100 }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Books in insertion order",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "422": error_response("Invalid query parameters"),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": book_response("Created book"),
                        "422": error_response("Validation error"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found"),
                        "422": error_response("Invalid book id")
                    }
                },
                "put": {
                    "summary": "Update the supplied fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/UpdateBook" }
                            }
                        }
                    },
                    "responses": {
                        "200": book_response("Updated book"),
                        "404": error_response("Book not found"),
                        "422": error_response("Validation error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found"),
                        "422": error_response("Invalid book id")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ReadingStatus": {
                    "type": "string",
                    "enum": ["want_to_read", "reading", "completed"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 100 },
                        "status": status_ref,
                        "genre": { "type": ["string", "null"], "maxLength": 50 },
                        "notes": { "type": ["string", "null"], "maxLength": 1000 }
                    },
                    "required": ["id", "title", "author", "status", "genre", "notes"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 100 },
                        "status": status_ref,
                        "genre": { "type": ["string", "null"], "maxLength": 50 },
                        "notes": { "type": ["string", "null"], "maxLength": 1000 }
                    },
                    "required": ["title", "author"]
                },
                "UpdateBook": {
                    "type": "object",
                    "description": "Only supplied fields are applied; null clears genre or notes",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 100 },
                        "status": status_ref,
                        "genre": { "type": ["string", "null"], "maxLength": 50 },
                        "notes": { "type": ["string", "null"], "maxLength": 1000 }
                    }
                }
            }
        }
    })
}
