pub mod dto;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::Module;

use service::BookService;

/// Books module: CRUD over books, each optionally linked to an author
pub struct BooksModule {
    service: Arc<dyn BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<dyn BookService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn routes(&self) -> Router {
        handlers::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_envelope = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookEnvelope" }
                    }
                }
            })
        };
        let book_id = serde_json::json!({
            "name": "book_id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let validation_error = serde_json::json!({
            "description": "Invalid body or validation failure",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ValidationErrorResponse" }
                }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create a book for an existing author",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBookRequest" }
                                }
                            }
                        },
                        "responses": {
                            "201": book_envelope("Book created"),
                            "400": validation_error,
                            "404": error("Author not found"),
                            "409": error("Book with this name already exists"),
                            "500": error("Internal server error")
                        }
                    },
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Books retrieved",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BooksEnvelope" }
                                    }
                                }
                            },
                            "404": error("No books stored"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/secure": {
                    "get": {
                        "summary": "API-key placeholder route",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/SuccessResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{book_id}": {
                    "get": {
                        "summary": "Get a book by id",
                        "tags": ["Books"],
                        "parameters": [book_id.clone()],
                        "responses": {
                            "200": book_envelope("Book retrieved"),
                            "400": error("Invalid uuid"),
                            "404": error("Book not found"),
                            "500": error("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [book_id.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBookRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": book_envelope("Book updated"),
                            "400": validation_error,
                            "404": error("Book not found"),
                            "500": error("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "responses": {
                            "200": {
                                "description": "Book deleted",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/SuccessResponse" }
                                    }
                                }
                            },
                            "400": error("Invalid uuid"),
                            "404": error("Book not found"),
                            "500": error("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateBookRequest": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "author_id": { "type": "string", "format": "uuid" }
                        },
                        "required": ["title", "description", "author_id"]
                    },
                    "UpdateBookRequest": {
                        "type": "object",
                        "properties": {
                            "description": { "type": "string" }
                        },
                        "required": ["description"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "author": { "$ref": "#/components/schemas/Author" }
                        },
                        "required": ["id", "title"]
                    },
                    "BookEnvelope": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "example": "success" },
                            "message": { "type": "string" },
                            "book": { "$ref": "#/components/schemas/Book" }
                        },
                        "required": ["status", "message", "book"]
                    },
                    "BooksEnvelope": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "example": "success" },
                            "message": { "type": "string" },
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["status", "message", "books"]
                    }
                }
            }
        }))
    }
}

/// Create the books module around its service
pub fn create_module(service: Arc<dyn BookService>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service))
}
