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

use service::AuthorService;

/// Authors module: create and fetch authors
pub struct AuthorsModule {
    service: Arc<dyn AuthorService>,
}

impl AuthorsModule {
    pub fn new(service: Arc<dyn AuthorService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    fn routes(&self) -> Router {
        handlers::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateAuthorRequest" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Author created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/AuthorEnvelope" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid body or validation failure",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ValidationErrorResponse" }
                                    }
                                }
                            },
                            "409": {
                                "description": "Author with this name already exists",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{author_id}": {
                    "get": {
                        "summary": "Get an author by id",
                        "tags": ["Authors"],
                        "parameters": [{
                            "name": "author_id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "uuid" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Author retrieved",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/AuthorEnvelope" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid uuid",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "404": {
                                "description": "Author not found",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateAuthorRequest": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "description": "Unique author name" }
                        },
                        "required": ["name"]
                    },
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" }
                        },
                        "required": ["id", "name"]
                    },
                    "AuthorEnvelope": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "example": "success" },
                            "message": { "type": "string" },
                            "author": { "$ref": "#/components/schemas/Author" }
                        },
                        "required": ["status", "message", "author"]
                    }
                }
            }
        }))
    }
}

/// Create the authors module around its service
pub fn create_module(service: Arc<dyn AuthorService>) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(service))
}
