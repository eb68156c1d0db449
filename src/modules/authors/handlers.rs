use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use bookshelf_http::{
    error::AppError,
    extract::{PathId, RequestCancellation, ValidatedJson},
    response::ApiResponse,
};

use super::dto::{AuthorPayload, CreateAuthorRequest};
use super::service::AuthorService;

type ServiceState = State<Arc<dyn AuthorService>>;

/// Routes mounted under `/api/authors`.
pub fn router(service: Arc<dyn AuthorService>) -> Router {
    Router::new()
        .route("/", post(create_author))
        .route("/{author_id}", get(get_author))
        .with_state(service)
}

async fn create_author(
    State(service): ServiceState,
    cancel: RequestCancellation,
    ValidatedJson(request): ValidatedJson<CreateAuthorRequest>,
) -> Result<ApiResponse<AuthorPayload>, AppError> {
    let author = service.create_author(cancel.token(), request).await?;
    Ok(ApiResponse::created(
        "Author created successfully",
        author.into(),
    ))
}

async fn get_author(
    State(service): ServiceState,
    PathId(author_id): PathId,
    cancel: RequestCancellation,
) -> Result<ApiResponse<AuthorPayload>, AppError> {
    let author = service.get_author_by_id(cancel.token(), author_id).await?;
    Ok(ApiResponse::ok("Author retrieved successfully", author.into()))
}
