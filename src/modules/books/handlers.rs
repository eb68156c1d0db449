use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use bookshelf_http::{
    error::AppError,
    extract::{PathId, RequestCancellation, ValidatedJson},
    response::{ApiResponse, Empty},
};

use super::dto::{BookPayload, BooksPayload, CreateBookRequest, UpdateBookRequest};
use super::service::BookService;

type ServiceState = State<Arc<dyn BookService>>;

/// Routes mounted under `/api/books`.
pub fn router(service: Arc<dyn BookService>) -> Router {
    Router::new()
        .route("/", post(create_book).get(list_books))
        .route("/secure", get(secure))
        .route(
            "/{book_id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn create_book(
    State(service): ServiceState,
    cancel: RequestCancellation,
    ValidatedJson(request): ValidatedJson<CreateBookRequest>,
) -> Result<ApiResponse<BookPayload>, AppError> {
    let book = service.create_book(cancel.token(), request).await?;
    Ok(ApiResponse::created("Book created successfully", book.into()))
}

async fn list_books(
    State(service): ServiceState,
    cancel: RequestCancellation,
) -> Result<ApiResponse<BooksPayload>, AppError> {
    let books = service.get_all_books(cancel.token()).await?;
    Ok(ApiResponse::ok("Books retrieved successfully", books.into()))
}

async fn get_book(
    State(service): ServiceState,
    PathId(book_id): PathId,
    cancel: RequestCancellation,
) -> Result<ApiResponse<BookPayload>, AppError> {
    let book = service.get_book_by_id(cancel.token(), book_id).await?;
    Ok(ApiResponse::ok("Book retrieved successfully", book.into()))
}

async fn update_book(
    State(service): ServiceState,
    PathId(book_id): PathId,
    cancel: RequestCancellation,
    ValidatedJson(request): ValidatedJson<UpdateBookRequest>,
) -> Result<ApiResponse<BookPayload>, AppError> {
    let book = service
        .update_book(cancel.token(), request, book_id)
        .await?;
    Ok(ApiResponse::ok("Book updated successfully", book.into()))
}

async fn delete_book(
    State(service): ServiceState,
    PathId(book_id): PathId,
    cancel: RequestCancellation,
) -> Result<ApiResponse<Empty>, AppError> {
    service.delete_book(cancel.token(), book_id).await?;
    Ok(ApiResponse::message("Book deleted successfully"))
}

/// Placeholder for an API-key protected route; no check is performed.
async fn secure() -> ApiResponse<Empty> {
    ApiResponse::message("ok")
}
