//! Request extractors shared by module handlers.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, INVALID_REQUEST_BODY, INVALID_UUID};
use crate::validation::{self, FieldNames};

/// JSON body that has passed its derived field rules.
///
/// The body is decoded whatever the `Content-Type`; an unreadable or
/// malformed body is a 400 "Invalid request body", failed constraints a 400
/// "Validation failed" listing each violation.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldNames,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::bad_request(INVALID_REQUEST_BODY))?;

        let value: T = serde_json::from_slice(&bytes).map_err(|err| {
            tracing::debug!(error = %err, "rejected request body");
            AppError::bad_request(INVALID_REQUEST_BODY)
        })?;

        validation::check(&value).map_err(AppError::validation)?;

        Ok(Self(value))
    }
}

/// Single UUID path parameter, e.g. `/books/{book_id}`.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request(INVALID_UUID))?;

        Uuid::parse_str(&raw)
            .map(Self)
            .map_err(|_| AppError::bad_request(INVALID_UUID))
    }
}

/// Cancellation token scoped to one request.
///
/// The token is cancelled when the handler future is dropped, which happens
/// on client disconnect or when the timeout layer gives up, and when the
/// server-wide abort token (a request extension) fires.
pub struct RequestCancellation {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestCancellation {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<CancellationToken>()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let guard = token.clone().drop_guard();

        Ok(Self {
            token,
            _guard: guard,
        })
    }
}
