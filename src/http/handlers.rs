//! Book CRUD handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, instrument};

use super::response::{ApiError, ApiResponse};
use super::router::AppState;
use crate::error::StoreError;
use crate::store::{Book, BookPatch, NewBook};

/// Request body for creating or updating a book. The response echoes it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

type HandlerResult<T> = Result<ApiResponse<T>, ApiError>;

fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let media_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if media_type.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ApiError::bad_request("Content-Type must be application/json"))
    }
}

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid book id"))
}

fn parse_input(body: &[u8]) -> Result<BookInput, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn internal(err: StoreError) -> ApiError {
    error!(error = %err, "Store operation failed");
    ApiError::from(err)
}

/// `GET /hello`
pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "API worked!" }))
}

/// `GET /books`
#[instrument(skip(state))]
pub async fn list_books(State(state): State<AppState>) -> HandlerResult<Vec<Book>> {
    let books = state.store.list().await.map_err(internal)?;
    debug!(count = books.len(), "Listed books");
    Ok(ApiResponse::ok(books))
}

/// `GET /books/{id}`. Responds with a list holding the book, or an empty
/// list when no book has that id.
#[instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Vec<Book>> {
    let id = parse_id(&id)?;
    let book = state.store.get(id).await.map_err(internal)?;
    Ok(ApiResponse::ok(book.into_iter().collect()))
}

/// `POST /books/create`
#[instrument(skip(state, headers, body))]
pub async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult<BookInput> {
    require_json(&headers)?;
    let input = parse_input(&body)?;

    let new_book = NewBook::new(input.title.clone(), input.description.clone())?;
    let book = state.store.create(new_book).await.map_err(internal)?;
    debug!(id = book.id, "Created book");

    Ok(ApiResponse::ok(input))
}

/// `PUT /books/{id}`. Empty fields keep their stored value.
#[instrument(skip(state, headers, body))]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult<BookInput> {
    let id = parse_id(&id)?;
    require_json(&headers)?;
    let input = parse_input(&body)?;

    let patch = BookPatch {
        title: input.title.clone(),
        description: input.description.clone(),
    };
    match state.store.update(id, patch).await {
        Ok(_) => Ok(ApiResponse::ok(input)),
        Err(StoreError::NotFound(_)) => Err(ApiError::not_found("No row found to update")),
        Err(err) => Err(internal(err)),
    }
}

/// `DELETE /books/{id}`
#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Value> {
    let id = parse_id(&id)?;
    match state.store.delete(id).await {
        Ok(()) => Ok(ApiResponse::ok(
            json!({ "message": format!("Deleted with id {}", id) }),
        )),
        Err(StoreError::NotFound(_)) => Err(ApiError::not_found("No row found to delete")),
        Err(err) => Err(internal(err)),
    }
}
