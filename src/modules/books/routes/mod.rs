//! HTTP handlers for `/books`.
//!
//! Each handler checks out one pooled connection, runs one repository
//! operation and lets the connection drop back into the pool on every path.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shelf_db::Database;
use shelf_http::{
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
};

use super::models::{Book, CreateBook, UpdateBook};
use super::repository;

const NOT_FOUND: &str = "Book not found";

#[derive(Clone)]
pub struct BooksState {
    pub db: Database,
}

/// Offset/limit passthrough for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "ListParams::default_limit")]
    pub limit: u32,
}

impl ListParams {
    fn default_limit() -> u32 {
        100
    }
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

async fn create_book(
    State(state): State<BooksState>,
    ApiJson(input): ApiJson<CreateBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    let book = repository::create(&mut conn, input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(
    State(state): State<BooksState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    let books = repository::list(&mut conn, params.skip, params.limit).await?;
    Ok(Json(books))
}

async fn get_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Book>, AppError> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    repository::get(&mut conn, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn update_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    repository::update(&mut conn, id, input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn delete_book(
    State(state): State<BooksState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    if repository::delete(&mut conn, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(NOT_FOUND))
    }
}
