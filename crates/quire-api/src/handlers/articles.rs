//! Blog article CRUD under `/api/articles`.
//!
//! These routes take no caller identity and check no ownership.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use quire_core::models::{Article, ArticleInput, ArticleSummary};
use quire_core::pagination::DEFAULT_ARTICLE_PAGE_SIZE;
use quire_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

fn article_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidInput("Invalid ID".to_string()))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ArticleListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleListResponse {
    pub total: i64,
    pub data: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/articles",
    tag = "articles",
    request_body = ArticleInput,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Invalid article", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, input), fields(operation = "create_article"))]
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<ArticleInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let article = state.articles.create(input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = ArticleInput,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 400, description = "Invalid ID or article", body = ErrorResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, input), fields(article_id = %id, operation = "update_article"))]
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<ArticleInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let article = state.articles.update(article_id(&id)?, input).await?;
    Ok(Json(article))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(article_id = %id, operation = "delete_article"))]
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.articles.delete(article_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Article deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article found", body = Article),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 404, description = "Article not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(article_id = %id, operation = "get_article"))]
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.articles.get(article_id(&id)?).await?))
}

#[utoipa::path(
    get,
    path = "/api/articles",
    tag = "articles",
    params(ArticleListQuery),
    responses(
        (status = 200, description = "One page of articles in id order", body = ArticleListResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_articles"))]
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(1);
    let page_size = query
        .page_size
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_ARTICLE_PAGE_SIZE);

    let page = state.articles.list(page, page_size).await?;
    Ok(Json(ArticleListResponse {
        total: page.total,
        data: page.items,
    }))
}
