//! Knowledge-base article endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cropdoc_common::db::models::{Account, Article, ArticleSource};
use cropdoc_common::roles::{can_perform, Action, Role};
use cropdoc_common::{time, uuid_utils};

use crate::api::auth::CurrentAccount;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<Article>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image_url: Option<String>,
    pub external_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub external_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
}

/// GET /api/articles?page=N
///
/// Published articles, newest first. Readable by any authenticated account.
pub async fn list_articles(
    State(state): State<AppState>,
    CurrentAccount(_account): CurrentAccount,
    Query(query): Query<ArticleQuery>,
) -> ApiResult<Json<ArticleListResponse>> {
    let total = db::articles::count_published(&state.db).await?;
    let pagination = calculate_pagination(total, query.page);

    let articles = db::articles::list_published(&state.db, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(ArticleListResponse {
        articles,
        page: pagination.page,
        total_pages: pagination.total_pages,
        total,
    }))
}

/// GET /api/articles/:id
///
/// Unpublished drafts are visible only to their author and admins.
pub async fn get_article(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    let article = db::articles::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article {} not found", id)))?;

    if !article.published && !may_edit(&account, &article) {
        return Err(ApiError::NotFound(format!("Article {} not found", id)));
    }

    Ok(Json(article))
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(payload): Json<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    if !can_perform(Action::AuthorArticles, &account) {
        return Err(ApiError::Forbidden(
            "Only active agronomists may publish articles".to_string(),
        ));
    }

    let title = payload.title.trim();
    let excerpt = payload.excerpt.trim();
    if title.is_empty() || payload.content.trim().is_empty() || excerpt.is_empty() {
        return Err(ApiError::Validation(
            "title, content and excerpt are required".to_string(),
        ));
    }

    let now = time::now();
    let article = Article {
        id: uuid_utils::generate(),
        author_id: Some(account.id),
        author_name: Some(account.name.clone()),
        title: title.to_string(),
        content: payload.content,
        excerpt: excerpt.to_string(),
        cover_image_url: payload.cover_image_url,
        source: ArticleSource::Agronomist,
        external_url: payload.external_url,
        tags: payload.tags,
        published: payload.published.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    db::articles::upsert(&state.db, &article).await?;

    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT /api/articles/:id
pub async fn update_article(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateArticleRequest>,
) -> ApiResult<Json<Article>> {
    let mut article = db::articles::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article {} not found", id)))?;

    if !may_edit(&account, &article) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin may edit an article".to_string(),
        ));
    }

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::Validation("title must not be empty".to_string()));
        }
        article.title = title;
    }
    if let Some(content) = payload.content {
        if content.trim().is_empty() {
            return Err(ApiError::Validation("content must not be empty".to_string()));
        }
        article.content = content;
    }
    if let Some(excerpt) = payload.excerpt {
        let excerpt = excerpt.trim().to_string();
        if excerpt.is_empty() {
            return Err(ApiError::Validation("excerpt must not be empty".to_string()));
        }
        article.excerpt = excerpt;
    }
    if let Some(cover_image_url) = payload.cover_image_url {
        article.cover_image_url = Some(cover_image_url);
    }
    if let Some(external_url) = payload.external_url {
        article.external_url = Some(external_url);
    }
    if let Some(tags) = payload.tags {
        article.tags = tags;
    }
    if let Some(published) = payload.published {
        article.published = published;
    }
    article.updated_at = time::now();

    db::articles::upsert(&state.db, &article).await?;
    Ok(Json(article))
}

/// DELETE /api/articles/:id
pub async fn delete_article(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let article = db::articles::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article {} not found", id)))?;

    if !may_edit(&account, &article) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin may delete an article".to_string(),
        ));
    }

    db::articles::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Authors edit their own articles; admins edit any
fn may_edit(account: &Account, article: &Article) -> bool {
    if !account.is_active {
        return false;
    }
    match account.role {
        Role::Admin => true,
        Role::Agronomist => article.author_id == Some(account.id),
        Role::Farmer => false,
    }
}
