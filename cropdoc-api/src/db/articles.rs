//! Article database operations
//!
//! Tags are stored as a JSON-encoded string array in a TEXT column.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use cropdoc_common::db::models::{Article, ArticleSource};
use cropdoc_common::{time, Error, Result};

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse article id: {}", e)))?;

    let author_id: Option<String> = row.get("author_id");
    let author_id = author_id
        .map(|s| {
            Uuid::parse_str(&s)
                .map_err(|e| Error::Internal(format!("Failed to parse author id: {}", e)))
        })
        .transpose()?;

    let source: String = row.get("source");
    let source = ArticleSource::parse(&source)
        .ok_or_else(|| Error::Internal(format!("Unknown article source: {}", source)))?;

    let tags: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags)
        .map_err(|e| Error::Internal(format!("Failed to deserialize tags: {}", e)))?;

    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Article {
        id,
        author_id,
        author_name: row.get("author_name"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        cover_image_url: row.get("cover_image_url"),
        source,
        external_url: row.get("external_url"),
        tags,
        published: row.get::<i64, _>("published") != 0,
        created_at: time::from_db(&created_at)?,
        updated_at: time::from_db(&updated_at)?,
    })
}

const ARTICLE_COLUMNS: &str = "id, author_id, author_name, title, content, excerpt, \
     cover_image_url, source, external_url, tags, published, created_at, updated_at";

/// Insert or replace an article
pub async fn upsert(pool: &SqlitePool, article: &Article) -> Result<()> {
    let tags = serde_json::to_string(&article.tags)
        .map_err(|e| Error::Internal(format!("Failed to serialize tags: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO articles (
            id, author_id, author_name, title, content, excerpt,
            cover_image_url, source, external_url, tags, published, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            excerpt = excluded.excerpt,
            cover_image_url = excluded.cover_image_url,
            external_url = excluded.external_url,
            tags = excluded.tags,
            published = excluded.published,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(article.id.to_string())
    .bind(article.author_id.map(|id| id.to_string()))
    .bind(&article.author_name)
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.excerpt)
    .bind(&article.cover_image_url)
    .bind(article.source.as_str())
    .bind(&article.external_url)
    .bind(&tags)
    .bind(article.published as i64)
    .bind(time::to_db(article.created_at))
    .bind(time::to_db(article.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load an article by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(article_from_row).transpose()
}

/// Count published articles
pub async fn count_published(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE published = 1")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// List a page of published articles, newest first
pub async fn list_published(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE published = 1 ORDER BY created_at DESC LIMIT ? OFFSET ?",
        ARTICLE_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(article_from_row).collect()
}

/// Delete an article
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
