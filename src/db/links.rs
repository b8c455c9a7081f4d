use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::ShareLink;
use super::DbPool;

/// Insert a share-link record. Returns the raw `sqlx::Error` so the caller
/// can distinguish a token unique-constraint collision from other faults.
pub async fn insert_link(
    pool: &DbPool,
    user_id: Uuid,
    path: &str,
    name: &str,
    token: &str,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<ShareLink, sqlx::Error> {
    sqlx::query_as::<_, ShareLink>(
        r#"
        INSERT INTO share_links (id, user_id, path, name, token, issued_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, path, name, token, issued_at, expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(path)
    .bind(name)
    .bind(token)
    .bind(issued_at)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

/// Look up a share link by its token.
pub async fn get_link_by_token(pool: &DbPool, token: &str) -> anyhow::Result<Option<ShareLink>> {
    let link = sqlx::query_as::<_, ShareLink>(
        r#"
        SELECT id, user_id, path, name, token, issued_at, expires_at
        FROM share_links
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(link)
}
