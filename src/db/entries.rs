use chrono::Utc;
use uuid::Uuid;

use super::models::SharedEntry;
use super::DbPool;

/// Insert the metadata record for a freshly created file or folder.
pub async fn insert_entry(
    pool: &DbPool,
    user_id: Uuid,
    path: &str,
    name: &str,
    size: i64,
    is_directory: bool,
) -> anyhow::Result<SharedEntry> {
    let entry = sqlx::query_as::<_, SharedEntry>(
        r#"
        INSERT INTO shared_entries (id, user_id, path, name, size, is_directory, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, path, name, size, is_directory, created_at, last_accessed, access_count
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(path)
    .bind(name)
    .bind(size)
    .bind(is_directory)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(entry)
}

/// Get the metadata record for a path, if one exists.
#[allow(dead_code)]
pub async fn get_entry_by_path(pool: &DbPool, path: &str) -> anyhow::Result<Option<SharedEntry>> {
    let entry = sqlx::query_as::<_, SharedEntry>(
        r#"
        SELECT id, user_id, path, name, size, is_directory, created_at, last_accessed, access_count
        FROM shared_entries
        WHERE path = $1
        "#,
    )
    .bind(path)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Remove the metadata record(s) for a path. Returns the number removed.
pub async fn delete_entries_by_path(pool: &DbPool, path: &str) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM shared_entries WHERE path = $1")
        .bind(path)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
