use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata record for a file or directory beneath the shared root.
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SharedEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub path: String,
    pub name: String,
    pub size: i64,
    pub is_directory: bool,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i64,
}

/// An expiring public capability bound to a path and owner.
#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShareLink {
    pub id: Uuid,
    pub user_id: Uuid,
    pub path: String,
    pub name: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Persisted identity of a device previously seen on the network.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KnownDevice {
    pub id: i64,
    pub mac: String,
    pub name: String,
    pub device_type: String,
}
