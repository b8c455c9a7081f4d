use chrono::{Duration, Utc};
use uuid::Uuid;

use super::error::ShareError;
use crate::db::{self, DbPool, ShareLink};

/// Attempts before giving up on a token unique-constraint collision. With
/// 192 bits of entropy per token a second round is already astronomically
/// unlikely.
const TOKEN_INSERT_RETRIES: usize = 4;

/// Issues and validates expiring share tokens.
///
/// Tokens come from a cryptographically-random source and are never derived
/// from the target path or name. Expiry is fixed at issuance and enforced at
/// resolution time; there is no background reaper.
pub struct ShareLinkRegistry {
    pool: DbPool,
    validity: Duration,
}

impl ShareLinkRegistry {
    pub fn new(pool: DbPool, validity_days: i64) -> Self {
        Self {
            pool,
            validity: Duration::days(validity_days),
        }
    }

    /// Generate a random share token (URL-safe)
    fn generate_token() -> String {
        let bytes: [u8; 24] = rand::random();
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
    }

    /// Issue a link for an already-guarded path. An insert collision on the
    /// token unique constraint is retried with a fresh token, never surfaced
    /// to the caller.
    pub async fn issue(
        &self,
        owner: Uuid,
        path: &str,
        name: &str,
    ) -> Result<ShareLink, ShareError> {
        for _ in 0..TOKEN_INSERT_RETRIES {
            let token = Self::generate_token();
            let issued_at = Utc::now();
            let expires_at = issued_at + self.validity;
            match db::links::insert_link(
                &self.pool, owner, path, name, &token, issued_at, expires_at,
            )
            .await
            {
                Ok(link) => {
                    tracing::info!(token = %link.token, path, "issued share link");
                    return Ok(link);
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => continue,
                Err(e) => return Err(ShareError::Db(e.into())),
            }
        }
        Err(ShareError::Db(anyhow::anyhow!(
            "token collision retries exhausted"
        )))
    }

    /// Resolve a token, enforcing expiry at read time.
    pub async fn resolve(&self, token: &str) -> Result<ShareLink, ShareError> {
        let link = db::links::get_link_by_token(&self.pool, token)
            .await?
            .ok_or(ShareError::LinkNotFound)?;
        if Utc::now() > link.expires_at {
            return Err(ShareError::LinkExpired);
        }
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_distinct_and_fixed_length() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let token = ShareLinkRegistry::generate_token();
            assert_eq!(token.len(), 32);
            assert!(seen.insert(token), "token collision");
        }
    }

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let pool = crate::db::test_pool().await;
        let user = crate::db::users::create_user(&pool, "alice", "x", false)
            .await
            .unwrap();
        let registry = ShareLinkRegistry::new(pool, 7);

        let link = registry
            .issue(user.id, "/srv/share/report.txt", "report.txt")
            .await
            .unwrap();
        assert_eq!(link.expires_at, link.issued_at + Duration::days(7));

        let resolved = registry.resolve(&link.token).await.unwrap();
        assert_eq!(resolved.path, "/srv/share/report.txt");
    }

    #[tokio::test]
    async fn test_expired_link_rejected() {
        let pool = crate::db::test_pool().await;
        let user = crate::db::users::create_user(&pool, "alice", "x", false)
            .await
            .unwrap();
        let registry = ShareLinkRegistry::new(pool.clone(), 7);

        let issued = Utc::now() - Duration::days(8);
        let link = db::links::insert_link(
            &pool,
            user.id,
            "/srv/share/old.txt",
            "old.txt",
            "stale-token",
            issued,
            issued + Duration::days(7),
        )
        .await
        .unwrap();

        assert!(matches!(
            registry.resolve(&link.token).await,
            Err(ShareError::LinkExpired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let pool = crate::db::test_pool().await;
        let registry = ShareLinkRegistry::new(pool, 7);
        assert!(matches!(
            registry.resolve("no-such-token").await,
            Err(ShareError::LinkNotFound)
        ));
    }
}
