use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identity;
use crate::db::User;

/// Access token expiration time in hours
const ACCESS_TOKEN_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // User ID
    username: String,
    role: String,
    exp: i64, // Expiration time
    iat: i64, // Issued at
}

/// Create an access token carrying the caller's verified identity.
pub fn create_access_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(ACCESS_TOKEN_HOURS);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify a token and extract the caller identity.
pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Identity> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(Identity {
        user_id: Uuid::parse_str(&token_data.claims.sub)?,
        username: token_data.claims.username,
        role: token_data.claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: String::new(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = "test_secret";
        let user = test_user();

        let token = create_access_token(secret, &user).unwrap();
        let identity = verify_token(secret, &token).unwrap();

        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, "admin");
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("test_secret", "invalid_token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_access_token("secret_a", &test_user()).unwrap();
        assert!(verify_token("secret_b", &token).is_err());
    }
}
