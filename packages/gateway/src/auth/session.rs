use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use sha2::{Digest, Sha256};

use super::credential::CredentialStore;
use crate::config::AuthConfig;
use crate::entity::session;
use crate::extractors::auth::AuthSession;

/// Length of a session token: 32 random bytes, base64url without padding.
const TOKEN_LEN: usize = 43;

/// Generate a fresh, unguessable session token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_token_shaped(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Session rows are keyed by the token digest so a leaked table cannot be replayed.
pub fn session_id_for(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A freshly issued session.
pub struct IssuedSession {
    /// Raw token, only ever handed to the client in the cookie.
    pub token: String,
    pub model: session::Model,
}

/// Issues, validates and revokes cookie sessions.
pub struct SessionService<'a, C: ConnectionTrait> {
    conn: &'a C,
    config: &'a AuthConfig,
}

impl<'a, C: ConnectionTrait> SessionService<'a, C> {
    pub fn new(conn: &'a C, config: &'a AuthConfig) -> Self {
        Self { conn, config }
    }

    /// True iff the credential allowlist holds an enabled entry for `user_key`.
    pub async fn authenticate(&self, user_key: &str) -> Result<bool, DbErr> {
        CredentialStore::new(self.conn).is_enabled(user_key).await
    }

    /// Store a new session for `user_key` expiring after the configured TTL.
    pub async fn create_session(&self, user_key: &str) -> Result<IssuedSession, DbErr> {
        let token = generate_token();
        let now = Utc::now();
        let model = session::ActiveModel {
            id: Set(session_id_for(&token)),
            user_key: Set(user_key.to_string()),
            created_at: Set(now),
            expires_at: Set(now + Duration::days(self.config.session_ttl_days)),
        };

        session::Entity::insert(model)
            .exec_without_returning(self.conn)
            .await?;

        let model = session::Entity::find_by_id(session_id_for(&token))
            .one(self.conn)
            .await?
            .ok_or_else(|| DbErr::Custom("session missing after insert".into()))?;

        tracing::debug!(user_key, "Session created");
        Ok(IssuedSession { token, model })
    }

    /// Delete the session behind `token` if there is one. Idempotent.
    pub async fn destroy_session(&self, token: &str) -> Result<(), DbErr> {
        if !is_token_shaped(token) {
            return Ok(());
        }
        session::Entity::delete_by_id(session_id_for(token))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Resolve a cookie token to its live session.
    ///
    /// Returns `None` for malformed tokens, unknown or expired sessions and
    /// sessions whose user key has been disabled since issue. Expired rows are
    /// deleted on discovery.
    pub async fn require_auth(&self, token: &str) -> Result<Option<AuthSession>, DbErr> {
        if !is_token_shaped(token) {
            return Ok(None);
        }

        let id = session_id_for(token);
        let Some(row) = session::Entity::find_by_id(id.clone())
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        if row.expires_at <= Utc::now() {
            if let Err(e) = session::Entity::delete_by_id(id).exec(self.conn).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        if !self.authenticate(&row.user_key).await? {
            return Ok(None);
        }

        Ok(Some(AuthSession {
            user_key: row.user_key,
            session_id: row.id,
        }))
    }
}

/// `Set-Cookie` directive carrying a newly issued token.
pub fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.session_ttl_days))
        .build()
}

/// `Set-Cookie` directive that clears the session cookie.
pub fn clear_session_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}
