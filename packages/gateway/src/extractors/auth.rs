use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::session::SessionService;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller resolved from the session cookie.
///
/// Add this as a handler parameter to require a live session whose user key
/// is still enabled in the credential allowlist.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_key: String,
    pub session_id: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.config.auth.cookie_name)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?;

        SessionService::new(&state.db, &state.config.auth)
            .require_auth(&token)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
