use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::auth::session::{SessionService, clear_session_cookie, session_cookie};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthSession;
use crate::extractors::json::AppJson;
use crate::models::auth::{CheckRequest, MeResponse, OkResponse};
use crate::state::AppState;

/// Exchange a user key for a session cookie.
#[utoipa::path(
    post,
    path = "/check",
    tag = "Auth",
    operation_id = "checkKey",
    summary = "Log in with a user key",
    description = "Verifies the key against the credential allowlist and, on success, sets an \
        HttpOnly session cookie. Unknown, disabled and malformed keys are rejected identically.",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Session issued, cookie set", body = OkResponse),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Key not accepted (UNAUTHORIZED)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn check(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<CheckRequest>,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let sessions = SessionService::new(&state.db, &state.config.auth);
    if !sessions.authenticate(&payload.user_key).await? {
        tracing::info!("Rejected user key");
        return Err(AppError::Unauthorized);
    }

    let issued = sessions.create_session(&payload.user_key).await?;
    tracing::info!(
        user_key = %payload.user_key,
        expires_at = %issued.model.expires_at,
        "Session issued"
    );

    let jar = jar.add(session_cookie(&state.config.auth, issued.token));
    Ok((jar, Json(OkResponse { ok: true })))
}

/// End the current session.
///
/// Succeeds whether or not the cookie named a live session.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "No session required. Deletes the session named by the cookie, if any, \
        and always clears the cookie, so an expired or unknown cookie still logs out cleanly.",
    responses(
        (status = 200, description = "Cookie cleared", body = OkResponse),
    ),
    security(()),
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    if let Some(cookie) = jar.get(&state.config.auth.cookie_name) {
        SessionService::new(&state.db, &state.config.auth)
            .destroy_session(cookie.value())
            .await?;
    }

    let jar = jar.add(clear_session_cookie(&state.config.auth));
    Ok((jar, Json(OkResponse { ok: true })))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Current identity",
    responses(
        (status = 200, description = "Session is live", body = MeResponse),
        (status = 401, description = "No live session (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip_all, fields(user_key = %auth.user_key, session_id = %auth.session_id))]
pub async fn me(auth: AuthSession) -> Json<MeResponse> {
    tracing::debug!("Session resolved");
    Json(MeResponse {
        user_key: auth.user_key,
    })
}
