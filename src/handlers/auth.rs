//! Auth endpoints: register, login, and the current-user profile.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::extractors::{ClientAddr, CurrentUser};
use crate::app_state::AppState;
use crate::error::AppError;
use crate::gateway::{action, AccessToken, LoginRequest, RegisterRequest, UserProfile, UserSummary};

/// Unwraps a JSON body. An unreadable body still counts against the
/// action's rate limit before it is rejected with 400.
async fn throttled_body<T>(
    state: &AppState,
    action: &str,
    client: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    // ---
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            state.gateway().admit_auth(action, client).await?;
            Err(AppError::BadRequest(rejection.body_text()))
        }
    }
}

/// POST /auth/register
///
/// # Request Body
/// ```json
/// { "email": "alice@example.com", "password": "pw123", "full_name": "Alice" }
/// ```
///
/// # Responses
/// - `201 Created` with `{ "id": 1, "email": "alice@example.com" }`
/// - `400 Bad Request` if email or password is missing
/// - `409 Conflict` if the email is already registered
/// - `429 Too Many Requests` with `Retry-After`
#[tracing::instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    // ---
    let req = throttled_body(&state, action::REGISTER, &client, body).await?;

    let summary = state.gateway().register(&client, req).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /auth/login
///
/// # Request Body
/// ```json
/// { "email": "alice@example.com", "password": "pw123" }
/// ```
///
/// # Responses
/// - `200 OK` with `{ "access_token": "...", "token_type": "bearer", "expires_in": 3600 }`
/// - `400 Bad Request` if a field is missing
/// - `401 Unauthorized` with `Invalid credentials`, whichever check failed
/// - `429 Too Many Requests` with `Retry-After`
#[tracing::instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, AppError> {
    // ---
    let req = throttled_body(&state, action::LOGIN, &client, body).await?;
    let token = state.gateway().login(&client, req).await?;

    Ok(Json(token))
}

/// GET /auth/me and GET /users/me
///
/// Requires `Authorization: Bearer <token>`.
#[tracing::instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    // ---
    state.gateway().admit_api(&client).await?;

    Ok(Json(UserProfile::from(&user)))
}
