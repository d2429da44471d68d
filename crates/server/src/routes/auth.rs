//! Authentication endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use coursehub_core::UserRole;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to student. Admin cannot be self-assigned.
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/signup`
///
/// Creates the account and logs it in immediately.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let service = AuthService::new(state.pool());

    let user = service
        .signup(
            &request.username,
            &request.email,
            &request.password,
            request.role.unwrap_or(UserRole::Student),
        )
        .await?;

    establish_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "account created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>> {
    let service = AuthService::new(state.pool());

    let user = service.login(&request.email, &request.password).await?;

    establish_session(&session, &user).await?;

    Ok(Json(user))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
///
/// Reads the account fresh from the database so role changes made by an
/// admin show up without re-login.
pub async fn me(State(state): State<AppState>, RequireAuth(current): RequireAuth) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    Ok(Json(user))
}

/// Rotate the session id and store the logged-in identity.
async fn establish_session(session: &Session, user: &User) -> Result<()> {
    // New id on privilege change, so a pre-login cookie can't be fixated.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("failed to cycle session id: {e}")))?;

    set_current_user(session, &CurrentUser::from_user(user))
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist session: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(())
}
