//! Auth API endpoints
//!
//! Provides the form targets for the entry pages:
//! - POST /api/auth/login - Exchange credentials for a session cookie
//! - POST /api/auth/logout - Clear the session cookie
//! - POST /api/auth/forgot-password - Email a one-time passcode
//! - POST /api/auth/reset-password - Set a new password with the passcode
//! - GET /api/auth/session - Current session profile

use axum::{
    Form, Json, Router,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use super::guard::{LANDING_PATH, LOGIN_PATH};
use super::service::{AuthErrorReason, AuthService, Credential};
use super::session::{Session, SessionCodec, SessionProfile, SessionRejection, clear_session};
use crate::core::error::ApiError;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

impl FromRef<Arc<AuthApiState>> for SessionCodec {
    fn from_ref(state: &Arc<AuthApiState>) -> Self {
        state.auth_service.sessions().clone()
    }
}

/// Form body of `POST /api/auth/forgot-password`
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Form body of `POST /api/auth/reset-password`
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub otp: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .route("/api/auth/session", get(session_handler))
        .with_state(state)
}

/// Redirect to the auth error page for a failed login
fn login_failure(reason: AuthErrorReason) -> Response {
    Redirect::to(&format!("/auth/error?error={}", reason.code())).into_response()
}

/// POST /api/auth/login
/// On success, set the session cookie and go to the landing page
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Form(credential): Form<Credential>,
) -> Response {
    tracing::info!("Login attempt for email: {}", credential.email);

    let session = match state.auth_service.authenticate(&credential).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!("Login failed for {}: {}", credential.email, err.reason);
            return login_failure(err.reason);
        }
    };

    let sessions = state.auth_service.sessions();
    let sealed = match sessions.seal(&session) {
        Ok(sealed) => sealed,
        Err(err) => {
            tracing::error!("Failed to seal session: {}", err);
            return login_failure(AuthErrorReason::ServerError);
        }
    };

    tracing::info!("User logged in successfully: {} ({})", session.email, session.role);

    (jar.add(sessions.cookie(sealed)), Redirect::to(LANDING_PATH)).into_response()
}

/// POST /api/auth/logout
async fn logout_handler(jar: CookieJar) -> (CookieJar, Redirect) {
    tracing::info!("Logout request");

    (clear_session(jar), Redirect::to(LOGIN_PATH))
}

/// POST /api/auth/forgot-password
async fn forgot_password_handler(
    State(state): State<Arc<AuthApiState>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Redirect {
    tracing::info!("Password reset requested for email: {}", form.email);

    let email = form.email.trim();
    match state.auth_service.request_password_reset(email).await {
        Ok(()) => Redirect::to(&format!(
            "/auth/verify-otp?email={}",
            urlencoding::encode(email)
        )),
        Err(err) => {
            tracing::warn!("Password reset request failed for {}: {}", email, err);
            Redirect::to(&format!(
                "/auth/forgot-password?email={}&error={}",
                urlencoding::encode(email),
                urlencoding::encode(&err.user_message())
            ))
        }
    }
}

/// POST /api/auth/reset-password
async fn reset_password_handler(
    State(state): State<Arc<AuthApiState>>,
    Form(form): Form<ResetPasswordForm>,
) -> Redirect {
    let email = form.email.trim();

    let result = state
        .auth_service
        .reset_password(email, &form.otp, &form.password, &form.confirm_password)
        .await;

    match result {
        Ok(()) => {
            tracing::info!("Password reset completed for {}", email);
            Redirect::to(LOGIN_PATH)
        }
        Err(err) => {
            tracing::warn!("Password reset failed for {}: {}", email, err);
            Redirect::to(&format!(
                "/auth/reset-password?email={}&otp={}&error={}",
                urlencoding::encode(email),
                urlencoding::encode(&form.otp),
                urlencoding::encode(&err.user_message())
            ))
        }
    }
}

/// GET /api/auth/session
/// Public profile of the current session, or 401
async fn session_handler(
    jar: CookieJar,
    session: Result<Session, SessionRejection>,
) -> Result<Json<SessionProfile>, Response> {
    match session {
        Ok(session) => Ok(Json(session.profile())),
        Err(SessionRejection::Absent) => Err(not_signed_in()),
        Err(SessionRejection::Invalid(err)) => {
            tracing::debug!("Session lookup with unusable cookie: {}", err);
            Err((clear_session(jar), not_signed_in()).into_response())
        }
    }
}

fn not_signed_in() -> Response {
    ApiError::new("Not signed in", "UNAUTHORIZED").with_status(StatusCode::UNAUTHORIZED)
}
