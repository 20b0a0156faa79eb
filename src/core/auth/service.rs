//! Credential exchange and password recovery
//!
//! Trades an email/password pair for a backend-issued token pair and wraps the result into
//! a [`Session`]. Also drives the one-time-passcode reset flow and authenticated password
//! changes. Nothing here touches cookies; callers persist the session only on success.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::core::auth::session::{IssuedIdentity, Session, SessionCodec};
use crate::core::backend::{BackendClient, BackendError};
use crate::core::error::ApiError;

/// Minimum accepted password length for reset/change
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Number of digits in a reset passcode
pub const OTP_LENGTH: usize = 6;

/// Message shown for reasons with no specific mapping
pub const GENERIC_AUTH_MESSAGE: &str = "An authentication error occurred.";

/// Why a login attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorReason {
    InvalidCredentials,
    NetworkFailure,
    ServerError,
}

impl AuthErrorReason {
    /// Stable code used in redirects (`/auth/error?error=<code>`)
    pub fn code(&self) -> &'static str {
        match self {
            AuthErrorReason::InvalidCredentials => "invalid-credentials",
            AuthErrorReason::NetworkFailure => "network-failure",
            AuthErrorReason::ServerError => "server-error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "invalid-credentials" => Some(AuthErrorReason::InvalidCredentials),
            "network-failure" => Some(AuthErrorReason::NetworkFailure),
            "server-error" => Some(AuthErrorReason::ServerError),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthErrorReason::InvalidCredentials => "The email or password you entered is incorrect.",
            AuthErrorReason::NetworkFailure => {
                "Could not reach the server. Check your connection and try again."
            }
            AuthErrorReason::ServerError => "The server could not complete sign-in. Please try again later.",
        }
    }
}

impl fmt::Display for AuthErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// User-facing message for an error code, falling back to a generic message
pub fn message_for_code(code: Option<&str>) -> &'static str {
    code.and_then(AuthErrorReason::from_code)
        .map(|reason| reason.user_message())
        .unwrap_or(GENERIC_AUTH_MESSAGE)
}

/// Failed credential exchange
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Authentication failed: {reason}")]
pub struct AuthError {
    pub reason: AuthErrorReason,
}

impl AuthError {
    pub fn new(reason: AuthErrorReason) -> Self {
        Self { reason }
    }
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        let reason = match &err {
            BackendError::Transport(_) => AuthErrorReason::NetworkFailure,
            BackendError::Status { status, .. } if (400..500).contains(status) => {
                AuthErrorReason::InvalidCredentials
            }
            BackendError::Status { .. }
            | BackendError::Malformed(_)
            | BackendError::InvalidId(_) => AuthErrorReason::ServerError,
        };
        AuthError::new(reason)
    }
}

/// Transient login input; never stored
#[derive(Clone, serde::Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Password reset/change failures
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Passwords do not match")]
    Mismatch,

    #[error("Password must be at least 6 characters")]
    TooShort,

    #[error("Please enter all 6 digits")]
    InvalidOtp,

    #[error("Email is required")]
    MissingEmail,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PasswordError {
    /// Text for the form that submitted the request
    pub fn user_message(&self) -> String {
        match self {
            PasswordError::Backend(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PasswordError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let code = match self {
            PasswordError::Backend(err) => return err.into_response(),
            PasswordError::Mismatch => "PASSWORD_MISMATCH",
            PasswordError::TooShort => "PASSWORD_TOO_SHORT",
            PasswordError::InvalidOtp => "INVALID_OTP",
            PasswordError::MissingEmail => "MISSING_EMAIL",
        };

        ApiError::new(message, code).with_status(StatusCode::BAD_REQUEST)
    }
}

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }

    Ok(())
}

/// A reset passcode is exactly six ASCII digits
pub fn validate_otp(otp: &str) -> Result<(), PasswordError> {
    if otp.len() == OTP_LENGTH && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PasswordError::InvalidOtp)
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    backend: BackendClient,
    sessions: SessionCodec,
}

impl AuthService {
    pub fn new(backend: BackendClient, sessions: SessionCodec) -> Self {
        Self { backend, sessions }
    }

    pub fn sessions(&self) -> &SessionCodec {
        &self.sessions
    }

    /// Exchange credentials with the backend for a new session
    pub async fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError> {
        let email = credential.email.trim();

        if email.is_empty() || credential.password.is_empty() {
            return Err(AuthError::new(AuthErrorReason::InvalidCredentials));
        }

        let data = self.backend.login(email, &credential.password).await?;

        if data.access_token.is_empty() {
            tracing::warn!("Login response for {} carried no access token", email);
            return Err(AuthError::new(AuthErrorReason::ServerError));
        }

        let identity = IssuedIdentity {
            subject_id: data.id,
            display_name: data.user.name,
            email: data.user.email,
            avatar_url: data.user.avatar.and_then(|a| a.url),
            role: data.role,
            access_token: data.access_token,
            refresh_token: data.refresh_token,
        };

        Ok(self.sessions.issue(identity))
    }

    /// Ask the backend to email a reset passcode
    pub async fn request_password_reset(&self, email: &str) -> Result<(), PasswordError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PasswordError::MissingEmail);
        }

        self.backend.forgot_password(email).await?;
        Ok(())
    }

    /// Set a new password using the emailed passcode
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(), PasswordError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PasswordError::MissingEmail);
        }
        validate_otp(otp)?;
        validate_new_password(password, confirmation)?;

        self.backend.reset_password(email, otp, password).await?;
        Ok(())
    }

    /// Change the signed-in user's password
    pub async fn change_password(
        &self,
        session: &Session,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), PasswordError> {
        validate_new_password(new_password, confirmation)?;

        self.backend
            .change_password(session, current_password, new_password, confirmation)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::session::SessionConfig;
    use crate::core::test_support::{STUB_EMAIL, STUB_PASSWORD, STUB_TOKEN, session_for, spawn_stub_backend};

    fn service(base: &str) -> AuthService {
        AuthService::new(
            BackendClient::new(base),
            SessionCodec::new(SessionConfig::new("test_secret")),
        )
    }

    fn credential(email: &str, password: &str) -> Credential {
        Credential {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let base = spawn_stub_backend().await;
        let session = service(&base)
            .authenticate(&credential(STUB_EMAIL, STUB_PASSWORD))
            .await
            .unwrap();

        assert_eq!(session.access_token, STUB_TOKEN);
        assert_eq!(session.role, "admin");
        assert_eq!(session.subject_id, "66f1c0ffee");
        assert_eq!(session.display_name, "Admin");
        assert_eq!(
            session.avatar_url.as_deref(),
            Some("https://cdn.petshop.example/a.png")
        );
        assert_eq!(session.max_age, 86_400);
    }

    #[tokio::test]
    async fn test_authenticate_keeps_backend_role() {
        let base = spawn_stub_backend().await;
        let session = service(&base)
            .authenticate(&credential("seller@example.com", "sellerpw"))
            .await
            .unwrap();

        assert_eq!(session.role, "seller");
        assert!(session.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let base = spawn_stub_backend().await;
        let err = service(&base)
            .authenticate(&credential(STUB_EMAIL, "wrongpw"))
            .await
            .unwrap_err();

        assert_eq!(err.reason, AuthErrorReason::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_authenticate_empty_fields_skip_backend() {
        // Unreachable backend: an empty field must fail before any dispatch
        let service = service("http://127.0.0.1:1/api");

        for (email, password) in [("", "pw"), ("a@b.c", ""), ("   ", "pw")] {
            let err = service
                .authenticate(&credential(email, password))
                .await
                .unwrap_err();
            assert_eq!(err.reason, AuthErrorReason::InvalidCredentials);
        }
    }

    #[tokio::test]
    async fn test_authenticate_network_failure() {
        let err = service("http://127.0.0.1:1/api")
            .authenticate(&credential(STUB_EMAIL, STUB_PASSWORD))
            .await
            .unwrap_err();

        assert_eq!(err.reason, AuthErrorReason::NetworkFailure);
    }

    #[tokio::test]
    async fn test_authenticate_server_errors() {
        let base = spawn_stub_backend().await;
        let service = service(&base);

        for email in ["crash@example.com", "broken@example.com", "blank@example.com"] {
            let err = service
                .authenticate(&credential(email, "whatever"))
                .await
                .unwrap_err();
            assert_eq!(err.reason, AuthErrorReason::ServerError, "{}", email);
        }
    }

    #[tokio::test]
    async fn test_reset_password_validation_happens_first() {
        let service = service("http://127.0.0.1:1/api");

        assert!(matches!(
            service.reset_password("a@b.c", "12345", "secret1", "secret1").await,
            Err(PasswordError::InvalidOtp)
        ));
        assert!(matches!(
            service.reset_password("a@b.c", "123456", "secret1", "secret2").await,
            Err(PasswordError::Mismatch)
        ));
        assert!(matches!(
            service.reset_password("a@b.c", "123456", "abc", "abc").await,
            Err(PasswordError::TooShort)
        ));
        assert!(matches!(
            service.reset_password(" ", "123456", "secret1", "secret1").await,
            Err(PasswordError::MissingEmail)
        ));
    }

    #[tokio::test]
    async fn test_reset_password_against_backend() {
        let base = spawn_stub_backend().await;
        let service = service(&base);

        service
            .reset_password(STUB_EMAIL, "123456", "newpass", "newpass")
            .await
            .unwrap();

        let err = service
            .reset_password(STUB_EMAIL, "654321", "newpass", "newpass")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid OTP");
    }

    #[tokio::test]
    async fn test_change_password() {
        let base = spawn_stub_backend().await;
        let service = service(&base);
        let session = session_for(STUB_TOKEN);

        service
            .change_password(&session, STUB_PASSWORD, "newpass", "newpass")
            .await
            .unwrap();

        assert!(matches!(
            service.change_password(&session, STUB_PASSWORD, "newpass", "other").await,
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_reason_codes_round_trip() {
        for reason in [
            AuthErrorReason::InvalidCredentials,
            AuthErrorReason::NetworkFailure,
            AuthErrorReason::ServerError,
        ] {
            assert_eq!(AuthErrorReason::from_code(reason.code()), Some(reason));
        }
    }

    #[test]
    fn test_message_for_code() {
        assert_eq!(
            message_for_code(Some("invalid-credentials")),
            "The email or password you entered is incorrect."
        );
        assert_eq!(message_for_code(Some("something-else")), GENERIC_AUTH_MESSAGE);
        assert_eq!(message_for_code(None), GENERIC_AUTH_MESSAGE);
    }

    #[test]
    fn test_validate_otp() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12a456").is_err());
        assert!(validate_otp("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let debug = format!("{:?}", credential(STUB_EMAIL, "hunter22"));
        assert!(debug.contains(STUB_EMAIL));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_password_error_responses() {
        assert_eq!(
            PasswordError::TooShort.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let forbidden = PasswordError::Backend(BackendError::Status {
            status: 403,
            message: "Forbidden".to_string(),
        });
        assert_eq!(forbidden.user_message(), "Forbidden");
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::new(AuthErrorReason::InvalidCredentials);
        assert_eq!(err.to_string(), "Authentication failed: invalid-credentials");
    }
}
