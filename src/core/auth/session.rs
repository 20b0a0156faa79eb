//! Session record and its cookie encoding
//!
//! A session is issued once per successful login and lives in a signed, httpOnly cookie.
//! The cookie value is an HS256-signed token carrying the backend's access/refresh tokens,
//! the user's profile and the role returned by the backend. Sessions expire 24 hours after
//! issuance.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::guard::LOGIN_PATH;
use crate::core::config::Config;

/// Session lifetime (24 hours)
pub const SESSION_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Cookie name for plain-HTTP deployments
pub const SESSION_COOKIE: &str = "session-token";

/// Cookie name when secure cookies are enabled
pub const SECURE_SESSION_COOKIE: &str = "__Secure-session-token";

/// Issuer claim stamped on every session token
const SESSION_ISSUER: &str = "petshop-admin";

/// Secret used by debug builds when `SESSION_SECRET` is missing
const DEV_SESSION_SECRET: &str = "petshop_admin_dev_session_secret_not_for_production";

/// Session configuration
#[derive(Clone)]
pub struct SessionConfig {
    /// Secret key for signing session tokens
    pub secret: String,
    /// Session lifetime in seconds
    pub max_age_seconds: i64,
    /// Token issuer
    pub issuer: String,
    /// Use the `__Secure-` cookie name and the `Secure` attribute
    pub secure: bool,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            max_age_seconds: SESSION_MAX_AGE_SECONDS,
            issuer: SESSION_ISSUER.to_string(),
            secure: false,
        }
    }

    /// Build from application config.
    ///
    /// Debug builds fall back to a development secret; release builds require
    /// `SESSION_SECRET`.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let secret = match config.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ if cfg!(debug_assertions) => {
                tracing::warn!("SESSION_SECRET not set, using development secret");
                DEV_SESSION_SECRET.to_string()
            }
            _ => return Err(SessionError::MissingSecret),
        };

        Ok(Self::new(secret).secure(config.secure_cookies))
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age_seconds = seconds;
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Name of the cookie this configuration writes
    pub fn cookie_name(&self) -> &'static str {
        if self.secure {
            SECURE_SESSION_COOKIE
        } else {
            SESSION_COOKIE
        }
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("SESSION_SECRET environment variable not set")]
    MissingSecret,

    #[error("Session encoding failed: {0}")]
    EncodingError(String),

    #[error("Session decoding failed: {0}")]
    DecodingError(String),

    #[error("Session expired")]
    Expired,

    #[error("Invalid session")]
    InvalidSession,
}

impl From<jsonwebtoken::errors::Error> for SessionError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer => SessionError::InvalidSession,
            _ => SessionError::DecodingError(err.to_string()),
        }
    }
}

/// Profile and tokens returned by the backend on a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedIdentity {
    pub subject_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// An authenticated admin session.
///
/// The role is whatever the backend returned at login; it is never re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Issued at (Unix timestamp)
    pub issued_at: i64,
    /// Lifetime in seconds
    pub max_age: i64,
}

impl Session {
    /// Expiration time (Unix timestamp)
    pub fn expires_at(&self) -> i64 {
        self.issued_at + self.max_age
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at()
    }

    /// Profile fields safe to hand to the browser (no tokens)
    pub fn profile(&self) -> SessionProfile {
        SessionProfile {
            id: self.subject_id.clone(),
            name: self.display_name.clone(),
            email: self.email.clone(),
            image: self.avatar_url.clone(),
            role: self.role.clone(),
            expires_at: self.expires_at(),
        }
    }
}

/// Public view of a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub role: String,
    pub expires_at: i64,
}

/// Signed claims stored in the session cookie
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    role: String,
    access_token: String,
    refresh_token: String,
    iat: i64,
    exp: i64,
    iss: String,
    jti: String,
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject_id: claims.sub,
            display_name: claims.name,
            email: claims.email,
            avatar_url: claims.picture,
            role: claims.role,
            access_token: claims.access_token,
            refresh_token: claims.refresh_token,
            issued_at: claims.iat,
            max_age: claims.exp - claims.iat,
        }
    }
}

/// Issues, seals and opens session cookies
#[derive(Clone)]
pub struct SessionCodec {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionCodec {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a new session for a freshly authenticated identity
    pub fn issue(&self, identity: IssuedIdentity) -> Session {
        Session {
            subject_id: identity.subject_id,
            display_name: identity.display_name,
            email: identity.email,
            avatar_url: identity.avatar_url,
            role: identity.role,
            access_token: identity.access_token,
            refresh_token: identity.refresh_token,
            issued_at: Utc::now().timestamp(),
            max_age: self.config.max_age_seconds,
        }
    }

    /// Sign a session into an opaque cookie value
    pub fn seal(&self, session: &Session) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: session.subject_id.clone(),
            name: session.display_name.clone(),
            email: session.email.clone(),
            picture: session.avatar_url.clone(),
            role: session.role.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            iat: session.issued_at,
            exp: session.expires_at(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::EncodingError(e.to_string()))
    }

    /// Verify signature, issuer and expiry of a cookie value
    pub fn open(&self, value: &str) -> Result<Session, SessionError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(value, &self.decoding_key, &validation)?;

        Ok(data.claims.into())
    }

    /// Build the `Set-Cookie` value for a sealed session
    pub fn cookie(&self, sealed: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name(), sealed))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.config.max_age_seconds))
            .build()
    }

    /// Read the session out of a cookie jar.
    ///
    /// Returns `Ok(None)` when no session cookie is present.
    pub fn read(&self, jar: &CookieJar) -> Result<Option<Session>, SessionError> {
        match session_cookie_value(jar) {
            Some(value) => self.open(&value).map(Some),
            None => Ok(None),
        }
    }
}

/// Value of whichever session cookie is present and non-empty
pub fn session_cookie_value(jar: &CookieJar) -> Option<String> {
    [SESSION_COOKIE, SECURE_SESSION_COOKIE]
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value().to_string())
        .find(|value| !value.is_empty())
}

/// Expire both session cookie variants.
///
/// Removal cookies are added unconditionally so the browser drops the cookie even when the
/// request did not carry it.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    [SESSION_COOKIE, SECURE_SESSION_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| jar.add(removal_cookie(name)))
}

/// Browsers ignore a `__Secure-` cookie that lacks `Secure`, removals included
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(name == SECURE_SESSION_COOKIE)
        .build();
    cookie.make_removal();
    cookie
}

/// Why a handler could not obtain a session
#[derive(Debug)]
pub enum SessionRejection {
    /// No cookie at all: the expected unauthenticated state
    Absent,
    /// A cookie was present but did not verify
    Invalid(SessionError),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            SessionRejection::Absent => Redirect::to(LOGIN_PATH).into_response(),
            SessionRejection::Invalid(err) => {
                tracing::debug!("Rejected session cookie: {}", err);
                let jar = clear_session(CookieJar::new());
                (jar, Redirect::to(LOGIN_PATH)).into_response()
            }
        }
    }
}

/// Request-scoped session extractor
impl<S> FromRequestParts<S> for Session
where
    SessionCodec: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = SessionCodec::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        match codec.read(&jar) {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(SessionRejection::Absent),
            Err(err) => Err(SessionRejection::Invalid(err)),
        }
    }
}
