//! Session guard
//!
//! Runs in front of every route and decides, from the request path and the mere presence
//! of a session cookie, whether to let the request through or redirect it:
//!
//! - protected path without a session cookie -> login page
//! - entry (auth flow) path with a session cookie -> admin landing page
//! - anything else -> unchanged
//!
//! The cookie is not verified here. Signature and expiry are checked by handlers that
//! actually need the session, and the backend has the final word on the access token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::session::session_cookie_value;

/// Login entry page
pub const LOGIN_PATH: &str = "/auth/login";

/// Default landing page for authenticated users
pub const LANDING_PATH: &str = "/admin/dashboard";

/// How a request path is treated by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Requires a session
    Protected,
    /// Part of the authentication flow, off-limits once signed in
    Entry,
    /// Everything else
    Public,
}

/// Outcome of the guard for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToLanding,
}

/// Path prefixes and redirect targets used by the guard
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub protected_prefixes: Vec<String>,
    pub entry_prefixes: Vec<String>,
    pub login_path: String,
    pub landing_path: String,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            protected_prefixes: vec!["/admin".to_string(), "/dashboard".to_string()],
            entry_prefixes: vec!["/auth".to_string()],
            login_path: LOGIN_PATH.to_string(),
            landing_path: LANDING_PATH.to_string(),
        }
    }
}

impl GuardPolicy {
    pub fn classify(&self, path: &str) -> PathClass {
        if self
            .protected_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            PathClass::Protected
        } else if self
            .entry_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            PathClass::Entry
        } else {
            PathClass::Public
        }
    }

    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision {
        match (self.classify(path), has_session) {
            (PathClass::Protected, false) => GuardDecision::RedirectToLogin,
            (PathClass::Entry, true) => GuardDecision::RedirectToLanding,
            _ => GuardDecision::Allow,
        }
    }
}

/// Segment-aware prefix match: `/admin` matches `/admin` and `/admin/...`, not `/administrator`
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Axum middleware applying a [`GuardPolicy`]
pub async fn session_guard(
    State(policy): State<Arc<GuardPolicy>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let has_session = session_cookie_value(&jar).is_some();

    match policy.decide(&path, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin => {
            tracing::debug!("No session for protected path {}, redirecting to login", path);
            Redirect::to(&policy.login_path).into_response()
        }
        GuardDecision::RedirectToLanding => {
            tracing::debug!("Session present on entry path {}, redirecting to landing", path);
            Redirect::to(&policy.landing_path).into_response()
        }
    }
}
