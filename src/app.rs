//! Router assembly
//!
//! Wires the entry pages, the auth API and the admin API behind the session guard.

use std::sync::Arc;

use axum::{Router, middleware, response::Redirect, routing::get};
use tower_http::compression::{CompressionLayer, CompressionLevel};

use crate::core::admin::{AdminApiState, admin_api_router};
use crate::core::auth::{
    AuthApiState, AuthService, GuardPolicy, LANDING_PATH, SessionCodec, SessionConfig,
    SessionError, auth_api_router, auth_pages_router, session_guard,
};
use crate::core::backend::BackendClient;
use crate::core::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub auth_service: AuthService,
    pub guard: Arc<GuardPolicy>,
}

impl AppState {
    pub fn new(backend: BackendClient, sessions: SessionCodec) -> Self {
        Self {
            auth_service: AuthService::new(backend.clone(), sessions),
            backend,
            guard: Arc::new(GuardPolicy::default()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let sessions = SessionCodec::new(SessionConfig::from_config(config)?);
        Ok(Self::new(BackendClient::from_config(config), sessions))
    }

    pub fn with_guard(mut self, policy: GuardPolicy) -> Self {
        self.guard = Arc::new(policy);
        self
    }
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let auth_api = auth_api_router(AuthApiState {
        auth_service: state.auth_service.clone(),
    });
    let admin_api = admin_api_router(AdminApiState {
        backend: state.backend.clone(),
        auth_service: state.auth_service.clone(),
    });

    Router::new()
        .route("/", get(|| async { Redirect::to(LANDING_PATH) }))
        .route("/dashboard", get(|| async { Redirect::to(LANDING_PATH) }))
        .merge(auth_pages_router())
        .merge(auth_api)
        .merge(admin_api)
        // Runs before routing so unknown protected paths are redirected too
        .layer(middleware::from_fn_with_state(state.guard, session_guard))
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Default),
        )
}
