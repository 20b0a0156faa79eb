//! Authentication module for the PetShop admin
//!
//! This module provides authentication functionality including:
//! - Credential exchange with the backend and session issuance
//! - Signed session cookies and the request-scoped `Session` extractor
//! - The path guard that redirects between the login flow and the admin area
//! - Password recovery and the `/auth/*` entry pages

pub mod api;
pub mod guard;
pub mod pages;
pub mod service;
pub mod session;

pub use api::{AuthApiState, auth_api_router};
pub use guard::{GuardDecision, GuardPolicy, LANDING_PATH, LOGIN_PATH, PathClass, session_guard};
pub use pages::auth_pages_router;
pub use service::{AuthError, AuthErrorReason, AuthService, Credential, PasswordError};
pub use session::{
    Session, SessionCodec, SessionConfig, SessionError, SessionProfile, SessionRejection,
    clear_session,
};
