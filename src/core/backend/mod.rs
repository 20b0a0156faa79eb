//! PetShop backend API access
//!
//! All business data lives in the backend. This module owns the HTTP client, the typed
//! request/response schemas and one method per backend endpoint.

pub mod client;
mod endpoints;
pub mod models;

pub use client::{BackendClient, BackendError, GENERIC_FAILURE_MESSAGE};
