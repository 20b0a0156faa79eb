//! Core modules: configuration, authentication, backend access and the admin API

pub mod admin;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
#[cfg(test)]
pub mod test_support;
