//! PetShop Admin - administrative web server for the PetShop platform
//!
//! Signs administrators in against the PetShop backend, keeps the resulting tokens in a
//! signed session cookie and proxies the admin views to the backend API on their behalf.

pub mod app;
pub mod core;
