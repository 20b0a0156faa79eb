//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

/// Default backend API base URL used when `PETSHOP_API_BASE_URL` is not set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default listen address used when `SITE_ADDR` is not set
pub const DEFAULT_SITE_ADDR: &str = "127.0.0.1:3000";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the PetShop backend REST API
    /// Example: https://api.petshop.example/api
    pub api_base_url: String,

    /// Address the admin server listens on
    pub site_addr: String,

    /// Secret key for signing session cookies
    /// Should be a long random string in production
    pub session_secret: Option<String>,

    /// Use the `__Secure-` cookie prefix and the `Secure` attribute (TLS deployments)
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("PETSHOP_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            site_addr: std::env::var("SITE_ADDR").unwrap_or_else(|_| DEFAULT_SITE_ADDR.to_string()),
            session_secret: std::env::var("SESSION_SECRET").ok(),
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Check if a session secret is configured
    pub fn has_session_secret(&self) -> bool {
        self.session_secret.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Backend base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
