//! Entry-flow HTML pages under `/auth/*`
//!
//! Plain server-rendered forms. Each form posts to the matching `/api/auth/*` endpoint, which
//! answers with a redirect back here (carrying an `error` query parameter on failure).

use axum::{
    Router,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;

use super::guard::LOGIN_PATH;
use super::service::message_for_code;

/// Query parameters understood by the entry pages
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub error: Option<String>,
}

/// Create the entry pages router
pub fn auth_pages_router() -> Router {
    Router::new()
        .route("/auth", get(|| async { Redirect::to(LOGIN_PATH) }))
        .route("/auth/login", get(login_page))
        .route("/auth/forgot-password", get(forgot_password_page))
        .route("/auth/verify-otp", get(verify_otp_page))
        .route("/auth/reset-password", get(reset_password_page))
        .route("/auth/error", get(error_page))
}

/// Escape text for interpolation into HTML content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>{title} | PetShop Admin</title>
</head>
<body>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        body = body,
    ))
}

fn error_banner(error: Option<&str>) -> String {
    match error.filter(|e| !e.is_empty()) {
        Some(error) => format!(r#"<p role="alert">{}</p>"#, escape_html(error)),
        None => String::new(),
    }
}

async fn login_page(Query(params): Query<PageParams>) -> Html<String> {
    let body = format!(
        r#"{banner}<form method="post" action="/api/auth/login">
<label>Email <input type="email" name="email" required autocomplete="username"/></label>
<label>Password <input type="password" name="password" required autocomplete="current-password"/></label>
<button type="submit">Sign in</button>
</form>
<p><a href="/auth/forgot-password">Forgot password?</a></p>"#,
        banner = error_banner(params.error.as_deref()),
    );

    layout("Sign in", &body)
}

async fn forgot_password_page(Query(params): Query<PageParams>) -> Html<String> {
    let body = format!(
        r#"{banner}<p>Enter your account email and we will send you a 6-digit code.</p>
<form method="post" action="/api/auth/forgot-password">
<label>Email <input type="email" name="email" value="{email}" required/></label>
<button type="submit">Send code</button>
</form>
<p><a href="{login}">Back to sign in</a></p>"#,
        banner = error_banner(params.error.as_deref()),
        email = escape_html(params.email.as_deref().unwrap_or_default()),
        login = LOGIN_PATH,
    );

    layout("Forgot password", &body)
}

async fn verify_otp_page(Query(params): Query<PageParams>) -> Response {
    let Some(email) = params.email.filter(|e| !e.trim().is_empty()) else {
        return Redirect::to("/auth/forgot-password").into_response();
    };

    let body = format!(
        r#"{banner}<p>We sent a code to {email}.</p>
<form method="get" action="/auth/reset-password">
<input type="hidden" name="email" value="{email}"/>
<label>Code <input type="text" name="otp" inputmode="numeric" pattern="[0-9]{{6}}" maxlength="6" required/></label>
<button type="submit">Verify</button>
</form>"#,
        banner = error_banner(params.error.as_deref()),
        email = escape_html(&email),
    );

    layout("Verify code", &body).into_response()
}

async fn reset_password_page(Query(params): Query<PageParams>) -> Response {
    let (Some(email), Some(otp)) = (params.email, params.otp) else {
        return Redirect::to("/auth/forgot-password").into_response();
    };

    let body = format!(
        r#"{banner}<form method="post" action="/api/auth/reset-password">
<input type="hidden" name="email" value="{email}"/>
<input type="hidden" name="otp" value="{otp}"/>
<label>New password <input type="password" name="password" minlength="6" required autocomplete="new-password"/></label>
<label>Confirm password <input type="password" name="confirm_password" minlength="6" required autocomplete="new-password"/></label>
<button type="submit">Reset password</button>
</form>"#,
        banner = error_banner(params.error.as_deref()),
        email = escape_html(&email),
        otp = escape_html(&otp),
    );

    layout("Reset password", &body).into_response()
}

async fn error_page(Query(params): Query<PageParams>) -> Html<String> {
    let body = format!(
        r#"<p role="alert">{message}</p>
<p><a href="{login}">Try again</a></p>"#,
        message = escape_html(message_for_code(params.error.as_deref())),
        login = LOGIN_PATH,
    );

    layout("Sign-in failed", &body)
}
