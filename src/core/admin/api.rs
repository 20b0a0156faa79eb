//! Admin API endpoints
//!
//! Every route requires a session and forwards to the backend with the session's access
//! token:
//! - GET /admin/dashboard - Overview totals and charts
//! - GET /admin/categories - List categories
//! - POST /admin/categories - Create a category (multipart `name`, `image`)
//! - PATCH /admin/categories/{id} - Update a category (multipart)
//! - DELETE /admin/categories/{id} - Delete a category
//! - GET /admin/orders - List orders
//! - GET /admin/revenue - Revenue per seller
//! - GET /admin/sellers, GET/DELETE /admin/sellers/{id}
//! - GET /admin/buyers, GET/DELETE /admin/buyers/{id}
//! - GET /admin/profile - Signed-in user's profile
//! - POST /admin/settings/password - Change password
//!
//! A backend 401/403 means the access token is no longer accepted; the session cookie is
//! cleared along with the error so the next navigation lands on the login page.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::core::auth::{
    AuthService, PasswordError, Session, SessionCodec, SessionProfile, clear_session,
};
use crate::core::backend::models::{
    Ack, AdminOverview, BuyerDetails, BuyerPage, Category, CategoryForm, ImageUpload, Order,
    PageQuery, SellerDetails, SellerPage, SellerRevenuePage,
};
use crate::core::backend::{BackendClient, BackendError};
use crate::core::error::ApiError;

/// Admin API state
#[derive(Clone)]
pub struct AdminApiState {
    pub backend: BackendClient,
    pub auth_service: AuthService,
}

impl FromRef<Arc<AdminApiState>> for SessionCodec {
    fn from_ref(state: &Arc<AdminApiState>) -> Self {
        state.auth_service.sessions().clone()
    }
}

/// Admin API error types
#[derive(Debug, thiserror::Error)]
pub enum AdminApiError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl AdminApiError {
    /// The backend no longer accepts the session's token
    fn forces_logout(&self) -> bool {
        match self {
            AdminApiError::Backend(err) | AdminApiError::Password(PasswordError::Backend(err)) => {
                err.is_unauthorized()
            }
            _ => false,
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> Response {
        let forced_logout = self.forces_logout();

        let response = match self {
            AdminApiError::Backend(err) => err.into_response(),
            AdminApiError::Password(err) => err.into_response(),
            AdminApiError::BadRequest(message) => {
                ApiError::new(message, "BAD_REQUEST").with_status(StatusCode::BAD_REQUEST)
            }
        };

        if forced_logout {
            tracing::info!("Backend rejected access token, clearing session");
            (clear_session(CookieJar::new()), response).into_response()
        } else {
            response
        }
    }
}

/// JSON body of `POST /admin/settings/password`
#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Largest category create/update body accepted, image included
pub const CATEGORY_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin API router
pub fn admin_api_router(state: AdminApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/admin/dashboard", get(dashboard_handler))
        .route(
            "/admin/categories",
            get(list_categories_handler)
                .post(create_category_handler)
                .layer(DefaultBodyLimit::max(CATEGORY_UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/admin/categories/{id}",
            patch(update_category_handler)
                .delete(delete_category_handler)
                .layer(DefaultBodyLimit::max(CATEGORY_UPLOAD_LIMIT_BYTES)),
        )
        .route("/admin/orders", get(orders_handler))
        .route("/admin/revenue", get(revenue_handler))
        .route("/admin/sellers", get(sellers_handler))
        .route(
            "/admin/sellers/{id}",
            get(seller_details_handler).delete(delete_seller_handler),
        )
        .route("/admin/buyers", get(buyers_handler))
        .route(
            "/admin/buyers/{id}",
            get(buyer_details_handler).delete(delete_buyer_handler),
        )
        .route("/admin/profile", get(profile_handler))
        .route("/admin/settings/password", post(change_password_handler))
        .with_state(state)
}

// ============================================================================
// Dashboard & account
// ============================================================================

/// GET /admin/dashboard
async fn dashboard_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
) -> Result<Json<AdminOverview>, AdminApiError> {
    let overview = state.backend.admin_overview(&session).await?;
    Ok(Json(overview))
}

/// GET /admin/profile
async fn profile_handler(session: Session) -> Json<SessionProfile> {
    Json(session.profile())
}

/// POST /admin/settings/password
async fn change_password_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Json(body): Json<ChangePasswordBody>,
) -> Result<Json<Ack>, AdminApiError> {
    tracing::info!("Password change requested for {}", session.email);

    state
        .auth_service
        .change_password(
            &session,
            &body.current_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;

    Ok(Json(Ack {
        message: Some("Password changed successfully".to_string()),
    }))
}

// ============================================================================
// Categories
// ============================================================================

/// GET /admin/categories
async fn list_categories_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Category>>, AdminApiError> {
    let categories = state.backend.categories(&session, page.normalized()).await?;
    Ok(Json(categories))
}

/// POST /admin/categories
async fn create_category_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Category>), AdminApiError> {
    let form = read_category_form(multipart).await?;

    if form.name.is_none() {
        return Err(AdminApiError::BadRequest("Category name is required".to_string()));
    }

    let category = state.backend.create_category(&session, form).await?;
    tracing::info!("Category created: {}", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /admin/categories/{id}
async fn update_category_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Category>, AdminApiError> {
    let form = read_category_form(multipart).await?;

    if form == CategoryForm::default() {
        return Err(AdminApiError::BadRequest("Nothing to update".to_string()));
    }

    let category = state.backend.update_category(&session, &id, form).await?;
    Ok(Json(category))
}

/// DELETE /admin/categories/{id}
async fn delete_category_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AdminApiError> {
    let ack = state.backend.delete_category(&session, &id).await?;
    tracing::info!("Category deleted: {}", id);
    Ok(Json(ack))
}

/// Collect the `name` and `image` parts of a category form.
///
/// Blank names and empty file inputs are treated as not provided.
async fn read_category_form(mut multipart: Multipart) -> Result<CategoryForm, AdminApiError> {
    let mut form = CategoryForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdminApiError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().map(str::to_string);

        match field_name.as_deref() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AdminApiError::BadRequest(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    form.name = Some(text.to_string());
                }
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AdminApiError::BadRequest(e.to_string()))?;

                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

// ============================================================================
// Orders & revenue
// ============================================================================

/// GET /admin/orders
async fn orders_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Order>>, AdminApiError> {
    Ok(Json(state.backend.orders(&session, page.normalized()).await?))
}

/// GET /admin/revenue
async fn revenue_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> Result<Json<SellerRevenuePage>, AdminApiError> {
    let revenue = state
        .backend
        .revenue_from_sellers(&session, page.normalized())
        .await?;
    Ok(Json(revenue))
}

// ============================================================================
// Sellers
// ============================================================================

/// GET /admin/sellers
async fn sellers_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> Result<Json<SellerPage>, AdminApiError> {
    Ok(Json(state.backend.sellers(&session, page.normalized()).await?))
}

/// GET /admin/sellers/{id}
async fn seller_details_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<SellerDetails>, AdminApiError> {
    Ok(Json(state.backend.seller_details(&session, &id).await?))
}

/// DELETE /admin/sellers/{id}
async fn delete_seller_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AdminApiError> {
    let ack = state.backend.delete_seller(&session, &id).await?;
    tracing::info!("Seller deleted: {}", id);
    Ok(Json(ack))
}

// ============================================================================
// Buyers
// ============================================================================

/// GET /admin/buyers
async fn buyers_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> Result<Json<BuyerPage>, AdminApiError> {
    Ok(Json(state.backend.buyers(&session, page.normalized()).await?))
}

/// GET /admin/buyers/{id}
async fn buyer_details_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<BuyerDetails>, AdminApiError> {
    Ok(Json(state.backend.buyer_details(&session, &id).await?))
}

/// DELETE /admin/buyers/{id}
async fn delete_buyer_handler(
    State(state): State<Arc<AdminApiState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AdminApiError> {
    let ack = state.backend.delete_buyer(&session, &id).await?;
    tracing::info!("Buyer deleted: {}", id);
    Ok(Json(ack))
}
