//! Typed wrappers for each backend endpoint used by the admin
//!
//! Authenticated calls take the caller's `Session` explicitly; the token never comes from
//! anywhere else.

use reqwest::{
    Method,
    multipart::{Form, Part},
};

use super::client::{BackendClient, BackendError};
use super::models::*;
use crate::core::auth::Session;

/// Percent-encode an id so it stays a single path segment
///
/// `.` and `..` survive encoding and would be collapsed by URL normalization.
fn id_segment(id: &str) -> Result<String, BackendError> {
    match id {
        "" | "." | ".." => Err(BackendError::InvalidId(id.to_string())),
        _ => Ok(urlencoding::encode(id).into_owned()),
    }
}

// ============================================================================
// Auth
// ============================================================================

impl BackendClient {
    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, BackendError> {
        let request = self
            .request(Method::POST, "/auth/login", None)
            .json(&LoginRequest { email, password });
        self.fetch(request).await
    }

    /// `POST /auth/forget` - sends a one-time passcode to the email
    pub async fn forgot_password(&self, email: &str) -> Result<Ack, BackendError> {
        let request = self
            .request(Method::POST, "/auth/forget", None)
            .json(&ForgotPasswordRequest { email });
        self.acknowledge(request).await
    }

    /// `POST /auth/reset-password`
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> Result<Ack, BackendError> {
        let request = self
            .request(Method::POST, "/auth/reset-password", None)
            .json(&ResetPasswordRequest {
                email,
                otp,
                password,
            });
        self.acknowledge(request).await
    }

    /// `POST /user/change-password`
    pub async fn change_password(
        &self,
        session: &Session,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Ack, BackendError> {
        let request = self
            .request(Method::POST, "/user/change-password", Some(session))
            .json(&ChangePasswordRequest {
                current_password,
                new_password,
                confirm_password,
            });
        self.acknowledge(request).await
    }
}

// ============================================================================
// Dashboard
// ============================================================================

impl BackendClient {
    /// `GET /user/admin-overview`
    pub async fn admin_overview(&self, session: &Session) -> Result<AdminOverview, BackendError> {
        self.fetch(self.request(Method::GET, "/user/admin-overview", Some(session)))
            .await
    }
}

// ============================================================================
// Categories
// ============================================================================

impl BackendClient {
    /// `GET /category`
    pub async fn categories(
        &self,
        session: &Session,
        page: PageQuery,
    ) -> Result<Vec<Category>, BackendError> {
        let request = self
            .request(Method::GET, "/category", Some(session))
            .query(&page);
        self.fetch(request).await
    }

    /// `POST /category` (multipart)
    pub async fn create_category(
        &self,
        session: &Session,
        form: CategoryForm,
    ) -> Result<Category, BackendError> {
        let request = self
            .request(Method::POST, "/category", Some(session))
            .multipart(multipart_form(form)?);
        self.fetch(request).await
    }

    /// `PATCH /category/{id}` (multipart)
    pub async fn update_category(
        &self,
        session: &Session,
        id: &str,
        form: CategoryForm,
    ) -> Result<Category, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/category/{}", id_segment(id)?), Some(session))
            .multipart(multipart_form(form)?);
        self.fetch(request).await
    }

    /// `DELETE /category/{id}`
    pub async fn delete_category(&self, session: &Session, id: &str) -> Result<Ack, BackendError> {
        let path = format!("/category/{}", id_segment(id)?);
        self.acknowledge(self.request(Method::DELETE, &path, Some(session)))
            .await
    }
}

fn multipart_form(form: CategoryForm) -> Result<Form, BackendError> {
    let mut multipart = Form::new();

    if let Some(name) = form.name {
        multipart = multipart.text("name", name);
    }

    if let Some(image) = form.image {
        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type {
            part = part.mime_str(&content_type)?;
        }
        multipart = multipart.part("image", part);
    }

    Ok(multipart)
}

// ============================================================================
// Orders & Revenue
// ============================================================================

impl BackendClient {
    /// `GET /order`
    pub async fn orders(&self, session: &Session, page: PageQuery) -> Result<Vec<Order>, BackendError> {
        let request = self
            .request(Method::GET, "/order", Some(session))
            .query(&page);
        self.fetch(request).await
    }

    /// `GET /user/revenue-from-sellers`
    pub async fn revenue_from_sellers(
        &self,
        session: &Session,
        page: PageQuery,
    ) -> Result<SellerRevenuePage, BackendError> {
        let request = self
            .request(Method::GET, "/user/revenue-from-sellers", Some(session))
            .query(&page);
        self.fetch(request).await
    }
}

// ============================================================================
// Sellers
// ============================================================================

impl BackendClient {
    /// `GET /user/seller-profiles`
    pub async fn sellers(&self, session: &Session, page: PageQuery) -> Result<SellerPage, BackendError> {
        let request = self
            .request(Method::GET, "/user/seller-profiles", Some(session))
            .query(&page);
        self.fetch(request).await
    }

    /// `GET /user/seller-details/{id}`
    pub async fn seller_details(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<SellerDetails, BackendError> {
        let path = format!("/user/seller-details/{}", id_segment(id)?);
        self.fetch(self.request(Method::GET, &path, Some(session))).await
    }

    /// `DELETE /user/seller-delete/{id}`
    pub async fn delete_seller(&self, session: &Session, id: &str) -> Result<Ack, BackendError> {
        let path = format!("/user/seller-delete/{}", id_segment(id)?);
        self.acknowledge(self.request(Method::DELETE, &path, Some(session)))
            .await
    }
}

// ============================================================================
// Buyers
// ============================================================================

impl BackendClient {
    /// `GET /user/buyer-profiles`
    pub async fn buyers(&self, session: &Session, page: PageQuery) -> Result<BuyerPage, BackendError> {
        let request = self
            .request(Method::GET, "/user/buyer-profiles", Some(session))
            .query(&page);
        self.fetch(request).await
    }

    /// `GET /user/buyer-details/{id}`
    pub async fn buyer_details(&self, session: &Session, id: &str) -> Result<BuyerDetails, BackendError> {
        let path = format!("/user/buyer-details/{}", id_segment(id)?);
        self.fetch(self.request(Method::GET, &path, Some(session))).await
    }

    /// `DELETE /user/buyer-delete/{id}`
    pub async fn delete_buyer(&self, session: &Session, id: &str) -> Result<Ack, BackendError> {
        let path = format!("/user/buyer-delete/{}", id_segment(id)?);
        self.acknowledge(self.request(Method::DELETE, &path, Some(session)))
            .await
    }
}
