//! Request and response schemas for the PetShop backend API
//!
//! Every endpoint gets an explicit schema. Responses that do not match are rejected at the
//! boundary instead of leaking missing fields into the admin views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Envelope & Paging
// ============================================================================

/// Standard backend response wrapper: `{ success, message, data }`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Acknowledgement for mutations whose payload the admin does not use
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `page`/`limit` query parameters accepted by list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Clamp to sane bounds (page >= 1, 1 <= limit <= 100)
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
        }
    }
}

/// Paging block returned alongside list payloads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    pub pages: u64,
}

/// Uploaded image reference (`{ public_id, url }`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

// ============================================================================
// Auth
// ============================================================================

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `data` of a successful login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(rename = "_id")]
    pub id: String,
    pub role: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// Body of `POST /auth/forget`
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /auth/reset-password`
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
    pub password: &'a str,
}

/// Body of `POST /user/change-password`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

// ============================================================================
// Dashboard
// ============================================================================

/// `data` of `GET /user/admin-overview`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub total_products: u64,
    pub total_revenue: f64,
    pub total_sellers: u64,
    pub total_users: u64,
    pub total_orders: u64,
    #[serde(default)]
    pub charts: OverviewCharts,
    #[serde(default)]
    pub products_by_category: Vec<CategoryShare>,
    #[serde(default)]
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewCharts {
    #[serde(default)]
    pub revenue_chart: Vec<RevenuePoint>,
    #[serde(default)]
    pub active_users: Vec<ActiveUsersPoint>,
}

/// Chart bucket key; the backend groups by month number or by date string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChartKey {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenuePoint {
    #[serde(rename = "_id")]
    pub period: ChartKey,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersPoint {
    #[serde(rename = "_id")]
    pub period: ChartKey,
    pub active_users: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category_name: String,
    pub product_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub total_price: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Image attached to a category create/update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart payload for `POST /category` and `PATCH /category/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub image: Option<ImageUpload>,
}

// ============================================================================
// Orders & Revenue
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    pub total_price: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    #[serde(default)]
    pub product: Option<OrderProduct>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderProduct {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// `data` of `GET /user/revenue-from-sellers`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellerRevenuePage {
    #[serde(default)]
    pub revenue_data: Vec<SellerRevenue>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellerRevenue {
    pub seller_id: String,
    pub total_revenue: f64,
}

// ============================================================================
// Sellers
// ============================================================================

/// `data` of `GET /user/seller-profiles`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellerPage {
    #[serde(default)]
    pub sellers: Vec<SellerSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellerSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// `data` of `GET /user/seller-details/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellerDetails {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub join_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Buyers
// ============================================================================

/// `data` of `GET /user/buyer-profiles`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuyerPage {
    #[serde(default)]
    pub buyers: Vec<BuyerSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyerSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub delivered_orders: u64,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub cancelled_orders: u64,
}

/// `data` of `GET /user/buyer-details/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDetails {
    pub buyer: BuyerProfile,
    #[serde(default)]
    pub order_stats: OrderStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyerProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub processing_orders: u64,
    #[serde(default)]
    pub delivered_orders: u64,
    #[serde(default)]
    pub cancelled_orders: u64,
}
