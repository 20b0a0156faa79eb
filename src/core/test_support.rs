//! In-process stand-in for the PetShop backend, used by tests

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};

use crate::core::auth::Session;
use crate::core::backend::models::PageQuery;

/// Access token the stub accepts for authenticated endpoints
pub const STUB_TOKEN: &str = "access-user";

/// Credentials the stub accepts
pub const STUB_EMAIL: &str = "user@example.com";
pub const STUB_PASSWORD: &str = "correctpw";

/// A session carrying `token` as its access token
pub fn session_for(token: &str) -> Session {
    Session {
        subject_id: "66f1c0ffee".to_string(),
        display_name: "Admin".to_string(),
        email: STUB_EMAIL.to_string(),
        avatar_url: None,
        role: "admin".to_string(),
        access_token: token.to_string(),
        refresh_token: "refresh-user".to_string(),
        issued_at: chrono::Utc::now().timestamp(),
        max_age: 86_400,
    }
}

/// Bind the stub on an ephemeral port and return its API base URL
pub async fn spawn_stub_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api", stub_routes());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn stub_routes() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/forget", post(forget))
        .route("/auth/reset-password", post(reset_password))
        .route("/user/change-password", post(change_password))
        .route("/user/admin-overview", get(overview))
        .route("/category", get(categories).post(create_category))
        .route("/category/{id}", patch(update_category).delete(delete_category))
        .route("/order", get(orders))
        .route("/user/revenue-from-sellers", get(revenue))
        .route("/user/seller-profiles", get(sellers))
        .route("/user/seller-details/{id}", get(seller_details))
        .route("/user/seller-delete/{id}", delete(ack_delete))
        .route("/user/buyer-profiles", get(buyers))
        .route("/user/buyer-details/{id}", get(buyer_details))
        .route("/user/buyer-delete/{id}", delete(ack_delete))
        .route("/echo-bearer", get(echo_bearer))
        .layer(DefaultBodyLimit::disable())
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "message": "OK", "data": data })).into_response()
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers).as_deref() {
        Some(STUB_TOKEN) => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match (email, password) {
        (STUB_EMAIL, STUB_PASSWORD) => ok(json!({
            "_id": "66f1c0ffee",
            "role": "admin",
            "accessToken": STUB_TOKEN,
            "refreshToken": "refresh-user",
            "user": {
                "name": "Admin",
                "email": STUB_EMAIL,
                "avatar": { "public_id": "a1", "url": "https://cdn.petshop.example/a.png" }
            }
        })),
        ("seller@example.com", "sellerpw") => ok(json!({
            "_id": "77aa",
            "role": "seller",
            "accessToken": "access-seller",
            "refreshToken": "refresh-seller",
            "user": { "name": "Seller", "email": "seller@example.com" }
        })),
        ("broken@example.com", _) => ok(json!({ "unexpected": true })),
        ("blank@example.com", _) => ok(json!({
            "_id": "88bb",
            "role": "admin",
            "accessToken": "",
            "user": { "name": "Blank", "email": "blank@example.com" }
        })),
        ("crash@example.com", _) => reject(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        _ => reject(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn forget(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some("ghost@example.com") => reject(StatusCode::NOT_FOUND, "User not found"),
        _ => Json(json!({ "success": true, "message": "OTP sent to your email" })).into_response(),
    }
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    match body["otp"].as_str() {
        Some("123456") => Json(json!({ "success": true, "message": "Password reset" })).into_response(),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid OTP" }))).into_response(),
    }
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    if body["currentPassword"] != STUB_PASSWORD {
        return reject(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    Json(json!({ "success": true, "message": "Password changed" })).into_response()
}

async fn overview(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!({
        "totalProducts": 12,
        "totalRevenue": 450.5,
        "totalSellers": 3,
        "totalUsers": 40,
        "totalOrders": 9,
        "charts": {
            "revenueChart": [{ "_id": 1, "revenue": 100.0 }],
            "activeUsers": [{ "_id": "2024-02-01", "activeUsers": 7 }]
        },
        "productsByCategory": [{ "categoryName": "Dogs", "productCount": 8 }],
        "recentOrders": [{ "_id": "o1", "name": "Bone", "totalPrice": 4.5, "createdAt": "2024-02-01T10:00:00Z" }]
    }))
}

async fn categories(headers: HeaderMap, Query(page): Query<PageQuery>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!([{
        "_id": "c1",
        "name": format!("page={} limit={}", page.page, page.limit),
        "image": "https://cdn.petshop.example/c1.png",
        "createdAt": "2024-01-05T09:00:00Z"
    }]))
}

async fn read_category_form(mut multipart: Multipart) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut image = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = field.text().await.ok(),
            Some("image") => image = field.file_name().map(str::to_string),
            _ => {}
        }
    }

    (name, image)
}

async fn create_category(headers: HeaderMap, multipart: Multipart) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    match read_category_form(multipart).await {
        (Some(name), image) => ok(json!({ "_id": "c2", "name": name, "image": image })),
        (None, _) => reject(StatusCode::UNPROCESSABLE_ENTITY, "Name is required"),
    }
}

async fn update_category(
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let (name, image) = read_category_form(multipart).await;
    ok(json!({ "_id": id, "name": name.unwrap_or_else(|| "Unchanged".to_string()), "image": image }))
}

async fn delete_category(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(json!({ "success": true, "message": "Category deleted" })).into_response()
}

async fn orders(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!([{
        "_id": "o1",
        "products": [{ "product": { "_id": "p1", "name": "Chew Toy", "images": ["https://cdn.petshop.example/p1.png"] }, "quantity": 2 }],
        "totalPrice": 19.98,
        "status": "delivered",
        "createdAt": "2024-02-01T10:00:00Z"
    }]))
}

async fn revenue(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!({
        "revenueData": [{ "sellerId": "s1", "totalRevenue": 250.0 }],
        "pagination": { "total": 1, "page": 1, "limit": 10, "pages": 1 }
    }))
}

async fn sellers(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!({
        "sellers": [{ "_id": "s1", "name": "Paws & Co", "avatar": { "url": "https://cdn.petshop.example/s1.png" } }],
        "pagination": { "total": 1, "pages": 1 }
    }))
}

async fn seller_details(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    if id == "missing" {
        return reject(StatusCode::NOT_FOUND, "Seller not found");
    }
    ok(json!({
        "_id": id,
        "name": "Paws & Co",
        "email": "paws@example.com",
        "phone": "+1 555 0100",
        "totalProducts": 14,
        "totalOrders": 30,
        "totalRevenue": 1200.0,
        "joinDate": "2023-11-20T00:00:00Z"
    }))
}

async fn buyers(headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!({
        "buyers": [{
            "_id": "b1",
            "name": "Kim",
            "totalOrders": 4,
            "deliveredOrders": 3,
            "pendingOrders": 0,
            "cancelledOrders": 1
        }],
        "pagination": { "total": 1, "pages": 1 }
    }))
}

async fn buyer_details(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    ok(json!({
        "buyer": { "_id": id, "name": "Kim", "email": "kim@example.com", "createdAt": "2024-01-01T00:00:00Z" },
        "orderStats": { "totalOrders": 4, "pendingOrders": 0, "processingOrders": 0, "deliveredOrders": 3, "cancelledOrders": 1 }
    }))
}

async fn ack_delete(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(json!({ "success": true, "message": "Deleted" })).into_response()
}

/// Returns the bearer token it received, or `anonymous`
async fn echo_bearer(headers: HeaderMap) -> Response {
    ok(json!(bearer(&headers).unwrap_or_else(|| "anonymous".to_string())))
}
