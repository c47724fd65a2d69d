// Vendor onboarding against a real database:
// register -> unverified profile -> staff verifies -> profile verified.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use dodo_backend::{config::AppState, models::user::RegisterVendorPayload, routes};

fn vendor_payload() -> RegisterVendorPayload {
    serde_json::from_value(json!({
        "mobile": "9876543210",
        "first_name": "Asha",
        "last_name": "Rao",
        "business_name": "Acme Cleaners",
        "business_address": "12 MG Road, Bengaluru"
    }))
    .unwrap()
}

fn verify_request(profile_id: uuid::Uuid, access: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/users/vendor-profiles/{profile_id}/verify"))
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn staff_verifies_a_registered_vendor(pool: PgPool) {
    let state = AppState::build(common::settings(), pool.clone()).unwrap();
    let app = routes::app(state.clone());

    // 1. Registration creates the user and an unverified profile
    let registered = state
        .user_service
        .register_vendor(vendor_payload().normalized().unwrap())
        .await
        .unwrap();
    assert_eq!(registered.message, "Vendor registered successfully");

    let profiles = state.user_repo.list_vendor_profiles(Some(registered.user_id)).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert!(!profiles[0].is_verified);
    let profile_id = profiles[0].id;

    // 2. The vendor cannot verify itself
    let vendor = state.user_repo.find_by_id(registered.user_id).await.unwrap().unwrap();
    let vendor_tokens = state.auth_service.issue_tokens(&vendor).unwrap();
    let response = app.clone().oneshot(verify_request(profile_id, &vendor_tokens.access)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 3. A staff member can
    let staff_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, user_type, is_staff) VALUES ('ops@dodoservices.com', 'admin', TRUE) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let staff = state.user_repo.find_by_id(staff_id).await.unwrap().unwrap();
    let staff_tokens = state.auth_service.issue_tokens(&staff).unwrap();

    let response = app.clone().oneshot(verify_request(profile_id, &staff_tokens.access)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], format!("Vendor {profile_id} verified successfully"));

    let profile = state.user_repo.find_vendor_profile(profile_id).await.unwrap().unwrap();
    assert!(profile.is_verified);

    // 4. Registering the same mobile again is a conflict
    let duplicate = state
        .user_service
        .register_vendor(vendor_payload().normalized().unwrap())
        .await
        .unwrap_err();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}
