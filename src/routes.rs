// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppState, handlers, middleware::auth::auth_middleware};

pub fn app(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/otp/send", post(handlers::auth::send_otp))
        .route("/otp/verify", post(handlers::auth::verify_otp))
        .route("/admin/login", post(handlers::auth::admin_login))
        .route("/token/refresh", post(handlers::auth::refresh_token));

    let user_routes = Router::new()
        .route("/register/customer", post(handlers::users::register_customer))
        .route("/register/vendor", post(handlers::users::register_vendor))
        .route("/register/admin", post(handlers::users::register_admin))
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::users::me))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{id}/activate", post(handlers::users::activate_user))
        .route("/users/{id}/deactivate", post(handlers::users::deactivate_user))
        .route("/customer-profiles", get(handlers::users::list_customer_profiles))
        .route(
            "/customer-profiles/{id}",
            get(handlers::users::get_customer_profile)
                .put(handlers::users::update_customer_profile)
                .patch(handlers::users::update_customer_profile)
                .delete(handlers::users::delete_customer_profile),
        )
        .route("/vendor-profiles", get(handlers::users::list_vendor_profiles))
        .route(
            "/vendor-profiles/{id}",
            get(handlers::users::get_vendor_profile)
                .put(handlers::users::update_vendor_profile)
                .patch(handlers::users::update_vendor_profile)
                .delete(handlers::users::delete_vendor_profile),
        )
        .route(
            "/vendor-profiles/{id}/verify",
            get(handlers::users::verify_vendor).post(handlers::users::verify_vendor),
        )
        .route("/admin-profiles", get(handlers::users::list_admin_profiles))
        .route(
            "/admin-profiles/{id}",
            get(handlers::users::get_admin_profile)
                .put(handlers::users::update_admin_profile)
                .patch(handlers::users::update_admin_profile)
                .delete(handlers::users::delete_admin_profile),
        );

    let role_routes = Router::new()
        .route(
            "/permissions",
            get(handlers::rbac::list_permissions).post(handlers::rbac::create_permission),
        )
        .route(
            "/permissions/{id}",
            get(handlers::rbac::get_permission)
                .put(handlers::rbac::update_permission)
                .delete(handlers::rbac::delete_permission),
        )
        .route("/roles", get(handlers::rbac::list_roles).post(handlers::rbac::create_role))
        .route(
            "/roles/{id}",
            get(handlers::rbac::get_role)
                .put(handlers::rbac::update_role)
                .patch(handlers::rbac::update_role)
                .delete(handlers::rbac::delete_role),
        )
        .route("/roles/{id}/activate", post(handlers::rbac::activate_role))
        .route("/roles/{id}/deactivate", post(handlers::rbac::deactivate_role))
        .route(
            "/admin-roles",
            get(handlers::rbac::list_admin_roles).post(handlers::rbac::assign_admin_role),
        )
        .route(
            "/admin-roles/{id}",
            get(handlers::rbac::get_admin_role)
                .put(handlers::rbac::update_admin_role)
                .patch(handlers::rbac::update_admin_role)
                .delete(handlers::rbac::delete_admin_role),
        );

    let catalog_routes = Router::new()
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .patch(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/services",
            get(handlers::catalog::list_services).post(handlers::catalog::create_service),
        )
        .route(
            "/services/{id}",
            get(handlers::catalog::get_service)
                .put(handlers::catalog::update_service)
                .patch(handlers::catalog::update_service)
                .delete(handlers::catalog::delete_service),
        )
        .route("/taxes", get(handlers::catalog::list_taxes).post(handlers::catalog::create_tax))
        .route(
            "/taxes/{id}",
            get(handlers::catalog::get_tax)
                .put(handlers::catalog::update_tax)
                .patch(handlers::catalog::update_tax)
                .delete(handlers::catalog::delete_tax),
        )
        .route(
            "/payment-terms",
            get(handlers::catalog::list_payment_terms).post(handlers::catalog::create_payment_term),
        )
        .route(
            "/payment-terms/{id}",
            get(handlers::catalog::get_payment_term)
                .put(handlers::catalog::update_payment_term)
                .patch(handlers::catalog::update_payment_term)
                .delete(handlers::catalog::delete_payment_term),
        );

    let pwa_routes = Router::new()
        .route(
            "/api/push-subscriptions",
            get(handlers::pwa::list_push_subscriptions).post(handlers::pwa::create_push_subscription),
        )
        .route(
            "/api/push-subscriptions/{id}",
            get(handlers::pwa::get_push_subscription).delete(handlers::pwa::delete_push_subscription),
        )
        .route("/api/notifications/send", post(handlers::pwa::send_notification))
        .route(
            "/api/offline-actions",
            get(handlers::pwa::list_offline_actions).post(handlers::pwa::create_offline_action),
        )
        .route("/api/offline-actions/sync", post(handlers::pwa::sync_offline_actions))
        .route(
            "/api/offline-actions/{id}",
            get(handlers::pwa::get_offline_action).delete(handlers::pwa::delete_offline_action),
        )
        .route("/api/seo-metadata", get(handlers::seo::list_seo_metadata))
        .route("/api/seo-metadata/{id}", get(handlers::seo::get_seo_metadata))
        .route(
            "/api/sitemap-entries",
            get(handlers::seo::list_sitemap_entries).post(handlers::seo::create_sitemap_entry),
        )
        .route("/api/sitemap-entries/regenerate", post(handlers::seo::regenerate_sitemap))
        .route(
            "/api/sitemap-entries/{id}",
            get(handlers::seo::get_sitemap_entry)
                .put(handlers::seo::update_sitemap_entry)
                .delete(handlers::seo::delete_sitemap_entry),
        )
        .route("/api/health-check", get(handlers::seo::health_check));

    // Documents fetched by the browser shells and crawlers
    let document_routes = Router::new()
        .route("/manifest.json", get(handlers::seo::manifest))
        .route("/{app_type}/manifest.json", get(handlers::seo::app_manifest))
        .route("/sw-config.json", get(handlers::seo::sw_config))
        .route("/{app_type}/sw-config.json", get(handlers::seo::app_sw_config))
        .route("/robots.txt", get(handlers::seo::robots))
        .route("/{app_type}/robots.txt", get(handlers::seo::app_robots))
        .route("/sitemap.xml", get(handlers::seo::sitemap))
        .route("/webpush-config.json", get(handlers::seo::webpush_config));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/roles", role_routes)
        .nest("/api/core", catalog_routes)
        .merge(pwa_routes)
        .merge(document_routes)
        // Optional everywhere: anonymous requests pass, bad tokens are rejected
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
