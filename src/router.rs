// bluemoon-rbac/src/router.rs
use actix_web::{web, Scope};
use tracing::{info, warn};
use crate::configs::initializer::BluemoonConfig;
use crate::controllers::auth_controller::{
    api_login_action,
    check_auth_status,
    login_action,
    login_form,
    logout_action,
};
use crate::api::endpoints::entity_for_page;
use crate::controllers::dashboard_controller::{dashboard_view, page_data, page_view};
use crate::health::health_check;
use crate::registry::all_pages;

/// Login, logout, dashboard and the JSON auth endpoints.
pub fn register_auth_routes_only(config: &BluemoonConfig) -> Scope {
    web::scope("")
        // ===========================
        // AUTHENTICATION ROUTES
        // ===========================
        .route(&config.login_path, web::get().to(login_form))
        .route(&config.login_path, web::post().to(login_action))
        .route("/logout", web::get().to(logout_action))
        .route("/logout", web::post().to(logout_action))

        // ===========================
        // DASHBOARD ROUTES
        // ===========================
        .route(&config.home_path, web::get().to(dashboard_view))
        .route("/health", web::get().to(health_check))

        // ===========================
        // API ROUTES
        // ===========================
        .route("/api/login", web::post().to(api_login_action))
        .route("/api/auth/status", web::get().to(check_auth_status))
}

/// Every route of the front end: the auth routes plus one guarded route per
/// registered page.
pub fn register_all_bluemoon_routes(config: &BluemoonConfig) -> Scope {
    info!("🔧 Starting BlueMoon route registration...");

    let mut scope = register_auth_routes_only(config);

    let pages = all_pages();
    info!("📋 Found {} pages to register", pages.len());

    if pages.is_empty() {
        warn!("⚠️  No pages found! Make sure you've called bluemoon_initialize() before starting the server.");
        return scope;
    }

    for page in pages {
        info!("🔐 Registering page '{}' at {} (allowed: {:?})", page.id, page.path, page.allowed_roles);
        scope = scope.service(
            web::resource(page.path.as_str())
                .wrap(page.guard())
                .route(web::get().to(page_view)),
        );

        if entity_for_page(page.id.as_str()).is_some() {
            scope = scope.service(
                web::resource(format!("/api/data{}", page.path))
                    .wrap(page.guard())
                    .route(web::get().to(page_data)),
            );
        }
    }

    info!("🎉 BlueMoon route registration completed!");
    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::register_default_pages;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::{cookie::Key, http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_pages_are_guarded() {
        register_default_pages();
        let config = BluemoonConfig::default();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                .service(register_all_bluemoon_routes(&config)),
        )
        .await;

        for path in ["/can-ho", "/khoan-thu", "/tai-khoan", "/"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "{}", path);
            assert_eq!(resp.headers().get("Location").unwrap(), "/login");
        }

        let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
