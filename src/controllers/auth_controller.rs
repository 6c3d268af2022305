// bluemoon-rbac/src/controllers/auth_controller.rs
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use tracing::{error, info, warn};
use crate::api::client::ApiClient;
use crate::api::endpoints::AuthApi;
use crate::configs::initializer::BluemoonConfig;
use crate::helpers::auth_helper::{redirect_to, session_access};
use crate::helpers::template_helper::{create_base_context, render_template};
use crate::utils::session::{store_login, SessionProvider};
use crate::utils::structs::{
    ApiResponse, AuthStatus, FlashMessage, LoginForm, UserRecord, DEFAULT_DISPLAY_NAME,
};

fn render_login(config: &BluemoonConfig, error: Option<&str>, username: &str) -> HttpResponse {
    let mut ctx = create_base_context();
    ctx.insert("is_authenticated", &false);
    ctx.insert("page_title", "Đăng nhập");
    ctx.insert("login_path", &config.login_path);
    ctx.insert("username", username);
    ctx.insert("error", &error.map(|e| FlashMessage::error(e).message));
    render_template("login.html.tera", ctx)
}

/// Authenticate against the upstream API and persist the user in the session.
async fn authenticate(
    client: &ApiClient,
    session: &Session,
    username: &str,
    password: &str,
) -> Result<UserRecord, String> {
    if username.is_empty() || password.is_empty() {
        return Err("Vui lòng nhập tên đăng nhập và mật khẩu".to_string());
    }

    let outcome = AuthApi::new(client)
        .login(username, password)
        .await
        .map_err(|e| {
            warn!("Login failed for {}: {}", username, e);
            e.to_string()
        })?;

    session.renew();
    store_login(session, &outcome.user, outcome.access_token.as_deref()).map_err(|e| {
        error!("Session insertion failed: {}", e);
        "Không thể tạo phiên đăng nhập".to_string()
    })?;

    Ok(outcome.user)
}

/// GET /login - Show login page
pub async fn login_form(
    session: Session,
    config: web::Data<BluemoonConfig>,
) -> impl Responder {
    if session_access(&session).is_some() {
        return redirect_to(&config.home_path);
    }
    render_login(&config, None, "")
}

/// POST /login - Authenticate and store the user in the session
pub async fn login_action(
    form: web::Form<LoginForm>,
    session: Session,
    config: web::Data<BluemoonConfig>,
    client: web::Data<ApiClient>,
) -> impl Responder {
    let username = form.username.trim();
    info!("Attempting login for: {}", username);

    match authenticate(&client, &session, username, form.password.trim()).await {
        Ok(user) => {
            info!("Login successful for: {} ({})", username, user.raw_role().unwrap_or("no role"));
            redirect_to(&config.home_path)
        }
        Err(message) => render_login(&config, Some(&message), username),
    }
}

/// POST /api/login - JSON variant of the login form
pub async fn api_login_action(
    form: web::Json<LoginForm>,
    session: Session,
    client: web::Data<ApiClient>,
) -> impl Responder {
    match authenticate(&client, &session, form.username.trim(), form.password.trim()).await {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(message) => HttpResponse::Unauthorized().json(ApiResponse::<UserRecord>::error(message)),
    }
}

/// GET/POST /logout - Clear session and redirect
pub async fn logout_action(
    session: Session,
    config: web::Data<BluemoonConfig>,
) -> impl Responder {
    if let Err(e) = session.clear_session() {
        warn!("Session was not fully cleared on logout: {}", e);
    }
    info!("User logged out");
    redirect_to(&config.login_path)
}

/// GET /api/auth/status
pub async fn check_auth_status(session: Session) -> impl Responder {
    let status = match session_access(&session) {
        Some(access) => AuthStatus {
            authenticated: true,
            display_name: Some(
                session
                    .current_user()
                    .ok()
                    .flatten()
                    .map(|u| u.display_name())
                    .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            ),
            role: Some(access.role),
            hidden_regions: access.hidden_regions,
        },
        None => AuthStatus::anonymous(),
    };
    HttpResponse::Ok().json(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::FakeTransport;
    use crate::api::client::RawResponse;
    use crate::configs::initializer::configure_bluemoon_services;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::{cookie::Key, http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn client_with(responses: Vec<RawResponse>) -> ApiClient {
        ApiClient::new("http://api.test/api", FakeTransport::new(responses))
    }

    macro_rules! auth_app {
        ($client:expr) => {
            test::init_service(
                App::new()
                    .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                    .configure(|cfg| configure_bluemoon_services(cfg, BluemoonConfig::default(), $client))
                    .route("/login", web::get().to(login_form))
                    .route("/login", web::post().to(login_action))
                    .route("/logout", web::get().to(logout_action))
                    .route("/api/auth/status", web::get().to(check_auth_status)),
            )
            .await
        };
    }

    fn accountant_login() -> RawResponse {
        RawResponse::json(
            200,
            json!({
                "success": true,
                "accessToken": "tok-1",
                "data": {"id": 7, "tenDangNhap": "ketoan1", "hoTen": "Trần Thị C", "vaiTro": "KeToan"}
            }),
        )
    }

    #[actix_web::test]
    async fn test_status_without_session() {
        let app = auth_app!(client_with(vec![]));
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/auth/status").to_request(),
        )
        .await;
        assert_eq!(body["authenticated"], json!(false));
        assert_eq!(body["role"], Value::Null);
    }

    #[actix_web::test]
    async fn test_login_status_logout() {
        let app = auth_app!(client_with(vec![accountant_login()]));

        let login = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_form(LoginForm {
                    username: "ketoan1".to_string(),
                    password: "secret".to_string(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(login.status(), StatusCode::FOUND);
        assert_eq!(login.headers().get("Location").unwrap(), "/");
        let cookie = login.response().cookies().next().unwrap().into_owned();

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/auth/status").cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(body["authenticated"], json!(true));
        assert_eq!(body["role"], json!("ACCOUNTANT"));
        assert_eq!(body["displayName"], json!("Trần Thị C"));
        assert!(body["hiddenRegions"].as_array().unwrap().contains(&json!("resident-menu")));

        let logout = test::call_service(
            &app,
            test::TestRequest::get().uri("/logout").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(logout.status(), StatusCode::FOUND);
        assert_eq!(logout.headers().get("Location").unwrap(), "/login");
        let cleared = logout.response().cookies().next().unwrap().into_owned();

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/auth/status").cookie(cleared).to_request(),
        )
        .await;
        assert_eq!(body["authenticated"], json!(false));
    }

    #[actix_web::test]
    async fn test_rejected_login_shows_message() {
        let app = auth_app!(client_with(vec![RawResponse::json(
            401,
            json!({"success": false, "message": "Sai mật khẩu"}),
        )]));

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_form(LoginForm {
                    username: "ketoan1".to_string(),
                    password: "wrong".to_string(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Lỗi: Sai mật khẩu"));
    }

    #[actix_web::test]
    async fn test_blank_credentials_skip_upstream() {
        let app = auth_app!(client_with(vec![]));
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_form(LoginForm {
                    username: "  ".to_string(),
                    password: String::new(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Vui lòng nhập tên đăng nhập và mật khẩu"));
    }

    fn login_request(username: &str) -> test::TestRequest {
        test::TestRequest::post().uri("/login").set_form(LoginForm {
            username: username.to_string(),
            password: "secret".to_string(),
        })
    }

    #[actix_web::test]
    async fn test_second_login_replaces_previous_user() {
        let app = auth_app!(client_with(vec![
            RawResponse::json(
                200,
                json!({"success": true, "accessToken": "admin-token", "data": {"tenDangNhap": "admin", "role": "admin"}}),
            ),
            RawResponse::json(200, json!({"success": true, "data": {"tenDangNhap": "guest"}})),
        ]));

        let first = test::call_service(&app, login_request("admin").to_request()).await;
        let cookie = first.response().cookies().next().unwrap().into_owned();
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/auth/status").cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(body["role"], json!("ADMIN"));

        let second = test::call_service(&app, login_request("guest").cookie(cookie).to_request()).await;
        assert_eq!(second.status(), StatusCode::FOUND);
        let cookie = second.response().cookies().next().unwrap().into_owned();

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/auth/status").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(body["authenticated"], json!(false));
        assert_eq!(body["role"], Value::Null);
    }
}
