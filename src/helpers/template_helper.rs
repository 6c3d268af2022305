// bluemoon-rbac/src/helpers/template_helper.rs
use actix_web::HttpResponse;
use chrono::Datelike;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::error;
use crate::menu::{visible_menus, visible_regions};
use crate::registry::get_menus_for_role;
use crate::utils::guard::{AccessContext, Denial, NO_PERMISSION_NOTICE};
use crate::utils::structs::{UserRecord, DEFAULT_DISPLAY_NAME};

// Templates compiled into the binary, parents first.
const TEMPLATE_FILES: &[(&str, &str)] = &[
    ("layout.html.tera", include_str!("../templates/layout.html.tera")),
    ("dashboard.html.tera", include_str!("../templates/dashboard.html.tera")),
    ("page.html.tera", include_str!("../templates/page.html.tera")),
    ("login.html.tera", include_str!("../templates/login.html.tera")),
    ("denied.html.tera", include_str!("../templates/denied.html.tera")),
    ("errors/404.html.tera", include_str!("../templates/errors/404.html.tera")),
    ("errors/500.html.tera", include_str!("../templates/errors/500.html.tera")),
];

pub static BLUEMOON_TEMPLATES: Lazy<Arc<Tera>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    if let Err(e) = tera.add_raw_templates(TEMPLATE_FILES.to_vec()) {
        error!("Failed to load templates: {}", e);
    }
    Arc::new(tera)
});

pub fn render_template(template_name: &str, ctx: Context) -> HttpResponse {
    let tera = Arc::clone(&BLUEMOON_TEMPLATES);
    match tera.render(template_name, &ctx) {
        Ok(html) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html),
        Err(err) => {
            error!("Template render error for {}: {:?}", template_name, err);
            render_500(Some(&format!("Failed to render template: {}", template_name)))
        }
    }
}

/// Standalone notice page for a visitor without permission: no layout, no
/// menu, only the notice and the way out.
pub fn render_denied(denial: &Denial) -> HttpResponse {
    let tera = Arc::clone(&BLUEMOON_TEMPLATES);
    let notice = denial
        .notice
        .as_ref()
        .map(|n| n.message.clone())
        .unwrap_or_else(|| NO_PERMISSION_NOTICE.to_string());

    let mut ctx = Context::new();
    ctx.insert("notice", &notice);
    ctx.insert("destination", &denial.destination);

    let html = tera
        .render("denied.html.tera", &ctx)
        .unwrap_or_else(|_| format!("<p>{}</p>", notice));
    HttpResponse::Forbidden()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

pub fn render_404() -> HttpResponse {
    let tera = Arc::clone(&BLUEMOON_TEMPLATES);
    let html = tera
        .render("errors/404.html.tera", &create_base_context())
        .unwrap_or_else(|_| "<h1>404 - Page Not Found</h1>".to_string());
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

pub fn render_500(error_message: Option<&str>) -> HttpResponse {
    let tera = Arc::clone(&BLUEMOON_TEMPLATES);
    let mut ctx = create_base_context();
    ctx.insert("error_message", &error_message.unwrap_or("An internal server error occurred."));

    let html = tera
        .render("errors/500.html.tera", &ctx)
        .unwrap_or_else(|_| "<h1>500 - Internal Server Error</h1>".to_string());
    HttpResponse::InternalServerError()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

pub fn create_base_context() -> Context {
    let mut ctx = Context::new();
    ctx.insert("app_name", "BlueMoon");
    ctx.insert("app_version", env!("CARGO_PKG_VERSION"));
    ctx.insert("current_year", &chrono::Utc::now().year());
    ctx
}

/// Layout context for an authorised page: menus limited to the pages the role
/// may open with its regions removed, the remaining regions, and who is logged in.
pub fn create_access_context(
    access: &AccessContext,
    user: Option<&UserRecord>,
    page_title: &str,
    home_path: &str,
) -> Context {
    let mut ctx = create_base_context();
    ctx.insert("page_title", page_title);
    ctx.insert("home_path", home_path);
    ctx.insert("menus", &visible_menus(&get_menus_for_role(&access.role), &access.hidden_regions));
    ctx.insert("hidden_regions", &access.hidden_regions);
    ctx.insert("visible_regions", &visible_regions(&access.hidden_regions));
    ctx.insert("user_role", &access.role);
    ctx.insert("role_display_name", access.role.display_name());
    ctx.insert("current_user", &user);
    ctx.insert(
        "display_name",
        &user.map(UserRecord::display_name)
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
    );
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::guard::DenialReason;
    use crate::utils::role::CanonicalRole;
    use crate::utils::structs::FlashMessage;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;

    fn body_text(response: HttpResponse) -> String {
        let bytes = response.into_body().try_into_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_templates_load() {
        let names: Vec<_> = BLUEMOON_TEMPLATES.get_template_names().collect();
        assert_eq!(names.len(), TEMPLATE_FILES.len());
    }

    #[test]
    fn test_denied_page_has_notice_and_no_layout() {
        let response = render_denied(&Denial {
            reason: DenialReason::InsufficientPrivilege,
            destination: "/".to_string(),
            notice: Some(FlashMessage::warning(NO_PERMISSION_NOTICE)),
        });
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let html = body_text(response);
        assert!(html.contains(NO_PERMISSION_NOTICE));
        assert!(html.contains("window.location.replace(\"/\")"));
        assert!(!html.contains("id=\"sidebar\""));
    }

    #[test]
    fn test_dashboard_hides_regions_for_management() {
        let access = AccessContext::for_role(CanonicalRole::Management);
        let ctx = create_access_context(&access, None, "Dashboard", "/");
        let response = render_template("dashboard.html.tera", ctx);
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response);
        assert!(!html.contains("btnQuickCreateFee"));
        assert!(!html.contains("revenueChart"));
        assert!(html.contains("demographicsChart"));
        assert!(html.contains("Người dùng"));
    }

    #[test]
    fn test_dashboard_shows_everything_for_admin() {
        let access = AccessContext::for_role(CanonicalRole::Admin);
        let html = body_text(render_template(
            "dashboard.html.tera",
            create_access_context(&access, None, "Dashboard", "/"),
        ));
        assert!(html.contains("btnQuickCreateFee"));
        assert!(html.contains("revenueChart"));
        assert!(html.contains("demographicsChart"));
    }

    #[test]
    fn test_unknown_template_renders_500() {
        let response = render_template("missing.html.tera", create_base_context());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
