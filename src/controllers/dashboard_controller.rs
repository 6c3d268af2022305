// bluemoon-rbac/src/controllers/dashboard_controller.rs

use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, web};
use actix_session::Session;
use crate::api::client::ApiClient;
use crate::api::endpoints::{entity_for_page, EntityApi};
use crate::configs::initializer::BluemoonConfig;
use crate::error::BluemoonError;
use crate::helpers::auth_helper::{
    authorized_client, create_base_template_context_with_auth, create_context_for_access,
    redirect_to,
};
use crate::helpers::template_helper::{render_404, render_template};
use crate::registry::find_page;
use crate::utils::guard::AccessContext;
use crate::utils::rbac::PageId;
use crate::utils::structs::ApiResponse;
use tracing::{info, warn};

/// GET / - Dashboard. Any logged-in role may open it; the financial and
/// demographic panels are dropped per role.
pub async fn dashboard_view(
    session: Session,
    config: web::Data<BluemoonConfig>,
) -> impl Responder {
    match create_base_template_context_with_auth("Dashboard", &session, &config) {
        Ok(ctx) => render_template("dashboard.html.tera", ctx),
        Err(redirect) => redirect,
    }
}

/// GET /<page> - A registered page, mounted behind its `PageGuard`.
pub async fn page_view(
    req: HttpRequest,
    session: Session,
    config: web::Data<BluemoonConfig>,
) -> HttpResponse {
    let access = match req.extensions().get::<AccessContext>().cloned() {
        Some(access) => access,
        None => {
            warn!("Page {} served without a guard", req.path());
            return redirect_to(&config.login_path);
        }
    };

    let page_id = PageId::new(req.path().trim_start_matches('/'));
    match find_page(&page_id) {
        Some(page) => {
            info!("Page {} rendered for role {}", page.id, access.role);
            let mut ctx = create_context_for_access(&access, &page.title, &session, &config);
            ctx.insert("page_id", &page.id);
            render_template("page.html.tera", ctx)
        }
        None => render_404(),
    }
}

/// GET /api/data/<page> - Upstream records behind a page, fetched with the
/// session's token. Mounted behind the same guard as the page.
pub async fn page_data(
    req: HttpRequest,
    session: Session,
    client: web::Data<ApiClient>,
) -> Result<HttpResponse, BluemoonError> {
    let page = req.path().rsplit('/').next().unwrap_or_default();
    let base = entity_for_page(page).ok_or(BluemoonError::NotFound)?;

    let client = authorized_client(&session, &client);
    let items = EntityApi::new(&client, base)
        .list()
        .await
        .map_err(|e| {
            warn!("Fetching {} failed: {}", base, e);
            BluemoonError::Upstream(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(items)))
}
