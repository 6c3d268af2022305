// bluemoon-rbac/src/helpers/auth_helper.rs
use actix_web::HttpResponse;
use actix_session::Session;
use tera::Context;
use crate::api::client::ApiClient;
use crate::configs::initializer::BluemoonConfig;
use crate::helpers::template_helper::create_access_context;
use crate::utils::guard::{resolve_role, AccessContext};
use crate::utils::session::{SessionProvider, ACCESS_TOKEN_KEY, TOKEN_KEY};

pub fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", location))
        .finish()
}

/// Access context for whoever holds `session`, `None` when not logged in.
pub fn session_access(session: &Session) -> Option<AccessContext> {
    resolve_role(session).map(AccessContext::for_role)
}

/// Layout context for a page that only needs a session. Not logged in means a
/// redirect to the login page.
pub fn create_base_template_context_with_auth(
    page_title: &str,
    session: &Session,
    config: &BluemoonConfig,
) -> Result<Context, HttpResponse> {
    match session_access(session) {
        Some(access) => Ok(create_context_for_access(&access, page_title, session, config)),
        None => Err(redirect_to(&config.login_path)),
    }
}

/// Layout context for a page whose access was already decided by the guard.
pub fn create_context_for_access(
    access: &AccessContext,
    page_title: &str,
    session: &Session,
    config: &BluemoonConfig,
) -> Context {
    let user = session.current_user().ok().flatten();
    let mut ctx = create_access_context(access, user.as_ref(), page_title, &config.home_path);
    ctx.insert("is_authenticated", &true);
    ctx.insert("login_path", &config.login_path);
    ctx.insert("api_base_url", &config.api_base_url);
    ctx
}

/// Shared API client authenticating as the session's user, when a token was
/// stored at login.
pub fn authorized_client(session: &Session, client: &ApiClient) -> ApiClient {
    let token = [ACCESS_TOKEN_KEY, TOKEN_KEY]
        .iter()
        .find_map(|key| session.read_key(key).ok().flatten())
        .filter(|t| !t.trim().is_empty());
    client.with_bearer(token)
}
