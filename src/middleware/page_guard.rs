// bluemoon-rbac/src/middleware/page_guard.rs
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use actix_session::SessionExt;
use crate::configs::initializer::BluemoonConfig;
use crate::helpers::auth_helper::redirect_to;
use crate::helpers::template_helper::render_denied;
use crate::utils::{
    guard::{guard, DenialReason, GuardDestinations, GuardOutcome},
    rbac::{AllowList, PageId},
    session::RequestSession,
    structs::{PageGuard, UserRecord},
};
use tracing::{info, warn};

impl<S, B> Transform<S, ServiceRequest> for PageGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = PageGuardMiddleware<S>;
    type InitError = ();
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            Ok(PageGuardMiddleware {
                service: Rc::new(service),
                allowed_roles,
            })
        })
    }
}

pub struct PageGuardMiddleware<S> {
    service: Rc<S>,
    allowed_roles: AllowList,
}

fn destinations_for(req: &ServiceRequest) -> GuardDestinations {
    match req.app_data::<web::Data<BluemoonConfig>>() {
        Some(config) => config.destinations(),
        None => {
            warn!("⚠️  BlueMoon config not found in app data for request: {}", req.path());
            GuardDestinations::default()
        }
    }
}

impl<S, B> Service<ServiceRequest> for PageGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();

        Box::pin(async move {
            let destinations = destinations_for(&req);
            let page = PageId::new(req.path().trim_start_matches('/'));

            // Resolution and decision in one pass, before anything is rendered.
            let outcome = {
                let session = req.get_session();
                let loaded = req.extensions().get::<UserRecord>().cloned();
                let provider = RequestSession::new(&session, loaded);
                guard(&provider, &page, &allowed_roles, &destinations)
            };

            match outcome {
                GuardOutcome::Allowed(access) => {
                    info!("✅ Access granted to page {} for role {}", page, access.role);
                    req.extensions_mut().insert(access);
                    let res = svc.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                GuardOutcome::Denied(denial) => {
                    let response = match denial.reason {
                        DenialReason::NoSession => redirect_to(&denial.destination),
                        DenialReason::InsufficientPrivilege => render_denied(&denial),
                    };
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::guard::{AccessContext, NO_PERMISSION_NOTICE};
    use crate::utils::rbac::RegionId;
    use crate::utils::role::CanonicalRole;
    use crate::utils::session::ROLE_KEY;
    use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
    use actix_web::{cookie::Key, http::StatusCode, test, App, HttpRequest, HttpResponse};

    async fn test_login(session: Session, path: web::Path<String>) -> HttpResponse {
        session.insert(ROLE_KEY, path.into_inner()).unwrap();
        HttpResponse::Ok().finish()
    }

    async fn protected(req: HttpRequest) -> HttpResponse {
        let hidden = req
            .extensions()
            .get::<AccessContext>()
            .map(|ctx| ctx.is_hidden(RegionId::FeeMenu))
            .unwrap_or(false);
        HttpResponse::Ok().body(format!("resident list, fees hidden: {}", hidden))
    }

    macro_rules! guarded_app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($config))
                    .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                    .route("/test-login/{role}", web::get().to(test_login))
                    .service(
                        web::resource("/can-ho")
                            .wrap(PageGuard::new(vec![CanonicalRole::Management]))
                            .route(web::get().to(protected)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_no_session_redirects_to_login() {
        let app = guarded_app!(BluemoonConfig::default());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/can-ho").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get("Location").unwrap(), "/login");
    }

    #[actix_web::test]
    async fn test_allowed_role_reaches_handler() {
        let app = guarded_app!(BluemoonConfig::default());
        let login = test::call_service(&app, test::TestRequest::get().uri("/test-login/BanQuanLy").to_request()).await;
        let cookie = login.response().cookies().next().unwrap().into_owned();

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/can-ho").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "resident list, fees hidden: true");
    }

    #[actix_web::test]
    async fn test_forbidden_role_gets_notice_only() {
        let config = BluemoonConfig {
            home_path: "/index".to_string(),
            ..Default::default()
        };
        let app = guarded_app!(config);
        let login = test::call_service(&app, test::TestRequest::get().uri("/test-login/KeToan").to_request()).await;
        let cookie = login.response().cookies().next().unwrap().into_owned();

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/can-ho").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(NO_PERMISSION_NOTICE));
        assert!(body.contains("/index"));
        assert!(!body.contains("resident list"));
    }

    #[actix_web::test]
    async fn test_admin_passes_any_guard() {
        let app = guarded_app!(BluemoonConfig::default());
        let login = test::call_service(&app, test::TestRequest::get().uri("/test-login/admin").to_request()).await;
        let cookie = login.response().cookies().next().unwrap().into_owned();

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/can-ho").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "resident list, fees hidden: false");
    }
}
