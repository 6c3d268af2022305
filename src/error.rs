// bluemoon-rbac/src/error.rs

use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde::Serialize;

#[derive(Debug, Display)]
pub enum BluemoonError {
    #[display(fmt = "Not Found")]
    NotFound,
    #[display(fmt = "Bad Request: {}", _0)]
    BadRequest(String),
    #[display(fmt = "Authentication required")]
    Unauthorized,
    #[display(fmt = "Forbidden: {}", _0)]
    Forbidden(String),
    #[display(fmt = "Malformed session data: {}", _0)]
    MalformedSession(String),
    #[display(fmt = "Session store error: {}", _0)]
    SessionStore(String),
    #[display(fmt = "Upstream API error: {}", _0)]
    Upstream(String),
    #[display(fmt = "Internal Server Error")]
    InternalError,
}

impl std::error::Error for BluemoonError {}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for BluemoonError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            BluemoonError::NotFound => actix_web::http::StatusCode::NOT_FOUND,
            BluemoonError::BadRequest(_) => actix_web::http::StatusCode::BAD_REQUEST,
            BluemoonError::Unauthorized
            | BluemoonError::MalformedSession(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            BluemoonError::Forbidden(_) => actix_web::http::StatusCode::FORBIDDEN,
            BluemoonError::Upstream(_) => actix_web::http::StatusCode::BAD_GATEWAY,
            BluemoonError::SessionStore(_)
            | BluemoonError::InternalError => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
