// bluemoon-rbac/src/lib.rs

pub mod api;
pub mod error;
pub mod router;
pub mod menu;
pub mod registry;
pub mod health;
pub mod middleware;
pub mod utils;
pub mod helpers;
pub mod controllers;
pub mod configs;

// Export configuration and app creation functions
pub use configs::initializer::{
    setup_bluemoon_logging,
    get_bluemoon_session_middleware,
    get_bluemoon_api_client,
    configure_bluemoon_services,
    bluemoon_initialize,
    BluemoonConfig,
};

// Role resolution, access policy and the page guard
pub use utils::{
    role::{normalize, CanonicalRole},
    rbac::{is_page_allowed, regions_to_hide, AllowList, PageId, RegionId},
    session::{resolve_raw_role, SessionProvider, MemorySession},
    guard::{guard, AccessContext, GuardDestinations, GuardOutcome},
    structs::{LoginForm, PageGuard, UserRecord},
};

pub use error::BluemoonError;
pub use api::{ApiClient, ApiError};

// Export controllers for custom route registration
pub use controllers::{
    auth_controller::{login_form, login_action, logout_action, check_auth_status},
    dashboard_controller::{dashboard_view, page_view},
};

// Export router for custom integration
pub use router::register_all_bluemoon_routes;

// Export template helpers
pub use helpers::template_helper::{
    render_template,
    render_denied,
    render_404,
    render_500,
};

// Export middleware
pub use middleware::page_guard::PageGuardMiddleware;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub mod prelude {
    pub use crate::{
        BluemoonConfig,
        bluemoon_initialize,
        CanonicalRole,
        PageGuard,
        PageId,
        RegionId,
        SessionProvider,
        UserRecord,
        guard,
        normalize,
        render_template,
    };
}
