// bluemoon-rbac/src/utils/guard.rs
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};
use crate::utils::rbac::{is_page_allowed, regions_to_hide, AllowList, PageId, RegionId};
use crate::utils::role::{normalize, CanonicalRole};
use crate::utils::session::{resolve_raw_role, SessionProvider};
use crate::utils::structs::FlashMessage;

pub const NO_PERMISSION_NOTICE: &str = "Bạn không có quyền truy cập trang này!";

/// Where a denied visitor is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDestinations {
    pub login: String,
    pub home: String,
}

impl Default for GuardDestinations {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            home: "/".to_string(),
        }
    }
}

/// What an allowed page may render: the resolved role and the regions to
/// leave out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessContext {
    pub role: CanonicalRole,
    pub hidden_regions: BTreeSet<RegionId>,
}

impl AccessContext {
    pub fn for_role(role: CanonicalRole) -> Self {
        let hidden_regions = regions_to_hide(&role);
        Self { role, hidden_regions }
    }

    pub fn is_hidden(&self, region: RegionId) -> bool {
        self.hidden_regions.contains(&region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No role could be resolved; the visitor is not logged in.
    NoSession,
    /// Logged in, but the page does not admit the role.
    InsufficientPrivilege,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
    pub reason: DenialReason,
    pub destination: String,
    pub notice: Option<FlashMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allowed(AccessContext),
    Denied(Denial),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allowed(_))
    }
}

/// Canonical role of the current visitor, `None` when not logged in.
pub fn resolve_role(provider: &dyn SessionProvider) -> Option<CanonicalRole> {
    normalize(resolve_raw_role(provider).as_deref())
}

/// Decide whether `page` may be rendered for the current visitor.
///
/// Role resolution and the decision happen in one synchronous pass. Anything
/// that goes wrong while reading the session ends up as `NoSession`, which
/// routes to login rather than to the no-permission notice.
pub fn guard(
    provider: &dyn SessionProvider,
    page: &PageId,
    allowed: &AllowList,
    destinations: &GuardDestinations,
) -> GuardOutcome {
    let role = match resolve_role(provider) {
        Some(role) => role,
        None => {
            info!("no session for page {}, redirecting to {}", page, destinations.login);
            return GuardOutcome::Denied(Denial {
                reason: DenialReason::NoSession,
                destination: destinations.login.clone(),
                notice: None,
            });
        }
    };

    if !is_page_allowed(&role, page, allowed) {
        warn!(
            "access denied to page {} for role {} (allowed: {:?})",
            page, role, allowed
        );
        return GuardOutcome::Denied(Denial {
            reason: DenialReason::InsufficientPrivilege,
            destination: destinations.home.clone(),
            notice: Some(FlashMessage::warning(NO_PERMISSION_NOTICE)),
        });
    }

    GuardOutcome::Allowed(AccessContext::for_role(role))
}
