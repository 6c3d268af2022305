// bluemoon-rbac/src/utils/rbac.rs
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;
use crate::utils::role::CanonicalRole;

/// A named, hideable UI area. The renderer decides what each one maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    FeeMenu,
    CollectionPeriodMenu,
    ReceiptMenu,
    ReportMenu,
    FinancialDashboardWidgets,
    FinancialCharts,
    ResidentMenu,
    RoomMenu,
    VehicleMenu,
    DemographicCharts,
}

impl RegionId {
    pub const ALL: [RegionId; 10] = [
        RegionId::FeeMenu,
        RegionId::CollectionPeriodMenu,
        RegionId::ReceiptMenu,
        RegionId::ReportMenu,
        RegionId::FinancialDashboardWidgets,
        RegionId::FinancialCharts,
        RegionId::ResidentMenu,
        RegionId::RoomMenu,
        RegionId::VehicleMenu,
        RegionId::DemographicCharts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionId::FeeMenu => "fee-menu",
            RegionId::CollectionPeriodMenu => "collection-period-menu",
            RegionId::ReceiptMenu => "receipt-menu",
            RegionId::ReportMenu => "report-menu",
            RegionId::FinancialDashboardWidgets => "financial-dashboard-widgets",
            RegionId::FinancialCharts => "financial-charts",
            RegionId::ResidentMenu => "resident-menu",
            RegionId::RoomMenu => "room-menu",
            RegionId::VehicleMenu => "vehicle-menu",
            RegionId::DemographicCharts => "demographic-charts",
        }
    }

    /// Selectors of the legacy markup this region covers.
    pub fn selectors(&self) -> &'static [&'static str] {
        match self {
            RegionId::FeeMenu => &["a[href*=\"khoan-thu.html\"]"],
            RegionId::CollectionPeriodMenu => &["a[href*=\"dot-thu.html\"]"],
            RegionId::ReceiptMenu => &["a[href*=\"phieu-thu.html\"]"],
            RegionId::ReportMenu => &[
                "a[href*=\"bao-cao.html\"]",
                "a[href*=\"bao-cao-thu.html\"]",
                "a[href*=\"bao-cao-cong-no.html\"]",
            ],
            RegionId::FinancialDashboardWidgets => &["#btnQuickCreateFee"],
            RegionId::FinancialCharts => &["[id*=\"revenue\"]", "[id*=\"debt\"]"],
            RegionId::ResidentMenu => &["a[href*=\"danh-sach-dan-cu.html\"]"],
            RegionId::RoomMenu => &["a[href*=\"can-ho.html\"]", "a[href*=\"phong.html\"]"],
            RegionId::VehicleMenu => &["a[href*=\"phuong-tien.html\"]"],
            RegionId::DemographicCharts => &["[id*=\"demographics\"]", "[id*=\"resident\"]"],
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == id)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Opaque page identifier, e.g. `khoan-thu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Roles explicitly allowed on a page. Admin is always allowed, so an empty
/// list means admin-only.
pub type AllowList = BTreeSet<CanonicalRole>;

pub fn allow_list<I>(roles: I) -> AllowList
where
    I: IntoIterator<Item = CanonicalRole>,
{
    roles.into_iter().collect()
}

pub const RESIDENT_PAGES: &[&str] = &["can-ho", "danh-sach-dan-cu", "phuong-tien"];
pub const FINANCIAL_PAGES: &[&str] = &[
    "khoan-thu",
    "dot-thu",
    "phieu-thu",
    "bao-cao",
    "bao-cao-thu",
    "bao-cao-cong-no",
];
pub const STATISTICS_PAGE: &str = "thong-ke";
pub const ACCOUNTS_PAGE: &str = "tai-khoan";

/// Regions the given role must not see. Anything not listed stays visible,
/// and roles without an entry (admin, unrecognized) see everything.
pub fn regions_to_hide(role: &CanonicalRole) -> BTreeSet<RegionId> {
    match role {
        CanonicalRole::Management => BTreeSet::from([
            RegionId::FeeMenu,
            RegionId::CollectionPeriodMenu,
            RegionId::ReceiptMenu,
            RegionId::ReportMenu,
            RegionId::FinancialDashboardWidgets,
            RegionId::FinancialCharts,
        ]),
        CanonicalRole::Accountant => BTreeSet::from([
            RegionId::ResidentMenu,
            RegionId::RoomMenu,
            RegionId::VehicleMenu,
            RegionId::DemographicCharts,
        ]),
        CanonicalRole::Admin | CanonicalRole::Unrecognized(_) => BTreeSet::new(),
    }
}

pub fn is_page_allowed(role: &CanonicalRole, page: &PageId, allowed: &AllowList) -> bool {
    let allowed_here = role.is_admin() || allowed.contains(role);
    debug!("page access {} for role {} -> {}", page, role, allowed_here);
    allowed_here
}

/// Allow-list of the application's built-in pages.
pub fn standard_allow_list(page: &PageId) -> Option<AllowList> {
    let id = page.as_str();
    if RESIDENT_PAGES.contains(&id) {
        Some(allow_list([CanonicalRole::Management]))
    } else if FINANCIAL_PAGES.contains(&id) {
        Some(allow_list([CanonicalRole::Accountant]))
    } else if id == STATISTICS_PAGE {
        Some(allow_list([CanonicalRole::Management, CanonicalRole::Accountant]))
    } else if id == ACCOUNTS_PAGE {
        Some(AllowList::new())
    } else {
        None
    }
}

pub fn can_access_resident(role: &CanonicalRole) -> bool {
    role.is_admin() || role.is_management()
}

pub fn can_access_financial(role: &CanonicalRole) -> bool {
    role.is_admin() || role.is_accountant()
}
