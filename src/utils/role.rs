// bluemoon-rbac/src/utils/role.rs
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical role of a logged-in user.
///
/// Anything that does not match one of the known roles is kept as an opaque,
/// uppercased token so the policy layer can still key on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalRole {
    Admin,
    Management,
    Accountant,
    Unrecognized(String),
}

impl CanonicalRole {
    pub fn as_str(&self) -> &str {
        match self {
            CanonicalRole::Admin => "ADMIN",
            CanonicalRole::Management => "MANAGEMENT",
            CanonicalRole::Accountant => "ACCOUNTANT",
            CanonicalRole::Unrecognized(token) => token.as_str(),
        }
    }

    /// Role code used by the backend (`TaiKhoan.vaiTro`).
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CanonicalRole::Admin => Some("Admin"),
            CanonicalRole::Management => Some("BanQuanLy"),
            CanonicalRole::Accountant => Some("KeToan"),
            CanonicalRole::Unrecognized(_) => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            CanonicalRole::Admin => "Quản trị viên",
            CanonicalRole::Management => "Ban quản lý",
            CanonicalRole::Accountant => "Kế toán",
            CanonicalRole::Unrecognized(token) => token.as_str(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, CanonicalRole::Admin)
    }

    pub fn is_management(&self) -> bool {
        matches!(self, CanonicalRole::Management)
    }

    pub fn is_accountant(&self) -> bool {
        matches!(self, CanonicalRole::Accountant)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CanonicalRole::Unrecognized(_))
    }

    /// Parse a canonical name (`ADMIN`, `management`, ...) as written in page
    /// allow-lists. Free-form tokens go through [`normalize`] instead.
    pub fn from_canonical(name: &str) -> Option<Self> {
        normalize(Some(name))
    }
}

impl fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

const MANAGEMENT_PHRASES: &[&str] = &["quản lý", "quan ly"];
const MANAGEMENT_CODES: &[&str] = &["banquanly", "management"];
const ACCOUNTANT_PHRASES: &[&str] = &["kế toán", "ke toan"];
const ACCOUNTANT_CODES: &[&str] = &["ketoan", "accountant"];

/// Map a raw role token onto the canonical role set.
///
/// Matching is case-insensitive on the trimmed token. `ADMIN` only comes from
/// an exact `admin`; a "quản lý" phrase always means management.
pub fn normalize(raw: Option<&str>) -> Option<CanonicalRole> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();

    if lower == "admin" {
        return Some(CanonicalRole::Admin);
    }

    if MANAGEMENT_PHRASES.iter().any(|p| lower.contains(p))
        || MANAGEMENT_CODES.contains(&lower.as_str())
    {
        return Some(CanonicalRole::Management);
    }

    if ACCOUNTANT_PHRASES.iter().any(|p| lower.contains(p))
        || ACCOUNTANT_CODES.contains(&lower.as_str())
    {
        return Some(CanonicalRole::Accountant);
    }

    Some(CanonicalRole::Unrecognized(trimmed.to_uppercase()))
}
