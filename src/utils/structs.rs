// bluemoon-rbac/src/utils/structs.rs
use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use crate::utils::rbac::{allow_list, standard_allow_list, AllowList, PageId, RegionId};
use crate::utils::role::CanonicalRole;

pub const DEFAULT_DISPLAY_NAME: &str = "Người dùng";

/// Account record as returned by the upstream `/login` endpoint and kept in
/// the session under `currentUser`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_dang_nhap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ho_ten: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vai_tro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dien_thoai: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UserRecord {
    /// `hoTen`, then `tenDangNhap`, then a generic label.
    pub fn display_name(&self) -> String {
        non_blank(&self.ho_ten)
            .or_else(|| non_blank(&self.ten_dang_nhap))
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string()
    }

    /// Raw role token, `role` first then `vaiTro`.
    pub fn raw_role(&self) -> Option<&str> {
        non_blank(&self.role).or_else(|| non_blank(&self.vai_tro))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Per-page access requirement, mounted as actix middleware.
#[derive(Debug, Clone)]
pub struct PageGuard {
    pub allowed_roles: AllowList,
}

impl PageGuard {
    pub fn new(roles: Vec<CanonicalRole>) -> Self {
        Self {
            allowed_roles: allow_list(roles),
        }
    }

    pub fn from_allow_list(allowed_roles: AllowList) -> Self {
        Self { allowed_roles }
    }

    /// Guard for one of the built-in pages; unknown pages are admin-only.
    pub fn for_page(page: &PageId) -> Self {
        Self {
            allowed_roles: standard_allow_list(page).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Body of `GET /api/auth/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub role: Option<CanonicalRole>,
    pub display_name: Option<String>,
    pub hidden_regions: BTreeSet<RegionId>,
}

impl AuthStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: None,
            display_name: None,
            hidden_regions: BTreeSet::new(),
        }
    }
}

// Flash message support
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

impl FlashMessage {
    pub fn success(message: &str) -> Self {
        Self {
            level: FlashLevel::Success,
            message: format!("Thành công: {}", message),
        }
    }

    pub fn warning(message: &str) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            level: FlashLevel::Error,
            message: format!("Lỗi: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = UserRecord {
            ho_ten: Some("  Nguyễn Văn B ".to_string()),
            ten_dang_nhap: Some("nvb".to_string()),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "Nguyễn Văn B");

        user.ho_ten = Some("   ".to_string());
        assert_eq!(user.display_name(), "nvb");

        user.ten_dang_nhap = None;
        assert_eq!(user.display_name(), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_raw_role_prefers_role_key() {
        let user: UserRecord =
            serde_json::from_str(r#"{"id": 3, "role": "Admin", "vaiTro": "KeToan"}"#).unwrap();
        assert_eq!(user.raw_role(), Some("Admin"));

        let user: UserRecord =
            serde_json::from_str(r#"{"role": " ", "vaiTro": "KeToan"}"#).unwrap();
        assert_eq!(user.raw_role(), Some("KeToan"));
    }

    #[test]
    fn test_user_record_uses_backend_keys() {
        let user: UserRecord = serde_json::from_str(
            r#"{"id": 7, "tenDangNhap": "bql", "hoTen": "Ban QL", "vaiTro": "BanQuanLy", "matKhau": null}"#,
        )
        .unwrap();
        assert_eq!(user.id, Some(7));
        assert_eq!(user.vai_tro.as_deref(), Some("BanQuanLy"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["tenDangNhap"], "bql");
        assert!(json.get("role").is_none());
    }

    #[test]
    fn test_page_guard_for_standard_page() {
        let guard = PageGuard::for_page(&PageId::from("khoan-thu"));
        assert!(guard.allowed_roles.contains(&CanonicalRole::Accountant));
        assert!(PageGuard::for_page(&PageId::from("unknown")).allowed_roles.is_empty());
    }
}
