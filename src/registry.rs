// bluemoon-rbac/src/registry.rs
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use lazy_static::lazy_static;
use crate::menu::MenuItem;
use crate::utils::rbac::{is_page_allowed, standard_allow_list, AllowList, PageId, RegionId};
use crate::utils::role::CanonicalRole;
use crate::utils::structs::PageGuard;

/// A guarded page of the front end.
#[derive(Debug, Clone, Serialize)]
pub struct PageSpec {
    pub id: PageId,
    pub title: String,
    pub path: String,
    pub icon: Option<String>,
    pub group: Option<String>,
    pub order: Option<usize>,
    pub region: Option<RegionId>,
    pub allowed_roles: AllowList,
}

impl PageSpec {
    /// Page mounted at `/<id>`, with the built-in allow-list for its id
    /// (admin-only when there is none).
    pub fn new(id: &str, title: &str) -> Self {
        let page_id = PageId::from(id);
        let allowed_roles = standard_allow_list(&page_id).unwrap_or_default();
        Self {
            id: page_id,
            title: title.to_string(),
            path: format!("/{}", id),
            icon: None,
            group: None,
            order: None,
            region: None,
            allowed_roles,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_region(mut self, region: RegionId) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_allowed_roles(mut self, allowed_roles: AllowList) -> Self {
        self.allowed_roles = allowed_roles;
        self
    }

    pub fn guard(&self) -> PageGuard {
        PageGuard::from_allow_list(self.allowed_roles.clone())
    }

    pub fn menu_item(&self) -> MenuItem {
        MenuItem {
            title: self.title.clone(),
            path: self.path.clone(),
            children: None,
            icon: self.icon.clone(),
            order: self.order,
            region: self.region,
        }
    }
}

lazy_static! {
    static ref PAGE_REGISTRY: RwLock<Vec<PageSpec>> = RwLock::new(vec![]);
}

fn read_registry() -> RwLockReadGuard<'static, Vec<PageSpec>> {
    PAGE_REGISTRY.read().unwrap_or_else(|e| e.into_inner())
}

fn write_registry() -> RwLockWriteGuard<'static, Vec<PageSpec>> {
    PAGE_REGISTRY.write().unwrap_or_else(|e| e.into_inner())
}

/// Register a page globally, replacing any page with the same id
pub fn register_page(page: PageSpec) {
    let mut pages = write_registry();
    pages.retain(|p| p.id != page.id);
    pages.push(page);
}

pub fn all_pages() -> Vec<PageSpec> {
    read_registry().clone()
}

pub fn find_page(id: &PageId) -> Option<PageSpec> {
    read_registry().iter().find(|p| &p.id == id).cloned()
}

/// Menu tree of the registered pages, grouped by `group`. Hiding per role is
/// applied afterwards with `menu::visible_menus`.
pub fn get_registered_menus() -> Vec<MenuItem> {
    build_menus(read_registry().iter())
}

/// Menu tree of the registered pages whose guard admits `role`.
pub fn get_menus_for_role(role: &CanonicalRole) -> Vec<MenuItem> {
    build_menus(
        read_registry()
            .iter()
            .filter(|page| is_page_allowed(role, &page.id, &page.allowed_roles)),
    )
}

fn build_menus<'a>(pages: impl Iterator<Item = &'a PageSpec>) -> Vec<MenuItem> {
    let mut grouped_menus: HashMap<String, Vec<MenuItem>> = HashMap::new();
    let mut ungrouped_menus: Vec<MenuItem> = Vec::new();

    for page in pages {
        match &page.group {
            Some(group_name) => grouped_menus
                .entry(group_name.clone())
                .or_default()
                .push(page.menu_item()),
            None => ungrouped_menus.push(page.menu_item()),
        }
    }

    let mut final_menus = Vec::new();

    for (group_name, mut children) in grouped_menus {
        children.sort_by(by_order_then_title);
        let order = children.iter().filter_map(|c| c.order).min();

        final_menus.push(MenuItem {
            title: group_name,
            path: String::new(), // Non-clickable parent
            icon: Some("folder".to_string()),
            order,
            region: None,
            children: Some(children),
        });
    }

    final_menus.extend(ungrouped_menus);
    final_menus.sort_by(by_order_then_title);
    final_menus
}

fn by_order_then_title(a: &MenuItem, b: &MenuItem) -> std::cmp::Ordering {
    match (a.order, b.order) {
        (Some(a_order), Some(b_order)) => a_order.cmp(&b_order).then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

/// The BlueMoon pages and the menu regions they live in.
pub fn default_pages() -> Vec<PageSpec> {
    vec![
        PageSpec::new("can-ho", "Hộ gia đình").with_group("Dân cư").with_region(RegionId::RoomMenu).with_icon("home").with_order(10),
        PageSpec::new("danh-sach-dan-cu", "Cư dân").with_group("Dân cư").with_region(RegionId::ResidentMenu).with_icon("users").with_order(11),
        PageSpec::new("phuong-tien", "Phương tiện").with_group("Dân cư").with_region(RegionId::VehicleMenu).with_icon("car").with_order(12),
        PageSpec::new("khoan-thu", "Khoản thu").with_group("Thu phí").with_region(RegionId::FeeMenu).with_icon("money-bill").with_order(20),
        PageSpec::new("dot-thu", "Đợt thu").with_group("Thu phí").with_region(RegionId::CollectionPeriodMenu).with_icon("calendar").with_order(21),
        PageSpec::new("phieu-thu", "Phiếu thu").with_group("Thu phí").with_region(RegionId::ReceiptMenu).with_icon("receipt").with_order(22),
        PageSpec::new("bao-cao", "Báo cáo").with_group("Báo cáo").with_region(RegionId::ReportMenu).with_icon("file").with_order(30),
        PageSpec::new("bao-cao-thu", "Báo cáo thu").with_group("Báo cáo").with_region(RegionId::ReportMenu).with_icon("file").with_order(31),
        PageSpec::new("bao-cao-cong-no", "Báo cáo công nợ").with_group("Báo cáo").with_region(RegionId::ReportMenu).with_icon("file").with_order(32),
        PageSpec::new("thong-ke", "Thống kê").with_icon("chart-bar").with_order(40),
        // Admin only; other roles lose the entry through `get_menus_for_role`.
        PageSpec::new("tai-khoan", "Tài khoản").with_icon("user-cog").with_order(50),
    ]
}

pub fn register_default_pages() {
    for page in default_pages() {
        register_page(page);
    }
}

/// Clear all registered pages (useful for testing)
pub fn clear_registry() {
    write_registry().clear();
}

pub fn page_count() -> usize {
    read_registry().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The registry is process-wide; tests only touch it through default pages,
    // which are idempotent to register.

    #[test]
    fn test_default_pages_use_standard_allow_lists() {
        let pages = default_pages();
        let can_ho = pages.iter().find(|p| p.id.as_str() == "can-ho").unwrap();
        assert!(can_ho.allowed_roles.contains(&CanonicalRole::Management));
        let accounts = pages.iter().find(|p| p.id.as_str() == "tai-khoan").unwrap();
        assert!(accounts.allowed_roles.is_empty());
        assert_eq!(accounts.path, "/tai-khoan");
    }

    #[test]
    fn test_register_replaces_same_id() {
        register_default_pages();
        let before = page_count();
        register_page(PageSpec::new("thong-ke", "Thống kê").with_order(40).with_icon("chart-bar"));
        assert_eq!(page_count(), before);
        assert!(find_page(&PageId::from("thong-ke")).is_some());
    }

    #[test]
    fn test_menus_grouped_and_ordered() {
        register_default_pages();
        let menus = get_registered_menus();
        let titles: Vec<_> = menus.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Dân cư", "Thu phí", "Báo cáo", "Thống kê", "Tài khoản"]);

        let fees = &menus[1];
        assert!(fees.path.is_empty());
        let children = fees.children.as_ref().unwrap();
        assert_eq!(children[0].region, Some(RegionId::FeeMenu));
    }

    #[test]
    fn test_menus_for_role_skip_denied_pages() {
        register_default_pages();
        let titles = |role: CanonicalRole| -> Vec<String> {
            get_menus_for_role(&role).into_iter().map(|m| m.title).collect()
        };

        assert!(titles(CanonicalRole::Admin).contains(&"Tài khoản".to_string()));
        for role in [CanonicalRole::Management, CanonicalRole::Accountant] {
            let menus = titles(role);
            assert!(!menus.contains(&"Tài khoản".to_string()));
            assert!(menus.contains(&"Thống kê".to_string()));
        }
        assert!(!titles(CanonicalRole::Accountant).contains(&"Dân cư".to_string()));
    }
}
