// bluemoon-rbac/src/menu.rs

use serde::Serialize;
use std::collections::BTreeSet;
use crate::utils::rbac::RegionId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub title: String,
    pub path: String,
    pub children: Option<Vec<MenuItem>>,
    pub icon: Option<String>,
    pub order: Option<usize>,
    /// Region this entry belongs to; entries without one are always shown.
    pub region: Option<RegionId>,
}

impl MenuItem {
    /// Non-clickable parent entry.
    fn is_group(&self) -> bool {
        self.path.is_empty()
    }
}

/// Drop every entry whose region is hidden, and any group left empty.
pub fn visible_menus(menus: &[MenuItem], hidden: &BTreeSet<RegionId>) -> Vec<MenuItem> {
    menus
        .iter()
        .filter(|item| item.region.map_or(true, |r| !hidden.contains(&r)))
        .filter_map(|item| {
            let mut item = item.clone();
            if let Some(children) = item.children.take() {
                let kept = visible_menus(&children, hidden);
                if kept.is_empty() && item.is_group() {
                    return None;
                }
                item.children = Some(kept);
            }
            Some(item)
        })
        .collect()
}

/// Regions still rendered after hiding, for the region-level template checks.
pub fn visible_regions(hidden: &BTreeSet<RegionId>) -> Vec<RegionId> {
    RegionId::ALL
        .iter()
        .copied()
        .filter(|r| !hidden.contains(r))
        .collect()
}
