//! Stateless navigation policy over a [`MenuHierarchy`].
//!
//! Every function here is a pure function of its arguments. The only input
//! that drives submenu visibility is the attention target: the hovered item
//! if any, otherwise the click-activated item.
use std::{cmp::Reverse, fmt};

use super::{
    hierarchy::{MenuHierarchy, MenuTrail},
    item::{MenuItem, MenuLevel, MAX_MENU_DEPTH},
    url::{last_path_segment, normalize_url},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleMenuItems<'a> {
    pub main: Vec<&'a MenuItem>,
    pub secondary: Vec<&'a MenuItem>,
    pub tertiary: Vec<&'a MenuItem>,
}

impl<'a> VisibleMenuItems<'a> {
    fn main_only(hierarchy: &'a MenuHierarchy) -> Self {
        Self {
            main: hierarchy.root_items(),
            ..Self::default()
        }
    }

    fn sorted(mut self) -> Self {
        for level in [&mut self.main, &mut self.secondary, &mut self.tertiary] {
            level.sort_by_key(|item| item.order());
        }
        self
    }

    pub fn at_level(&self, level: MenuLevel) -> &[&'a MenuItem] {
        match level {
            MenuLevel::Main => &self.main,
            MenuLevel::Secondary => &self.secondary,
            MenuLevel::Tertiary => &self.tertiary,
        }
    }

    pub fn ids_at_level(&self, level: MenuLevel) -> Vec<String> {
        self.at_level(level)
            .iter()
            .map(|item| item.id().to_string())
            .collect()
    }
}

pub fn attention_target<'a>(
    active_item_id: Option<&'a str>,
    hovered_item_id: Option<&'a str>,
) -> Option<&'a str> {
    hovered_item_id.or(active_item_id)
}

/// Items shown at each level for the current attention target, in display order.
pub fn visible_menu_items<'a>(
    hierarchy: &'a MenuHierarchy,
    active_item_id: Option<&str>,
    hovered_item_id: Option<&str>,
) -> VisibleMenuItems<'a> {
    let Some(target) = attention_target(active_item_id, hovered_item_id)
        .and_then(|target_id| hierarchy.find_item(target_id))
    else {
        return VisibleMenuItems::main_only(hierarchy).sorted();
    };

    let mut visible = VisibleMenuItems::main_only(hierarchy);
    match target.level() {
        MenuLevel::Main => {
            visible.secondary = hierarchy.secondary_items(target.id());
        }
        MenuLevel::Secondary => {
            if let Some(parent_id) = target.parent_id() {
                visible.secondary = hierarchy.secondary_items(parent_id);
            }
            visible.tertiary = hierarchy.tertiary_items(target.id());
        }
        MenuLevel::Tertiary => {
            let parent = target
                .parent_id()
                .and_then(|parent_id| hierarchy.find_item(parent_id));
            if let Some(parent) = parent {
                visible.tertiary = hierarchy.tertiary_items(parent.id());
                if let Some(grandparent_id) = parent.parent_id() {
                    visible.secondary = hierarchy.secondary_items(grandparent_id);
                }
            }
        }
    }

    visible.sorted()
}

pub fn breadcrumb_trail<'a>(hierarchy: &'a MenuHierarchy, item_id: &str) -> MenuTrail<'a> {
    hierarchy.trail_to(item_id)
}

/// Exact or contains matches on normalized paths. Placeholder links never match.
pub fn find_items_by_url<'a>(hierarchy: &'a MenuHierarchy, url: &str) -> Vec<&'a MenuItem> {
    let wanted = normalize_url(url);
    hierarchy
        .items()
        .iter()
        .filter(|item| !item.is_placeholder())
        .filter(|item| {
            let candidate = normalize_url(item.url());
            candidate == wanted || candidate.contains(&wanted)
        })
        .collect()
}

/// Exact path matches win, lowest `order` first. Otherwise the longest raw
/// url among partial matches is taken as the most specific.
pub fn determine_active_item<'a>(
    hierarchy: &'a MenuHierarchy,
    current_url: &str,
) -> Option<&'a MenuItem> {
    let matches = find_items_by_url(hierarchy, current_url);
    let wanted = normalize_url(current_url);

    let exact = matches
        .iter()
        .copied()
        .filter(|item| normalize_url(item.url()) == wanted)
        .min_by_key(|item| item.order());
    if exact.is_some() {
        return exact;
    }

    matches
        .into_iter()
        .min_by_key(|item| (Reverse(item.url().len()), item.order()))
}

pub fn is_in_active_trail(
    hierarchy: &MenuHierarchy,
    item_id: &str,
    active_item_id: Option<&str>,
) -> bool {
    let Some(active_item_id) = active_item_id else {
        return false;
    };
    item_id == active_item_id
        || breadcrumb_trail(hierarchy, active_item_id)
            .iter()
            .any(|item| item.id() == item_id)
}

/// Siblings (other roots for a root item) followed by children, sorted by `order`.
pub fn recommended_items<'a>(
    hierarchy: &'a MenuHierarchy,
    item_id: &str,
    max_items: usize,
) -> Vec<&'a MenuItem> {
    let Some(current) = hierarchy.find_item(item_id) else {
        return Vec::new();
    };

    let mut recommendations: Vec<&MenuItem> = match current.parent_id() {
        Some(parent_id) => hierarchy.children_of(parent_id),
        None => hierarchy.root_items(),
    };
    recommendations.retain(|item| item.id() != current.id());
    recommendations.extend(hierarchy.children_of(current.id()));
    recommendations.sort_by_key(|item| item.order());
    recommendations.truncate(max_items);
    recommendations
}

/// Level-3 child of a level-2 item whose title or final url segment equals `label`.
pub fn auto_activate_child<'a>(
    hierarchy: &'a MenuHierarchy,
    item: &MenuItem,
    label: &str,
) -> Option<&'a MenuItem> {
    if item.level() != MenuLevel::Secondary {
        return None;
    }
    hierarchy
        .tertiary_items(item.id())
        .into_iter()
        .filter(|child| {
            child.title().trim().eq_ignore_ascii_case(label)
                || last_path_segment(child.url())
                    .is_some_and(|segment| segment.eq_ignore_ascii_case(label))
        })
        .min_by_key(|child| child.order())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessibilityIssue {
    EmptyTitle { id: String },
    DeadPlaceholder { id: String, title: String },
    ExcessiveDepth { depth: u8 },
    OrphanedItem { id: String, title: String },
}

impl fmt::Display for AccessibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle { id } => write!(f, "menu item {id} has empty title"),
            Self::DeadPlaceholder { id, title } => write!(
                f,
                "menu item \"{title}\" ({id}) has placeholder URL but no children"
            ),
            Self::ExcessiveDepth { depth } => write!(
                f,
                "menu hierarchy depth {depth} exceeds maximum recommended depth of {MAX_MENU_DEPTH} levels"
            ),
            Self::OrphanedItem { id, title } => write!(
                f,
                "menu item \"{title}\" ({id}) references non-existent parent"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessibilityReport {
    pub issues: Vec<AccessibilityIssue>,
}

impl AccessibilityReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Non-fatal lint. Callers log the issues and keep rendering.
pub fn validate_accessibility(hierarchy: &MenuHierarchy) -> AccessibilityReport {
    let mut issues = Vec::new();

    for item in hierarchy.items() {
        if item.title().trim().is_empty() {
            issues.push(AccessibilityIssue::EmptyTitle {
                id: item.id().to_string(),
            });
        }
        if item.is_placeholder() && !hierarchy.has_children(item.id()) {
            issues.push(AccessibilityIssue::DeadPlaceholder {
                id: item.id().to_string(),
                title: item.title().to_string(),
            });
        }
    }

    let depth = hierarchy.max_depth();
    if depth > MAX_MENU_DEPTH {
        issues.push(AccessibilityIssue::ExcessiveDepth { depth });
    }

    for item in hierarchy.items() {
        let orphaned = item
            .parent_id()
            .is_some_and(|parent_id| hierarchy.find_item(parent_id).is_none());
        if orphaned {
            issues.push(AccessibilityIssue::OrphanedItem {
                id: item.id().to_string(),
                title: item.title().to_string(),
            });
        }
    }

    AccessibilityReport { issues }
}
