use std::collections::HashSet;

use smallvec::SmallVec;

use super::item::{MenuItem, MenuLevel, MAX_MENU_DEPTH};

pub const DEFAULT_MENU_LOCATION: &str = "primary";

/// Root-first path of items. Never longer than the depth bound plus one.
pub type MenuTrail<'a> = SmallVec<[&'a MenuItem; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    DuplicateItemId { id: String },
    DanglingParent { id: String, parent_id: String },
    LevelMismatch {
        id: String,
        level: MenuLevel,
        parent_id: String,
        parent_level: MenuLevel,
    },
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateItemId { id } => write!(f, "menu item id `{id}` is not unique"),
            Self::DanglingParent { id, parent_id } => write!(
                f,
                "menu item `{id}` references non-existent parent `{parent_id}`"
            ),
            Self::LevelMismatch {
                id,
                level,
                parent_id,
                parent_level,
            } => write!(
                f,
                "menu item `{id}` is at level {} but its parent `{parent_id}` is at level {}",
                level.depth(),
                parent_level.depth()
            ),
        }
    }
}

impl std::error::Error for StructuralError {}

/// Flat item list for one menu location. Load order is kept; `order` governs display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuHierarchy {
    id: String,
    name: String,
    location: String,
    items: Vec<MenuItem>,
}

impl MenuHierarchy {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
        items: Vec<MenuItem>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            items,
        }
    }

    pub fn empty(location: impl Into<String>) -> Self {
        Self::new("", "", location, Vec::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Level-1 items in load order. Callers sort by `order`.
    pub fn root_items(&self) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|item| item.is_root() && item.level() == MenuLevel::Main)
            .collect()
    }

    pub fn find_item(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn secondary_items(&self, parent_id: &str) -> Vec<&MenuItem> {
        self.children_at_level(parent_id, MenuLevel::Secondary)
    }

    pub fn tertiary_items(&self, parent_id: &str) -> Vec<&MenuItem> {
        self.children_at_level(parent_id, MenuLevel::Tertiary)
    }

    fn children_at_level(&self, parent_id: &str, level: MenuLevel) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|item| item.parent_id() == Some(parent_id) && item.level() == level)
            .collect()
    }

    /// Direct children regardless of level.
    pub fn children_of(&self, parent_id: &str) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|item| item.parent_id() == Some(parent_id))
            .collect()
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.parent_id() == Some(id))
    }

    pub fn items_by_level(&self, level: MenuLevel) -> Vec<&MenuItem> {
        self.items.iter().filter(|item| item.level() == level).collect()
    }

    pub fn active_item(&self) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.is_active())
    }

    pub fn active_trail(&self) -> MenuTrail<'_> {
        match self.active_item() {
            Some(active) => self.trail_from(active),
            None => MenuTrail::new(),
        }
    }

    /// Empty when `id` is unknown.
    pub fn trail_to(&self, id: &str) -> MenuTrail<'_> {
        match self.find_item(id) {
            Some(item) => self.trail_from(item),
            None => MenuTrail::new(),
        }
    }

    fn trail_from<'a>(&'a self, item: &'a MenuItem) -> MenuTrail<'a> {
        let mut trail = MenuTrail::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = item;
        trail.push(current);
        visited.insert(current.id());

        // Bounded walk: a corrupted parent chain can loop.
        while trail.len() <= usize::from(MAX_MENU_DEPTH) {
            let Some(parent) = current.parent_id().and_then(|parent_id| self.find_item(parent_id))
            else {
                break;
            };
            if !visited.insert(parent.id()) {
                break;
            }
            trail.push(parent);
            current = parent;
        }

        trail.reverse();
        trail
    }

    /// Level-1 items with `children` filled recursively, sorted by `order` at every level.
    pub fn build_tree(&self) -> Vec<MenuItem> {
        let mut roots: Vec<MenuItem> = self
            .items
            .iter()
            .filter(|item| item.is_root())
            .map(|item| self.build_subtree(item, 1))
            .collect();
        roots.sort_by_key(MenuItem::order);
        roots
    }

    fn build_subtree(&self, item: &MenuItem, depth: u8) -> MenuItem {
        let mut children: Vec<MenuItem> = if depth < MAX_MENU_DEPTH {
            self.children_of(item.id())
                .into_iter()
                .map(|child| self.build_subtree(child, depth + 1))
                .collect()
        } else {
            Vec::new()
        };
        children.sort_by_key(MenuItem::order);
        item.clone().with_children(children)
    }

    pub fn set_active_item(&self, id: &str) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|item| item.with_active_state(item.id() == id))
                .collect(),
            ..self.clone()
        }
    }

    pub fn max_depth(&self) -> u8 {
        self.items
            .iter()
            .map(|item| item.level().depth())
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Vec<StructuralError> {
        validate_hierarchy(self)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

pub fn validate_hierarchy(hierarchy: &MenuHierarchy) -> Vec<StructuralError> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for item in hierarchy.items() {
        if !seen_ids.insert(item.id()) {
            errors.push(StructuralError::DuplicateItemId {
                id: item.id().to_string(),
            });
        }

        let Some(parent_id) = item.parent_id() else {
            continue;
        };
        match hierarchy.find_item(parent_id) {
            None => errors.push(StructuralError::DanglingParent {
                id: item.id().to_string(),
                parent_id: parent_id.to_string(),
            }),
            Some(parent) if parent.level().child() != Some(item.level()) => {
                errors.push(StructuralError::LevelMismatch {
                    id: item.id().to_string(),
                    level: item.level(),
                    parent_id: parent_id.to_string(),
                    parent_level: parent.level(),
                });
            }
            Some(_) => {}
        }
    }

    errors
}
