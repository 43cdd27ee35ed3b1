use enum_map::Enum;

pub const MAX_MENU_DEPTH: u8 = 3;
pub const PLACEHOLDER_URL: &str = "#";
pub const DEFAULT_LINK_TARGET: &str = "_self";

/// Depth of an item in the three tier menu.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MenuLevel {
    #[default]
    Main,
    Secondary,
    Tertiary,
}

impl MenuLevel {
    pub const ALL: [MenuLevel; 3] = [Self::Main, Self::Secondary, Self::Tertiary];

    pub const fn depth(self) -> u8 {
        match self {
            Self::Main => 1,
            Self::Secondary => 2,
            Self::Tertiary => 3,
        }
    }

    pub const fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            1 => Some(Self::Main),
            2 => Some(Self::Secondary),
            3 => Some(Self::Tertiary),
            _ => None,
        }
    }

    pub const fn child(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    pub const fn parent(self) -> Option<Self> {
        Self::from_depth(self.depth().saturating_sub(1))
    }
}

impl TryFrom<u8> for MenuLevel {
    type Error = MenuItemError;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        Self::from_depth(depth).ok_or(MenuItemError::LevelOutOfRange { level: depth })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItemError {
    LevelOutOfRange { level: u8 },
    DepthExceeded { id: String },
    ChildNotAllowed { parent_id: String, level: MenuLevel },
    ChildLevelMismatch { parent_id: String, child_id: String },
}

impl std::fmt::Display for MenuItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LevelOutOfRange { level } => write!(
                f,
                "menu item level must be between 1 and {MAX_MENU_DEPTH}, got {level}"
            ),
            Self::DepthExceeded { id } => write!(
                f,
                "menu item `{id}` is nested deeper than {MAX_MENU_DEPTH} levels or has a cyclic parent chain"
            ),
            Self::ChildNotAllowed { parent_id, level } => write!(
                f,
                "menu item `{parent_id}` at level {} cannot have children",
                level.depth()
            ),
            Self::ChildLevelMismatch {
                parent_id,
                child_id,
            } => write!(
                f,
                "menu item `{child_id}` is not one level below its parent `{parent_id}`"
            ),
        }
    }
}

impl std::error::Error for MenuItemError {}

/// Immutable menu node. State changes produce new instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    id: String,
    title: String,
    url: String,
    parent_id: Option<String>,
    level: MenuLevel,
    order: i32,
    css_classes: Vec<String>,
    target: String,
    description: String,
    is_active: bool,
    children: Vec<MenuItem>,
}

impl MenuItem {
    /// Fails when `level` is outside `1..=3`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        parent_id: Option<String>,
        level: u8,
    ) -> Result<Self, MenuItemError> {
        Ok(Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            parent_id,
            level: MenuLevel::try_from(level)?,
            order: 0,
            css_classes: Vec::new(),
            target: String::from(DEFAULT_LINK_TARGET),
            description: String::new(),
            is_active: false,
            children: Vec::new(),
        })
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_css_classes(mut self, css_classes: Vec<String>) -> Self {
        self.css_classes = css_classes;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub(crate) fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn level(&self) -> MenuLevel {
        self.level
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn css_classes(&self) -> &[String] {
        &self.css_classes
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn children(&self) -> &[MenuItem] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_placeholder(&self) -> bool {
        self.url == PLACEHOLDER_URL
    }

    pub fn can_have_children(&self) -> bool {
        self.level.child().is_some()
    }

    pub fn find_child(&self, id: &str) -> Option<&MenuItem> {
        self.children.iter().find(|child| child.id == id)
    }

    /// Depth-first, parents before their children.
    pub fn descendants(&self) -> Vec<&MenuItem> {
        let mut descendants = Vec::new();
        for child in &self.children {
            descendants.push(child);
            descendants.extend(child.descendants());
        }
        descendants
    }

    /// Children are always deactivated; only one path can be active.
    pub fn with_active_state(&self, is_active: bool) -> Self {
        Self {
            is_active,
            children: self
                .children
                .iter()
                .map(|child| child.with_active_state(false))
                .collect(),
            ..self.clone()
        }
    }

    pub fn add_child(&self, child: MenuItem) -> Result<Self, MenuItemError> {
        let Some(expected_level) = self.level.child() else {
            return Err(MenuItemError::ChildNotAllowed {
                parent_id: self.id.clone(),
                level: self.level,
            });
        };
        if child.level != expected_level {
            return Err(MenuItemError::ChildLevelMismatch {
                parent_id: self.id.clone(),
                child_id: child.id,
            });
        }

        let mut children = self.children.clone();
        children.push(child);
        children.sort_by_key(MenuItem::order);
        Ok(self.clone().with_children(children))
    }
}
