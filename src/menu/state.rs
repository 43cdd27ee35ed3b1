use enum_map::{enum_map, EnumMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::MenuLevel;

/// Subset of [`MenuState`] that survives a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableMenuState {
    pub active_item_id: Option<String>,
    pub active_level: u8,
    pub is_sticky: bool,
}

/// Immutable UI state snapshot. Every transition returns a new value.
///
/// The cascading transitions ([`MenuState::with_active_item`],
/// [`MenuState::with_submenu_availability`], [`MenuState::with_all_menus_hidden`])
/// keep `tertiary visible => secondary visible` and
/// `active level >= 2 => secondary visible`. [`MenuState::with_menu_level`] is the
/// targeted per-level override and touches one flag only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    active_item_id: Option<String>,
    hovered_item_id: Option<String>,
    visibility: EnumMap<MenuLevel, bool>,
    is_mobile_menu_open: bool,
    is_sticky: bool,
    active_level: MenuLevel,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            active_item_id: None,
            hovered_item_id: None,
            visibility: enum_map! {
                MenuLevel::Main => true,
                MenuLevel::Secondary => false,
                MenuLevel::Tertiary => false,
            },
            is_mobile_menu_open: false,
            is_sticky: false,
            active_level: MenuLevel::Main,
        }
    }
}

impl MenuState {
    pub fn active_item_id(&self) -> Option<&str> {
        self.active_item_id.as_deref()
    }

    pub fn hovered_item_id(&self) -> Option<&str> {
        self.hovered_item_id.as_deref()
    }

    pub fn is_level_visible(&self, level: MenuLevel) -> bool {
        self.visibility[level]
    }

    pub fn is_main_menu_visible(&self) -> bool {
        self.visibility[MenuLevel::Main]
    }

    pub fn is_secondary_menu_visible(&self) -> bool {
        self.visibility[MenuLevel::Secondary]
    }

    pub fn is_tertiary_menu_visible(&self) -> bool {
        self.visibility[MenuLevel::Tertiary]
    }

    pub fn is_mobile_menu_open(&self) -> bool {
        self.is_mobile_menu_open
    }

    pub fn is_sticky(&self) -> bool {
        self.is_sticky
    }

    pub fn active_level(&self) -> MenuLevel {
        self.active_level
    }

    pub fn has_visible_menus(&self) -> bool {
        self.visibility.values().any(|visible| *visible)
    }

    pub fn is_hover_mode(&self) -> bool {
        self.hovered_item_id.is_some()
    }

    /// Hover is preserved: activating by click does not cancel a hover elsewhere.
    pub fn with_active_item(&self, item_id: &str, level: MenuLevel) -> Self {
        Self {
            active_item_id: Some(item_id.to_string()),
            visibility: Self::cascade(level, false, false),
            active_level: level,
            ..self.clone()
        }
    }

    /// Records what is hovered. Derived visibility is the caller's concern.
    pub fn with_hovered_item(&self, item_id: Option<&str>) -> Self {
        Self {
            hovered_item_id: item_id.map(str::to_string),
            ..self.clone()
        }
    }

    /// Re-derives submenu flags from what the navigation policy can show,
    /// never dropping below what the active level requires.
    pub fn with_submenu_availability(&self, secondary: bool, tertiary: bool) -> Self {
        Self {
            visibility: Self::cascade(self.active_level, secondary, tertiary),
            ..self.clone()
        }
    }

    fn cascade(level: MenuLevel, secondary: bool, tertiary: bool) -> EnumMap<MenuLevel, bool> {
        let tertiary = tertiary || level == MenuLevel::Tertiary;
        let secondary = secondary || tertiary || level >= MenuLevel::Secondary;
        enum_map! {
            MenuLevel::Main => true,
            MenuLevel::Secondary => secondary,
            MenuLevel::Tertiary => tertiary,
        }
    }

    pub fn with_mobile_menu_toggled(&self) -> Self {
        Self {
            is_mobile_menu_open: !self.is_mobile_menu_open,
            ..self.clone()
        }
    }

    pub fn with_mobile_menu_closed(&self) -> Self {
        Self {
            is_mobile_menu_open: false,
            ..self.clone()
        }
    }

    pub fn with_sticky_state(&self, is_sticky: bool) -> Self {
        Self {
            is_sticky,
            ..self.clone()
        }
    }

    /// Closed state: only the main level shows. The active id is kept so a
    /// closed menu is distinguishable from one that was never activated.
    pub fn with_all_menus_hidden(&self) -> Self {
        Self {
            hovered_item_id: None,
            visibility: Self::cascade(MenuLevel::Main, false, false),
            is_mobile_menu_open: false,
            active_level: MenuLevel::Main,
            ..self.clone()
        }
    }

    /// Changes exactly one level's flag. Hiding level 2 leaves level 3 as is.
    pub fn with_menu_level(&self, level: MenuLevel, visible: bool) -> Self {
        let mut visibility = self.visibility;
        visibility[level] = visible;
        Self {
            visibility,
            ..self.clone()
        }
    }

    pub fn to_serializable(&self) -> SerializableMenuState {
        SerializableMenuState {
            active_item_id: self.active_item_id.clone(),
            active_level: self.active_level.depth(),
            is_sticky: self.is_sticky,
        }
    }

    /// Lenient restore from arbitrary JSON. Missing or malformed fields fall
    /// back to no active item, level 1 and not sticky.
    pub fn from_serializable(data: &Value) -> Self {
        let active_item_id = data
            .get("activeItemId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let active_level = data
            .get("activeLevel")
            .and_then(Value::as_u64)
            .and_then(|level| u8::try_from(level).ok())
            .and_then(MenuLevel::from_depth)
            .unwrap_or_default();
        let is_sticky = data
            .get("isSticky")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self::restored(active_item_id, active_level, is_sticky)
    }

    fn restored(active_item_id: Option<String>, active_level: MenuLevel, is_sticky: bool) -> Self {
        Self {
            active_item_id,
            hovered_item_id: None,
            visibility: Self::cascade(active_level, false, false),
            is_mobile_menu_open: false,
            is_sticky,
            active_level,
        }
    }
}

impl From<SerializableMenuState> for MenuState {
    fn from(data: SerializableMenuState) -> Self {
        let active_level = MenuLevel::from_depth(data.active_level).unwrap_or_default();
        let active_item_id = data.active_item_id.filter(|id| !id.is_empty());
        Self::restored(active_item_id, active_level, data.is_sticky)
    }
}
