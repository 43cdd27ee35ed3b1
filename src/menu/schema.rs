//! Inbound menu payload and its resolution into a [`MenuHierarchy`].
//!
//! Levels sent by the menu source are never trusted: every item's level is
//! derived by walking its parent links, and items nested deeper than three
//! levels (or caught in a parent cycle) are skipped instead of failing the
//! whole load.
use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    error::Error,
    fmt,
};

use bevy::log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use super::{
    hierarchy::{MenuHierarchy, DEFAULT_MENU_LOCATION},
    item::{MenuItem, MenuItemError, DEFAULT_LINK_TARGET, MAX_MENU_DEPTH, PLACEHOLDER_URL},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub items: Vec<MenuItemPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub css_classes: Vec<String>,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_current_ancestor: bool,
}

fn default_location() -> String {
    String::from(DEFAULT_MENU_LOCATION)
}

fn default_url() -> String {
    String::from(PLACEHOLDER_URL)
}

fn default_target() -> String {
    String::from(DEFAULT_LINK_TARGET)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

// Menu editors send `0` or `""` for top-level items.
fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let parent = Option::<RawId>::deserialize(deserializer)?.map(String::from);
    Ok(parent.filter(|id| !id.is_empty() && id != "0"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSchemaError {
    Parse(String),
    Validation(String),
    Item { id: String, error: MenuItemError },
}

impl fmt::Display for MenuSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "menu payload parse error: {err}"),
            Self::Validation(err) => write!(f, "menu payload validation error: {err}"),
            Self::Item { id, error } => write!(f, "menu item `{id}` skipped: {error}"),
        }
    }
}

impl Error for MenuSchemaError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMenu {
    pub hierarchy: MenuHierarchy,
    /// Explicit current-page marker sent with the data.
    pub current_item_id: Option<String>,
    pub skipped: Vec<MenuSchemaError>,
}

pub fn parse_menu_payload(json: &str) -> Result<MenuPayload, MenuSchemaError> {
    serde_json::from_str(json).map_err(|err| MenuSchemaError::Parse(err.to_string()))
}

pub fn load_and_resolve_menu(json: &str) -> Result<ResolvedMenu, MenuSchemaError> {
    parse_menu_payload(json).map(|payload| resolve_menu_payload(&payload))
}

pub fn resolve_menu_payload(payload: &MenuPayload) -> ResolvedMenu {
    let mut by_id: HashMap<&str, &MenuItemPayload> = HashMap::new();
    for raw in &payload.items {
        by_id.entry(raw.id.as_str()).or_insert(raw);
    }

    let mut skipped = Vec::new();
    let mut items = Vec::new();
    let mut markers = Vec::new();

    for raw in &payload.items {
        match resolve_item(raw, &by_id) {
            Ok(item) => {
                if raw.is_current || raw.is_current_ancestor {
                    markers.push(CurrentMarker {
                        is_current: raw.is_current,
                        depth: item.level().depth(),
                        order: item.order(),
                        id: item.id().to_string(),
                    });
                }
                items.push(item);
            }
            Err(error) => {
                warn!("{error}");
                skipped.push(error);
            }
        }
    }

    let current_item_id = pick_current_marker(markers);
    let mut hierarchy = MenuHierarchy::new(
        payload.id.clone(),
        payload.name.clone(),
        payload.location.clone(),
        items,
    );
    if let Some(current) = &current_item_id {
        hierarchy = hierarchy.set_active_item(current);
    }

    ResolvedMenu {
        hierarchy,
        current_item_id,
        skipped,
    }
}

fn resolve_item(
    raw: &MenuItemPayload,
    by_id: &HashMap<&str, &MenuItemPayload>,
) -> Result<MenuItem, MenuSchemaError> {
    if raw.id.trim().is_empty() {
        return Err(MenuSchemaError::Validation(format!(
            "menu item titled `{}` has an empty id",
            raw.title
        )));
    }

    let to_item_error = |error| MenuSchemaError::Item {
        id: raw.id.clone(),
        error,
    };
    let level = derive_level(raw, by_id).map_err(to_item_error)?;
    let item = MenuItem::new(
        raw.id.clone(),
        raw.title.clone(),
        raw.url.clone(),
        raw.parent_id.clone(),
        level,
    )
    .map_err(to_item_error)?;

    Ok(item
        .with_order(raw.order)
        .with_css_classes(raw.css_classes.clone())
        .with_target(raw.target.clone())
        .with_description(raw.description.clone()))
}

/// One plus the number of parent hops to a root. An unresolvable parent
/// still counts as one hop so structural validation can reject it.
fn derive_level(
    raw: &MenuItemPayload,
    by_id: &HashMap<&str, &MenuItemPayload>,
) -> Result<u8, MenuItemError> {
    let exceeded = || MenuItemError::DepthExceeded { id: raw.id.clone() };
    let mut depth: u8 = 1;
    let mut visited: HashSet<&str> = HashSet::from([raw.id.as_str()]);
    let mut current = raw;

    while let Some(parent_id) = current.parent_id.as_deref() {
        depth += 1;
        if depth > MAX_MENU_DEPTH {
            return Err(exceeded());
        }
        let Some(&parent) = by_id.get(parent_id) else {
            break;
        };
        if !visited.insert(parent.id.as_str()) {
            return Err(exceeded());
        }
        current = parent;
    }

    Ok(depth)
}

struct CurrentMarker {
    is_current: bool,
    depth: u8,
    order: i32,
    id: String,
}

/// `isCurrent` beats `isCurrentAncestor`; deeper beats shallower; lower order breaks ties.
fn pick_current_marker(markers: Vec<CurrentMarker>) -> Option<String> {
    markers
        .into_iter()
        .max_by_key(|marker| (marker.is_current, marker.depth, Reverse(marker.order)))
        .map(|marker| marker.id)
}
