//! Menu domain: items, the validated three level hierarchy, the navigation
//! policy and the immutable UI state.
pub mod hierarchy;
pub mod item;
pub mod navigation;
pub mod schema;
pub mod state;
pub mod url;

pub use hierarchy::{MenuHierarchy, MenuTrail, StructuralError, DEFAULT_MENU_LOCATION};
pub use item::{MenuItem, MenuItemError, MenuLevel, MAX_MENU_DEPTH};
pub use navigation::{AccessibilityIssue, AccessibilityReport, VisibleMenuItems};
pub use schema::{MenuItemPayload, MenuPayload, MenuSchemaError, ResolvedMenu};
pub use state::{MenuState, SerializableMenuState};
