//! Three-level sticky navigation menu: a validated menu hierarchy, pure
//! navigation policy and state transitions, persisted active-item state and
//! a single-entry controller driven through Bevy messages.
pub mod config;
pub mod controller;
pub mod menu;
pub mod persistence;
pub mod systems;

pub use config::MenuConfig;
pub use controller::{
    ControllerError, MenuController, MenuIntent, MenuLifecycle, MenuLoadError, MenuSnapshot,
    VisibleMenuIds,
};
pub use systems::{MenuDataLoaded, MenuSnapshotChanged, StickyMenuPlugin};
