//! Bevy wiring for the menu controller.
//!
//! Everything that touches [`MenuController`] runs in one chained `Update`
//! set, so load results, debounced viewport/scroll reports and user intents
//! apply in arrival order and snapshots are published after all of them.
pub mod resize;

use std::path::PathBuf;

use bevy::prelude::*;

use crate::{
    config::MenuConfig,
    controller::{MenuController, MenuIntent, MenuLoadError, MenuSnapshot},
    menu::MenuPayload,
    persistence::{FileStore, MemoryStore, StatePersistence, StateStore},
};

pub use resize::{Debouncer, PageScrolled, ResizeDebounce, ScrollDebounce, ViewportResized};

/// Result of fetching the menu payload, delivered by whoever loads it.
#[derive(Message, Debug, Clone)]
pub struct MenuDataLoaded {
    pub payload: Result<MenuPayload, MenuLoadError>,
    pub current_url: Option<String>,
}

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct MenuSnapshotChanged(pub MenuSnapshot);

#[derive(Resource, Debug, Default)]
struct PublishedSnapshot(Option<MenuSnapshot>);

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum StickyMenuSystems {
    Apply,
    Publish,
}

#[derive(Default)]
pub struct StickyMenuPlugin {
    pub config: MenuConfig,
    /// Directory for the durable tier. In-memory when unset.
    pub storage_dir: Option<PathBuf>,
}

impl StickyMenuPlugin {
    fn persistence(&self) -> StatePersistence {
        let durable: Box<dyn StateStore> = match &self.storage_dir {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        };
        StatePersistence::from_config(&self.config, durable, Box::new(MemoryStore::new()))
    }
}

impl Plugin for StickyMenuPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<MenuController>() {
            app.insert_resource(MenuController::new(self.config.clone(), self.persistence()));
        }

        app.add_message::<MenuIntent>()
            .add_message::<MenuDataLoaded>()
            .add_message::<ViewportResized>()
            .add_message::<PageScrolled>()
            .add_message::<MenuSnapshotChanged>()
            .init_resource::<ResizeDebounce>()
            .init_resource::<ScrollDebounce>()
            .init_resource::<PublishedSnapshot>()
            .configure_sets(
                Update,
                (StickyMenuSystems::Apply, StickyMenuSystems::Publish).chain(),
            )
            .add_systems(Startup, begin_menu_load)
            .add_systems(
                Update,
                (
                    apply_loaded_menu,
                    resize::debounce_viewport_and_scroll,
                    apply_menu_intents,
                )
                    .chain()
                    .in_set(StickyMenuSystems::Apply),
            )
            .add_systems(
                Update,
                publish_menu_snapshot.in_set(StickyMenuSystems::Publish),
            );
    }
}

fn begin_menu_load(mut controller: ResMut<MenuController>) {
    controller.begin_load();
}

fn apply_loaded_menu(
    mut loaded: MessageReader<MenuDataLoaded>,
    mut controller: ResMut<MenuController>,
) {
    for message in loaded.read() {
        controller.finish_load(message.payload.clone(), message.current_url.as_deref());
    }
}

fn apply_menu_intents(
    mut intents: MessageReader<MenuIntent>,
    mut controller: ResMut<MenuController>,
) {
    for intent in intents.read() {
        if let Err(error) = controller.dispatch(intent.clone()) {
            debug!("menu intent {intent:?} not applied: {error}");
        }
    }
}

fn publish_menu_snapshot(
    controller: Res<MenuController>,
    mut published: ResMut<PublishedSnapshot>,
    mut changed: MessageWriter<MenuSnapshotChanged>,
) {
    if !controller.is_changed() {
        return;
    }
    let snapshot = controller.snapshot();
    if published.0.as_ref() == Some(&snapshot) {
        return;
    }
    published.0 = Some(snapshot.clone());
    changed.write(MenuSnapshotChanged(snapshot));
}
