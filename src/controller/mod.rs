//! Page-lifecycle orchestrator. Every intent funnels through
//! [`MenuController::dispatch`], which recomputes visibility from the current
//! [`MenuState`] and [`MenuHierarchy`] at apply time.
use std::fmt;

use bevy::{
    log::{debug, error, info, warn},
    prelude::{Message, Resource},
};

use crate::{
    config::MenuConfig,
    menu::{
        navigation::{
            auto_activate_child, determine_active_item, is_in_active_trail, recommended_items,
            validate_accessibility, visible_menu_items,
        },
        schema::resolve_menu_payload,
        MenuHierarchy, MenuItem, MenuLevel, MenuPayload, MenuSchemaError, MenuState,
        StructuralError, VisibleMenuItems, DEFAULT_MENU_LOCATION,
    },
    persistence::StatePersistence,
};

#[cfg(test)]
mod flow_tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MenuLifecycle {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    /// Load or validation failed; the empty shell is still interactive.
    Failed,
}

impl MenuLifecycle {
    /// Whether interactions that need the hierarchy can run.
    pub fn accepts_intents(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuLoadError {
    Fetch(String),
    Schema(MenuSchemaError),
    Structural(Vec<StructuralError>),
}

impl fmt::Display for MenuLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "menu data unavailable: {err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Structural(errors) => {
                write!(f, "menu hierarchy is invalid")?;
                for err in errors {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MenuLoadError {}

impl From<MenuSchemaError> for MenuLoadError {
    fn from(error: MenuSchemaError) -> Self {
        Self::Schema(error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    NotReady(MenuLifecycle),
    UnknownItem(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady(lifecycle) => write!(f, "menu is not ready ({lifecycle:?})"),
            Self::UnknownItem(id) => write!(f, "menu item `{id}` does not exist"),
        }
    }
}

impl std::error::Error for ControllerError {}

#[derive(Message, Debug, Clone, PartialEq)]
pub enum MenuIntent {
    Activate(String),
    Hover(Option<String>),
    ToggleMobile,
    CloseMobile,
    ViewportResized { width: f32 },
    Scrolled { offset: f32 },
    ClickOutside,
    CartCountChanged(u32),
    Navigated { url: String },
}

impl MenuIntent {
    /// Interactions that need a loaded hierarchy. Environment reports
    /// (viewport, scroll, cart, navigation) are recorded in every lifecycle.
    pub fn requires_menu(&self) -> bool {
        matches!(
            self,
            Self::Activate(_) | Self::Hover(_) | Self::ToggleMobile | Self::ClickOutside
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleMenuIds {
    pub main: Vec<String>,
    pub secondary: Vec<String>,
    pub tertiary: Vec<String>,
}

impl From<&VisibleMenuItems<'_>> for VisibleMenuIds {
    fn from(visible: &VisibleMenuItems<'_>) -> Self {
        Self {
            main: visible.ids_at_level(MenuLevel::Main),
            secondary: visible.ids_at_level(MenuLevel::Secondary),
            tertiary: visible.ids_at_level(MenuLevel::Tertiary),
        }
    }
}

/// Everything the presentation layer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuSnapshot {
    pub lifecycle: MenuLifecycle,
    pub state: MenuState,
    pub visible: VisibleMenuIds,
    pub active_trail: Vec<String>,
    pub is_mobile: bool,
    pub cart_count: u32,
}

impl MenuSnapshot {
    pub fn is_in_active_trail(&self, item_id: &str) -> bool {
        self.active_trail.iter().any(|id| id == item_id)
    }
}

#[derive(Resource, Debug)]
pub struct MenuController {
    config: MenuConfig,
    lifecycle: MenuLifecycle,
    hierarchy: MenuHierarchy,
    state: MenuState,
    persistence: StatePersistence,
    is_mobile: bool,
    menus_closed: bool,
    /// Sticky flag reported before the menu finished loading.
    pending_sticky: Option<bool>,
    cart_count: u32,
}

impl Default for MenuController {
    fn default() -> Self {
        let config = MenuConfig::default();
        let persistence = StatePersistence::from_config(
            &config,
            Box::new(crate::persistence::MemoryStore::new()),
            Box::new(crate::persistence::MemoryStore::new()),
        );
        Self::new(config, persistence)
    }
}

impl MenuController {
    pub fn new(config: MenuConfig, persistence: StatePersistence) -> Self {
        Self {
            config,
            lifecycle: MenuLifecycle::Uninitialized,
            hierarchy: MenuHierarchy::empty(DEFAULT_MENU_LOCATION),
            state: MenuState::default(),
            persistence,
            is_mobile: false,
            menus_closed: false,
            pending_sticky: None,
            cart_count: 0,
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> MenuLifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn hierarchy(&self) -> &MenuHierarchy {
        &self.hierarchy
    }

    pub fn persistence(&self) -> &StatePersistence {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut StatePersistence {
        &mut self.persistence
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn cart_count(&self) -> u32 {
        self.cart_count
    }

    pub fn begin_load(&mut self) {
        debug!("menu load started");
        self.lifecycle = MenuLifecycle::Loading;
    }

    /// Installs a loaded payload, or the empty shell when loading failed.
    ///
    /// Sequencing: restore (durable, then session), drop a restored id the
    /// new hierarchy no longer has, let an explicit current marker override,
    /// and only when nothing was restored fall back to url detection.
    pub fn finish_load(
        &mut self,
        payload: Result<MenuPayload, MenuLoadError>,
        current_url: Option<&str>,
    ) -> MenuLifecycle {
        let resolved = payload.map(|payload| resolve_menu_payload(&payload)).and_then(|resolved| {
            let errors = resolved.hierarchy.validate();
            if errors.is_empty() {
                Ok(resolved)
            } else {
                Err(MenuLoadError::Structural(errors))
            }
        });

        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(load_error) => {
                error!("{load_error}; rendering an empty menu shell");
                self.hierarchy = MenuHierarchy::empty(DEFAULT_MENU_LOCATION);
                let state = self.with_pending_sticky(MenuState::default());
                self.state = self.viewport_adjusted(state);
                self.menus_closed = false;
                self.lifecycle = MenuLifecycle::Failed;
                return self.lifecycle;
            }
        };

        for issue in validate_accessibility(&resolved.hierarchy).issues {
            warn!("menu accessibility: {issue}");
        }
        self.hierarchy = resolved.hierarchy;
        self.menus_closed = false;

        self.persistence.cleanup_expired_state();
        let restored = self.restore_state();
        let restored_anything = restored.active_item_id().is_some();
        let restored_sticky = restored.is_sticky();
        self.state = self.with_pending_sticky(restored);

        let detected = resolved.current_item_id.or_else(|| {
            if restored_anything {
                return None;
            }
            current_url
                .and_then(|url| determine_active_item(&self.hierarchy, url))
                .map(|item| item.id().to_string())
        });
        if let Some(item_id) = detected {
            debug!("current page resolves to menu item `{item_id}`");
            self.apply_activation(&item_id);
        } else if let Some(item_id) = self.state.active_item_id().map(str::to_string) {
            self.apply_activation(&item_id);
        }

        self.state = self.viewport_adjusted(self.state.clone());
        self.lifecycle = MenuLifecycle::Ready;
        if self.state.is_sticky() != restored_sticky {
            self.persist();
        }
        info!(
            "menu `{}` ready with {} items",
            self.hierarchy.name(),
            self.hierarchy.items().len()
        );
        self.lifecycle
    }

    /// Single entry point for every user and environment intent.
    pub fn dispatch(&mut self, intent: MenuIntent) -> Result<(), ControllerError> {
        if intent.requires_menu() && !self.lifecycle.accepts_intents() {
            warn!("dropping {intent:?}: menu is {:?}", self.lifecycle);
            return Err(ControllerError::NotReady(self.lifecycle));
        }

        match intent {
            MenuIntent::Activate(item_id) => self.activate(&item_id),
            MenuIntent::Hover(item_id) => self.hover(item_id.as_deref()),
            MenuIntent::ToggleMobile => {
                self.state = self.state.with_mobile_menu_toggled();
                Ok(())
            }
            MenuIntent::CloseMobile => {
                self.state = self.state.with_mobile_menu_closed();
                Ok(())
            }
            MenuIntent::ViewportResized { width } => {
                self.set_viewport_width(width);
                Ok(())
            }
            MenuIntent::Scrolled { offset } => {
                self.set_scroll_offset(offset);
                Ok(())
            }
            MenuIntent::ClickOutside => {
                self.click_outside();
                Ok(())
            }
            MenuIntent::CartCountChanged(count) => {
                self.cart_count = count;
                Ok(())
            }
            MenuIntent::Navigated { url } => {
                self.navigated(&url);
                Ok(())
            }
        }
    }

    fn activate(&mut self, item_id: &str) -> Result<(), ControllerError> {
        let Some(item) = self.hierarchy.find_item(item_id) else {
            warn!("cannot activate unknown menu item `{item_id}`");
            return Err(ControllerError::UnknownItem(item_id.to_string()));
        };
        let target = self
            .config
            .auto_activate_label
            .as_deref()
            .and_then(|label| auto_activate_child(&self.hierarchy, item, label))
            .unwrap_or(item)
            .id()
            .to_string();

        self.apply_activation(&target);
        self.persist();
        Ok(())
    }

    fn hover(&mut self, item_id: Option<&str>) -> Result<(), ControllerError> {
        if let Some(item_id) = item_id {
            if self.hierarchy.find_item(item_id).is_none() {
                return Err(ControllerError::UnknownItem(item_id.to_string()));
            }
        }
        // Touch layouts have no hover; the drawer only follows activation.
        if self.is_mobile {
            return Ok(());
        }
        if item_id.is_some() {
            self.menus_closed = false;
        }
        self.state = self.state.with_hovered_item(item_id);
        self.refresh_visibility();
        Ok(())
    }

    fn set_viewport_width(&mut self, width: f32) {
        let is_mobile = self.config.is_mobile_width(width);
        if is_mobile == self.is_mobile {
            return;
        }
        self.is_mobile = is_mobile;
        debug!(
            "viewport {width}px switched to {} layout",
            if is_mobile { "mobile" } else { "desktop" }
        );

        if is_mobile {
            self.state = self.viewport_adjusted(self.state.clone());
        } else {
            self.state = self.state.with_mobile_menu_closed();
            self.refresh_visibility();
        }
    }

    fn set_scroll_offset(&mut self, offset: f32) {
        let is_sticky = self.config.is_sticky_offset(offset);
        if !self.lifecycle.accepts_intents() {
            // Persisting now would overwrite the record the load restores.
            self.pending_sticky = Some(is_sticky);
            self.state = self.state.with_sticky_state(is_sticky);
            return;
        }
        if is_sticky == self.state.is_sticky() {
            return;
        }
        self.state = self.state.with_sticky_state(is_sticky);
        self.persist();
    }

    fn with_pending_sticky(&mut self, state: MenuState) -> MenuState {
        match self.pending_sticky.take() {
            Some(is_sticky) => state.with_sticky_state(is_sticky),
            None => state,
        }
    }

    fn click_outside(&mut self) {
        if self.is_mobile {
            self.state = self.state.with_mobile_menu_closed();
            return;
        }
        self.state = self.state.with_all_menus_hidden();
        self.menus_closed = true;
    }

    fn navigated(&mut self, url: &str) {
        let detected =
            determine_active_item(&self.hierarchy, url).map(|item| item.id().to_string());
        match detected {
            Some(item_id) => {
                self.apply_activation(&item_id);
                self.state = self.viewport_adjusted(self.state.clone());
            }
            None => debug!("no menu item matches `{url}`"),
        }
    }

    fn restore_state(&mut self) -> MenuState {
        let Some((restored, tier)) = self.persistence.restore() else {
            return MenuState::default();
        };
        match restored.active_item_id() {
            Some(item_id) if self.hierarchy.find_item(item_id).is_none() => {
                info!("restored menu item `{item_id}` no longer exists; using default state");
                MenuState::default()
            }
            _ => {
                debug!("restored menu state from {tier} storage");
                restored
            }
        }
    }

    /// Activation without persistence. Used for clicks and page detection.
    fn apply_activation(&mut self, item_id: &str) {
        let Some(level) = self.hierarchy.find_item(item_id).map(MenuItem::level) else {
            return;
        };
        self.menus_closed = false;
        self.state = self.state.with_active_item(item_id, level);
        self.refresh_visibility();
        self.hierarchy = self.hierarchy.set_active_item(item_id);
    }

    fn refresh_visibility(&mut self) {
        if self.menus_closed {
            return;
        }
        let visible = self.reachable_items();
        let secondary = !visible.secondary.is_empty();
        let tertiary = !visible.tertiary.is_empty();
        self.state = self.state.with_submenu_availability(secondary, tertiary);
    }

    /// Mobile hides the desktop submenus and hover but keeps the active item.
    fn viewport_adjusted(&self, state: MenuState) -> MenuState {
        if !self.is_mobile {
            return state;
        }
        state
            .with_hovered_item(None)
            .with_menu_level(MenuLevel::Secondary, false)
            .with_menu_level(MenuLevel::Tertiary, false)
    }

    fn persist(&mut self) {
        if let Err(error) = self.persistence.save_state(&self.state) {
            warn!("menu state kept in memory only: {error}");
        }
    }

    /// What the attention target could open, regardless of visibility flags.
    fn reachable_items(&self) -> VisibleMenuItems<'_> {
        visible_menu_items(
            &self.hierarchy,
            self.state.active_item_id(),
            self.state.hovered_item_id(),
        )
    }

    /// Items on screen: levels whose flag is off are empty.
    pub fn visible_items(&self) -> VisibleMenuItems<'_> {
        let mut visible = self.reachable_items();
        if !self.state.is_secondary_menu_visible() {
            visible.secondary.clear();
        }
        if !self.state.is_tertiary_menu_visible() {
            visible.tertiary.clear();
        }
        visible
    }

    pub fn is_in_active_trail(&self, item_id: &str) -> bool {
        is_in_active_trail(&self.hierarchy, item_id, self.state.active_item_id())
    }

    pub fn recommended_items(&self, item_id: &str, max_items: usize) -> Vec<&MenuItem> {
        recommended_items(&self.hierarchy, item_id, max_items)
    }

    pub fn active_trail(&self) -> Vec<String> {
        self.state
            .active_item_id()
            .map(|item_id| {
                self.hierarchy
                    .trail_to(item_id)
                    .iter()
                    .map(|item| item.id().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> MenuSnapshot {
        MenuSnapshot {
            lifecycle: self.lifecycle,
            state: self.state.clone(),
            visible: VisibleMenuIds::from(&self.visible_items()),
            active_trail: self.active_trail(),
            is_mobile: self.is_mobile,
            cart_count: self.cart_count,
        }
    }
}
