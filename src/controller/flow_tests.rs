use serde_json::{json, Value};

use super::*;
use crate::{
    config::DEFAULT_DURABLE_KEY,
    persistence::{FileStore, MemoryStore},
};

const EXAMPLE_MENU: &str = include_str!("../menu/content/primary_menu.example.json");

fn payload(value: Value) -> Result<MenuPayload, MenuLoadError> {
    serde_json::from_value(value).map_err(|error| MenuLoadError::Fetch(error.to_string()))
}

fn example_payload() -> Result<MenuPayload, MenuLoadError> {
    crate::menu::schema::parse_menu_payload(EXAMPLE_MENU).map_err(MenuLoadError::from)
}

fn minimal_shop_payload() -> Result<MenuPayload, MenuLoadError> {
    payload(json!({
        "id": "1",
        "name": "Minimal",
        "items": [
            { "id": "home", "title": "Home", "url": "/", "order": 1 },
            { "id": "shop", "title": "Shop", "url": "/shop/", "order": 2 },
            { "id": "womens", "title": "Womens", "url": "/shop/womens/", "parentId": "shop", "order": 2 },
            { "id": "mens", "title": "Mens", "url": "/shop/mens/", "parentId": "shop", "order": 1 }
        ]
    }))
}

fn controller_with_durable(durable: MemoryStore) -> MenuController {
    MenuController::new(
        MenuConfig::default(),
        StatePersistence::new(Box::new(durable), Box::new(MemoryStore::new())),
    )
}

fn loaded(
    mut controller: MenuController,
    payload: Result<MenuPayload, MenuLoadError>,
    current_url: Option<&str>,
) -> MenuController {
    controller.begin_load();
    controller.finish_load(payload, current_url);
    controller
}

#[test]
fn activating_a_root_shows_its_children_in_order() {
    let mut controller = loaded(MenuController::default(), minimal_shop_payload(), None);
    assert_eq!(controller.lifecycle(), MenuLifecycle::Ready);

    controller
        .dispatch(MenuIntent::Activate(String::from("shop")))
        .expect("shop exists");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.visible.main, vec!["home", "shop"]);
    assert_eq!(snapshot.visible.secondary, vec!["mens", "womens"]);
    assert!(snapshot.visible.tertiary.is_empty());
    assert_eq!(snapshot.state.active_level(), MenuLevel::Main);
    assert!(snapshot.state.is_secondary_menu_visible());
    assert!(!snapshot.state.is_tertiary_menu_visible());
    assert!(controller.persistence().has_stored_state());
}

#[test]
fn restored_item_missing_from_new_menu_falls_back_to_default() {
    let durable = MemoryStore::new().with_entry(
        DEFAULT_DURABLE_KEY,
        r#"{"activeItemId":"mens","activeLevel":2,"isSticky":true}"#,
    );
    let stripped = payload(json!({
        "id": "1",
        "name": "Minimal",
        "items": [
            { "id": "home", "title": "Home", "url": "/" },
            { "id": "shop", "title": "Shop", "url": "/shop/" }
        ]
    }));

    let controller = loaded(controller_with_durable(durable), stripped, None);

    assert_eq!(controller.state(), &MenuState::default());
    assert!(controller.hierarchy().active_item().is_none());
}

#[test]
fn restored_item_reopens_its_submenus() {
    let durable = MemoryStore::new().with_entry(
        DEFAULT_DURABLE_KEY,
        r#"{"activeItemId":"mens","activeLevel":2,"isSticky":true}"#,
    );

    let controller = loaded(
        controller_with_durable(durable),
        example_payload(),
        Some("/shop/womens/"),
    );

    let state = controller.state();
    assert_eq!(state.active_item_id(), Some("mens"));
    assert!(state.is_sticky());
    assert!(state.is_secondary_menu_visible());
    assert!(state.is_tertiary_menu_visible());
    assert_eq!(controller.snapshot().visible.tertiary, vec!["mens-all", "mens-shirts"]);
}

#[test]
fn explicit_current_marker_beats_restored_state() {
    let durable = MemoryStore::new().with_entry(
        DEFAULT_DURABLE_KEY,
        r#"{"activeItemId":"womens","activeLevel":2,"isSticky":false}"#,
    );
    let marked = payload(json!({
        "id": "1",
        "name": "Marked",
        "items": [
            { "id": "shop", "title": "Shop", "url": "/shop/", "isCurrentAncestor": true },
            { "id": "womens", "title": "Womens", "url": "/shop/womens/", "parentId": "shop" },
            { "id": "mens", "title": "Mens", "url": "/shop/mens/", "parentId": "shop", "isCurrent": true }
        ]
    }));

    let controller = loaded(controller_with_durable(durable), marked, None);

    assert_eq!(controller.state().active_item_id(), Some("mens"));
    assert_eq!(controller.active_trail(), vec!["shop", "mens"]);
}

#[test]
fn url_detection_runs_when_nothing_was_restored() {
    let controller = loaded(
        MenuController::default(),
        example_payload(),
        Some("https://shop.test/shop/mens/shirts?utm=1#reviews"),
    );

    assert_eq!(controller.state().active_item_id(), Some("mens-shirts"));
    assert_eq!(controller.state().active_level(), MenuLevel::Tertiary);
    assert!(!controller.persistence().has_stored_state());
}

#[test]
fn hover_previews_then_falls_back_to_activation() {
    let mut controller = loaded(MenuController::default(), example_payload(), None);

    controller
        .dispatch(MenuIntent::Activate(String::from("mens")))
        .expect("mens exists");
    controller
        .dispatch(MenuIntent::Hover(Some(String::from("about"))))
        .expect("about exists");

    let preview = controller.snapshot();
    assert_eq!(preview.visible.secondary, vec!["team"]);
    assert!(preview.visible.tertiary.is_empty());
    assert_eq!(preview.state.active_item_id(), Some("mens"));

    controller.dispatch(MenuIntent::Hover(None)).expect("ready");
    let settled = controller.snapshot();
    assert_eq!(settled.visible.secondary, vec!["mens", "womens"]);
    assert_eq!(settled.visible.tertiary, vec!["mens-all", "mens-shirts"]);
    assert!(settled.state.is_tertiary_menu_visible());
}

#[test]
fn hover_then_activate_leaves_the_activated_state() {
    let mut controller = loaded(MenuController::default(), example_payload(), None);

    controller
        .dispatch(MenuIntent::Hover(Some(String::from("womens"))))
        .expect("womens exists");
    controller
        .dispatch(MenuIntent::Activate(String::from("womens")))
        .expect("womens exists");
    controller.dispatch(MenuIntent::Hover(None)).expect("ready");

    let state = controller.state();
    assert_eq!(state.active_item_id(), Some("womens"));
    assert_eq!(state.active_level(), MenuLevel::Secondary);
    assert!(state.is_secondary_menu_visible());
    assert!(!state.is_tertiary_menu_visible());
}

#[test]
fn resizing_across_the_breakpoint_keeps_the_active_item() {
    let mut controller = loaded(MenuController::default(), example_payload(), None);
    controller
        .dispatch(MenuIntent::Activate(String::from("mens")))
        .expect("mens exists");

    controller
        .dispatch(MenuIntent::ViewportResized { width: 500.0 })
        .expect("ready");
    assert!(controller.is_mobile());
    assert!(!controller.state().is_secondary_menu_visible());
    assert!(!controller.state().is_tertiary_menu_visible());
    assert_eq!(controller.state().active_item_id(), Some("mens"));
    assert_eq!(controller.state().active_level(), MenuLevel::Secondary);
    let mobile = controller.snapshot();
    assert!(mobile.visible.secondary.is_empty());
    assert!(mobile.visible.tertiary.is_empty());
    assert_eq!(mobile.active_trail, vec!["shop", "mens"]);

    controller.dispatch(MenuIntent::ToggleMobile).expect("ready");
    assert!(controller.state().is_mobile_menu_open());
    controller.dispatch(MenuIntent::ClickOutside).expect("ready");
    assert!(!controller.state().is_mobile_menu_open());
    controller.dispatch(MenuIntent::ToggleMobile).expect("ready");

    controller
        .dispatch(MenuIntent::ViewportResized { width: 1280.0 })
        .expect("ready");
    assert!(!controller.is_mobile());
    assert!(!controller.state().is_mobile_menu_open());
    assert!(controller.state().is_secondary_menu_visible());
    assert!(controller.state().is_tertiary_menu_visible());
    assert_eq!(controller.snapshot().visible.tertiary, vec!["mens-all", "mens-shirts"]);
}

#[test]
fn viewport_and_scroll_reported_while_loading_apply_on_load() {
    let mut controller = MenuController::default();
    controller.begin_load();

    controller
        .dispatch(MenuIntent::ViewportResized { width: 400.0 })
        .expect("viewport reports are recorded while loading");
    controller
        .dispatch(MenuIntent::Scrolled { offset: 120.0 })
        .expect("scroll reports are recorded while loading");
    assert!(controller.is_mobile());
    assert!(!controller.persistence().has_stored_state());

    controller.finish_load(example_payload(), Some("/shop/mens/"));

    assert_eq!(controller.lifecycle(), MenuLifecycle::Ready);
    assert!(controller.is_mobile());
    let state = controller.state();
    assert_eq!(state.active_item_id(), Some("mens"));
    assert!(state.is_sticky());
    assert!(!state.is_secondary_menu_visible());
    assert!(!state.is_tertiary_menu_visible());
    assert!(controller.snapshot().visible.secondary.is_empty());
}

#[test]
fn early_scroll_overrides_the_restored_sticky_flag() {
    let durable = MemoryStore::new().with_entry(
        DEFAULT_DURABLE_KEY,
        r#"{"activeItemId":"mens","activeLevel":2,"isSticky":true}"#,
    );
    let mut controller = controller_with_durable(durable);
    controller.begin_load();
    controller
        .dispatch(MenuIntent::Scrolled { offset: 0.0 })
        .expect("scroll reports are recorded while loading");

    controller.finish_load(example_payload(), None);

    assert_eq!(controller.state().active_item_id(), Some("mens"));
    assert!(!controller.state().is_sticky());
    let stored = controller.persistence_mut().load_state().expect("record rewritten");
    assert!(!stored.is_sticky());
}

#[test]
fn mobile_ignores_hover_but_activation_opens_drawer_levels() {
    let mut controller = loaded(MenuController::default(), example_payload(), None);
    controller
        .dispatch(MenuIntent::ViewportResized { width: 400.0 })
        .expect("ready");

    controller
        .dispatch(MenuIntent::Hover(Some(String::from("shop"))))
        .expect("shop exists");
    assert_eq!(controller.state().hovered_item_id(), None);
    assert!(!controller.state().is_secondary_menu_visible());
    assert!(controller.snapshot().visible.secondary.is_empty());
    assert_eq!(
        controller.dispatch(MenuIntent::Hover(Some(String::from("ghost")))),
        Err(ControllerError::UnknownItem(String::from("ghost")))
    );

    controller.dispatch(MenuIntent::ToggleMobile).expect("ready");
    controller
        .dispatch(MenuIntent::Activate(String::from("mens")))
        .expect("mens exists");
    let drawer = controller.snapshot();
    assert!(drawer.state.is_mobile_menu_open());
    assert_eq!(drawer.visible.secondary, vec!["mens", "womens"]);
    assert_eq!(drawer.visible.tertiary, vec!["mens-all", "mens-shirts"]);

    controller
        .dispatch(MenuIntent::Navigated {
            url: String::from("/shop/womens/"),
        })
        .expect("ready");
    assert_eq!(controller.state().active_item_id(), Some("womens"));
    assert!(!controller.state().is_secondary_menu_visible());
}

#[test]
fn failed_load_renders_an_interactive_empty_shell() {
    let durable = MemoryStore::new().with_entry(
        DEFAULT_DURABLE_KEY,
        r#"{"activeItemId":"shop","activeLevel":1,"isSticky":true}"#,
    );
    let mut controller = loaded(
        controller_with_durable(durable),
        Err(MenuLoadError::Fetch(String::from("503 Service Unavailable"))),
        Some("/shop/"),
    );

    assert_eq!(controller.lifecycle(), MenuLifecycle::Failed);
    assert!(controller.hierarchy().is_empty());
    assert_eq!(controller.state(), &MenuState::default());
    assert_eq!(controller.snapshot().visible, VisibleMenuIds::default());

    controller.dispatch(MenuIntent::ToggleMobile).expect("shell stays interactive");
    assert_eq!(
        controller.dispatch(MenuIntent::Activate(String::from("shop"))),
        Err(ControllerError::UnknownItem(String::from("shop")))
    );
}

#[test]
fn structurally_invalid_menu_is_rejected_whole() {
    let dangling = payload(json!({
        "id": "1",
        "name": "Broken",
        "items": [
            { "id": "home", "title": "Home", "url": "/" },
            { "id": "ghost-child", "title": "Ghost", "url": "/ghost/", "parentId": "ghost" }
        ]
    }));

    let controller = loaded(MenuController::default(), dangling, None);

    assert_eq!(controller.lifecycle(), MenuLifecycle::Failed);
    assert!(controller.hierarchy().is_empty());
}

#[test]
fn items_nested_past_three_levels_are_skipped() {
    let deep = payload(json!({
        "id": "1",
        "name": "Deep",
        "items": [
            { "id": "a", "title": "A", "url": "/a/" },
            { "id": "b", "title": "B", "url": "/a/b/", "parentId": "a" },
            { "id": "c", "title": "C", "url": "/a/b/c/", "parentId": "b" },
            { "id": "d", "title": "D", "url": "/a/b/c/d/", "parentId": "c" }
        ]
    }));

    let mut controller = loaded(MenuController::default(), deep, None);

    assert_eq!(controller.lifecycle(), MenuLifecycle::Ready);
    assert!(controller.hierarchy().find_item("d").is_none());
    assert_eq!(
        controller.dispatch(MenuIntent::Activate(String::from("d"))),
        Err(ControllerError::UnknownItem(String::from("d")))
    );
}

#[test]
fn navigation_reruns_url_detection() {
    let mut controller = loaded(MenuController::default(), example_payload(), Some("/"));
    assert_eq!(controller.state().active_item_id(), Some("home"));

    controller
        .dispatch(MenuIntent::Navigated {
            url: String::from("/about/team/"),
        })
        .expect("ready");
    assert_eq!(controller.state().active_item_id(), Some("team"));
    assert_eq!(controller.active_trail(), vec!["about", "team"]);

    controller
        .dispatch(MenuIntent::Navigated {
            url: String::from("/checkout/"),
        })
        .expect("ready");
    assert_eq!(controller.state().active_item_id(), Some("team"));
}

#[test]
fn activation_survives_a_page_reload() {
    let dir = std::env::temp_dir().join(format!("sticky_menu_reload_{}", std::process::id()));
    let new_controller = || {
        MenuController::new(
            MenuConfig::default(),
            StatePersistence::new(
                Box::new(FileStore::new(&dir)),
                Box::new(MemoryStore::new()),
            ),
        )
    };

    let mut first_page = loaded(new_controller(), example_payload(), None);
    first_page
        .dispatch(MenuIntent::Activate(String::from("mens-shirts")))
        .expect("mens-shirts exists");
    first_page
        .dispatch(MenuIntent::Scrolled { offset: 300.0 })
        .expect("ready");

    let second_page = loaded(new_controller(), example_payload(), Some("/"));
    let state = second_page.state();
    assert_eq!(state.active_item_id(), Some("mens-shirts"));
    assert_eq!(state.active_level(), MenuLevel::Tertiary);
    assert!(state.is_sticky());
    assert!(second_page.is_in_active_trail("shop"));

    let _ = std::fs::remove_dir_all(&dir);
}
