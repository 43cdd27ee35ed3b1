use std::{env, time::Duration};

use bevy::{log::LogPlugin, prelude::*, time::TimeUpdateStrategy};
use once_cell::sync::Lazy;
use sticky_menu::{
    menu::{schema::parse_menu_payload, MenuPayload, MenuSchemaError},
    systems::{PageScrolled, ViewportResized},
    MenuConfig, MenuController, MenuDataLoaded, MenuIntent, MenuLoadError, MenuSnapshotChanged,
    StickyMenuPlugin,
};

static DEMO_CONFIG: Lazy<MenuConfig> =
    Lazy::new(|| MenuConfig::load_or_default(include_str!("./content/menu_config.json")));

static DEMO_MENU: Lazy<Result<MenuPayload, MenuSchemaError>> =
    Lazy::new(|| parse_menu_payload(include_str!("./menu/content/primary_menu.example.json")));

const FRAME: Duration = Duration::from_millis(50);
const SETTLE_FRAMES: usize = 8;

fn main() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .add_plugins(StickyMenuPlugin {
            config: DEMO_CONFIG.clone(),
            storage_dir: Some(env::temp_dir().join("sticky_menu_demo")),
        })
        .add_systems(Startup, deliver_demo_menu)
        .add_systems(Update, log_snapshots);

    app.update();
    app.update();

    let script = [
        MenuIntent::Hover(Some(String::from("shop"))),
        MenuIntent::Activate(String::from("mens")),
        MenuIntent::Hover(None),
        MenuIntent::CartCountChanged(2),
        MenuIntent::ClickOutside,
        MenuIntent::Activate(String::from("womens")),
    ];
    for intent in script {
        app.world_mut().write_message(intent);
        app.update();
    }

    app.world_mut().write_message(ViewportResized { width: 480.0 });
    app.world_mut().write_message(PageScrolled { offset: 320.0 });
    for _ in 0..SETTLE_FRAMES {
        app.update();
    }
    app.world_mut().write_message(MenuIntent::ToggleMobile);
    app.update();

    let controller = app.world().resource::<MenuController>();
    info!(
        "final state: active {:?}, trail {:?}, storage {:?}",
        controller.state().active_item_id(),
        controller.active_trail(),
        controller.persistence().has_stored_state(),
    );
}

fn deliver_demo_menu(mut loaded: MessageWriter<MenuDataLoaded>) {
    loaded.write(MenuDataLoaded {
        payload: DEMO_MENU.clone().map_err(MenuLoadError::from),
        current_url: env::args().nth(1),
    });
}

fn log_snapshots(mut changed: MessageReader<MenuSnapshotChanged>) {
    for MenuSnapshotChanged(snapshot) in changed.read() {
        info!(
            "{:?}: active {:?} | main {:?} | secondary {:?} | tertiary {:?} | mobile {} open {} | sticky {} | cart {}",
            snapshot.lifecycle,
            snapshot.state.active_item_id(),
            snapshot.visible.main,
            snapshot.visible.secondary,
            snapshot.visible.tertiary,
            snapshot.is_mobile,
            snapshot.state.is_mobile_menu_open(),
            snapshot.state.is_sticky(),
            snapshot.cart_count,
        );
    }
}
