use std::time::Duration;

use bevy::log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURABLE_KEY: &str = "sticky_mlm_menu_state";
pub const DEFAULT_SESSION_KEY: &str = "sticky_mlm_session_state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
    /// Viewports at or below this width use the off-canvas drawer.
    pub mobile_breakpoint_px: f32,
    /// Scroll offset past which the bar is sticky.
    pub sticky_threshold_px: f32,
    pub scroll_debounce_ms: u64,
    pub resize_debounce_ms: u64,
    /// Persisted state older than this is discarded on restore.
    pub state_ttl_secs: u64,
    pub durable_key: String,
    pub session_key: String,
    /// When set, activating a level-2 item activates its level-3 child with
    /// this title or final url segment instead. Off unless configured.
    pub auto_activate_label: Option<String>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: 768.0,
            sticky_threshold_px: 10.0,
            scroll_debounce_ms: 10,
            resize_debounce_ms: 250,
            state_ttl_secs: 24 * 60 * 60,
            durable_key: String::from(DEFAULT_DURABLE_KEY),
            session_key: String::from(DEFAULT_SESSION_KEY),
            auto_activate_label: None,
        }
    }
}

impl MenuConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(error) => {
                warn!("failed to load menu config: {error}; using safe defaults");
                Self::default()
            }
        }
    }

    pub fn is_mobile_width(&self, width_px: f32) -> bool {
        width_px <= self.mobile_breakpoint_px
    }

    pub fn is_sticky_offset(&self, offset_px: f32) -> bool {
        offset_px > self.sticky_threshold_px
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }
}
