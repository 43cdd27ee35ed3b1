//! Durable and per-session storage of the navigation-relevant part of
//! [`MenuState`]. Every failure here degrades to "nothing stored"; none of
//! them reach the caller as a hard error on the read path.
pub mod store;

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use bevy::log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::{MenuConfig, DEFAULT_DURABLE_KEY, DEFAULT_SESSION_KEY},
    menu::{MenuState, SerializableMenuState},
};

pub use store::{FileStore, MemoryStore, StateStore, StorageError};

const DEFAULT_STATE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTier {
    Durable,
    Session,
}

impl fmt::Display for StoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Session => write!(f, "session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    Storage {
        tier: StoreTier,
        key: String,
        source: StorageError,
    },
    Corrupted {
        tier: StoreTier,
        key: String,
        reason: String,
    },
    Expired {
        tier: StoreTier,
        key: String,
        age: Duration,
    },
    Encode(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { tier, key, source } => {
                write!(f, "{tier} storage failed for `{key}`: {source}")
            }
            Self::Corrupted { tier, key, reason } => {
                write!(f, "{tier} record `{key}` is corrupted: {reason}")
            }
            Self::Expired { tier, key, age } => {
                write!(f, "{tier} record `{key}` expired ({}s old)", age.as_secs())
            }
            Self::Encode(err) => write!(f, "failed to encode menu state: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// On-disk shape. `savedAt` is unix milliseconds; records without it are
/// treated as fresh. Reads go through [`MenuState::from_serializable`] so
/// records with missing or older fields still restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedMenuRecord {
    #[serde(flatten)]
    state: SerializableMenuState,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageInfo {
    pub durable_available: bool,
    pub session_available: bool,
    pub has_durable_state: bool,
    pub has_session_state: bool,
    pub durable_bytes: usize,
    pub session_bytes: usize,
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

pub struct StatePersistence {
    durable: Box<dyn StateStore>,
    session: Box<dyn StateStore>,
    durable_key: String,
    session_key: String,
    ttl: Duration,
    now_ms: fn() -> u64,
}

impl fmt::Debug for StatePersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatePersistence")
            .field("durable_key", &self.durable_key)
            .field("session_key", &self.session_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for StatePersistence {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }
}

impl StatePersistence {
    pub fn new(durable: Box<dyn StateStore>, session: Box<dyn StateStore>) -> Self {
        Self {
            durable,
            session,
            durable_key: String::from(DEFAULT_DURABLE_KEY),
            session_key: String::from(DEFAULT_SESSION_KEY),
            ttl: DEFAULT_STATE_TTL,
            now_ms: system_now_ms,
        }
    }

    pub fn from_config(
        config: &MenuConfig,
        durable: Box<dyn StateStore>,
        session: Box<dyn StateStore>,
    ) -> Self {
        Self {
            durable_key: config.durable_key.clone(),
            session_key: config.session_key.clone(),
            ttl: config.state_ttl(),
            ..Self::new(durable, session)
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, now_ms: fn() -> u64) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Writes durably, falling back to the session tier when the durable
    /// write fails. Returns the tier that took the record.
    pub fn save_state(&mut self, state: &MenuState) -> Result<StoreTier, PersistenceError> {
        let encoded = self.encode(state)?;
        match self.write(StoreTier::Durable, &encoded) {
            Ok(()) => Ok(StoreTier::Durable),
            Err(error) => {
                warn!("{error}; falling back to session storage");
                self.write(StoreTier::Session, &encoded)?;
                Ok(StoreTier::Session)
            }
        }
    }

    pub fn save_session_state(&mut self, state: &MenuState) -> Result<(), PersistenceError> {
        let encoded = self.encode(state)?;
        self.write(StoreTier::Session, &encoded)
    }

    pub fn load_state(&mut self) -> Option<MenuState> {
        self.load_tier(StoreTier::Durable)
    }

    pub fn load_session_state(&mut self) -> Option<MenuState> {
        self.load_tier(StoreTier::Session)
    }

    /// Durable first, then session.
    pub fn restore(&mut self) -> Option<(MenuState, StoreTier)> {
        self.load_state()
            .map(|state| (state, StoreTier::Durable))
            .or_else(|| self.load_session_state().map(|state| (state, StoreTier::Session)))
    }

    /// Drops expired or unreadable records from both tiers.
    pub fn cleanup_expired_state(&mut self) {
        for tier in [StoreTier::Durable, StoreTier::Session] {
            if let Err(error) = self.read_record(tier) {
                self.discard(tier, error);
            }
        }
    }

    pub fn clear(&mut self) {
        for tier in [StoreTier::Durable, StoreTier::Session] {
            let key = self.key(tier).to_string();
            if let Err(source) = self.store_mut(tier).remove(&key) {
                warn!("failed to clear {tier} menu state `{key}`: {source}");
            }
        }
    }

    pub fn has_stored_state(&self) -> bool {
        [StoreTier::Durable, StoreTier::Session]
            .into_iter()
            .any(|tier| self.has_tier_state(tier))
    }

    pub fn storage_info(&mut self) -> StorageInfo {
        StorageInfo {
            durable_available: self.durable.is_available(),
            session_available: self.session.is_available(),
            has_durable_state: self.has_tier_state(StoreTier::Durable),
            has_session_state: self.has_tier_state(StoreTier::Session),
            durable_bytes: self.stored_bytes(StoreTier::Durable),
            session_bytes: self.stored_bytes(StoreTier::Session),
        }
    }

    fn has_tier_state(&self, tier: StoreTier) -> bool {
        matches!(self.store(tier).get(self.key(tier)), Ok(Some(_)))
    }

    fn stored_bytes(&self, tier: StoreTier) -> usize {
        match self.store(tier).get(self.key(tier)) {
            Ok(Some(raw)) => raw.len(),
            _ => 0,
        }
    }

    fn key(&self, tier: StoreTier) -> &str {
        match tier {
            StoreTier::Durable => &self.durable_key,
            StoreTier::Session => &self.session_key,
        }
    }

    fn store(&self, tier: StoreTier) -> &dyn StateStore {
        match tier {
            StoreTier::Durable => self.durable.as_ref(),
            StoreTier::Session => self.session.as_ref(),
        }
    }

    fn store_mut(&mut self, tier: StoreTier) -> &mut dyn StateStore {
        match tier {
            StoreTier::Durable => self.durable.as_mut(),
            StoreTier::Session => self.session.as_mut(),
        }
    }

    fn encode(&self, state: &MenuState) -> Result<String, PersistenceError> {
        let record = PersistedMenuRecord {
            state: state.to_serializable(),
            saved_at: Some((self.now_ms)()),
        };
        serde_json::to_string(&record).map_err(|error| PersistenceError::Encode(error.to_string()))
    }

    fn write(&mut self, tier: StoreTier, encoded: &str) -> Result<(), PersistenceError> {
        let key = self.key(tier).to_string();
        self.store_mut(tier)
            .set(&key, encoded)
            .map_err(|source| PersistenceError::Storage { tier, key, source })
    }

    fn load_tier(&mut self, tier: StoreTier) -> Option<MenuState> {
        match self.read_record(tier) {
            Ok(record) => record.as_ref().map(MenuState::from_serializable),
            Err(error) => {
                self.discard(tier, error);
                None
            }
        }
    }

    /// Storage failures leave the record in place; anything else removes it.
    fn discard(&mut self, tier: StoreTier, error: PersistenceError) {
        if let PersistenceError::Storage { .. } = error {
            warn!("{error}");
            return;
        }
        warn!("{error}; discarding record");
        let key = self.key(tier).to_string();
        if let Err(source) = self.store_mut(tier).remove(&key) {
            warn!("failed to discard {tier} menu state `{key}`: {source}");
        }
    }

    /// Fetches a tier's record and checks it is usable: a JSON object whose
    /// `activeItemId`, when present, is a string or null, saved within the ttl.
    fn read_record(&self, tier: StoreTier) -> Result<Option<Value>, PersistenceError> {
        let key = self.key(tier);
        let raw = self
            .store(tier)
            .get(key)
            .map_err(|source| PersistenceError::Storage {
                tier,
                key: key.to_string(),
                source,
            })?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let corrupted = |reason: String| PersistenceError::Corrupted {
            tier,
            key: key.to_string(),
            reason,
        };
        let record: Value =
            serde_json::from_str(&raw).map_err(|error| corrupted(error.to_string()))?;
        if !record.is_object() {
            return Err(corrupted(String::from("expected a JSON object")));
        }
        if record
            .get("activeItemId")
            .is_some_and(|id| !id.is_string() && !id.is_null())
        {
            return Err(corrupted(String::from("`activeItemId` is not a string")));
        }

        if let Some(saved_at) = record.get("savedAt").and_then(Value::as_u64) {
            let age = Duration::from_millis((self.now_ms)().saturating_sub(saved_at));
            if age > self.ttl {
                return Err(PersistenceError::Expired {
                    tier,
                    key: key.to_string(),
                    age,
                });
            }
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuLevel;

    const SAVED_AT_MS: u64 = 1_700_000_000_000;

    fn fixed_clock() -> u64 {
        SAVED_AT_MS
    }

    fn two_days_later() -> u64 {
        SAVED_AT_MS + 2 * 24 * 60 * 60 * 1000
    }

    fn shop_state() -> MenuState {
        MenuState::default()
            .with_active_item("mens", MenuLevel::Secondary)
            .with_sticky_state(true)
    }

    fn persistence(durable: MemoryStore, session: MemoryStore) -> StatePersistence {
        StatePersistence::new(Box::new(durable), Box::new(session)).with_clock(fixed_clock)
    }

    #[test]
    fn saved_state_restores_navigation_fields_only() {
        let mut persistence = persistence(MemoryStore::new(), MemoryStore::new());
        let state = shop_state().with_hovered_item(Some("home")).with_mobile_menu_toggled();

        assert_eq!(persistence.save_state(&state), Ok(StoreTier::Durable));
        let (restored, tier) = persistence.restore().expect("state should restore");

        assert_eq!(tier, StoreTier::Durable);
        assert_eq!(restored.active_item_id(), Some("mens"));
        assert_eq!(restored.active_level(), MenuLevel::Secondary);
        assert!(restored.is_sticky());
        assert!(restored.is_secondary_menu_visible());
        assert_eq!(restored.hovered_item_id(), None);
        assert!(!restored.is_mobile_menu_open());
    }

    #[test]
    fn repeated_saves_are_idempotent() {
        let mut persistence = persistence(MemoryStore::new(), MemoryStore::new());
        persistence.save_state(&shop_state()).expect("first save");
        persistence.save_state(&shop_state()).expect("second save");

        assert_eq!(
            persistence.load_state(),
            Some(MenuState::from(shop_state().to_serializable()))
        );
    }

    #[test]
    fn durable_write_failure_falls_back_to_session() {
        let mut persistence = persistence(MemoryStore::unavailable(), MemoryStore::new());

        assert_eq!(persistence.save_state(&shop_state()), Ok(StoreTier::Session));
        let (restored, tier) = persistence.restore().expect("session copy should restore");
        assert_eq!(tier, StoreTier::Session);
        assert_eq!(restored.active_item_id(), Some("mens"));
    }

    #[test]
    fn both_tiers_failing_surfaces_the_session_error() {
        let mut persistence = persistence(MemoryStore::unavailable(), MemoryStore::with_quota(8));

        assert!(matches!(
            persistence.save_state(&shop_state()),
            Err(PersistenceError::Storage {
                tier: StoreTier::Session,
                source: StorageError::QuotaExceeded { .. },
                ..
            })
        ));
        assert_eq!(persistence.restore(), None);
    }

    #[test]
    fn expired_records_are_removed() {
        let mut persistence = persistence(MemoryStore::new(), MemoryStore::new());
        persistence.save_state(&shop_state()).expect("save");

        let mut persistence = StatePersistence {
            now_ms: two_days_later,
            ..persistence
        };
        assert_eq!(persistence.load_state(), None);
        assert!(!persistence.has_stored_state());
    }

    #[test]
    fn records_without_timestamp_are_fresh() {
        let durable = MemoryStore::new().with_entry(
            DEFAULT_DURABLE_KEY,
            r#"{"activeItemId":"shop","activeLevel":1,"isSticky":false}"#,
        );
        let mut persistence = persistence(durable, MemoryStore::new()).with_clock(two_days_later);

        let restored = persistence.load_state().expect("untimestamped record is kept");
        assert_eq!(restored.active_item_id(), Some("shop"));
    }

    #[test]
    fn records_missing_fields_restore_with_defaults() {
        let durable = MemoryStore::new()
            .with_entry(DEFAULT_DURABLE_KEY, r#"{"activeItemId":"mens","activeLevel":2}"#);
        let mut persistence = persistence(durable, MemoryStore::new());

        let restored = persistence.load_state().expect("older record shape still restores");
        assert_eq!(restored.active_item_id(), Some("mens"));
        assert_eq!(restored.active_level(), MenuLevel::Secondary);
        assert!(!restored.is_sticky());
        assert!(persistence.has_stored_state());
    }

    #[test]
    fn malformed_fields_fall_back_without_discarding() {
        let durable = MemoryStore::new().with_entry(
            DEFAULT_DURABLE_KEY,
            r#"{"activeItemId":null,"activeLevel":"one","isSticky":"yes","savedAt":"soon"}"#,
        );
        let mut persistence = persistence(durable, MemoryStore::new()).with_clock(two_days_later);

        assert_eq!(persistence.load_state(), Some(MenuState::default()));
        assert!(persistence.has_stored_state());
    }

    #[test]
    fn corrupted_or_mistyped_records_are_discarded() {
        for raw in [
            "not json",
            "[1, 2]",
            r#""mens""#,
            r#"{"activeItemId":42,"activeLevel":1,"isSticky":false}"#,
            r#"{"activeItemId":["mens"],"activeLevel":2}"#,
        ] {
            let durable = MemoryStore::new().with_entry(DEFAULT_DURABLE_KEY, raw);
            let mut persistence = persistence(durable, MemoryStore::new());

            assert_eq!(persistence.load_state(), None, "{raw}");
            assert!(!persistence.has_stored_state(), "{raw} should be removed");
        }
    }

    #[test]
    fn cleanup_removes_only_stale_records() {
        let expired = format!(
            r#"{{"activeItemId":"mens","activeLevel":2,"isSticky":true,"savedAt":{SAVED_AT_MS}}}"#
        );
        let durable = MemoryStore::new().with_entry(DEFAULT_DURABLE_KEY, &expired);
        let session = MemoryStore::new()
            .with_entry(DEFAULT_SESSION_KEY, r#"{"activeItemId":"about","activeLevel":1}"#);
        let mut persistence = persistence(durable, session).with_clock(two_days_later);

        persistence.cleanup_expired_state();

        let info = persistence.storage_info();
        assert!(!info.has_durable_state);
        assert!(info.has_session_state);
        let (restored, tier) = persistence.restore().expect("session record survives cleanup");
        assert_eq!(tier, StoreTier::Session);
        assert_eq!(restored.active_item_id(), Some("about"));
    }

    #[test]
    fn durable_record_wins_over_session() {
        let session = MemoryStore::new().with_entry(
            DEFAULT_SESSION_KEY,
            r#"{"activeItemId":"about","activeLevel":1,"isSticky":false}"#,
        );
        let mut persistence = persistence(MemoryStore::new(), session);
        persistence.save_state(&shop_state()).expect("save");

        let (restored, tier) = persistence.restore().expect("restore");
        assert_eq!(tier, StoreTier::Durable);
        assert_eq!(restored.active_item_id(), Some("mens"));
    }

    #[test]
    fn clear_and_storage_info_cover_both_tiers() {
        let mut persistence = persistence(MemoryStore::new(), MemoryStore::new());
        persistence.save_state(&shop_state()).expect("save");
        persistence.save_session_state(&shop_state()).expect("session save");

        let info = persistence.storage_info();
        assert!(info.durable_available && info.session_available);
        assert!(info.has_durable_state && info.has_session_state);
        assert!(info.durable_bytes > 0);
        assert_eq!(info.durable_bytes, info.session_bytes);

        persistence.clear();
        assert!(!persistence.has_stored_state());
        assert_eq!(persistence.restore(), None);
    }

    #[test]
    fn keys_and_ttl_come_from_config() {
        let config = MenuConfig {
            durable_key: String::from("custom_menu"),
            state_ttl_secs: 60,
            ..MenuConfig::default()
        };
        let mut persistence = StatePersistence::from_config(
            &config,
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        );

        assert_eq!(persistence.ttl(), Duration::from_secs(60));
        persistence.save_state(&shop_state()).expect("save");
        assert!(persistence.storage_info().has_durable_state);
    }
}
