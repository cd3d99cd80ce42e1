//! Preference store
//!
//! Durable home of the user's theme choices on top of a [`StorageBackend`].
//! Reads never fail: anything missing, unreadable or malformed comes back as
//! the compiled-in default. Writes that the backend rejects are kept in a
//! session-only overlay so the running context behaves as if the write
//! succeeded until it is reloaded.

use crate::config::StorageKeys;
use crate::error::StorageError;
use crate::mode::ThemeMode;
use crate::notifier::{Change, Notifier};
use crate::preferences::{ColorOverrides, ThemePreferences};
use crate::storage::StorageBackend;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

const PROBE_KEY: &str = "__veneer_probe__";

/// What is stored under the mode key
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModeLookup {
    /// Nothing stored, or storage unavailable
    Unset,
    Stored(ThemeMode),
    /// Stored value is not a recognized mode
    Corrupted(String),
}

impl ModeLookup {
    /// Collapse to a mode, with `default` for unset and corrupted values
    pub fn unwrap_or(self, default: ThemeMode) -> ThemeMode {
        match self {
            ModeLookup::Stored(mode) => mode,
            ModeLookup::Unset | ModeLookup::Corrupted(_) => default,
        }
    }
}

/// Session value for a key: `Some(None)` means removed this session
type Overlay = FxHashMap<String, Option<String>>;

pub struct PreferenceStore {
    backend: Arc<dyn StorageBackend>,
    notifier: Notifier,
    keys: StorageKeys,
    default_mode: ThemeMode,
    available: bool,
    degraded: AtomicBool,
    overlay: RwLock<Overlay>,
}

impl PreferenceStore {
    /// Wrap `backend`, probing once whether it accepts writes
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        notifier: Notifier,
        keys: StorageKeys,
        default_mode: ThemeMode,
    ) -> Self {
        let available = probe(backend.as_ref());
        if !available {
            tracing::warn!("theme storage unavailable, preferences will not persist");
        }

        Self {
            backend,
            notifier,
            keys,
            default_mode,
            available,
            degraded: AtomicBool::new(!available),
            overlay: RwLock::new(Overlay::default()),
        }
    }

    /// Result of the construction-time capability probe
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// True once any write has failed; later writes only reach the overlay
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn default_mode(&self) -> ThemeMode {
        self.default_mode
    }

    pub fn lookup_mode(&self) -> ModeLookup {
        match self.get_item(&self.keys.mode) {
            None => ModeLookup::Unset,
            Some(raw) => match ThemeMode::parse(raw.trim()) {
                Some(mode) => ModeLookup::Stored(mode),
                None => {
                    tracing::warn!(value = %raw, "stored theme mode is not recognized, using default");
                    ModeLookup::Corrupted(raw)
                }
            },
        }
    }

    pub fn get_mode(&self) -> ThemeMode {
        self.lookup_mode().unwrap_or(self.default_mode)
    }

    /// Persist `mode` and notify local listeners
    pub fn set_mode(&self, mode: ThemeMode) {
        self.write(&self.keys.mode, Some(mode.as_str().to_string()));
        self.notifier.publish_local(Change::Mode(mode));
    }

    /// The full preference record. The dedicated mode and custom color keys
    /// are authoritative over the copies inside the record.
    pub fn get_preferences(&self) -> ThemePreferences {
        let mut prefs = self
            .get_item(&self.keys.preferences)
            .map(|raw| {
                ThemePreferences::from_json_lenient(&raw, self.default_mode).unwrap_or_else(|| {
                    tracing::warn!("stored theme preferences are malformed, using defaults");
                    ThemePreferences::with_mode(self.default_mode)
                })
            })
            .unwrap_or_else(|| ThemePreferences::with_mode(self.default_mode));

        match self.lookup_mode() {
            ModeLookup::Stored(mode) => prefs.mode = mode,
            ModeLookup::Corrupted(_) => prefs.mode = self.default_mode,
            ModeLookup::Unset => {}
        }

        prefs.custom_colors = self.get_custom_colors();
        prefs
    }

    /// Persist the full record (mode key included) and notify local listeners
    pub fn set_preferences(&self, prefs: &ThemePreferences) {
        match serde_json::to_string(prefs) {
            Ok(raw) => self.write(&self.keys.preferences, Some(raw)),
            Err(err) => tracing::warn!(%err, "failed to encode theme preferences"),
        }
        self.write(&self.keys.mode, Some(prefs.mode.as_str().to_string()));
        self.write_custom_colors(prefs.custom_colors.as_ref());
        self.notifier.publish_local(Change::Preferences(prefs.clone()));
    }

    pub fn get_custom_colors(&self) -> Option<ColorOverrides> {
        let raw = self.get_item(&self.keys.custom_colors)?;
        let colors = ColorOverrides::from_json_lenient(&raw);
        if colors.is_none() {
            tracing::warn!("stored custom colors are malformed, ignoring");
        }
        colors
    }

    /// Persist custom colors (`None` removes them) and notify local listeners
    pub fn set_custom_colors(&self, colors: Option<&ColorOverrides>) {
        self.write_custom_colors(colors);
        self.notifier
            .publish_local(Change::CustomColors(colors.cloned()));
    }

    /// Remove every persisted record and notify local listeners
    pub fn clear(&self) {
        for key in self.keys.all() {
            self.write(key, None);
        }
        self.notifier.publish_local(Change::Cleared);
    }

    /// Raw read of any key, session overlay first
    pub fn get_item(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overlay().get(key) {
            return value.clone();
        }
        if !self.available {
            return None;
        }
        match self.backend.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "theme storage read failed, using default");
                None
            }
        }
    }

    /// Forget the session-only value held for `key`, so reads fall through to
    /// the backend again. Used when another context has written the key.
    pub fn release_session_value(&self, key: &str) -> bool {
        let released = self.overlay_mut().remove(key).is_some();
        if released {
            tracing::debug!(key, "session-only theme value superseded by shared storage");
        }
        released
    }

    /// Raw write of any key; does not notify
    pub fn set_item(&self, key: &str, value: &str) {
        self.write(key, Some(value.to_string()));
    }

    fn write_custom_colors(&self, colors: Option<&ColorOverrides>) {
        let raw = match colors {
            Some(colors) => match serde_json::to_string(colors) {
                Ok(raw) => Some(raw),
                Err(err) => {
                    tracing::warn!(%err, "failed to encode custom colors");
                    return;
                }
            },
            None => None,
        };
        self.write(&self.keys.custom_colors, raw);
    }

    fn write(&self, key: &str, value: Option<String>) {
        if !self.is_degraded() {
            let result = match &value {
                Some(value) => self.backend.set_item(key, value),
                None => self.backend.remove_item(key),
            };
            match result {
                Ok(()) => {
                    self.overlay_mut().remove(key);
                    return;
                }
                Err(err) => self.degrade(key, &err),
            }
        }
        self.overlay_mut().insert(key.to_string(), value);
    }

    fn degrade(&self, key: &str, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            tracing::warn!(key, %err, "theme storage write failed, keeping preferences for this session only");
        }
    }

    fn overlay(&self) -> std::sync::RwLockReadGuard<'_, Overlay> {
        self.overlay.read().unwrap_or_else(|p| p.into_inner())
    }

    fn overlay_mut(&self) -> std::sync::RwLockWriteGuard<'_, Overlay> {
        self.overlay.write().unwrap_or_else(|p| p.into_inner())
    }
}

fn probe(backend: &dyn StorageBackend) -> bool {
    let result = backend
        .set_item(PROBE_KEY, PROBE_KEY)
        .and_then(|()| backend.remove_item(PROBE_KEY));
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(%err, "theme storage probe failed");
            false
        }
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("keys", &self.keys)
            .field("available", &self.available)
            .field("degraded", &self.is_degraded())
            .finish()
    }
}
