//! User theme preferences
//!
//! [`ThemePreferences`] is the full record a user can customize. Updates come
//! in as a [`ThemePreferencesPatch`] and merge shallowly: every field set in
//! the patch replaces the stored one, everything else is kept.

use crate::error::ParseTimeError;
use crate::mode::ThemeMode;
use crate::tokens::ColorToken;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use veneer_core::Color;

/// Wall-clock time with minute precision, persisted as `HH:MM`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    fn minutes(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour = h.parse::<u8>().map_err(|_| err())?;
        let minute = m.parse::<u8>().map_err(|_| err())?;
        TimeOfDay::new(hour, minute).ok_or_else(err)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Times of day at which an automatic schedule switches scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSwitchTime {
    /// Switch to light at this time
    pub light: TimeOfDay,
    /// Switch to dark at this time
    pub dark: TimeOfDay,
}

impl AutoSwitchTime {
    /// Whether the schedule calls for dark at `now`. Handles windows that
    /// wrap past midnight.
    pub fn is_dark_at(&self, now: TimeOfDay) -> bool {
        let (light, dark, now) = (self.light.minutes(), self.dark.minutes(), now.minutes());
        match light.cmp(&dark) {
            std::cmp::Ordering::Less => !(light..dark).contains(&now),
            std::cmp::Ordering::Greater => (dark..light).contains(&now),
            std::cmp::Ordering::Equal => false,
        }
    }
}

/// Per-token color replacements chosen by the user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorOverrides(BTreeMap<ColorToken, Color>);

impl ColorOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: ColorToken, color: Color) -> Self {
        self.0.insert(token, color);
        self
    }

    pub fn insert(&mut self, token: ColorToken, color: Color) -> Option<Color> {
        self.0.insert(token, color)
    }

    pub fn remove(&mut self, token: ColorToken) -> Option<Color> {
        self.0.remove(&token)
    }

    pub fn get(&self, token: ColorToken) -> Option<Color> {
        self.0.get(&token).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColorToken, Color)> + '_ {
        self.0.iter().map(|(token, color)| (*token, *color))
    }

    /// Decode a persisted record, dropping entries that fail to parse
    pub fn from_json_lenient(raw: &str) -> Option<Self> {
        let Value::Object(map) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };
        let mut overrides = Self::new();
        for (key, value) in map {
            let token = serde_json::from_value::<ColorToken>(Value::String(key.clone()));
            let color = serde_json::from_value::<Color>(value);
            match (token, color) {
                (Ok(token), Ok(color)) => {
                    overrides.insert(token, color);
                }
                _ => tracing::debug!(key = %key, "dropping malformed color override"),
            }
        }
        Some(overrides)
    }
}

/// Everything a user can customize about theming
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePreferences {
    pub mode: ThemeMode,
    pub auto_switch_time: Option<AutoSwitchTime>,
    pub high_contrast: bool,
    pub reduced_motion: bool,
    pub custom_colors: Option<ColorOverrides>,
}

impl ThemePreferences {
    /// Shallow merge: fields present in `patch` replace ours
    pub fn merged(&self, patch: &ThemePreferencesPatch) -> Self {
        Self {
            mode: patch.mode.unwrap_or(self.mode),
            auto_switch_time: patch.auto_switch_time.unwrap_or(self.auto_switch_time),
            high_contrast: patch.high_contrast.unwrap_or(self.high_contrast),
            reduced_motion: patch.reduced_motion.unwrap_or(self.reduced_motion),
            custom_colors: patch
                .custom_colors
                .clone()
                .unwrap_or_else(|| self.custom_colors.clone()),
        }
    }

    /// Defaults for everything except `mode`
    pub fn with_mode(mode: ThemeMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Decode a persisted record field by field.
    ///
    /// A field that is missing or malformed takes its default, `default_mode`
    /// for the mode; the rest of the record is still honored. Returns `None`
    /// only when `raw` is not a JSON object at all.
    pub fn from_json_lenient(raw: &str, default_mode: ThemeMode) -> Option<Self> {
        let Value::Object(map) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };

        fn field<T: serde::de::DeserializeOwned + Default>(
            map: &serde_json::Map<String, Value>,
            name: &str,
        ) -> T {
            match map.get(name) {
                None | Some(Value::Null) => T::default(),
                Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
                    tracing::warn!(field = name, %err, "malformed theme preference, using default");
                    T::default()
                }),
            }
        }

        let mode = match map.get("mode") {
            Some(Value::String(raw)) => ThemeMode::parse_or(raw, default_mode),
            _ => default_mode,
        };

        let custom_colors = match map.get("customColors") {
            Some(Value::Object(_)) => map
                .get("customColors")
                .and_then(|v| ColorOverrides::from_json_lenient(&v.to_string())),
            _ => None,
        };

        Some(Self {
            mode,
            auto_switch_time: field(&map, "autoSwitchTime"),
            high_contrast: field(&map, "highContrast"),
            reduced_motion: field(&map, "reducedMotion"),
            custom_colors,
        })
    }
}

/// Partial update for [`ThemePreferences`]
///
/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemePreferencesPatch {
    pub mode: Option<ThemeMode>,
    pub auto_switch_time: Option<Option<AutoSwitchTime>>,
    pub high_contrast: Option<bool>,
    pub reduced_motion: Option<bool>,
    pub custom_colors: Option<Option<ColorOverrides>>,
}

impl ThemePreferencesPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ThemeMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn auto_switch_time(mut self, schedule: Option<AutoSwitchTime>) -> Self {
        self.auto_switch_time = Some(schedule);
        self
    }

    pub fn high_contrast(mut self, enabled: bool) -> Self {
        self.high_contrast = Some(enabled);
        self
    }

    pub fn reduced_motion(mut self, enabled: bool) -> Self {
        self.reduced_motion = Some(enabled);
        self
    }

    pub fn custom_colors(mut self, colors: Option<ColorOverrides>) -> Self {
        self.custom_colors = Some(colors);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
