//! Theme modes and the mode resolver
//!
//! [`ThemeMode`] is what the user asked for; [`ColorScheme`] is what gets
//! painted. [`resolve`] turns the first into the second given the
//! environment's dark-mode preference. It is pure and cheap, so callers can
//! run it on every render.

use crate::error::ParseModeError;
use crate::theme::ColorScheme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User-selected theme intent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the environment's preferred color scheme
    #[default]
    Auto,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::Auto];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::Auto => "auto",
        }
    }

    /// Strict parse: exactly `light`, `dark` or `auto`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            "auto" => Some(ThemeMode::Auto),
            _ => None,
        }
    }

    /// Parse a persisted value, treating anything unrecognized as `Auto`
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse_or(value, ThemeMode::Auto)
    }

    /// Parse a persisted value, ignoring case and surrounding whitespace
    pub fn parse_or(value: &str, default: ThemeMode) -> Self {
        Self::parse(value.trim().to_ascii_lowercase().as_str()).unwrap_or(default)
    }

    /// Next mode in the toggle cycle `light -> dark -> auto -> light`
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Auto,
            ThemeMode::Auto => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseModeError(s.to_string()))
    }
}

impl From<ColorScheme> for ThemeMode {
    fn from(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => ThemeMode::Light,
            ColorScheme::Dark => ThemeMode::Dark,
        }
    }
}

/// Resolve the effective scheme for a mode and environment preference
pub const fn resolve(mode: ThemeMode, environment_prefers_dark: bool) -> ColorScheme {
    match mode {
        ThemeMode::Light => ColorScheme::Light,
        ThemeMode::Dark => ColorScheme::Dark,
        ThemeMode::Auto => {
            if environment_prefers_dark {
                ColorScheme::Dark
            } else {
                ColorScheme::Light
            }
        }
    }
}

/// Resolve a raw stored value; unrecognized values resolve as `Auto`
pub fn resolve_raw(stored: &str, environment_prefers_dark: bool) -> ColorScheme {
    resolve(ThemeMode::parse_lenient(stored), environment_prefers_dark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn explicit_modes_ignore_environment() {
        for dark_env in [false, true] {
            assert_eq!(resolve(ThemeMode::Light, dark_env), ColorScheme::Light);
            assert_eq!(resolve(ThemeMode::Dark, dark_env), ColorScheme::Dark);
        }
    }

    #[test]
    fn auto_follows_environment() {
        assert_eq!(resolve(ThemeMode::Auto, true), ColorScheme::Dark);
        assert_eq!(resolve(ThemeMode::Auto, false), ColorScheme::Light);
    }

    #[test]
    fn corrupted_value_falls_back_to_auto() {
        assert_eq!(resolve_raw("not-a-mode", true), ColorScheme::Dark);
        assert_eq!(resolve_raw("not-a-mode", false), ColorScheme::Light);
        assert_eq!(resolve_raw("", true), ColorScheme::Dark);
        assert_eq!(resolve_raw(" DARK ", false), ColorScheme::Dark);
    }

    #[test]
    fn strict_parse_rejects_variants() {
        assert_eq!("dark".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
        assert!("Dark".parse::<ThemeMode>().is_err());
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn toggle_cycle_visits_dark_auto_light() {
        let mut mode = ThemeMode::Light;
        let mut visited = Vec::new();
        for _ in 0..3 {
            mode = mode.next();
            visited.push(mode);
        }
        assert_eq!(visited, vec![ThemeMode::Dark, ThemeMode::Auto, ThemeMode::Light]);
    }

    fn any_mode() -> impl Strategy<Value = ThemeMode> {
        prop_oneof![
            Just(ThemeMode::Light),
            Just(ThemeMode::Dark),
            Just(ThemeMode::Auto)
        ]
    }

    proptest! {
        #[test]
        fn resolve_is_deterministic(mode in any_mode(), dark_env in any::<bool>()) {
            prop_assert_eq!(resolve(mode, dark_env), resolve(mode, dark_env));
        }

        #[test]
        fn explicit_mode_wins(dark_env in any::<bool>()) {
            prop_assert_eq!(resolve(ThemeMode::Light, dark_env), ColorScheme::Light);
            prop_assert_eq!(resolve(ThemeMode::Dark, dark_env), ColorScheme::Dark);
        }

        #[test]
        fn arbitrary_strings_never_panic(raw in ".*", dark_env in any::<bool>()) {
            let expected = resolve(ThemeMode::parse_lenient(&raw), dark_env);
            prop_assert_eq!(resolve_raw(&raw, dark_env), expected);
        }

        #[test]
        fn display_round_trips(mode in any_mode()) {
            prop_assert_eq!(mode.to_string().parse::<ThemeMode>(), Ok(mode));
        }
    }
}
