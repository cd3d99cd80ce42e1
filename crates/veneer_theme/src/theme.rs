//! Theme trait, color schemes, and light/dark bundles

use crate::tokens::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The concrete scheme a UI is painted in (the effective mode)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn toggle(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, ColorScheme::Dark)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete set of tokens for one color scheme
pub trait Theme: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn color_scheme(&self) -> ColorScheme;
    fn colors(&self) -> &ColorTokens;
    fn typography(&self) -> &TypographyTokens;
    fn spacing(&self) -> &SpacingTokens;
    fn radii(&self) -> &RadiusTokens;
    fn shadows(&self) -> &ShadowTokens;
    fn animations(&self) -> &AnimationTokens;
}

/// A light/dark pair of themes
#[derive(Clone, Debug)]
pub struct ThemeBundle {
    name: String,
    light: Arc<dyn Theme>,
    dark: Arc<dyn Theme>,
}

impl ThemeBundle {
    pub fn new(
        name: impl Into<String>,
        light: impl Theme + 'static,
        dark: impl Theme + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            light: Arc::new(light),
            dark: Arc::new(dark),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant painted for `scheme`
    pub fn for_scheme(&self, scheme: ColorScheme) -> &dyn Theme {
        match scheme {
            ColorScheme::Light => self.light.as_ref(),
            ColorScheme::Dark => self.dark.as_ref(),
        }
    }
}
