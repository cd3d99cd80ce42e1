//! Default Veneer theme (slate neutrals with an indigo accent)

use super::palette;
use crate::theme::{ColorScheme, Theme, ThemeBundle};
use crate::tokens::*;

/// Default theme shipped with the built-in token catalog
#[derive(Clone, Debug)]
pub struct DefaultTheme {
    scheme: ColorScheme,
    colors: ColorTokens,
    typography: TypographyTokens,
    spacing: SpacingTokens,
    radii: RadiusTokens,
    shadows: ShadowTokens,
    animations: AnimationTokens,
}

impl DefaultTheme {
    pub fn light() -> Self {
        Self::with_colors(ColorScheme::Light, palette::light(), ShadowTokens::light())
    }

    pub fn dark() -> Self {
        Self::with_colors(ColorScheme::Dark, palette::dark(), ShadowTokens::dark())
    }

    /// Light and dark variants
    pub fn bundle() -> ThemeBundle {
        ThemeBundle::new("Veneer", Self::light(), Self::dark())
    }

    fn with_colors(scheme: ColorScheme, colors: ColorTokens, shadows: ShadowTokens) -> Self {
        Self {
            scheme,
            colors,
            typography: TypographyTokens::default(),
            spacing: SpacingTokens::default(),
            radii: RadiusTokens::default(),
            shadows,
            animations: AnimationTokens::default(),
        }
    }
}

impl Theme for DefaultTheme {
    fn name(&self) -> &str {
        "Veneer"
    }

    fn color_scheme(&self) -> ColorScheme {
        self.scheme
    }

    fn colors(&self) -> &ColorTokens {
        &self.colors
    }

    fn typography(&self) -> &TypographyTokens {
        &self.typography
    }

    fn spacing(&self) -> &SpacingTokens {
        &self.spacing
    }

    fn radii(&self) -> &RadiusTokens {
        &self.radii
    }

    fn shadows(&self) -> &ShadowTokens {
        &self.shadows
    }

    fn animations(&self) -> &AnimationTokens {
        &self.animations
    }
}
