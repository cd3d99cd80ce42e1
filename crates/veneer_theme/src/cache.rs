//! Theme configuration cache
//!
//! Building a [`ThemeConfiguration`] resolves every token and component style
//! for one color scheme. The result is immutable and shared behind an `Arc`;
//! consumers compare configurations with [`Arc::ptr_eq`] to skip work, so the
//! cache must hand back the very same `Arc` for the same key.

use crate::catalog::{CatalogVersion, TokenCatalog};
use crate::theme::ColorScheme;
use crate::tokens::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use veneer_core::Color;

#[derive(Clone, Debug, PartialEq)]
pub struct ButtonStyle {
    pub background: Color,
    pub background_hover: Color,
    pub foreground: Color,
    pub radius: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub font_weight: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardStyle {
    pub background: Color,
    pub border: Color,
    pub radius: f32,
    pub padding: f32,
    pub shadow: Shadow,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableStyle {
    pub header_background: Color,
    pub header_foreground: Color,
    pub row_hover: Color,
    pub divider: Color,
    pub cell_padding: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputStyle {
    pub background: Color,
    pub foreground: Color,
    pub placeholder: Color,
    pub border: Color,
    pub focus_ring: Color,
    pub radius: f32,
}

/// Per-component overrides derived from the tokens
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentStyles {
    pub button: ButtonStyle,
    pub card: CardStyle,
    pub table: TableStyle,
    pub input: InputStyle,
}

impl ComponentStyles {
    fn derive(
        colors: &ColorTokens,
        spacing: &SpacingTokens,
        radii: &RadiusTokens,
        shadows: &ShadowTokens,
        typography: &TypographyTokens,
    ) -> Self {
        Self {
            button: ButtonStyle {
                background: colors.primary,
                background_hover: colors.primary_hover,
                foreground: colors.primary_contrast,
                radius: radii.radius_md,
                padding_x: spacing.space_4,
                padding_y: spacing.space_2,
                font_weight: typography.weight_medium,
            },
            card: CardStyle {
                background: colors.paper,
                border: colors.border,
                radius: radii.radius_lg,
                padding: spacing.space_6,
                shadow: shadows.shadow_md.clone(),
            },
            table: TableStyle {
                header_background: colors.paper_elevated,
                header_foreground: colors.text_secondary,
                row_hover: colors.selection,
                divider: colors.divider,
                cell_padding: spacing.space_3,
            },
            input: InputStyle {
                background: colors.paper,
                foreground: colors.text_primary,
                placeholder: colors.text_disabled,
                border: colors.border,
                focus_ring: colors.focus_ring,
                radius: radii.radius_sm,
            },
        }
    }
}

/// Fully resolved style object for one color scheme
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeConfiguration {
    pub scheme: ColorScheme,
    pub version: CatalogVersion,
    pub name: String,
    pub colors: ColorTokens,
    pub shadows: ShadowTokens,
    pub spacing: SpacingTokens,
    pub typography: TypographyTokens,
    pub radii: RadiusTokens,
    pub animations: AnimationTokens,
    pub components: ComponentStyles,
}

impl ThemeConfiguration {
    pub fn build(scheme: ColorScheme, catalog: &dyn TokenCatalog) -> Self {
        let bundle = catalog.bundle();
        let theme = bundle.for_scheme(scheme);
        let components = ComponentStyles::derive(
            theme.colors(),
            theme.spacing(),
            theme.radii(),
            theme.shadows(),
            theme.typography(),
        );

        Self {
            scheme,
            version: catalog.version(),
            name: bundle.name().to_string(),
            colors: theme.colors().clone(),
            shadows: theme.shadows().clone(),
            spacing: theme.spacing().clone(),
            typography: theme.typography().clone(),
            radii: theme.radii().clone(),
            animations: theme.animations().clone(),
            components,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scheme: ColorScheme,
    pub version: CatalogVersion,
}

/// Memoizes configurations by `(scheme, catalog version)`
#[derive(Debug, Default)]
pub struct ConfigurationCache {
    entries: FxHashMap<CacheKey, Arc<ThemeConfiguration>>,
    current_version: Option<CatalogVersion>,
    hits: u64,
    misses: u64,
}

impl ConfigurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached configuration for `scheme`, building it on a miss.
    ///
    /// Seeing a catalog version different from the last one evicts every
    /// entry first.
    pub fn build(&mut self, scheme: ColorScheme, catalog: &dyn TokenCatalog) -> Arc<ThemeConfiguration> {
        let version = catalog.version();
        if self.current_version.as_ref() != Some(&version) {
            if !self.entries.is_empty() {
                tracing::debug!(%version, evicted = self.entries.len(), "token catalog changed, evicting theme configurations");
            }
            self.entries.clear();
            self.current_version = Some(version.clone());
        }

        let key = CacheKey { scheme, version };
        if let Some(config) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(config);
        }

        self.misses += 1;
        tracing::trace!(%scheme, version = %key.version, "building theme configuration");
        let config = Arc::new(ThemeConfiguration::build(scheme, catalog));
        self.entries.insert(key, Arc::clone(&config));
        config
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_version = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BundleCatalog;
    use crate::themes::DefaultTheme;

    #[test]
    fn same_key_returns_identical_arc() {
        let catalog = BundleCatalog::default();
        let mut cache = ConfigurationCache::new();

        let first = cache.build(ColorScheme::Dark, &catalog);
        let second = cache.build(ColorScheme::Dark, &catalog);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        let light = cache.build(ColorScheme::Light, &catalog);
        assert!(!Arc::ptr_eq(&first, &light));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn new_version_evicts_old_entries() {
        let v1 = BundleCatalog::new("v1", DefaultTheme::bundle());
        let v2 = BundleCatalog::new("v2", DefaultTheme::bundle());
        let mut cache = ConfigurationCache::new();

        let old = cache.build(ColorScheme::Light, &v1);
        cache.build(ColorScheme::Dark, &v1);
        let new = cache.build(ColorScheme::Light, &v2);

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.version.as_str(), "v2");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn components_follow_palette() {
        let catalog = BundleCatalog::default();
        let dark = ThemeConfiguration::build(ColorScheme::Dark, &catalog);
        assert_eq!(dark.components.button.background, dark.colors.primary);
        assert_eq!(dark.components.card.background, dark.colors.paper);
        assert_eq!(dark.components.input.focus_ring, dark.colors.focus_ring);
        assert_eq!(dark.scheme, ColorScheme::Dark);
    }
}
