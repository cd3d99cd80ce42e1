//! Color tokens for theming

use serde::{Deserialize, Serialize};
use veneer_core::Color;

/// Semantic color token keys for dynamic access
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorToken {
    // Brand
    Primary,
    PrimaryHover,
    PrimaryContrast,
    Secondary,

    // Status
    Success,
    Warning,
    Error,
    Info,

    // Surfaces
    Background,
    Paper,
    PaperElevated,

    // Text
    TextPrimary,
    TextSecondary,
    TextDisabled,

    // Lines
    Divider,
    Border,
    FocusRing,

    Selection,
}

impl ColorToken {
    pub const ALL: [ColorToken; 18] = [
        ColorToken::Primary,
        ColorToken::PrimaryHover,
        ColorToken::PrimaryContrast,
        ColorToken::Secondary,
        ColorToken::Success,
        ColorToken::Warning,
        ColorToken::Error,
        ColorToken::Info,
        ColorToken::Background,
        ColorToken::Paper,
        ColorToken::PaperElevated,
        ColorToken::TextPrimary,
        ColorToken::TextSecondary,
        ColorToken::TextDisabled,
        ColorToken::Divider,
        ColorToken::Border,
        ColorToken::FocusRing,
        ColorToken::Selection,
    ];

    /// Kebab-case name, used for CSS variables and persisted overrides
    pub fn css_name(self) -> &'static str {
        match self {
            ColorToken::Primary => "primary",
            ColorToken::PrimaryHover => "primary-hover",
            ColorToken::PrimaryContrast => "primary-contrast",
            ColorToken::Secondary => "secondary",
            ColorToken::Success => "success",
            ColorToken::Warning => "warning",
            ColorToken::Error => "error",
            ColorToken::Info => "info",
            ColorToken::Background => "background",
            ColorToken::Paper => "paper",
            ColorToken::PaperElevated => "paper-elevated",
            ColorToken::TextPrimary => "text-primary",
            ColorToken::TextSecondary => "text-secondary",
            ColorToken::TextDisabled => "text-disabled",
            ColorToken::Divider => "divider",
            ColorToken::Border => "border",
            ColorToken::FocusRing => "focus-ring",
            ColorToken::Selection => "selection",
        }
    }
}

/// Complete set of semantic color tokens for one color scheme
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTokens {
    pub primary: Color,
    pub primary_hover: Color,
    pub primary_contrast: Color,
    pub secondary: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub background: Color,
    pub paper: Color,
    pub paper_elevated: Color,

    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_disabled: Color,

    pub divider: Color,
    pub border: Color,
    pub focus_ring: Color,

    pub selection: Color,
}

impl ColorTokens {
    /// Get a color by token key
    pub fn get(&self, token: ColorToken) -> Color {
        match token {
            ColorToken::Primary => self.primary,
            ColorToken::PrimaryHover => self.primary_hover,
            ColorToken::PrimaryContrast => self.primary_contrast,
            ColorToken::Secondary => self.secondary,
            ColorToken::Success => self.success,
            ColorToken::Warning => self.warning,
            ColorToken::Error => self.error,
            ColorToken::Info => self.info,
            ColorToken::Background => self.background,
            ColorToken::Paper => self.paper,
            ColorToken::PaperElevated => self.paper_elevated,
            ColorToken::TextPrimary => self.text_primary,
            ColorToken::TextSecondary => self.text_secondary,
            ColorToken::TextDisabled => self.text_disabled,
            ColorToken::Divider => self.divider,
            ColorToken::Border => self.border,
            ColorToken::FocusRing => self.focus_ring,
            ColorToken::Selection => self.selection,
        }
    }
}

impl Default for ColorTokens {
    fn default() -> Self {
        crate::themes::palette::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_names_are_unique() {
        let mut names: Vec<_> = ColorToken::ALL.iter().map(|t| t.css_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ColorToken::ALL.len());
    }

    #[test]
    fn serde_name_matches_css_name() {
        for token in ColorToken::ALL {
            let json = serde_json::to_string(&token).unwrap();
            assert_eq!(json, format!("\"{}\"", token.css_name()));
        }
    }
}
