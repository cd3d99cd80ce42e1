//! Shadow tokens for theming

use veneer_core::Color;

/// Semantic shadow token keys for dynamic access
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ShadowToken {
    Sm,
    Md,
    Lg,
    None,
}

/// A box shadow definition
#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub color: Color,
}

impl Shadow {
    pub const fn new(offset_x: f32, offset_y: f32, blur: f32, spread: f32, color: Color) -> Self {
        Self {
            offset_x,
            offset_y,
            blur,
            spread,
            color,
        }
    }

    pub const fn none() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, Color::TRANSPARENT)
    }

    /// CSS `box-shadow` value
    pub fn to_css(&self) -> String {
        if self.color.a == 0.0 {
            return "none".to_string();
        }
        format!(
            "{}px {}px {}px {}px {}",
            self.offset_x,
            self.offset_y,
            self.blur,
            self.spread,
            self.color.to_css()
        )
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::none()
    }
}

/// Complete set of shadow tokens
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowTokens {
    pub shadow_sm: Shadow,
    pub shadow_md: Shadow,
    pub shadow_lg: Shadow,
    pub shadow_none: Shadow,
}

impl ShadowTokens {
    /// Get shadow by token key
    pub fn get(&self, token: ShadowToken) -> &Shadow {
        match token {
            ShadowToken::Sm => &self.shadow_sm,
            ShadowToken::Md => &self.shadow_md,
            ShadowToken::Lg => &self.shadow_lg,
            ShadowToken::None => &self.shadow_none,
        }
    }

    /// Shadows for a light color scheme
    pub fn light() -> Self {
        let base = Color::BLACK;
        Self {
            shadow_sm: Shadow::new(0.0, 1.0, 2.0, 0.0, base.with_alpha(0.06)),
            shadow_md: Shadow::new(0.0, 4.0, 8.0, -2.0, base.with_alpha(0.1)),
            shadow_lg: Shadow::new(0.0, 12.0, 24.0, -6.0, base.with_alpha(0.12)),
            shadow_none: Shadow::none(),
        }
    }

    /// Shadows for a dark color scheme; darker surfaces need denser shadows
    pub fn dark() -> Self {
        let base = Color::BLACK;
        Self {
            shadow_sm: Shadow::new(0.0, 1.0, 2.0, 0.0, base.with_alpha(0.3)),
            shadow_md: Shadow::new(0.0, 4.0, 8.0, -2.0, base.with_alpha(0.4)),
            shadow_lg: Shadow::new(0.0, 12.0, 24.0, -6.0, base.with_alpha(0.5)),
            shadow_none: Shadow::none(),
        }
    }
}

impl Default for ShadowTokens {
    fn default() -> Self {
        Self::light()
    }
}
