//! Typography tokens

/// Font families, sizes and weights
#[derive(Clone, Debug, PartialEq)]
pub struct TypographyTokens {
    pub font_sans: String,
    pub font_mono: String,

    pub text_xs: f32,
    pub text_sm: f32,
    pub text_base: f32,
    pub text_lg: f32,
    pub text_xl: f32,

    pub weight_normal: u16,
    pub weight_medium: u16,
    pub weight_bold: u16,

    pub line_height: f32,
}

impl Default for TypographyTokens {
    fn default() -> Self {
        Self {
            font_sans: "Inter, system-ui, sans-serif".to_string(),
            font_mono: "'JetBrains Mono', ui-monospace, monospace".to_string(),
            text_xs: 12.0,
            text_sm: 14.0,
            text_base: 16.0,
            text_lg: 18.0,
            text_xl: 20.0,
            weight_normal: 400,
            weight_medium: 500,
            weight_bold: 700,
            line_height: 1.5,
        }
    }
}
