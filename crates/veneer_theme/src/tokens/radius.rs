//! Border radius tokens

/// Radius token keys
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum RadiusToken {
    None,
    Sm,
    Md,
    Lg,
    Full,
}

/// Border radii in logical pixels
#[derive(Clone, Debug, PartialEq)]
pub struct RadiusTokens {
    pub radius_none: f32,
    pub radius_sm: f32,
    pub radius_md: f32,
    pub radius_lg: f32,
    pub radius_full: f32,
}

impl RadiusTokens {
    pub fn get(&self, token: RadiusToken) -> f32 {
        match token {
            RadiusToken::None => self.radius_none,
            RadiusToken::Sm => self.radius_sm,
            RadiusToken::Md => self.radius_md,
            RadiusToken::Lg => self.radius_lg,
            RadiusToken::Full => self.radius_full,
        }
    }
}

impl Default for RadiusTokens {
    fn default() -> Self {
        Self {
            radius_none: 0.0,
            radius_sm: 4.0,
            radius_md: 8.0,
            radius_lg: 12.0,
            radius_full: 9999.0,
        }
    }
}
