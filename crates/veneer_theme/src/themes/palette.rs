//! Light and dark color scales of the built-in catalog

use crate::tokens::ColorTokens;
use veneer_core::Color;

/// Slate neutrals
pub mod slate {
    pub const S50: u32 = 0xF8FAFC;
    pub const S100: u32 = 0xF1F5F9;
    pub const S200: u32 = 0xE2E8F0;
    pub const S300: u32 = 0xCBD5E1;
    pub const S400: u32 = 0x94A3B8;
    pub const S500: u32 = 0x64748B;
    pub const S600: u32 = 0x475569;
    pub const S700: u32 = 0x334155;
    pub const S800: u32 = 0x1E293B;
    pub const S900: u32 = 0x0F172A;
    pub const S950: u32 = 0x020617;
}

/// Indigo brand scale
pub mod indigo {
    pub const I300: u32 = 0xA5B4FC;
    pub const I400: u32 = 0x818CF8;
    pub const I500: u32 = 0x6366F1;
    pub const I600: u32 = 0x4F46E5;
    pub const I700: u32 = 0x4338CA;
}

/// Light scheme colors
pub fn light() -> ColorTokens {
    ColorTokens {
        primary: Color::from_hex(indigo::I600),
        primary_hover: Color::from_hex(indigo::I700),
        primary_contrast: Color::WHITE,
        secondary: Color::from_hex(0xDB2777),
        success: Color::from_hex(0x16A34A),
        warning: Color::from_hex(0xD97706),
        error: Color::from_hex(0xDC2626),
        info: Color::from_hex(0x0284C7),
        background: Color::from_hex(slate::S50),
        paper: Color::WHITE,
        paper_elevated: Color::WHITE,
        text_primary: Color::from_hex(slate::S900),
        text_secondary: Color::from_hex(slate::S600),
        text_disabled: Color::from_hex(slate::S400),
        divider: Color::from_hex(slate::S200),
        border: Color::from_hex(slate::S300),
        focus_ring: Color::from_hex(indigo::I500).with_alpha(0.5),
        selection: Color::from_hex(indigo::I500).with_alpha(0.2),
    }
}

/// Dark scheme colors
pub fn dark() -> ColorTokens {
    ColorTokens {
        primary: Color::from_hex(indigo::I400),
        primary_hover: Color::from_hex(indigo::I300),
        primary_contrast: Color::from_hex(slate::S950),
        secondary: Color::from_hex(0xF472B6),
        success: Color::from_hex(0x4ADE80),
        warning: Color::from_hex(0xFBBF24),
        error: Color::from_hex(0xF87171),
        info: Color::from_hex(0x38BDF8),
        background: Color::from_hex(slate::S950),
        paper: Color::from_hex(slate::S900),
        paper_elevated: Color::from_hex(slate::S800),
        text_primary: Color::from_hex(slate::S100),
        text_secondary: Color::from_hex(slate::S400),
        text_disabled: Color::from_hex(slate::S500),
        divider: Color::from_hex(slate::S800),
        border: Color::from_hex(slate::S700),
        focus_ring: Color::from_hex(indigo::I400).with_alpha(0.6),
        selection: Color::from_hex(indigo::I400).with_alpha(0.3),
    }
}
