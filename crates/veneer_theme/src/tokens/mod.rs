//! Design tokens for theming
//!
//! Tokens are the atomic values a token catalog supplies per color scheme:
//! - Colors
//! - Typography (fonts, sizes, weights)
//! - Spacing
//! - Border radii
//! - Shadows
//! - Animation durations

mod animation;
mod color;
mod radius;
mod shadow;
mod spacing;
mod typography;

pub use animation::*;
pub use color::*;
pub use radius::*;
pub use shadow::*;
pub use spacing::*;
pub use typography::*;
