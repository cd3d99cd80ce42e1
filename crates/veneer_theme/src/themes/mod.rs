//! Built-in themes

mod default;
pub mod palette;

pub use default::DefaultTheme;
