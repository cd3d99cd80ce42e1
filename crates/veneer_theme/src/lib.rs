//! Veneer Theme Engine
//!
//! Decides whether an application renders light or dark, remembers the
//! user's choice, and keeps every open execution context in agreement.
//!
//! # Overview
//!
//! - **Mode resolution**: `light`, `dark` or `auto` (follow the environment)
//! - **Persistence**: preferences survive reloads through a [`StorageBackend`]
//! - **Cross-context sync**: contexts sharing a [`SharedOrigin`] see each
//!   other's changes, never their own
//! - **Transitions**: changes are bracketed in a single debounced window
//! - **Design tokens**: resolved into a cached, immutable
//!   [`ThemeConfiguration`] per color scheme
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use veneer_core::ManualScheduler;
//! use veneer_theme::{DocumentRoot, SimulatedEnvironment, ThemeContext, ThemeMode};
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let root = DocumentRoot::new();
//!
//! let ctx = ThemeContext::builder()
//!     .environment(SimulatedEnvironment::dark())
//!     .scheduler(scheduler.clone())
//!     .style_target(root.clone())
//!     .mount();
//!
//! // Nothing stored yet, so `auto` follows the dark environment
//! assert!(ctx.is_dark_mode());
//!
//! ctx.set_theme(ThemeMode::Light);
//! scheduler.tick(Duration::from_millis(500));
//! assert_eq!(root.attribute("data-theme").as_deref(), Some("light"));
//! ```
//!
//! # Cross-context synchronization
//!
//! Each context polls its transport from the host loop with
//! [`ThemeContext::process_pending`]. Changes made by another context are
//! applied exactly like a local [`ThemeContext::set_theme`] except that the
//! store is not written again.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod css;
pub mod environment;
pub mod error;
pub mod mode;
pub mod notifier;
pub mod preferences;
pub mod storage;
pub mod store;
pub mod theme;
pub mod themes;
pub mod tokens;
pub mod transition;

pub use cache::{CacheKey, ComponentStyles, ConfigurationCache, ThemeConfiguration};
pub use catalog::{BundleCatalog, CatalogVersion, TokenCatalog};
pub use config::{CssConfig, StorageKeys, ThemeConfig, TransitionConfig};
pub use context::{try_use_theme, use_theme, ScopeGuard, ThemeContext, ThemeContextBuilder};
pub use css::{CssBridge, DocumentRoot, StyleBatch, StyleTarget};
#[cfg(feature = "system")]
pub use environment::SystemEnvironment;
pub use environment::{
    EnvironmentObserver, EnvironmentSignal, EnvironmentSource, EnvironmentSubscription,
    SimulatedEnvironment,
};
pub use error::{ConfigError, ParseModeError, ParseTimeError, StorageError};
pub use mode::{resolve, resolve_raw, ThemeMode};
pub use notifier::{Change, ChangeEvent, ChangeKind, ChangeOrigin, ListenerHandle, Notifier};
pub use preferences::{
    AutoSwitchTime, ColorOverrides, ThemePreferences, ThemePreferencesPatch, TimeOfDay,
};
pub use storage::{
    BroadcastTransport, ChangeTransport, ContextId, FileStorage, MemoryStorage, NullTransport, OriginStorage,
    SharedOrigin, StorageBackend, StorageEvent, TransportEvent, UnavailableStorage,
};
pub use store::{ModeLookup, PreferenceStore};
pub use theme::{ColorScheme, Theme, ThemeBundle};
pub use themes::DefaultTheme;
pub use tokens::*;
pub use transition::{TransitionController, TransitionEvent, TransitionState};
pub use veneer_core::Color;
