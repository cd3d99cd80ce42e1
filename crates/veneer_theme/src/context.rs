//! Theme context
//!
//! [`ThemeContext`] ties the engine together for one execution context: it
//! reads the stored preference, watches the environment, resolves the
//! effective scheme, brackets changes in a transition window, hands out the
//! cached [`ThemeConfiguration`] and mirrors everything onto the document
//! root through the CSS bridge.
//!
//! There is no global instance. The host builds a context, keeps it, and may
//! install it for the current thread with [`ThemeContext::enter`] or
//! [`ThemeContext::provide`] so that nested code can reach it through
//! [`use_theme`].

use crate::cache::{ConfigurationCache, ThemeConfiguration};
use crate::catalog::{BundleCatalog, TokenCatalog};
use crate::config::ThemeConfig;
use crate::css::{self, CssBridge, DocumentRoot, StyleBatch, StyleTarget};
use crate::environment::{
    EnvironmentObserver, EnvironmentSignal, EnvironmentSource, EnvironmentSubscription,
};
use crate::mode::{self, ThemeMode};
use crate::notifier::{Change, ChangeEvent, ListenerHandle, Notifier};
use crate::preferences::{ColorOverrides, ThemePreferences, ThemePreferencesPatch};
use crate::storage::{ChangeTransport, MemoryStorage, StorageBackend};
use crate::store::{ModeLookup, PreferenceStore};
use crate::theme::ColorScheme;
use crate::tokens::ColorToken;
use crate::transition::{TransitionController, TransitionEvent, TransitionState};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use veneer_core::{Color, ManualScheduler, Scheduler};

struct ContextState {
    mode: ThemeMode,
    prefs: ThemePreferences,
    system_dark: bool,
    env_high_contrast: bool,
    env_reduced_motion: bool,
    catalog: Arc<dyn TokenCatalog>,
    cache: ConfigurationCache,
    config: Arc<ThemeConfiguration>,
}

impl ContextState {
    fn effective(&self) -> ColorScheme {
        mode::resolve(self.mode, self.system_dark)
    }

    fn high_contrast(&self) -> bool {
        self.prefs.high_contrast || self.env_high_contrast
    }

    fn reduced_motion(&self) -> bool {
        self.prefs.reduced_motion || self.env_reduced_motion
    }

    fn rebuild(&mut self) {
        let scheme = self.effective();
        self.config = self.cache.build(scheme, self.catalog.as_ref());
    }
}

struct ContextInner {
    state: Mutex<ContextState>,
    store: PreferenceStore,
    environment: EnvironmentObserver,
    subscriptions: Mutex<Vec<EnvironmentSubscription>>,
    transitions: TransitionController,
    css: CssBridge,
    scheduler: Arc<dyn Scheduler>,
    config: ThemeConfig,
    mounted: AtomicBool,
}

/// Handle to one mounted theme engine; clones share the same engine
#[derive(Clone)]
pub struct ThemeContext {
    inner: Arc<ContextInner>,
}

/// Collects the collaborators of a [`ThemeContext`]
///
/// Anything not supplied gets an in-process default: [`MemoryStorage`], the
/// backend's own transport, a simulated (or, with the `system` feature, the
/// OS) environment, a [`ManualScheduler`], a detached [`DocumentRoot`] and
/// the built-in catalog.
#[derive(Default)]
pub struct ThemeContextBuilder {
    backend: Option<Arc<dyn StorageBackend>>,
    transport: Option<Box<dyn ChangeTransport>>,
    environment: Option<Arc<dyn EnvironmentSource>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    style_target: Option<Arc<dyn StyleTarget>>,
    catalog: Option<Arc<dyn TokenCatalog>>,
    config: ThemeConfig,
}

impl ThemeContextBuilder {
    pub fn backend(mut self, backend: impl StorageBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Override the transport; defaults to the backend's
    pub fn transport(mut self, transport: impl ChangeTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn environment(mut self, environment: impl EnvironmentSource + 'static) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn style_target(mut self, target: impl StyleTarget + 'static) -> Self {
        self.style_target = Some(Arc::new(target));
        self
    }

    pub fn catalog(mut self, catalog: impl TokenCatalog + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn config(mut self, config: ThemeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the context and run the startup sequence
    pub fn mount(self) -> ThemeContext {
        let config = self.config;
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let transport = self.transport.unwrap_or_else(|| backend.transport());
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(ManualScheduler::new()));
        let style_target = self
            .style_target
            .unwrap_or_else(|| Arc::new(DocumentRoot::new()));
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(BundleCatalog::default()));
        let environment = self.environment.unwrap_or_else(default_environment);

        let notifier = Notifier::new(transport, config.storage.clone(), config.default_mode);
        let store = PreferenceStore::new(backend, notifier, config.storage.clone(), config.default_mode);
        let prefs = store.get_preferences();

        let observer = EnvironmentObserver::new(environment);
        let mut cache = ConfigurationCache::new();
        let system_dark = observer.current(EnvironmentSignal::PrefersDark);
        let initial = cache.build(mode::resolve(prefs.mode, system_dark), catalog.as_ref());

        let transitions = TransitionController::new(
            Arc::clone(&scheduler),
            config.transition.reveal_delay(),
            config.transition.suppress_interaction,
        );
        let css = CssBridge::new(Arc::clone(&scheduler), style_target);

        let inner = Arc::new(ContextInner {
            state: Mutex::new(ContextState {
                mode: prefs.mode,
                prefs,
                system_dark,
                env_high_contrast: observer.current(EnvironmentSignal::PrefersHighContrast),
                env_reduced_motion: observer.current(EnvironmentSignal::PrefersReducedMotion),
                catalog,
                cache,
                config: initial,
            }),
            store,
            environment: observer,
            subscriptions: Mutex::new(Vec::new()),
            transitions,
            css,
            scheduler,
            config,
            mounted: AtomicBool::new(true),
        });

        let ctx = ThemeContext { inner };
        ctx.start();
        ctx
    }
}

#[cfg(feature = "system")]
fn default_environment() -> Arc<dyn EnvironmentSource> {
    Arc::new(crate::environment::SystemEnvironment)
}

#[cfg(not(feature = "system"))]
fn default_environment() -> Arc<dyn EnvironmentSource> {
    Arc::new(crate::environment::SimulatedEnvironment::new())
}

impl ThemeContext {
    pub fn builder() -> ThemeContextBuilder {
        ThemeContextBuilder::default()
    }

    fn start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let subscriptions: Vec<EnvironmentSubscription> = EnvironmentSignal::ALL
            .into_iter()
            .map(|signal| {
                let weak = Weak::clone(&weak);
                self.inner.environment.subscribe(signal, move |value| {
                    if let Some(ctx) = ThemeContext::upgrade(&weak) {
                        ctx.on_environment(signal, value);
                    }
                })
            })
            .collect();

        {
            let mut state = self.state();
            for sub in &subscriptions {
                match sub.signal() {
                    EnvironmentSignal::PrefersDark => state.system_dark = sub.initial(),
                    EnvironmentSignal::PrefersHighContrast => state.env_high_contrast = sub.initial(),
                    EnvironmentSignal::PrefersReducedMotion => state.env_reduced_motion = sub.initial(),
                }
            }
            state.rebuild();
            tracing::debug!(
                mode = %state.mode,
                effective = %state.effective(),
                available = self.inner.store.is_available(),
                "theme context mounted"
            );
        }
        *lock(&self.inner.subscriptions) = subscriptions;

        let css = self.inner.css.clone();
        self.inner.transitions.on_event(move |event| {
            let batch = match event {
                TransitionEvent::LoadingStarted => StyleBatch::new().flag(css::ATTR_LOADING, true),
                TransitionEvent::ContentRevealed { .. } => StyleBatch::new().flag(css::ATTR_LOADING, false),
                TransitionEvent::Began { .. } => StyleBatch::new().flag(css::ATTR_TRANSITIONING, true),
                TransitionEvent::Ended { .. } => StyleBatch::new().flag(css::ATTR_TRANSITIONING, false),
            };
            css.schedule(batch);
        });

        self.inner.transitions.begin_loading();
        self.schedule_styles();
        let transitions = self.inner.transitions.clone();
        self.inner
            .css
            .after_flush(Box::new(move || transitions.content_ready()));
    }

    // -- accessors --

    /// Mode the user asked for
    pub fn theme_mode(&self) -> ThemeMode {
        self.state().mode
    }

    /// Scheme actually painted
    pub fn effective_mode(&self) -> ColorScheme {
        self.state().effective()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.effective_mode().is_dark()
    }

    pub fn system_prefers_dark(&self) -> bool {
        self.state().system_dark
    }

    /// High contrast from the user's preference or the environment
    pub fn high_contrast(&self) -> bool {
        self.state().high_contrast()
    }

    /// Reduced motion from the user's preference or the environment
    pub fn reduced_motion(&self) -> bool {
        self.state().reduced_motion()
    }

    pub fn preferences(&self) -> ThemePreferences {
        let state = self.state();
        ThemePreferences {
            mode: state.mode,
            ..state.prefs.clone()
        }
    }

    /// The resolved configuration; identical `Arc` until the effective mode
    /// or the catalog changes
    pub fn theme(&self) -> Arc<ThemeConfiguration> {
        Arc::clone(&self.state().config)
    }

    /// Color for `token`, custom override first
    pub fn color(&self, token: ColorToken) -> Color {
        let state = self.state();
        state
            .prefs
            .custom_colors
            .as_ref()
            .and_then(|colors| colors.get(token))
            .unwrap_or_else(|| state.config.colors.get(token))
    }

    pub fn css_variables(&self) -> BTreeMap<String, String> {
        let state = self.state();
        css::theme_variables(
            &self.inner.config.css.variable_prefix,
            &state.config,
            state.prefs.custom_colors.as_ref(),
        )
    }

    pub fn transition_state(&self) -> TransitionState {
        self.inner.transitions.state()
    }

    pub fn is_interaction_suppressed(&self) -> bool {
        self.inner.transitions.is_interaction_suppressed()
    }

    pub fn storage_manager(&self) -> &PreferenceStore {
        &self.inner.store
    }

    pub fn notifier(&self) -> &Notifier {
        self.inner.store.notifier()
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.inner.scheduler
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.inner.config
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Listen for every theme change, local and external
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.inner.store.notifier().add_listener(listener)
    }

    pub fn on_transition<F>(&self, listener: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        self.inner.transitions.on_event(listener);
    }

    // -- mutations --

    /// Switch to `mode`, persist it and notify listeners. Does nothing if
    /// `mode` is already current.
    pub fn set_theme(&self, mode: ThemeMode) {
        if self.transition_to(mode) {
            self.inner.store.set_mode(mode);
            self.schedule_styles();
        }
    }

    /// [`set_theme`](Self::set_theme) from a string; unknown names are ignored
    pub fn set_theme_named(&self, name: &str) {
        match name.parse::<ThemeMode>() {
            Ok(mode) => self.set_theme(mode),
            Err(err) => tracing::debug!(%err, "ignoring theme change"),
        }
    }

    /// Advance `light -> dark -> auto -> light`
    pub fn toggle_theme(&self) {
        let next = self.theme_mode().next();
        self.set_theme(next);
    }

    /// Merge `patch` into the preferences, persist and notify
    pub fn update_theme_preferences(&self, patch: ThemePreferencesPatch) {
        if patch.is_empty() {
            return;
        }
        if let Some(mode) = patch.mode {
            self.set_theme(mode);
        }

        let merged = {
            let mut state = self.state();
            let merged = ThemePreferences {
                mode: state.mode,
                ..state.prefs.merged(&patch)
            };
            state.prefs = merged.clone();
            merged
        };
        self.inner.store.set_preferences(&merged);
        self.schedule_styles();
    }

    /// Replace the custom color overrides; `None` removes them
    pub fn set_custom_colors(&self, colors: Option<ColorOverrides>) {
        self.state().prefs.custom_colors = colors.clone();
        self.inner.store.set_custom_colors(colors.as_ref());
        self.schedule_styles();
    }

    /// Forget everything stored and return to the configured defaults
    pub fn reset_preferences(&self) {
        self.reset_state();
        self.inner.store.clear();
        self.schedule_styles();
    }

    /// Swap the token catalog. A new version rebuilds the configuration.
    pub fn reload_catalog(&self, catalog: impl TokenCatalog + 'static) {
        {
            let mut state = self.state();
            tracing::debug!(version = %catalog.version(), "reloading token catalog");
            state.catalog = Arc::new(catalog);
            state.rebuild();
        }
        self.schedule_styles();
    }

    /// Pump pending input: re-read the environment and apply changes made by
    /// other contexts. Returns how many changes were processed.
    pub fn process_pending(&self) -> usize {
        let mut processed = self.inner.environment.refresh();
        for event in self.inner.store.notifier().drain_external() {
            let applied = self.apply_external(event.change);
            self.inner.store.notifier().publish(ChangeEvent::external(applied));
            processed += 1;
        }
        processed
    }

    /// Detach from the environment and drop pending timers and frames.
    /// Safe to call more than once.
    pub fn unmount(&self) {
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        let subscriptions = std::mem::take(&mut *lock(&self.inner.subscriptions));
        drop(subscriptions);
        self.inner.transitions.cancel_pending();
        self.inner.css.cancel_pending();
        tracing::debug!("theme context unmounted");
    }

    // -- scope --

    /// Install this context for the current thread until the guard drops
    pub fn enter(&self) -> ScopeGuard {
        SCOPE.with(|scope| scope.borrow_mut().push(self.clone()));
        ScopeGuard {
            _not_send: PhantomData,
        }
    }

    /// Run `f` with this context installed
    pub fn provide<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    // -- internals --

    fn transition_to(&self, mode: ThemeMode) -> bool {
        let duration = {
            let state = self.state();
            if state.mode == mode {
                return false;
            }
            self.transition_duration(&state)
        };

        self.inner.transitions.begin_transition(duration);

        let mut state = self.state();
        let from = state.mode;
        state.mode = mode;
        state.prefs.mode = mode;
        state.rebuild();
        tracing::debug!(%from, to = %mode, effective = %state.effective(), "theme mode changed");
        true
    }

    fn transition_duration(&self, state: &ContextState) -> Duration {
        if state.reduced_motion() {
            return Duration::ZERO;
        }
        self.inner
            .config
            .transition
            .duration_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| state.config.animations.theme_transition())
    }

    fn reset_state(&self) {
        let default_mode = self.inner.config.default_mode;
        self.transition_to(default_mode);
        self.state().prefs = ThemePreferences {
            mode: default_mode,
            ..Default::default()
        };
    }

    /// Apply a change made elsewhere without writing the store. Returns the
    /// change as applied.
    fn apply_external(&self, change: Change) -> Change {
        let kind = change.kind();
        let store = &self.inner.store;
        let keys = store.keys();
        match &change {
            Change::Mode(_) => {
                store.release_session_value(&keys.mode);
            }
            Change::Preferences(_) => {
                store.release_session_value(&keys.preferences);
            }
            Change::CustomColors(_) => {
                store.release_session_value(&keys.custom_colors);
            }
            Change::Cleared | Change::Resync => {
                for key in keys.all() {
                    store.release_session_value(key);
                }
            }
            _ => {}
        }

        let applied = match change {
            Change::Mode(announced) => {
                // Events can be stale when contexts race; the medium holds the winner.
                let mode = match store.lookup_mode() {
                    ModeLookup::Stored(mode) => mode,
                    ModeLookup::Unset | ModeLookup::Corrupted(_) => announced,
                };
                self.transition_to(mode);
                Change::Mode(mode)
            }
            Change::Preferences(prefs) => {
                let mut state = self.state();
                state.prefs.auto_switch_time = prefs.auto_switch_time;
                state.prefs.high_contrast = prefs.high_contrast;
                state.prefs.reduced_motion = prefs.reduced_motion;
                Change::Preferences(prefs)
            }
            Change::CustomColors(colors) => {
                self.state().prefs.custom_colors = colors.clone();
                Change::CustomColors(colors)
            }
            Change::Cleared => {
                self.reset_state();
                Change::Cleared
            }
            Change::Resync => {
                let stored = store.get_preferences();
                self.transition_to(stored.mode);
                let mut state = self.state();
                state.prefs.auto_switch_time = stored.auto_switch_time;
                state.prefs.high_contrast = stored.high_contrast;
                state.prefs.reduced_motion = stored.reduced_motion;
                state.prefs.custom_colors = stored.custom_colors;
                Change::Resync
            }
            other => other,
        };
        tracing::debug!(?kind, "applied theme change from another context");
        self.schedule_styles();
        applied
    }

    fn on_environment(&self, signal: EnvironmentSignal, value: bool) {
        let change = match signal {
            EnvironmentSignal::PrefersDark => {
                let duration = {
                    let state = self.state();
                    let changes_scheme = state.mode == ThemeMode::Auto && state.system_dark != value;
                    changes_scheme.then(|| self.transition_duration(&state))
                };
                if let Some(duration) = duration {
                    self.inner.transitions.begin_transition(duration);
                }
                let mut state = self.state();
                state.system_dark = value;
                state.rebuild();
                Change::EnvironmentDark(value)
            }
            EnvironmentSignal::PrefersHighContrast => {
                self.state().env_high_contrast = value;
                Change::EnvironmentHighContrast(value)
            }
            EnvironmentSignal::PrefersReducedMotion => {
                self.state().env_reduced_motion = value;
                Change::EnvironmentReducedMotion(value)
            }
        };
        self.schedule_styles();
        self.inner.store.notifier().publish_local(change);
    }

    fn schedule_styles(&self) {
        let batch = {
            let state = self.state();
            let mut batch = StyleBatch::new();
            for (name, value) in css::theme_variables(
                &self.inner.config.css.variable_prefix,
                &state.config,
                state.prefs.custom_colors.as_ref(),
            ) {
                batch = batch.property(name, value);
            }
            batch
                .attribute(css::ATTR_MODE, state.mode.as_str())
                .attribute(css::ATTR_THEME, state.effective().as_str())
                .flag(css::ATTR_HIGH_CONTRAST, state.high_contrast())
                .flag(css::ATTR_REDUCED_MOTION, state.reduced_motion())
        };
        self.inner.css.schedule(batch);
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        lock(&self.inner.state)
    }

    fn upgrade(weak: &Weak<ContextInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl std::fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ThemeContext")
            .field("mode", &state.mode)
            .field("effective", &state.effective())
            .field("system_dark", &state.system_dark)
            .field("transition", &self.inner.transitions.state())
            .field("store", &self.inner.store)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

thread_local! {
    static SCOPE: RefCell<Vec<ThemeContext>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a context installed for the current thread; see [`ThemeContext::enter`]
#[must_use = "the context is uninstalled when the guard drops"]
pub struct ScopeGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPE.with(|scope| {
            scope.borrow_mut().pop();
        });
    }
}

/// The innermost context installed on this thread, if any
pub fn try_use_theme() -> Option<ThemeContext> {
    SCOPE.with(|scope| scope.borrow().last().cloned())
}

/// The innermost context installed on this thread
///
/// # Panics
///
/// Panics when no context is installed. Components reading the theme must run
/// inside [`ThemeContext::provide`] or while a [`ThemeContext::enter`] guard is
/// alive.
pub fn use_theme() -> ThemeContext {
    try_use_theme().unwrap_or_else(|| {
        panic!(
            "use_theme() called outside of a theme scope: install a ThemeContext with \
             ThemeContext::provide or ThemeContext::enter before reading the theme"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SimulatedEnvironment;
    use pretty_assertions::assert_eq;

    fn mount_with(env: SimulatedEnvironment) -> (Arc<ManualScheduler>, DocumentRoot, ThemeContext) {
        let scheduler = Arc::new(ManualScheduler::new());
        let root = DocumentRoot::new();
        let ctx = ThemeContext::builder()
            .environment(env)
            .scheduler(scheduler.clone())
            .style_target(root.clone())
            .mount();
        (scheduler, root, ctx)
    }

    fn settle(scheduler: &ManualScheduler) {
        scheduler.run_frame();
        scheduler.tick(Duration::from_secs(1));
        scheduler.run_frame();
    }

    #[test]
    fn mount_hides_content_until_revealed() {
        let (scheduler, root, ctx) = mount_with(SimulatedEnvironment::new());
        assert_eq!(ctx.transition_state(), TransitionState::Loading);

        // the reveal waits for the first batch of styles to land
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(ctx.transition_state(), TransitionState::Loading);
        assert_eq!(scheduler.pending_timers(), 0);

        scheduler.run_frame();
        assert_eq!(root.attribute(css::ATTR_LOADING).as_deref(), Some("true"));
        assert_eq!(root.attribute(css::ATTR_THEME).as_deref(), Some("light"));
        assert_eq!(root.attribute(css::ATTR_MODE).as_deref(), Some("auto"));
        assert_eq!(scheduler.pending_timers(), 1);

        scheduler.advance(Duration::from_millis(99));
        assert_eq!(ctx.transition_state(), TransitionState::Loading);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(ctx.transition_state(), TransitionState::Idle);

        settle(&scheduler);
        assert_eq!(ctx.transition_state(), TransitionState::Idle);
        assert_eq!(root.attribute(css::ATTR_LOADING), None);
    }

    #[test]
    fn set_theme_brackets_a_transition() {
        let (scheduler, root, ctx) = mount_with(SimulatedEnvironment::new());
        settle(&scheduler);

        ctx.set_theme(ThemeMode::Dark);
        assert!(ctx.is_dark_mode());
        assert_eq!(ctx.transition_state(), TransitionState::Transitioning);
        assert!(ctx.is_interaction_suppressed());

        scheduler.run_frame();
        assert_eq!(root.attribute(css::ATTR_THEME).as_deref(), Some("dark"));
        assert_eq!(root.attribute(css::ATTR_TRANSITIONING).as_deref(), Some("true"));

        settle(&scheduler);
        assert_eq!(ctx.transition_state(), TransitionState::Idle);
        assert_eq!(root.attribute(css::ATTR_TRANSITIONING), None);
    }

    #[test]
    fn same_mode_is_a_no_op() {
        let (scheduler, _root, ctx) = mount_with(SimulatedEnvironment::new());
        settle(&scheduler);
        let before = ctx.theme();

        ctx.set_theme(ThemeMode::Auto);
        assert_eq!(ctx.transition_state(), TransitionState::Idle);
        assert!(Arc::ptr_eq(&before, &ctx.theme()));
    }

    #[test]
    fn invalid_names_are_ignored() {
        let (_scheduler, _root, ctx) = mount_with(SimulatedEnvironment::new());
        ctx.set_theme_named("sepia");
        assert_eq!(ctx.theme_mode(), ThemeMode::Auto);
        ctx.set_theme_named("dark");
        assert_eq!(ctx.theme_mode(), ThemeMode::Dark);
    }

    #[test]
    fn environment_change_moves_auto_only() {
        let env = SimulatedEnvironment::new();
        let (scheduler, root, ctx) = mount_with(env.clone());
        settle(&scheduler);

        env.set_prefers_dark(true);
        assert_eq!(ctx.process_pending(), 1);
        assert_eq!(ctx.effective_mode(), ColorScheme::Dark);
        settle(&scheduler);
        assert_eq!(root.attribute(css::ATTR_THEME).as_deref(), Some("dark"));

        ctx.set_theme(ThemeMode::Light);
        env.set_prefers_dark(false);
        ctx.process_pending();
        env.set_prefers_dark(true);
        ctx.process_pending();
        assert_eq!(ctx.effective_mode(), ColorScheme::Light);
        assert!(ctx.system_prefers_dark());
    }

    #[test]
    fn reduced_motion_skips_the_window() {
        let env = SimulatedEnvironment::new();
        env.set_reduced_motion(true);
        let (scheduler, root, ctx) = mount_with(env);
        settle(&scheduler);

        ctx.set_theme(ThemeMode::Dark);
        assert_eq!(ctx.transition_state(), TransitionState::Idle);
        scheduler.run_frame();
        assert_eq!(root.attribute(css::ATTR_REDUCED_MOTION).as_deref(), Some("true"));
    }

    #[test]
    fn custom_colors_win_over_palette() {
        let (scheduler, root, ctx) = mount_with(SimulatedEnvironment::new());
        let red = Color::from_hex(0xFF0000);
        ctx.set_custom_colors(Some(ColorOverrides::new().with(ColorToken::Primary, red)));
        assert_eq!(ctx.color(ColorToken::Primary), red);

        settle(&scheduler);
        assert_eq!(root.property("--veneer-primary"), Some(red.to_css()));

        ctx.set_custom_colors(None);
        assert_eq!(ctx.color(ColorToken::Primary), ctx.theme().colors.primary);
    }

    #[test]
    fn preferences_patch_merges_and_routes_mode() {
        let (_scheduler, _root, ctx) = mount_with(SimulatedEnvironment::new());
        ctx.update_theme_preferences(ThemePreferencesPatch::new().high_contrast(true));
        ctx.update_theme_preferences(ThemePreferencesPatch::new().mode(ThemeMode::Dark));

        let prefs = ctx.preferences();
        assert!(prefs.high_contrast);
        assert_eq!(prefs.mode, ThemeMode::Dark);
        assert_eq!(ctx.storage_manager().get_mode(), ThemeMode::Dark);
        assert!(ctx.storage_manager().get_preferences().high_contrast);
    }

    #[test]
    fn unmount_releases_environment_subscriptions() {
        let env = SimulatedEnvironment::new();
        let (scheduler, _root, ctx) = mount_with(env.clone());
        assert_eq!(ctx.inner.environment.active_subscriptions(), 3);

        ctx.unmount();
        ctx.unmount();
        assert_eq!(ctx.inner.environment.active_subscriptions(), 0);
        assert_eq!(scheduler.pending_timers(), 0);
        assert_eq!(scheduler.pending_frames(), 0);

        env.set_prefers_dark(true);
        ctx.process_pending();
        assert_eq!(ctx.effective_mode(), ColorScheme::Light);
    }

    #[test]
    fn scope_installs_and_uninstalls() {
        let (_scheduler, _root, ctx) = mount_with(SimulatedEnvironment::new());
        assert!(try_use_theme().is_none());

        let mode = ctx.provide(|| use_theme().theme_mode());
        assert_eq!(mode, ThemeMode::Auto);
        assert!(try_use_theme().is_none());

        let guard = ctx.enter();
        use_theme().set_theme(ThemeMode::Light);
        drop(guard);
        assert_eq!(ctx.theme_mode(), ThemeMode::Light);
    }

    #[test]
    #[should_panic(expected = "outside of a theme scope")]
    fn use_theme_outside_scope_panics() {
        let _ = use_theme();
    }
}
