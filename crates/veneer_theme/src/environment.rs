//! Environment observer
//!
//! Watches the host's rendering preferences (dark scheme, high contrast,
//! reduced motion). The values come from an [`EnvironmentSource`]; the
//! observer remembers what it last saw and, on [`EnvironmentObserver::refresh`],
//! calls the subscribers of every signal that changed.

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// A host preference the engine reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvironmentSignal {
    PrefersDark,
    PrefersHighContrast,
    PrefersReducedMotion,
}

impl EnvironmentSignal {
    pub const ALL: [EnvironmentSignal; 3] = [
        EnvironmentSignal::PrefersDark,
        EnvironmentSignal::PrefersHighContrast,
        EnvironmentSignal::PrefersReducedMotion,
    ];

    fn index(self) -> usize {
        match self {
            EnvironmentSignal::PrefersDark => 0,
            EnvironmentSignal::PrefersHighContrast => 1,
            EnvironmentSignal::PrefersReducedMotion => 2,
        }
    }
}

/// Where signal values come from
pub trait EnvironmentSource: Send + Sync {
    fn query(&self, signal: EnvironmentSignal) -> bool;
}

#[derive(Default)]
struct SimulatedState {
    dark: AtomicBool,
    high_contrast: AtomicBool,
    reduced_motion: AtomicBool,
}

/// Settable environment for headless hosts and tests
///
/// Clones share state: keep one clone, hand another to the context, and flip
/// values to simulate the user changing system settings.
#[derive(Clone, Default)]
pub struct SimulatedEnvironment {
    state: Arc<SimulatedState>,
}

impl SimulatedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dark() -> Self {
        let env = Self::new();
        env.set_prefers_dark(true);
        env
    }

    pub fn set(&self, signal: EnvironmentSignal, value: bool) {
        let slot = match signal {
            EnvironmentSignal::PrefersDark => &self.state.dark,
            EnvironmentSignal::PrefersHighContrast => &self.state.high_contrast,
            EnvironmentSignal::PrefersReducedMotion => &self.state.reduced_motion,
        };
        slot.store(value, Ordering::SeqCst);
    }

    pub fn set_prefers_dark(&self, value: bool) {
        self.set(EnvironmentSignal::PrefersDark, value);
    }

    pub fn set_high_contrast(&self, value: bool) {
        self.set(EnvironmentSignal::PrefersHighContrast, value);
    }

    pub fn set_reduced_motion(&self, value: bool) {
        self.set(EnvironmentSignal::PrefersReducedMotion, value);
    }
}

impl EnvironmentSource for SimulatedEnvironment {
    fn query(&self, signal: EnvironmentSignal) -> bool {
        match signal {
            EnvironmentSignal::PrefersDark => self.state.dark.load(Ordering::SeqCst),
            EnvironmentSignal::PrefersHighContrast => self.state.high_contrast.load(Ordering::SeqCst),
            EnvironmentSignal::PrefersReducedMotion => self.state.reduced_motion.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for SimulatedEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedEnvironment")
            .field("dark", &self.query(EnvironmentSignal::PrefersDark))
            .field("high_contrast", &self.query(EnvironmentSignal::PrefersHighContrast))
            .field("reduced_motion", &self.query(EnvironmentSignal::PrefersReducedMotion))
            .finish()
    }
}

/// The desktop's light/dark setting, as reported by the OS
///
/// High contrast and reduced motion are not exposed by the OS probe and are
/// always reported as `false`.
#[cfg(feature = "system")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

#[cfg(feature = "system")]
impl EnvironmentSource for SystemEnvironment {
    fn query(&self, signal: EnvironmentSignal) -> bool {
        match signal {
            EnvironmentSignal::PrefersDark => match dark_light::detect() {
                Ok(dark_light::Mode::Dark) => true,
                Ok(_) => false,
                Err(err) => {
                    tracing::debug!(%err, "OS theme detection failed, assuming light");
                    false
                }
            },
            EnvironmentSignal::PrefersHighContrast | EnvironmentSignal::PrefersReducedMotion => false,
        }
    }
}

new_key_type! {
    struct SubscriptionId;
}

type Callback = Arc<dyn Fn(bool) + Send + Sync>;

struct ObserverInner {
    source: Arc<dyn EnvironmentSource>,
    last: Mutex<[bool; 3]>,
    subscribers: Mutex<SlotMap<SubscriptionId, (EnvironmentSignal, Callback)>>,
}

impl ObserverInner {
    fn subscribers(&self) -> MutexGuard<'_, SlotMap<SubscriptionId, (EnvironmentSignal, Callback)>> {
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Tracks environment signals and notifies subscribers of changes
#[derive(Clone)]
pub struct EnvironmentObserver {
    inner: Arc<ObserverInner>,
}

impl EnvironmentObserver {
    pub fn new(source: Arc<dyn EnvironmentSource>) -> Self {
        let last = EnvironmentSignal::ALL.map(|signal| source.query(signal));
        Self {
            inner: Arc::new(ObserverInner {
                source,
                last: Mutex::new(last),
                subscribers: Mutex::new(SlotMap::with_key()),
            }),
        }
    }

    /// Register `callback` for changes of `signal`. The current value is read
    /// synchronously and returned as [`EnvironmentSubscription::initial`].
    pub fn subscribe<F>(&self, signal: EnvironmentSignal, callback: F) -> EnvironmentSubscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let initial = self.inner.source.query(signal);
        self.inner.last.lock().unwrap_or_else(|p| p.into_inner())[signal.index()] = initial;
        let id = self.inner.subscribers().insert((signal, Arc::new(callback)));

        EnvironmentSubscription {
            observer: Arc::downgrade(&self.inner),
            id: Some(id),
            signal,
            initial,
        }
    }

    /// Last value seen for `signal`
    pub fn current(&self, signal: EnvironmentSignal) -> bool {
        self.inner.last.lock().unwrap_or_else(|p| p.into_inner())[signal.index()]
    }

    /// Re-query the source and notify subscribers of changed signals.
    /// Returns the number of signals that changed.
    pub fn refresh(&self) -> usize {
        let mut changed = Vec::new();
        {
            let mut last = self.inner.last.lock().unwrap_or_else(|p| p.into_inner());
            for signal in EnvironmentSignal::ALL {
                let value = self.inner.source.query(signal);
                if last[signal.index()] != value {
                    last[signal.index()] = value;
                    changed.push((signal, value));
                }
            }
        }

        for &(signal, value) in &changed {
            tracing::debug!(?signal, value, "environment preference changed");
            let callbacks: Vec<Callback> = self
                .inner
                .subscribers()
                .values()
                .filter(|(s, _)| *s == signal)
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            for callback in callbacks {
                callback(value);
            }
        }

        changed.len()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.subscribers().len()
    }
}

impl std::fmt::Debug for EnvironmentObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentObserver")
            .field("last", &*self.inner.last.lock().unwrap_or_else(|p| p.into_inner()))
            .field("subscriptions", &self.active_subscriptions())
            .finish()
    }
}

/// Live subscription to one environment signal; unsubscribes on drop
#[must_use = "dropping the subscription unsubscribes the callback"]
pub struct EnvironmentSubscription {
    observer: Weak<ObserverInner>,
    id: Option<SubscriptionId>,
    signal: EnvironmentSignal,
    initial: bool,
}

impl EnvironmentSubscription {
    /// Signal value read at subscribe time
    pub fn initial(&self) -> bool {
        self.initial
    }

    pub fn signal(&self) -> EnvironmentSignal {
        self.signal
    }

    pub fn unsubscribe(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(inner) = self.observer.upgrade() {
            inner.subscribers().remove(id);
        }
    }
}

impl Drop for EnvironmentSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for EnvironmentSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentSubscription")
            .field("signal", &self.signal)
            .field("initial", &self.initial)
            .field("active", &self.id.is_some())
            .finish()
    }
}
