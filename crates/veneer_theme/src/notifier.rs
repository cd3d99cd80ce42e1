//! Change notification
//!
//! The [`Notifier`] is a small listener registry with two inputs: local
//! changes published synchronously by this context, and external changes
//! pulled from a [`ChangeTransport`] when the host calls
//! [`Notifier::poll_external`]. Listeners get one [`ChangeEvent`] per change
//! and can tell the two apart through [`ChangeEvent::originated_externally`].

use crate::config::StorageKeys;
use crate::mode::ThemeMode;
use crate::preferences::{ColorOverrides, ThemePreferences};
use crate::storage::{ChangeTransport, StorageEvent, TransportEvent};
use slotmap::{new_key_type, SlotMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

new_key_type! {
    /// Registry slot of one listener
    pub struct ListenerId;
}

/// Where a change was made
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// This execution context
    Local,
    /// Another context sharing the same medium
    External,
}

/// Payload of a change
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Mode(ThemeMode),
    Preferences(ThemePreferences),
    CustomColors(Option<ColorOverrides>),
    EnvironmentDark(bool),
    EnvironmentHighContrast(bool),
    EnvironmentReducedMotion(bool),
    /// Every persisted record was removed
    Cleared,
    /// Changes from other contexts were missed; re-read shared storage
    Resync,
}

/// Discriminant of [`Change`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Mode,
    Preferences,
    CustomColors,
    EnvironmentDark,
    EnvironmentHighContrast,
    EnvironmentReducedMotion,
    Cleared,
    Resync,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Mode(_) => ChangeKind::Mode,
            Change::Preferences(_) => ChangeKind::Preferences,
            Change::CustomColors(_) => ChangeKind::CustomColors,
            Change::EnvironmentDark(_) => ChangeKind::EnvironmentDark,
            Change::EnvironmentHighContrast(_) => ChangeKind::EnvironmentHighContrast,
            Change::EnvironmentReducedMotion(_) => ChangeKind::EnvironmentReducedMotion,
            Change::Cleared => ChangeKind::Cleared,
            Change::Resync => ChangeKind::Resync,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub change: Change,
    pub origin: ChangeOrigin,
}

impl ChangeEvent {
    pub fn local(change: Change) -> Self {
        Self {
            change,
            origin: ChangeOrigin::Local,
        }
    }

    pub fn external(change: Change) -> Self {
        Self {
            change,
            origin: ChangeOrigin::External,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }

    pub fn originated_externally(&self) -> bool {
        self.origin == ChangeOrigin::External
    }
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct NotifierInner {
    listeners: Mutex<SlotMap<ListenerId, Listener>>,
    transport: Mutex<Box<dyn ChangeTransport>>,
    keys: StorageKeys,
    default_mode: ThemeMode,
}

/// Listener registry and relay for change events
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Notifier {
    /// Create a notifier translating transport events by `keys`.
    /// A removed mode key is reported as `default_mode`.
    pub fn new(transport: Box<dyn ChangeTransport>, keys: StorageKeys, default_mode: ThemeMode) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                listeners: Mutex::new(SlotMap::with_key()),
                transport: Mutex::new(transport),
                keys,
                default_mode,
            }),
        }
    }

    /// Notifier with no external input
    pub fn local_only() -> Self {
        Self::new(
            Box::new(crate::storage::NullTransport),
            StorageKeys::default(),
            ThemeMode::default(),
        )
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.listeners().insert(Arc::new(listener));
        ListenerHandle {
            notifier: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    /// Deliver `event` to every listener registered right now.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    pub fn publish(&self, event: ChangeEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners()
            .iter()
            .map(|(id, listener)| (id, Arc::clone(listener)))
            .collect();

        tracing::trace!(kind = ?event.kind(), origin = ?event.origin, listeners = snapshot.len(), "publishing theme change");

        for (id, listener) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                tracing::error!(
                    listener = ?id,
                    kind = ?event.kind(),
                    panic = panic_message(payload.as_ref()),
                    "theme change listener panicked"
                );
            }
        }
    }

    pub fn publish_local(&self, change: Change) {
        self.publish(ChangeEvent::local(change));
    }

    /// Pull pending transport events and translate them, without publishing
    pub fn drain_external(&self) -> Vec<ChangeEvent> {
        let raw = self
            .inner
            .transport
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .poll();

        raw.into_iter()
            .filter_map(|event| self.translate(event))
            .map(ChangeEvent::external)
            .collect()
    }

    /// Pull pending transport events and publish each one. Returns how many
    /// were published.
    pub fn poll_external(&self) -> usize {
        let events = self.drain_external();
        let count = events.len();
        for event in events {
            self.publish(event);
        }
        count
    }

    fn translate(&self, event: TransportEvent) -> Option<Change> {
        match event {
            TransportEvent::Changed(event) => self.translate_write(event),
            TransportEvent::Lagged { .. } => Some(Change::Resync),
        }
    }

    fn translate_write(&self, event: StorageEvent) -> Option<Change> {
        let keys = &self.inner.keys;
        let Some(key) = event.key else {
            return Some(Change::Cleared);
        };

        let value = event.new_value.as_deref();
        if key == keys.mode {
            let default_mode = self.inner.default_mode;
            Some(Change::Mode(
                value.map_or(default_mode, |raw| ThemeMode::parse_or(raw, default_mode)),
            ))
        } else if key == keys.preferences {
            let default_mode = self.inner.default_mode;
            Some(Change::Preferences(
                value
                    .and_then(|raw| ThemePreferences::from_json_lenient(raw, default_mode))
                    .unwrap_or_else(|| ThemePreferences::with_mode(default_mode)),
            ))
        } else if key == keys.custom_colors {
            Some(Change::CustomColors(
                value.and_then(ColorOverrides::from_json_lenient),
            ))
        } else {
            tracing::trace!(key = %key, "ignoring unrelated storage change");
            None
        }
    }

    fn listeners(&self) -> MutexGuard<'_, SlotMap<ListenerId, Listener>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .field("keys", &self.inner.keys)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Registration returned by [`Notifier::add_listener`]
///
/// Dropping the handle unsubscribes; call [`detach`](Self::detach) to keep
/// the listener for the notifier's whole lifetime.
#[must_use = "dropping the handle unsubscribes the listener"]
#[derive(Debug)]
pub struct ListenerHandle {
    notifier: Weak<NotifierInner>,
    id: Option<ListenerId>,
}

impl ListenerHandle {
    /// Remove the listener. Calling this more than once is harmless.
    pub fn unsubscribe(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(inner) = self.notifier.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .remove(id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.notifier.strong_count() > 0
    }

    pub fn detach(mut self) {
        self.id = None;
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for NotifierInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierInner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContextId, StorageEvent};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted(Vec<TransportEvent>);

    impl ChangeTransport for Scripted {
        fn poll(&mut self) -> Vec<TransportEvent> {
            std::mem::take(&mut self.0)
        }
    }

    fn event(key: Option<&str>, value: Option<&str>) -> TransportEvent {
        TransportEvent::Changed(StorageEvent {
            key: key.map(Into::into),
            new_value: value.map(Into::into),
            source: ContextId(7),
        })
    }

    #[test]
    fn local_publish_reaches_every_listener() {
        let notifier = Notifier::local_only();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        let _a = notifier.add_listener(move |e| s1.lock().unwrap().push(("a", e.clone())));
        let s2 = Arc::clone(&seen);
        let _b = notifier.add_listener(move |e| s2.lock().unwrap().push(("b", e.clone())));

        notifier.publish_local(Change::Mode(ThemeMode::Dark));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, e)| !e.originated_externally()));
    }

    #[test]
    fn unsubscribe_is_idempotent_and_runs_on_drop() {
        let notifier = Notifier::local_only();
        let mut handle = notifier.add_listener(|_| {});
        let other = notifier.add_listener(|_| {});
        assert_eq!(notifier.listener_count(), 2);

        handle.unsubscribe();
        handle.unsubscribe();
        assert_eq!(notifier.listener_count(), 1);

        drop(other);
        assert_eq!(notifier.listener_count(), 0);

        notifier.add_listener(|_| {}).detach();
        assert_eq!(notifier.listener_count(), 1);
    }

    #[test]
    fn panicking_listener_does_not_stop_fan_out() {
        let notifier = Notifier::local_only();
        let calls = Arc::new(AtomicUsize::new(0));

        let _bad = notifier.add_listener(|_| panic!("listener blew up"));
        let c = Arc::clone(&calls);
        let _good = notifier.add_listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        notifier.publish_local(Change::Cleared);
        notifier.publish_local(Change::Cleared);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_may_reenter_the_notifier() {
        let notifier = Notifier::local_only();
        let inner = notifier.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _h = notifier.add_listener(move |e| {
            c.fetch_add(1, Ordering::SeqCst);
            if e.kind() == ChangeKind::Mode {
                inner.add_listener(|_| {}).detach();
                inner.publish_local(Change::Cleared);
            }
        });

        notifier.publish_local(Change::Mode(ThemeMode::Light));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.listener_count(), 2);
    }

    #[test]
    fn external_events_are_translated_by_key() {
        let keys = StorageKeys::default();
        let transport = Scripted(vec![
            event(Some(&keys.mode), Some("dark")),
            event(Some(&keys.mode), Some("garbage")),
            event(Some(&keys.mode), None),
            event(Some(&keys.custom_colors), None),
            event(Some(&keys.preferences), Some("not json")),
            event(Some("unrelated"), Some("x")),
            TransportEvent::Lagged { skipped: 3 },
            event(None, None),
        ]);
        let notifier = Notifier::new(Box::new(transport), keys, ThemeMode::Light);

        let changes: Vec<Change> = notifier
            .drain_external()
            .into_iter()
            .inspect(|e| assert!(e.originated_externally()))
            .map(|e| e.change)
            .collect();

        assert_eq!(
            changes,
            vec![
                Change::Mode(ThemeMode::Dark),
                Change::Mode(ThemeMode::Light),
                Change::Mode(ThemeMode::Light),
                Change::CustomColors(None),
                Change::Preferences(ThemePreferences::with_mode(ThemeMode::Light)),
                Change::Resync,
                Change::Cleared,
            ]
        );
        assert!(notifier.drain_external().is_empty());
    }
}
