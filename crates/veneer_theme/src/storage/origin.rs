//! Origin-scoped storage shared by several execution contexts
//!
//! [`SharedOrigin`] is the medium: one map plus a broadcast channel carrying
//! every write. Each context opens its own [`OriginStorage`] handle; writes
//! through a handle are tagged with that handle's [`ContextId`] so its
//! [`BroadcastTransport`] can skip them. Writes are last-writer-wins.

use super::{ChangeTransport, ContextId, StorageBackend, StorageEvent, TransportEvent};
use crate::error::StorageError;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

const CHANNEL_CAPACITY: usize = 256;

struct OriginInner {
    items: RwLock<FxHashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_context: AtomicU64,
    available: AtomicBool,
}

/// The medium shared by every context of one origin
#[derive(Clone)]
pub struct SharedOrigin {
    inner: Arc<OriginInner>,
}

impl SharedOrigin {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Medium whose contexts each buffer at most `capacity` unread writes
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(OriginInner {
                items: RwLock::new(FxHashMap::default()),
                events,
                next_context: AtomicU64::new(1),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Attach a new execution context
    pub fn open_context(&self) -> OriginStorage {
        let id = ContextId(self.inner.next_context.fetch_add(1, Ordering::Relaxed));
        tracing::trace!(context = id.0, "opened origin context");
        OriginStorage {
            origin: self.clone(),
            context: id,
        }
    }

    /// Disable or re-enable the medium for every context
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Read a value without going through a context
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .items
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }
}

impl Default for SharedOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedOrigin")
            .field("receivers", &self.inner.events.receiver_count())
            .field("available", &self.inner.available.load(Ordering::SeqCst))
            .finish()
    }
}

/// One context's handle onto a [`SharedOrigin`]
#[derive(Clone, Debug)]
pub struct OriginStorage {
    origin: SharedOrigin,
    context: ContextId,
}

impl OriginStorage {
    pub fn context(&self) -> ContextId {
        self.context
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.origin.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }

    fn announce(&self, key: Option<&str>, new_value: Option<&str>) {
        // No receivers is fine; nobody else is listening yet.
        let _ = self.origin.inner.events.send(StorageEvent {
            key: key.map(str::to_string),
            new_value: new_value.map(str::to_string),
            source: self.context,
        });
    }
}

impl StorageBackend for OriginStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.origin.peek(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        let previous = self
            .origin
            .inner
            .items
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());

        if previous.as_deref() != Some(value) {
            self.announce(Some(key), Some(value));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        let previous = self
            .origin
            .inner
            .items
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);

        if previous.is_some() {
            self.announce(Some(key), None);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.check()?;
        let mut items = self
            .origin
            .inner
            .items
            .write()
            .unwrap_or_else(|p| p.into_inner());
        let had_items = !items.is_empty();
        items.clear();
        drop(items);

        if had_items {
            self.announce(None, None);
        }
        Ok(())
    }

    fn transport(&self) -> Box<dyn ChangeTransport> {
        Box::new(BroadcastTransport {
            context: self.context,
            rx: self.origin.inner.events.subscribe(),
        })
    }
}

/// Receives writes made on a [`SharedOrigin`] by every other context
#[derive(Debug)]
pub struct BroadcastTransport {
    context: ContextId,
    rx: broadcast::Receiver<StorageEvent>,
}

impl ChangeTransport for BroadcastTransport {
    fn poll(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.source == self.context => continue,
                Ok(event) => events.push(TransportEvent::Changed(event)),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        context = self.context.0,
                        skipped,
                        "theme change events dropped, resyncing"
                    );
                    events.push(TransportEvent::Lagged { skipped });
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }
}
