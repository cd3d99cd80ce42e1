//! Persistence backends
//!
//! A [`StorageBackend`] is a flat string key/value medium. Backends that are
//! shared between several execution contexts also hand out a
//! [`ChangeTransport`] through which a context learns about writes made by
//! the others.

mod file;
mod memory;
mod origin;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use origin::{BroadcastTransport, OriginStorage, SharedOrigin};

use crate::error::StorageError;

/// Identifies one execution context attached to a shared medium
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

/// A write observed on a shared medium
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed; `None` when the whole medium was cleared
    pub key: Option<String>,
    /// New value; `None` when the key was removed
    pub new_value: Option<String>,
    /// Context that performed the write
    pub source: ContextId,
}

/// What a [`ChangeTransport`] delivers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Changed(StorageEvent),
    /// The receiver fell behind and `skipped` writes were lost; the medium
    /// has to be re-read to catch up
    Lagged { skipped: u64 },
}

impl From<StorageEvent> for TransportEvent {
    fn from(event: StorageEvent) -> Self {
        TransportEvent::Changed(event)
    }
}

/// Source of change events written by other contexts
pub trait ChangeTransport: Send {
    /// Drain every event received since the last poll
    fn poll(&mut self) -> Vec<TransportEvent>;
}

/// Transport for single-context backends; never yields anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransport;

impl ChangeTransport for NullTransport {
    fn poll(&mut self) -> Vec<TransportEvent> {
        Vec::new()
    }
}

/// Key/value persistence medium
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;

    /// Transport delivering writes made by other contexts
    fn transport(&self) -> Box<dyn ChangeTransport> {
        Box::new(NullTransport)
    }
}

/// Backend that refuses everything, as when storage is disabled by privacy
/// settings
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStorage;

impl StorageBackend for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
