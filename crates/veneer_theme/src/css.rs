//! CSS bridge
//!
//! Writes the resolved theme onto a document root as custom properties and
//! `data-*` marker attributes. Writes requested during one turn of the host
//! loop are coalesced into a single [`StyleBatch`] applied on the next frame.

use crate::cache::ThemeConfiguration;
use crate::preferences::ColorOverrides;
use crate::tokens::ColorToken;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use veneer_core::{FrameId, Scheduler, Task};

pub const ATTR_MODE: &str = "data-theme-mode";
pub const ATTR_THEME: &str = "data-theme";
pub const ATTR_LOADING: &str = "data-theme-loading";
pub const ATTR_TRANSITIONING: &str = "data-theme-transitioning";
pub const ATTR_HIGH_CONTRAST: &str = "data-high-contrast";
pub const ATTR_REDUCED_MOTION: &str = "data-reduced-motion";

/// Custom properties published for every theme, by suffix
pub const THEME_VARIABLES: [(&str, ColorToken); 7] = [
    ("bg-default", ColorToken::Background),
    ("bg-paper", ColorToken::Paper),
    ("text-primary", ColorToken::TextPrimary),
    ("text-secondary", ColorToken::TextSecondary),
    ("border", ColorToken::Border),
    ("primary", ColorToken::Primary),
    ("focus-ring", ColorToken::FocusRing),
];

/// Custom property values for `config`, custom overrides first
pub fn theme_variables(
    prefix: &str,
    config: &ThemeConfiguration,
    overrides: Option<&ColorOverrides>,
) -> BTreeMap<String, String> {
    THEME_VARIABLES
        .iter()
        .map(|&(suffix, token)| {
            let color = overrides
                .and_then(|o| o.get(token))
                .unwrap_or_else(|| config.colors.get(token));
            (format!("--{prefix}-{suffix}"), color.to_css())
        })
        .collect()
}

/// Style writes applied together in one frame
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleBatch {
    pub properties: Vec<(String, String)>,
    /// `None` removes the attribute
    pub attributes: Vec<(String, Option<String>)>,
}

impl StyleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), Some(value.into())));
        self
    }

    pub fn remove_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push((name.into(), None));
        self
    }

    /// Set the attribute to `"true"` when `on`, remove it otherwise
    pub fn flag(self, name: impl Into<String>, on: bool) -> Self {
        if on {
            self.attribute(name, "true")
        } else {
            self.remove_attribute(name)
        }
    }

    /// Append `other`; its writes win over ours
    pub fn merge(&mut self, other: StyleBatch) {
        self.properties.extend(other.properties);
        self.attributes.extend(other.attributes);
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.attributes.is_empty()
    }
}

/// Receiver of style batches, typically the document root element
pub trait StyleTarget: Send + Sync {
    fn apply(&self, batch: &StyleBatch);
}

#[derive(Debug, Default)]
struct DocumentState {
    properties: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    batches: usize,
}

/// In-memory document root
///
/// Clones share state, so a host can keep one to read back what the engine
/// wrote.
#[derive(Clone, Debug, Default)]
pub struct DocumentRoot {
    state: Arc<Mutex<DocumentState>>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, name: &str) -> Option<String> {
        self.lock().properties.get(name).cloned()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.lock().attributes.get(name).cloned()
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        self.lock().properties.clone()
    }

    /// Number of batches applied so far
    pub fn batches_applied(&self) -> usize {
        self.lock().batches
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl StyleTarget for DocumentRoot {
    fn apply(&self, batch: &StyleBatch) {
        let mut state = self.lock();
        for (name, value) in &batch.properties {
            state.properties.insert(name.clone(), value.clone());
        }
        for (name, value) in &batch.attributes {
            match value {
                Some(value) => state.attributes.insert(name.clone(), value.clone()),
                None => state.attributes.remove(name),
            };
        }
        state.batches += 1;
    }
}

struct BridgeInner {
    target: Arc<dyn StyleTarget>,
    pending: Mutex<Option<(FrameId, StyleBatch)>>,
    after_flush: Mutex<Vec<Task>>,
}

impl BridgeInner {
    fn flush(&self) {
        let batch = self.pending.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some((_, batch)) = batch {
            tracing::trace!(
                properties = batch.properties.len(),
                attributes = batch.attributes.len(),
                "applying theme styles"
            );
            self.target.apply(&batch);
        }
        self.run_after_flush();
    }

    fn run_after_flush(&self) {
        let tasks = std::mem::take(&mut *self.after_flush.lock().unwrap_or_else(|p| p.into_inner()));
        for task in tasks {
            task();
        }
    }
}

/// Coalesces style writes into one batch per frame
#[derive(Clone)]
pub struct CssBridge {
    scheduler: Arc<dyn Scheduler>,
    inner: Arc<BridgeInner>,
}

impl CssBridge {
    pub fn new(scheduler: Arc<dyn Scheduler>, target: Arc<dyn StyleTarget>) -> Self {
        Self {
            scheduler,
            inner: Arc::new(BridgeInner {
                target,
                pending: Mutex::new(None),
                after_flush: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue `batch` for the next frame, merging with anything already queued
    pub fn schedule(&self, batch: StyleBatch) {
        if batch.is_empty() {
            return;
        }
        let mut pending = self.pending();
        match pending.as_mut() {
            Some((_, queued)) => queued.merge(batch),
            None => {
                let weak: Weak<BridgeInner> = Arc::downgrade(&self.inner);
                let frame = self.scheduler.request_frame(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.flush();
                    }
                }));
                *pending = Some((frame, batch));
            }
        }
    }

    /// Apply `batch` right away, after anything still queued
    pub fn apply_now(&self, batch: StyleBatch) {
        let queued = self.pending().take();
        let mut combined = match queued {
            Some((frame, queued)) => {
                self.scheduler.cancel_frame(frame);
                queued
            }
            None => StyleBatch::new(),
        };
        combined.merge(batch);
        if !combined.is_empty() {
            self.inner.target.apply(&combined);
        }
        self.inner.run_after_flush();
    }

    /// Run `task` once everything queued so far has been applied. Runs right
    /// away when nothing is queued.
    pub fn after_flush(&self, task: Task) {
        let pending = self.pending();
        if pending.is_none() {
            drop(pending);
            task();
            return;
        }
        self.inner
            .after_flush
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(task);
    }

    /// Drop queued writes, and anything waiting on them, without applying them
    pub fn cancel_pending(&self) -> bool {
        self.inner
            .after_flush
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
        match self.pending().take() {
            Some((frame, _)) => {
                self.scheduler.cancel_frame(frame);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending().is_some()
    }

    fn pending(&self) -> MutexGuard<'_, Option<(FrameId, StyleBatch)>> {
        self.inner.pending.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for CssBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssBridge")
            .field("pending", &self.has_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BundleCatalog;
    use crate::theme::ColorScheme;
    use veneer_core::{Color, ManualScheduler};

    #[test]
    fn writes_in_one_turn_land_in_one_batch() {
        let scheduler = Arc::new(ManualScheduler::new());
        let root = DocumentRoot::new();
        let bridge = CssBridge::new(scheduler.clone(), Arc::new(root.clone()));

        bridge.schedule(StyleBatch::new().attribute(ATTR_THEME, "light"));
        bridge.schedule(StyleBatch::new().attribute(ATTR_THEME, "dark").flag(ATTR_LOADING, true));
        assert_eq!(root.batches_applied(), 0);
        assert_eq!(scheduler.pending_frames(), 1);

        scheduler.run_frame();
        assert_eq!(root.batches_applied(), 1);
        assert_eq!(root.attribute(ATTR_THEME).as_deref(), Some("dark"));
        assert_eq!(root.attribute(ATTR_LOADING).as_deref(), Some("true"));

        bridge.schedule(StyleBatch::new().flag(ATTR_LOADING, false));
        scheduler.run_frame();
        assert_eq!(root.attribute(ATTR_LOADING), None);
    }

    #[test]
    fn cancel_drops_queued_writes() {
        let scheduler = Arc::new(ManualScheduler::new());
        let root = DocumentRoot::new();
        let bridge = CssBridge::new(scheduler.clone(), Arc::new(root.clone()));

        bridge.schedule(StyleBatch::new().property("--x", "1"));
        assert!(bridge.cancel_pending());
        scheduler.run_frame();
        assert_eq!(root.property("--x"), None);
    }

    #[test]
    fn apply_now_flushes_queue_first() {
        let scheduler = Arc::new(ManualScheduler::new());
        let root = DocumentRoot::new();
        let bridge = CssBridge::new(scheduler.clone(), Arc::new(root.clone()));

        bridge.schedule(StyleBatch::new().property("--x", "queued").property("--y", "queued"));
        bridge.apply_now(StyleBatch::new().property("--x", "now"));
        assert_eq!(root.property("--x").as_deref(), Some("now"));
        assert_eq!(root.property("--y").as_deref(), Some("queued"));
        assert_eq!(scheduler.pending_frames(), 0);
    }

    #[test]
    fn after_flush_waits_for_the_queued_batch() {
        let scheduler = Arc::new(ManualScheduler::new());
        let root = DocumentRoot::new();
        let bridge = CssBridge::new(scheduler.clone(), Arc::new(root.clone()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        bridge.schedule(StyleBatch::new().attribute(ATTR_THEME, "dark"));
        let doc = root.clone();
        let sink = Arc::clone(&seen);
        bridge.after_flush(Box::new(move || {
            sink.lock().unwrap().push(doc.attribute(ATTR_THEME));
        }));
        assert!(seen.lock().unwrap().is_empty());

        scheduler.run_frame();
        assert_eq!(*seen.lock().unwrap(), vec![Some("dark".to_string())]);

        // nothing queued: runs immediately
        let sink = Arc::clone(&seen);
        bridge.after_flush(Box::new(move || sink.lock().unwrap().push(None)));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn cancel_drops_after_flush_tasks() {
        let scheduler = Arc::new(ManualScheduler::new());
        let bridge = CssBridge::new(scheduler.clone(), Arc::new(DocumentRoot::new()));
        let ran = Arc::new(Mutex::new(false));

        bridge.schedule(StyleBatch::new().property("--x", "1"));
        let flag = Arc::clone(&ran);
        bridge.after_flush(Box::new(move || *flag.lock().unwrap() = true));
        bridge.cancel_pending();
        scheduler.run_frame();
        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn variables_prefer_overrides() {
        let config = ThemeConfiguration::build(ColorScheme::Light, &BundleCatalog::default());
        let red = Color::from_hex(0xFF0000);
        let overrides = ColorOverrides::new().with(ColorToken::Primary, red);

        let vars = theme_variables("app", &config, Some(&overrides));
        assert_eq!(vars.len(), THEME_VARIABLES.len());
        assert_eq!(vars["--app-primary"], red.to_css());
        assert_eq!(vars["--app-bg-default"], config.colors.background.to_css());
    }
}
