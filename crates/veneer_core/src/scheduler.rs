//! Cooperative scheduler
//!
//! Delayed actions and frame callbacks for a single execution context.
//! Nothing runs preemptively: the host loop drives the scheduler by advancing
//! virtual time and by running frames. Timers are cancelable, so a newer
//! request can supersede an older one instead of stacking behind it.

use slotmap::{new_key_type, SlotMap};
use std::sync::Mutex;
use std::time::Duration;

new_key_type! {
    /// Handle to a pending delayed task
    pub struct TimerId;
    /// Handle to a pending frame callback
    pub struct FrameId;
}

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send>;

/// Source of delayed actions and frame callbacks
pub trait Scheduler: Send + Sync {
    /// Current time since the scheduler was created
    fn now(&self) -> Duration;

    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;

    /// Run `task` at the next frame opportunity
    fn request_frame(&self, task: Task) -> FrameId;

    /// Cancel a pending frame callback
    fn cancel_frame(&self, id: FrameId) -> bool;
}

struct PendingTimer {
    due: Duration,
    seq: u64,
    task: Task,
}

struct PendingFrame {
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct SchedulerInner {
    now: Duration,
    seq: u64,
    timers: SlotMap<TimerId, PendingTimer>,
    frames: SlotMap<FrameId, PendingFrame>,
}

/// Virtual-time scheduler driven explicitly by its owner
///
/// Tasks never run while the scheduler's lock is held, so a task may freely
/// schedule or cancel other work.
#[derive(Default)]
pub struct ManualScheduler {
    inner: Mutex<SchedulerInner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance virtual time by `delta`, firing due timers in deadline order.
    ///
    /// Timers scheduled by a firing task are honored if they fall inside the
    /// window. Returns the number of timers fired.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.lock().now + delta;
        let mut fired = 0;

        loop {
            let next = {
                let mut inner = self.lock();
                let due = inner
                    .timers
                    .iter()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(id, _)| id);
                due.and_then(|id| inner.timers.remove(id)).map(|timer| {
                    inner.now = inner.now.max(timer.due);
                    timer.task
                })
            };

            let Some(task) = next else {
                break;
            };
            task();
            fired += 1;
        }

        let mut inner = self.lock();
        inner.now = inner.now.max(target);
        tracing::trace!(now = ?inner.now, fired, "scheduler advanced");
        fired
    }

    /// Run every frame callback requested before this call.
    ///
    /// Callbacks requested while the frame runs wait for the next frame.
    /// Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let mut frames: Vec<PendingFrame> = {
            let mut inner = self.lock();
            inner.frames.drain().map(|(_, frame)| frame).collect()
        };
        frames.sort_by_key(|frame| frame.seq);

        let count = frames.len();
        for frame in frames {
            (frame.task)();
        }
        count
    }

    /// Advance time and then run one frame
    pub fn tick(&self, delta: Duration) -> usize {
        self.advance(delta) + self.run_frame()
    }

    /// Number of timers waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Number of frame callbacks waiting for the next frame
    pub fn pending_frames(&self) -> usize {
        self.lock().frames.len()
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lock().timers.values().map(|t| t.due).min()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerInner> {
        // A panicking task never holds the lock, so poisoning carries no torn state
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut inner = self.lock();
        let due = inner.now + delay;
        inner.seq += 1;
        let seq = inner.seq;
        inner.timers.insert(PendingTimer { due, seq, task })
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.lock().timers.remove(id).is_some()
    }

    fn request_frame(&self, task: Task) -> FrameId {
        let mut inner = self.lock();
        inner.seq += 1;
        let seq = inner.seq;
        inner.frames.insert(PendingFrame { seq, task })
    }

    fn cancel_frame(&self, id: FrameId) -> bool {
        self.lock().frames.remove(id).is_some()
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &inner.now)
            .field("timers", &inner.timers.len())
            .field("frames", &inner.frames.len())
            .finish()
    }
}
