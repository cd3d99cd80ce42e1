//! Transition controller
//!
//! Brackets visual changes so they happen in one coordinated window:
//!
//! ```text
//! Idle --Mount--> Loading --Reveal--> Idle
//! Idle --Begin--> Transitioning --End--> Idle
//!                 Transitioning --Begin--> Transitioning (timer restarted)
//! ```
//!
//! Only one end-of-transition timer is ever outstanding. A new `begin`
//! cancels the pending timer and schedules a fresh one, so rapid changes
//! produce a single `Ended` at `last_begin + duration`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use veneer_core::{Scheduler, StateMachine, TimerId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionState {
    #[default]
    Idle,
    /// Content hidden until the first configuration is applied
    Loading,
    Transitioning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionInput {
    Mount,
    Reveal,
    Begin,
    End,
}

/// Emitted to [`TransitionController::on_event`] listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    LoadingStarted,
    ContentRevealed { at: Duration },
    Began { at: Duration },
    Ended { at: Duration },
}

type EventListener = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;

struct TransitionInner {
    scheduler: Arc<dyn Scheduler>,
    machine: Mutex<StateMachine<TransitionState, TransitionInput>>,
    suppressed: Arc<AtomicBool>,
    reveal_delay: Duration,
    pending_end: Mutex<Option<TimerId>>,
    pending_reveal: Mutex<Option<TimerId>>,
    listeners: Mutex<Vec<EventListener>>,
}

#[derive(Clone)]
pub struct TransitionController {
    inner: Arc<TransitionInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl TransitionController {
    pub fn new(scheduler: Arc<dyn Scheduler>, reveal_delay: Duration, suppress_interaction: bool) -> Self {
        let suppressed = Arc::new(AtomicBool::new(false));
        let enter_flag = Arc::clone(&suppressed);
        let exit_flag = Arc::clone(&suppressed);

        use TransitionInput::*;
        use TransitionState::*;
        let machine = StateMachine::builder(Idle)
            .on(Idle, Mount, Loading)
            .on(Loading, Reveal, Idle)
            .on(Idle, Begin, Transitioning)
            .on(Transitioning, Begin, Transitioning)
            .on(Transitioning, End, Idle)
            .on_enter(Transitioning, move || {
                enter_flag.store(suppress_interaction, Ordering::SeqCst)
            })
            .on_exit(Transitioning, move || exit_flag.store(false, Ordering::SeqCst))
            .build();

        Self {
            inner: Arc::new(TransitionInner {
                scheduler,
                machine: Mutex::new(machine),
                suppressed,
                reveal_delay,
                pending_end: Mutex::new(None),
                pending_reveal: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> TransitionState {
        lock(&self.inner.machine).current_state()
    }

    /// True while transitioning, if interaction suppression is configured
    pub fn is_interaction_suppressed(&self) -> bool {
        self.inner.suppressed.load(Ordering::SeqCst)
    }

    /// Recent `(from, input, to)` steps, oldest first
    pub fn history(&self) -> Vec<(TransitionState, TransitionInput, TransitionState)> {
        lock(&self.inner.machine).history().copied().collect()
    }

    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        lock(&self.inner.listeners).push(Arc::new(listener));
    }

    /// Hide content until [`content_ready`](Self::content_ready) reveals it
    pub fn begin_loading(&self) -> bool {
        if self.send(TransitionInput::Mount).is_none() {
            return false;
        }
        tracing::trace!("theme content hidden while loading");
        self.emit(TransitionEvent::LoadingStarted);
        true
    }

    /// Schedule the reveal after the configured delay
    pub fn content_ready(&self) {
        if self.state() != TransitionState::Loading {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let id = self.inner.scheduler.schedule(
            self.inner.reveal_delay,
            Box::new(move || {
                if let Some(controller) = Self::upgrade(&weak) {
                    controller.reveal();
                }
            }),
        );
        if let Some(previous) = lock(&self.inner.pending_reveal).replace(id) {
            self.inner.scheduler.cancel(previous);
        }
    }

    /// Open (or extend) a transition window lasting `duration`.
    ///
    /// Returns `false` while content is still loading. A zero duration opens
    /// and closes the window immediately.
    pub fn begin_transition(&self, duration: Duration) -> bool {
        if self.send(TransitionInput::Begin).is_none() {
            tracing::trace!("theme transition skipped while loading");
            return false;
        }

        if let Some(previous) = lock(&self.inner.pending_end).take() {
            self.inner.scheduler.cancel(previous);
        }

        let at = self.inner.scheduler.now();
        tracing::debug!(?duration, "theme transition started");
        self.emit(TransitionEvent::Began { at });

        if duration.is_zero() {
            self.finish();
            return true;
        }

        let weak = Arc::downgrade(&self.inner);
        let id = self.inner.scheduler.schedule(
            duration,
            Box::new(move || {
                if let Some(controller) = Self::upgrade(&weak) {
                    lock(&controller.inner.pending_end).take();
                    controller.finish();
                }
            }),
        );
        *lock(&self.inner.pending_end) = Some(id);
        true
    }

    /// Cancel outstanding timers without emitting events
    pub fn cancel_pending(&self) {
        for slot in [&self.inner.pending_end, &self.inner.pending_reveal] {
            if let Some(id) = lock(slot).take() {
                self.inner.scheduler.cancel(id);
            }
        }
    }

    fn reveal(&self) {
        lock(&self.inner.pending_reveal).take();
        if self.send(TransitionInput::Reveal).is_some() {
            let at = self.inner.scheduler.now();
            tracing::trace!(?at, "theme content revealed");
            self.emit(TransitionEvent::ContentRevealed { at });
        }
    }

    fn finish(&self) {
        if self.send(TransitionInput::End).is_some() {
            let at = self.inner.scheduler.now();
            tracing::debug!(?at, "theme transition ended");
            self.emit(TransitionEvent::Ended { at });
        }
    }

    fn send(&self, input: TransitionInput) -> Option<TransitionState> {
        lock(&self.inner.machine).try_send(input)
    }

    fn emit(&self, event: TransitionEvent) {
        let listeners: Vec<EventListener> = lock(&self.inner.listeners).clone();
        for listener in listeners {
            listener(&event);
        }
    }

    fn upgrade(weak: &Weak<TransitionInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl std::fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionController")
            .field("state", &self.state())
            .field("suppressed", &self.is_interaction_suppressed())
            .field("pending_end", &*lock(&self.inner.pending_end))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use veneer_core::ManualScheduler;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller() -> (Arc<ManualScheduler>, TransitionController, Arc<Mutex<Vec<TransitionEvent>>>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let controller = TransitionController::new(scheduler.clone(), ms(100), true);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        controller.on_event(move |e| sink.lock().unwrap().push(*e));
        (scheduler, controller, events)
    }

    #[test]
    fn loading_reveals_after_delay() {
        let (scheduler, controller, events) = controller();
        assert!(controller.begin_loading());
        controller.content_ready();
        assert_eq!(controller.state(), TransitionState::Loading);

        scheduler.advance(ms(99));
        assert_eq!(controller.state(), TransitionState::Loading);
        scheduler.advance(ms(1));
        assert_eq!(controller.state(), TransitionState::Idle);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TransitionEvent::LoadingStarted,
                TransitionEvent::ContentRevealed { at: ms(100) }
            ]
        );
    }

    #[test]
    fn begin_is_refused_while_loading() {
        let (_scheduler, controller, _events) = controller();
        controller.begin_loading();
        assert!(!controller.begin_transition(ms(300)));
        assert_eq!(controller.state(), TransitionState::Loading);
    }

    #[test]
    fn rapid_begins_end_once() {
        let (scheduler, controller, events) = controller();

        controller.begin_transition(ms(300));
        scheduler.advance(ms(100));
        controller.begin_transition(ms(300));
        assert!(controller.is_interaction_suppressed());
        assert_eq!(scheduler.pending_timers(), 1);

        scheduler.advance(ms(250));
        assert_eq!(controller.state(), TransitionState::Transitioning);
        scheduler.advance(ms(50));
        assert_eq!(controller.state(), TransitionState::Idle);
        assert!(!controller.is_interaction_suppressed());

        let ended: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, TransitionEvent::Ended { .. }))
            .copied()
            .collect();
        assert_eq!(ended, vec![TransitionEvent::Ended { at: ms(400) }]);
    }

    #[test]
    fn zero_duration_closes_immediately() {
        let (scheduler, controller, events) = controller();
        assert!(controller.begin_transition(Duration::ZERO));
        assert_eq!(controller.state(), TransitionState::Idle);
        assert_eq!(scheduler.pending_timers(), 0);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn suppression_can_be_disabled() {
        let scheduler = Arc::new(ManualScheduler::new());
        let controller = TransitionController::new(scheduler, ms(100), false);
        controller.begin_transition(ms(300));
        assert_eq!(controller.state(), TransitionState::Transitioning);
        assert!(!controller.is_interaction_suppressed());
    }

    #[test]
    fn cancel_pending_drops_timers() {
        let (scheduler, controller, _events) = controller();
        controller.begin_transition(ms(300));
        controller.cancel_pending();
        assert_eq!(scheduler.pending_timers(), 0);
        assert_eq!(
            controller.history(),
            vec![(TransitionState::Idle, TransitionInput::Begin, TransitionState::Transitioning)]
        );
    }
}
