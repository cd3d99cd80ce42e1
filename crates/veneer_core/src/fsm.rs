//! State Machine Runtime
//!
//! Small typed state machines for component lifecycles.
//! Supports:
//! - Flat state machines over `Copy` state and event enums
//! - Guards (conditional transitions)
//! - Entry/exit actions
//! - Transition actions
//! - Bounded transition history for debugging

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

/// A guard function that determines if a transition should occur
pub type Guard = Box<dyn Fn() -> bool + Send>;

/// An action function executed during transitions
pub type Action = Box<dyn FnMut() + Send>;

const DEFAULT_HISTORY_LIMIT: usize = 32;

/// A transition in the state machine
pub struct Transition<S, E> {
    pub from_state: S,
    pub event: E,
    pub to_state: S,
    pub guard: Option<Guard>,
    pub actions: SmallVec<[Action; 2]>,
}

impl<S, E> Transition<S, E> {
    /// Create a simple transition without guard or actions
    pub fn new(from: S, event: E, to: S) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
            guard: None,
            actions: SmallVec::new(),
        }
    }

    /// Add a guard condition
    pub fn with_guard<F: Fn() -> bool + Send + 'static>(mut self, guard: F) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Add an action to execute during transition
    pub fn with_action<F: FnMut() + Send + 'static>(mut self, action: F) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    fn matches(&self, state: S, event: E) -> bool
    where
        S: PartialEq,
        E: PartialEq,
    {
        self.from_state == state
            && self.event == event
            && self.guard.as_ref().map_or(true, |guard| guard())
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
    exit_callbacks: FxHashMap<S, Vec<Action>>,
    history_limit: usize,
}

impl<S, E> StateMachineBuilder<S, E>
where
    S: Copy + Eq + Hash,
    E: Copy + Eq,
{
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Add a transition
    pub fn transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add a simple transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push(Transition::new(from, event, to));
        self
    }

    /// Add an entry action for a state
    pub fn on_enter<F: FnMut() + Send + 'static>(mut self, state: S, action: F) -> Self {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Add an exit action for a state
    pub fn on_exit<F: FnMut() + Send + 'static>(mut self, state: S, action: F) -> Self {
        self.exit_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Keep at most `limit` entries of transition history
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the state machine
    pub fn build(self) -> StateMachine<S, E> {
        StateMachine {
            current_state: self.initial_state,
            transitions: self.transitions,
            entry_callbacks: self.entry_callbacks,
            exit_callbacks: self.exit_callbacks,
            history: VecDeque::new(),
            history_limit: self.history_limit,
        }
    }
}

/// A state machine instance
pub struct StateMachine<S, E> {
    current_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
    exit_callbacks: FxHashMap<S, Vec<Action>>,
    history: VecDeque<(S, E, S)>,
    history_limit: usize,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash,
    E: Copy + Eq,
{
    /// Create a state machine with an initial state and transitions
    pub fn new(initial_state: S, transitions: Vec<Transition<S, E>>) -> Self {
        Self {
            current_state: initial_state,
            transitions,
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Create a builder for a state machine
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    /// Get the current state
    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &(S, E, S)> {
        self.history.iter()
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an event can trigger a transition from current state
    pub fn can_send(&self, event: E) -> bool {
        let current = self.current_state;
        self.transitions.iter().any(|t| t.matches(current, event))
    }

    /// Send an event, returning the resulting state
    pub fn send(&mut self, event: E) -> S {
        self.try_send(event).unwrap_or(self.current_state)
    }

    /// Send an event, returning the new state only if a transition fired
    pub fn try_send(&mut self, event: E) -> Option<S> {
        let current = self.current_state;
        let idx = self
            .transitions
            .iter()
            .position(|t| t.matches(current, event))?;

        let to_state = self.transitions[idx].to_state;

        if let Some(callbacks) = self.exit_callbacks.get_mut(&current) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }

        for action in self.transitions[idx].actions.iter_mut() {
            action();
        }

        self.current_state = to_state;

        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back((current, event, to_state));
        }

        if let Some(callbacks) = self.entry_callbacks.get_mut(&to_state) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }

        Some(to_state)
    }
}

impl<S: fmt::Debug, E> fmt::Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current_state", &self.current_state)
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Phase {
        Idle,
        Busy,
        Done,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Input {
        Start,
        Finish,
        Reset,
    }

    fn job() -> StateMachine<Phase, Input> {
        StateMachine::new(
            Phase::Idle,
            vec![
                Transition::new(Phase::Idle, Input::Start, Phase::Busy),
                Transition::new(Phase::Busy, Input::Start, Phase::Busy),
                Transition::new(Phase::Busy, Input::Finish, Phase::Done),
                Transition::new(Phase::Done, Input::Reset, Phase::Idle),
            ],
        )
    }

    #[test]
    fn walks_the_table() {
        let mut fsm = job();
        assert_eq!(fsm.send(Input::Start), Phase::Busy);
        assert_eq!(fsm.send(Input::Finish), Phase::Done);
        assert_eq!(fsm.send(Input::Reset), Phase::Idle);
    }

    #[test]
    fn unknown_event_keeps_state() {
        let mut fsm = job();
        assert_eq!(fsm.try_send(Input::Finish), None);
        assert!(fsm.is_in(Phase::Idle));
        assert!(!fsm.can_send(Input::Reset));
        assert!(fsm.can_send(Input::Start));
    }

    #[test]
    fn guard_blocks_transition() {
        let open = Arc::new(AtomicBool::new(false));
        let gate = open.clone();
        let mut fsm = StateMachine::builder(Phase::Idle)
            .transition(
                Transition::new(Phase::Idle, Input::Start, Phase::Busy)
                    .with_guard(move || gate.load(Ordering::SeqCst)),
            )
            .build();

        assert_eq!(fsm.send(Input::Start), Phase::Idle);
        open.store(true, Ordering::SeqCst);
        assert_eq!(fsm.send(Input::Start), Phase::Busy);
    }

    #[test]
    fn self_transition_reruns_exit_and_entry() {
        let entered = Arc::new(AtomicUsize::new(0));
        let exited = Arc::new(AtomicUsize::new(0));
        let (e, x) = (entered.clone(), exited.clone());

        let mut fsm = StateMachine::builder(Phase::Idle)
            .on(Phase::Idle, Input::Start, Phase::Busy)
            .on(Phase::Busy, Input::Start, Phase::Busy)
            .on_enter(Phase::Busy, move || {
                e.fetch_add(1, Ordering::SeqCst);
            })
            .on_exit(Phase::Busy, move || {
                x.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        fsm.send(Input::Start);
        fsm.send(Input::Start);
        assert_eq!(entered.load(Ordering::SeqCst), 2);
        assert_eq!(exited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transition_actions_run() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut fsm = StateMachine::builder(Phase::Idle)
            .transition(
                Transition::new(Phase::Idle, Input::Start, Phase::Busy).with_action(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .build();

        fsm.send(Input::Start);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_is_bounded() {
        let mut fsm = StateMachine::builder(Phase::Idle)
            .on(Phase::Idle, Input::Start, Phase::Busy)
            .on(Phase::Busy, Input::Start, Phase::Busy)
            .history_limit(2)
            .build();

        fsm.send(Input::Start);
        fsm.send(Input::Start);
        fsm.send(Input::Start);

        let history: Vec<_> = fsm.history().copied().collect();
        assert_eq!(
            history,
            vec![
                (Phase::Busy, Input::Start, Phase::Busy),
                (Phase::Busy, Input::Start, Phase::Busy),
            ]
        );
    }
}
