//! Observable vote state for one (entity, tier).
//!
//! The container has exactly one writer, its controller. Observers are
//! called synchronously after every mutation, outside the state lock, and a
//! `watch` channel carries the same state to async readers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use graphvote_core::{delta, Transition, VoteCounts, VoteStatus};
use serde::Serialize;
use tokio::sync::watch;

use crate::context::VoteIntentContext;

/// Outcome of the most recent completed vote, shown transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LastOutcome {
    #[default]
    None,
    Success,
    Failure,
}

/// Mutable state for one (entity, tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    pub counts: VoteCounts,
    pub user_status: VoteStatus,
    pub is_voting: bool,
    pub last_outcome: LastOutcome,
    pub last_vote_type: Option<VoteStatus>,
}

impl VoteState {
    pub fn net(&self) -> i64 {
        self.counts.net()
    }
}

/// Result of trying to open a vote on the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteGate {
    /// Another vote is in flight.
    Busy,
    /// Requested stance equals the current one.
    NoOp(VoteState),
    /// The in-flight flag is now set; `snapshot` is the state just before.
    Open {
        snapshot: VoteState,
        transition: Transition,
    },
}

/// Read-only subscriber to state changes.
pub trait VoteObserver: Send + Sync {
    fn state_changed(&self, context: &VoteIntentContext, state: &VoteState);
}

struct Slot {
    state: VoteState,
    /// Number of votes opened so far.
    generation: u64,
}

/// Holds the state for one controller.
///
/// Lock order is state, then observers.
pub struct VoteStateContainer {
    context: Arc<VoteIntentContext>,
    slot: Mutex<Slot>,
    observers: Mutex<Vec<Arc<dyn VoteObserver>>>,
    updates: watch::Sender<VoteState>,
}

impl VoteStateContainer {
    pub fn new(context: Arc<VoteIntentContext>, initial: VoteState) -> Self {
        let (updates, _) = watch::channel(initial);
        Self {
            context,
            slot: Mutex::new(Slot {
                state: initial,
                generation: 0,
            }),
            observers: Mutex::new(Vec::new()),
            updates,
        }
    }

    pub fn context(&self) -> &VoteIntentContext {
        &self.context
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> MutexGuard<'_, Vec<Arc<dyn VoteObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> VoteState {
        self.lock().state
    }

    /// Number of votes opened on this container. Changes on every accepted
    /// [`begin_vote`](Self::begin_vote).
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Async view of every state change.
    pub fn subscribe(&self) -> watch::Receiver<VoteState> {
        self.updates.subscribe()
    }

    /// Register a synchronous observer. It is immediately told the current
    /// state and sees every mutation after it.
    pub fn observe(&self, observer: Arc<dyn VoteObserver>) {
        let state = {
            let slot = self.lock();
            self.observers().push(Arc::clone(&observer));
            slot.state
        };
        observer.state_changed(&self.context, &state);
    }

    fn update(&self, mutate: impl FnOnce(&mut VoteState)) -> VoteState {
        let (state, observers) = {
            let mut slot = self.lock();
            mutate(&mut slot.state);
            (slot.state, self.observers().clone())
        };
        self.notify(&state, observers);
        state
    }

    fn notify(&self, state: &VoteState, observers: Vec<Arc<dyn VoteObserver>>) {
        for observer in observers {
            observer.state_changed(&self.context, state);
        }
        self.updates.send_replace(*state);
    }

    /// Check the in-flight flag and the transition table, and set the flag if a
    /// vote may proceed. Check and set happen under one lock.
    pub fn begin_vote(&self, requested: VoteStatus) -> VoteGate {
        let (gate, state, observers) = {
            let mut slot = self.lock();
            if slot.state.is_voting {
                return VoteGate::Busy;
            }
            let transition = delta(slot.state.user_status, requested);
            if transition.is_noop() {
                return VoteGate::NoOp(slot.state);
            }
            let snapshot = slot.state;
            slot.state.is_voting = true;
            slot.generation += 1;
            let gate = VoteGate::Open {
                snapshot,
                transition,
            };
            (gate, slot.state, self.observers().clone())
        };
        self.notify(&state, observers);
        gate
    }

    /// Optimistically apply a transition to counts and stance.
    pub fn apply(&self, transition: Transition) -> VoteState {
        self.update(|state| {
            state.counts = state.counts.apply(transition.delta);
            state.user_status = transition.next_status;
        })
    }

    /// Replace counts and stance with server-confirmed values.
    pub fn reconcile(&self, counts: VoteCounts, status: VoteStatus) -> VoteState {
        self.update(|state| {
            state.counts = counts;
            state.user_status = status;
        })
    }

    /// Put back everything captured in `snapshot` except the in-flight flag,
    /// which belongs to the controller.
    pub fn restore(&self, snapshot: &VoteState) -> VoteState {
        self.update(|state| {
            *state = VoteState {
                is_voting: state.is_voting,
                ..*snapshot
            };
        })
    }

    /// Clear the in-flight flag and record the outcome.
    pub fn finish_vote(&self, outcome: LastOutcome, vote_type: Option<VoteStatus>) -> VoteState {
        self.update(|state| {
            state.is_voting = false;
            state.last_outcome = outcome;
            state.last_vote_type = vote_type;
        })
    }

    /// Return the outcome indicator to neutral if it still shows `expected`.
    pub fn clear_outcome(&self, expected: LastOutcome) -> bool {
        let mut cleared = false;
        self.update(|state| {
            if !state.is_voting && state.last_outcome == expected {
                state.last_outcome = LastOutcome::None;
                cleared = true;
            }
        });
        cleared
    }

    /// Seed counts from already-known values unless a vote is in flight.
    ///
    /// Returns the generation the counts were seeded at.
    pub fn seed_counts(&self, counts: VoteCounts) -> Option<u64> {
        let (generation, state, observers) = {
            let mut slot = self.lock();
            if slot.state.is_voting {
                return None;
            }
            slot.state.counts = counts;
            (slot.generation, slot.state, self.observers().clone())
        };
        self.notify(&state, observers);
        Some(generation)
    }

    /// Set the stance reported by the server, provided no vote has been opened
    /// since `generation`. A newer vote always wins over an older fetch.
    ///
    /// Returns the stance it replaced.
    pub fn resolve_user_status(&self, status: VoteStatus, generation: u64) -> Option<VoteStatus> {
        let (previous, state, observers) = {
            let mut slot = self.lock();
            if slot.state.is_voting || slot.generation != generation {
                return None;
            }
            let previous = slot.state.user_status;
            slot.state.user_status = status;
            (previous, slot.state, self.observers().clone())
        };
        self.notify(&state, observers);
        Some(previous)
    }
}
