//! Vote Controller - optimistic voting for one (entity, tier).
//!
//! Turns a click into a vote: the state is updated immediately, the server is
//! called, and the result is either reconciled to the server's authoritative
//! tally or rolled back and retried.
//!
//! # State Machine
//!
//! ```text
//! Idle ──handle_vote──▶ Voting ──ok──▶ Idle(success)
//!                         │
//!                        err
//!                         ▼
//!                    RetryPending ──delay──▶ Voting
//!                         │
//!                     exhausted
//!                         ▼
//!                   Idle(failure)
//! ```
//!
//! The in-flight flag stays set from the moment an intent is accepted until
//! it resolves or is abandoned, including while a retry is pending. A second
//! intent in that window is rejected, never queued.
//!
//! Teardown may land in Voting or RetryPending. Nothing touches the state
//! afterwards: a late response is dropped and no display timer is started.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use graphvote_core::{VoteCounts, VoteStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::backend::VoteBackend;
use crate::config::EngineConfig;
use crate::context::VoteIntentContext;
use crate::error::{Error, Result};
use crate::metadata::{MetadataStore, MetadataSynchronizer};
use crate::state::{LastOutcome, VoteGate, VoteObserver, VoteState, VoteStateContainer};
use crate::wire::VoteRequest;

/// Counts already known when a node enters view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialVotes {
    pub positive_votes: u64,
    pub negative_votes: u64,

    /// Trust the cached stance and do not ask the server.
    pub skip_status_fetch: bool,
}

impl InitialVotes {
    pub fn new(positive_votes: u64, negative_votes: u64) -> Self {
        Self {
            positive_votes,
            negative_votes,
            skip_status_fetch: false,
        }
    }

    #[must_use]
    pub fn skip_status_fetch(mut self) -> Self {
        self.skip_status_fetch = true;
        self
    }
}

/// Result of [`VoteController::handle_vote`].
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// Another vote on this tier was in flight, or the controller is torn down.
    Rejected,
    /// Requested stance equals the current one.
    NoOp,
    /// The server accepted the vote; `counts` are its authoritative tally.
    Success { counts: VoteCounts, attempts: u32 },
    /// Every attempt failed; state is back where it started.
    Failed { error: Error, attempts: u32 },
    /// Torn down before the vote resolved; state was left as it stood.
    Abandoned { attempts: u32 },
}

impl VoteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Network calls made for this intent.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Rejected | Self::NoOp => 0,
            Self::Success { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Abandoned { attempts } => *attempts,
        }
    }
}

/// Orchestrates votes for one (entity, tier).
pub struct VoteController {
    context: Arc<VoteIntentContext>,
    state: Arc<VoteStateContainer>,
    backend: Arc<dyn VoteBackend>,
    config: EngineConfig,

    /// Flips to `true` once on teardown.
    shutdown: watch::Sender<bool>,

    /// Pending reset of the outcome indicator.
    outcome_timer: Mutex<Option<JoinHandle<()>>>,
}

impl VoteController {
    /// Create a controller, seeding the stance from cached metadata.
    pub fn new(
        context: VoteIntentContext,
        backend: Arc<dyn VoteBackend>,
        metadata: Arc<dyn MetadataStore>,
        config: EngineConfig,
    ) -> Self {
        let cached = metadata
            .read(&context.entity_id, &context.metadata_key)
            .unwrap_or_default();
        let context = Arc::new(context);
        let state = Arc::new(VoteStateContainer::new(
            Arc::clone(&context),
            VoteState {
                user_status: cached,
                ..Default::default()
            },
        ));
        state.observe(Arc::new(MetadataSynchronizer::new(metadata)));

        let (shutdown, _) = watch::channel(false);

        debug!(
            entity_id = %context.entity_id,
            tier = %context.tier,
            cached = %cached,
            "Created vote controller"
        );

        Self {
            context,
            state,
            backend,
            config,
            shutdown,
            outcome_timer: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &VoteIntentContext {
        &self.context
    }

    /// Current state.
    pub fn state(&self) -> VoteState {
        self.state.snapshot()
    }

    /// Async view of state changes for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<VoteState> {
        self.state.subscribe()
    }

    /// Attach a synchronous observer.
    pub fn observe(&self, observer: Arc<dyn VoteObserver>) {
        self.state.observe(observer);
    }

    pub fn is_torn_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Seed counts and reconcile the stance with the server.
    ///
    /// A failed status fetch is logged and the stance falls back to none; node
    /// rendering is never blocked on it. A vote opened while the fetch is out
    /// always wins over the fetched stance.
    pub async fn initialize(&self, initial: InitialVotes) {
        if self.is_torn_down() {
            return;
        }

        let counts = VoteCounts::new(initial.positive_votes, initial.negative_votes);
        let Some(generation) = self.state.seed_counts(counts) else {
            warn!(
                entity_id = %self.context.entity_id,
                tier = %self.context.tier,
                "Ignoring initialize while a vote is in flight"
            );
            return;
        };

        if initial.skip_status_fetch {
            return;
        }

        let server_status = match self
            .backend
            .fetch_user_vote_status(&self.context.entity_id, self.context.tier)
            .await
        {
            Ok(response) => response.status(),
            Err(e) => {
                warn!(
                    entity_id = %self.context.entity_id,
                    tier = %self.context.tier,
                    error = %e,
                    "Could not fetch user vote status, assuming none"
                );
                VoteStatus::None
            }
        };

        if self.is_torn_down() {
            return;
        }
        match self.state.resolve_user_status(server_status, generation) {
            None => debug!(
                entity_id = %self.context.entity_id,
                tier = %self.context.tier,
                "Vote opened during status fetch, discarding fetched status"
            ),
            Some(cached) if cached != server_status => debug!(
                entity_id = %self.context.entity_id,
                tier = %self.context.tier,
                %cached,
                server = %server_status,
                "Cached vote status disagrees with server"
            ),
            Some(_) => {}
        }
    }

    /// Handle one vote intent. Never fails; every result is a [`VoteOutcome`].
    pub async fn handle_vote(&self, requested: VoteStatus) -> VoteOutcome {
        if self.is_torn_down() {
            debug!(entity_id = %self.context.entity_id, "Vote after teardown rejected");
            return VoteOutcome::Rejected;
        }

        let (snapshot, transition) = match self.state.begin_vote(requested) {
            VoteGate::Busy => {
                debug!(
                    entity_id = %self.context.entity_id,
                    tier = %self.context.tier,
                    %requested,
                    "Vote already in flight, rejecting"
                );
                return VoteOutcome::Rejected;
            }
            VoteGate::NoOp(_) => {
                trace!(entity_id = %self.context.entity_id, %requested, "No-op vote");
                return VoteOutcome::NoOp;
            }
            VoteGate::Open {
                snapshot,
                transition,
            } => (snapshot, transition),
        };

        // A stale display timer must not clear this vote's outcome.
        self.cancel_outcome_timer();

        let request = self.context.request_for(requested);
        let policy = self.config.retry;
        let mut attempt = 1;

        loop {
            let optimistic = self.state.apply(transition);
            debug!(
                entity_id = %self.context.entity_id,
                tier = %self.context.tier,
                attempt,
                counts = %optimistic.counts,
                status = %optimistic.user_status,
                "Applied optimistic vote"
            );

            let response = self.submit(&request).await;
            if self.is_torn_down() {
                return self.abandon(attempt);
            }

            let error = match response {
                Ok(counts) => {
                    self.state.reconcile(counts, transition.next_status);
                    self.state.finish_vote(LastOutcome::Success, Some(requested));
                    self.schedule_outcome_reset(LastOutcome::Success);
                    info!(
                        entity_id = %self.context.entity_id,
                        tier = %self.context.tier,
                        attempt,
                        counts = %counts,
                        "Vote confirmed"
                    );
                    return VoteOutcome::Success {
                        counts,
                        attempts: attempt,
                    };
                }
                Err(e) => e,
            };

            self.state.restore(&snapshot);

            let Some(delay) = policy.delay_before(attempt + 1) else {
                self.state.finish_vote(LastOutcome::Failure, Some(requested));
                self.schedule_outcome_reset(LastOutcome::Failure);
                warn!(
                    entity_id = %self.context.entity_id,
                    tier = %self.context.tier,
                    attempts = attempt,
                    error = %error,
                    "Vote failed, retries exhausted"
                );
                return VoteOutcome::Failed {
                    error,
                    attempts: attempt,
                };
            };

            debug!(
                entity_id = %self.context.entity_id,
                tier = %self.context.tier,
                attempt,
                ?delay,
                error = %error,
                "Vote failed, retry scheduled"
            );

            if !self.sleep_unless_torn_down(delay).await {
                return self.abandon(attempt);
            }

            attempt += 1;
        }
    }

    /// Stop pending retries and timers. Idempotent; also runs on drop.
    pub fn teardown(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        self.cancel_outcome_timer();
        debug!(
            entity_id = %self.context.entity_id,
            tier = %self.context.tier,
            "Vote controller torn down"
        );
    }

    /// State is left exactly as it was at teardown.
    fn abandon(&self, attempts: u32) -> VoteOutcome {
        debug!(
            entity_id = %self.context.entity_id,
            tier = %self.context.tier,
            attempts,
            "Vote abandoned on teardown"
        );
        VoteOutcome::Abandoned { attempts }
    }

    async fn submit(&self, request: &VoteRequest) -> Result<VoteCounts> {
        self.backend.submit(request).await?.counts()
    }

    /// Returns `false` if teardown happened before the delay elapsed.
    async fn sleep_unless_torn_down(&self, delay: Duration) -> bool {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow_and_update() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = shutdown.wait_for(|down| *down) => false,
        }
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.outcome_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_outcome_reset(&self, outcome: LastOutcome) {
        let mut slot = self.timer_slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        // Checked under the slot lock so teardown cannot miss the new timer.
        if self.is_torn_down() {
            return;
        }
        let window = self.config.outcome_display;
        let state = Arc::clone(&self.state);
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            state.clear_outcome(outcome);
        }));
    }

    fn cancel_outcome_timer(&self) {
        if let Some(timer) = self.timer_slot().take() {
            timer.abort();
        }
    }
}

impl Drop for VoteController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphvote_core::{EntityKind, VoteTier};
    use tokio::time::Instant;

    use crate::memory::{CallKind, MemoryVoteServer};
    use crate::metadata::InMemoryMetadata;

    const ENTITY: &str = "s-1";

    struct Harness {
        server: Arc<MemoryVoteServer>,
        metadata: Arc<InMemoryMetadata>,
        controller: Arc<VoteController>,
    }

    async fn harness(positive: u64, negative: u64) -> Harness {
        let server = Arc::new(MemoryVoteServer::new());
        server.seed(ENTITY, VoteTier::Inclusion, VoteCounts::new(positive, negative));
        let metadata = Arc::new(InMemoryMetadata::new());
        let controller = controller_for(&server, &metadata);
        controller
            .initialize(InitialVotes::new(positive, negative).skip_status_fetch())
            .await;
        Harness {
            server,
            metadata,
            controller,
        }
    }

    fn controller_for(server: &Arc<MemoryVoteServer>, metadata: &Arc<InMemoryMetadata>) -> Arc<VoteController> {
        let ctx = VoteIntentContext::for_entity(EntityKind::Statement, ENTITY, VoteTier::Inclusion).unwrap();
        Arc::new(VoteController::new(
            ctx,
            server.clone(),
            metadata.clone(),
            EngineConfig::default(),
        ))
    }

    fn spawn_vote(controller: &Arc<VoteController>, status: VoteStatus) -> JoinHandle<VoteOutcome> {
        let controller = Arc::clone(controller);
        tokio::spawn(async move { controller.handle_vote(status).await })
    }

    fn mirrored(h: &Harness) -> Option<VoteStatus> {
        h.metadata.read(ENTITY, "inclusionVoteStatus")
    }

    #[tokio::test(start_paused = true)]
    async fn click_applies_optimistically_then_confirms() {
        let h = harness(5, 2).await;

        h.server.hold();
        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;

        let mid = h.controller.state();
        assert_eq!(mid.counts, VoteCounts::new(6, 2));
        assert_eq!(mid.user_status, VoteStatus::Agree);
        assert!(mid.is_voting);
        assert_eq!(mirrored(&h), Some(VoteStatus::Agree));

        h.server.release();
        let outcome = pending.await.unwrap();
        assert!(matches!(
            outcome,
            VoteOutcome::Success { counts, attempts: 1 } if counts == VoteCounts::new(6, 2)
        ));

        let done = h.controller.state();
        assert_eq!(done.counts, VoteCounts::new(6, 2));
        assert_eq!(done.user_status, VoteStatus::Agree);
        assert!(!done.is_voting);
        assert_eq!(done.last_outcome, LastOutcome::Success);
        assert_eq!(done.last_vote_type, Some(VoteStatus::Agree));

        // Switching stance moves one vote across.
        h.server.hold();
        let pending = spawn_vote(&h.controller, VoteStatus::Disagree);
        h.server.wait_for_calls(2).await;
        assert_eq!(h.controller.state().counts, VoteCounts::new(5, 3));
        h.server.release();
        assert!(pending.await.unwrap().is_success());
        assert_eq!(h.server.tally(ENTITY, VoteTier::Inclusion), Some(VoteCounts::new(5, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn second_click_while_voting_is_rejected() {
        let h = harness(5, 2).await;

        h.server.hold();
        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;

        let outcome = h.controller.handle_vote(VoteStatus::Disagree).await;
        assert!(matches!(outcome, VoteOutcome::Rejected));
        assert_eq!(h.controller.state().counts, VoteCounts::new(6, 2));
        assert_eq!(h.controller.state().user_status, VoteStatus::Agree);

        h.server.release();
        assert!(pending.await.unwrap().is_success());
        assert_eq!(h.server.mutation_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn same_status_is_noop_without_network() {
        let h = harness(5, 2).await;
        let before = h.controller.state();

        let outcome = h.controller.handle_vote(VoteStatus::None).await;
        assert!(matches!(outcome, VoteOutcome::NoOp));
        assert_eq!(outcome.attempts(), 0);
        assert_eq!(h.controller.state(), before);
        assert!(h.server.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn server_counts_win_over_optimistic_counts() {
        let h = harness(5, 2).await;
        // Two other users voted since the node was loaded.
        h.server.inject_foreign_vote(ENTITY, VoteTier::Inclusion, VoteStatus::Agree);
        h.server.inject_foreign_vote(ENTITY, VoteTier::Inclusion, VoteStatus::Disagree);

        let outcome = h.controller.handle_vote(VoteStatus::Agree).await;
        assert!(outcome.is_success());

        let state = h.controller.state();
        assert_eq!(state.counts, VoteCounts::new(7, 3));
        assert_ne!(state.counts, VoteCounts::new(6, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_server_gets_three_attempts() {
        let h = harness(5, 2).await;
        h.server.fail_always(true);
        let before = h.controller.state();

        let (error, attempts) = match h.controller.handle_vote(VoteStatus::Agree).await {
            VoteOutcome::Failed { error, attempts } => (error, attempts),
            other => panic!("expected failure, got {:?}", other),
        };
        assert_eq!(attempts, 3);
        assert!(matches!(error, Error::Transport(_)));

        let calls = h.server.calls();
        assert_eq!(calls.len(), 3);
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1].at - w[0].at).collect();
        assert!(gaps[0] >= Duration::from_secs(1) && gaps[0] < Duration::from_millis(1100));
        assert!(gaps[1] >= Duration::from_secs(2) && gaps[1] < Duration::from_millis(2100));

        let after = h.controller.state();
        assert_eq!(after.counts, before.counts);
        assert_eq!(after.user_status, before.user_status);
        assert!(!after.is_voting);
        assert_eq!(after.last_outcome, LastOutcome::Failure);
        assert_eq!(mirrored(&h), Some(VoteStatus::None));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_pending_keeps_rolled_back_state_locked() {
        let h = harness(5, 2).await;
        h.server.fail_next(1);

        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;

        let waiting = h.controller.state();
        assert_eq!(waiting.counts, VoteCounts::new(5, 2));
        assert_eq!(waiting.user_status, VoteStatus::None);
        assert!(waiting.is_voting);
        assert_eq!(mirrored(&h), Some(VoteStatus::None));
        assert!(matches!(
            h.controller.handle_vote(VoteStatus::Disagree).await,
            VoteOutcome::Rejected
        ));

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, VoteOutcome::Success { attempts: 2, .. }));
        assert_eq!(h.controller.state().counts, VoteCounts::new(6, 2));
        assert_eq!(h.controller.state().last_outcome, LastOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_abandons_pending_retry() {
        let h = harness(5, 2).await;
        h.server.fail_always(true);

        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;
        h.controller.teardown();
        let at_teardown = h.controller.state();

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, VoteOutcome::Abandoned { attempts: 1 }));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.server.mutation_count(), 1);

        let state = h.controller.state();
        assert_eq!(state, at_teardown);
        assert_eq!(state.counts, VoteCounts::new(5, 2));
        assert!(matches!(
            h.controller.handle_vote(VoteStatus::Agree).await,
            VoteOutcome::Rejected
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_drops_in_flight_response() {
        let h = harness(5, 2).await;

        h.server.hold();
        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;
        h.controller.teardown();
        let at_teardown = h.controller.state();
        assert_eq!(at_teardown.counts, VoteCounts::new(6, 2));

        // The server still records the vote; the torn-down controller ignores it.
        h.server.inject_foreign_vote(ENTITY, VoteTier::Inclusion, VoteStatus::Agree);
        h.server.release();
        assert!(matches!(pending.await.unwrap(), VoteOutcome::Abandoned { attempts: 1 }));
        assert_eq!(h.server.tally(ENTITY, VoteTier::Inclusion), Some(VoteCounts::new(7, 2)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.controller.state(), at_teardown);
    }

    #[tokio::test(start_paused = true)]
    async fn no_display_timer_after_teardown() {
        let h = harness(5, 2).await;
        assert!(h.controller.handle_vote(VoteStatus::Agree).await.is_success());
        h.controller.teardown();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.controller.state().last_outcome, LastOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn success_indicator_is_transient() {
        let h = harness(5, 2).await;
        assert!(h.controller.handle_vote(VoteStatus::Agree).await.is_success());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(h.controller.state().last_outcome, LastOutcome::Success);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let state = h.controller.state();
        assert_eq!(state.last_outcome, LastOutcome::None);
        assert_eq!(state.last_vote_type, Some(VoteStatus::Agree));
    }

    #[tokio::test(start_paused = true)]
    async fn new_vote_restarts_display_window() {
        let h = harness(5, 2).await;
        assert!(h.controller.handle_vote(VoteStatus::Agree).await.is_success());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.controller.handle_vote(VoteStatus::None).await.is_success());

        // The first window would have ended here.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let state = h.controller.state();
        assert_eq!(state.last_outcome, LastOutcome::Success);
        assert_eq!(state.last_vote_type, Some(VoteStatus::None));
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_vote_calls_remove_endpoint() {
        let h = harness(5, 2).await;
        assert!(h.controller.handle_vote(VoteStatus::Agree).await.is_success());
        assert!(h.controller.handle_vote(VoteStatus::None).await.is_success());

        let calls = h.server.calls();
        assert_eq!(calls[0].kind, CallKind::Cast);
        assert_eq!(calls[1].kind, CallKind::Remove);
        assert_eq!(
            calls[1].endpoint.as_deref(),
            Some("/nodes/statement/s-1/vote-inclusion/remove")
        );
        assert_eq!(h.controller.state().counts, VoteCounts::new(5, 2));
        assert_eq!(mirrored(&h), Some(VoteStatus::None));
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_prefers_server_status() {
        let server = Arc::new(MemoryVoteServer::new());
        server.seed(ENTITY, VoteTier::Inclusion, VoteCounts::new(3, 0));
        server.seed_stance(ENTITY, VoteTier::Inclusion, VoteStatus::Agree);
        let metadata = Arc::new(InMemoryMetadata::new());
        metadata.write(ENTITY, "inclusionVoteStatus", VoteStatus::Disagree);

        let controller = controller_for(&server, &metadata);
        assert_eq!(controller.state().user_status, VoteStatus::Disagree);

        controller.initialize(InitialVotes::new(3, 0)).await;
        let state = controller.state();
        assert_eq!(state.counts, VoteCounts::new(3, 0));
        assert_eq!(state.user_status, VoteStatus::Agree);
        assert_eq!(metadata.read(ENTITY, "inclusionVoteStatus"), Some(VoteStatus::Agree));
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_degrades_when_status_fetch_fails() {
        let server = Arc::new(MemoryVoteServer::new());
        server.seed(ENTITY, VoteTier::Inclusion, VoteCounts::new(3, 0));
        server.fail_status_fetch(true);
        let metadata = Arc::new(InMemoryMetadata::new());
        metadata.write(ENTITY, "inclusionVoteStatus", VoteStatus::Agree);

        let controller = controller_for(&server, &metadata);
        controller.initialize(InitialVotes::new(3, 0)).await;

        let state = controller.state();
        assert_eq!(state.counts, VoteCounts::new(3, 0));
        assert_eq!(state.user_status, VoteStatus::None);
        assert!(!state.is_voting);
    }

    #[tokio::test(start_paused = true)]
    async fn vote_during_status_fetch_wins_over_fetched_status() {
        let server = Arc::new(MemoryVoteServer::new());
        server.seed(ENTITY, VoteTier::Inclusion, VoteCounts::new(5, 2));
        let metadata = Arc::new(InMemoryMetadata::new());
        let controller = controller_for(&server, &metadata);

        server.hold_status_fetch();
        let init = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.initialize(InitialVotes::new(5, 2)).await })
        };
        server.wait_for_calls(1).await;

        // The query saw no vote; the click lands and confirms before it returns.
        assert!(controller.handle_vote(VoteStatus::Agree).await.is_success());
        server.release_status_fetch();
        init.await.unwrap();

        let state = controller.state();
        assert_eq!(state.counts, VoteCounts::new(6, 2));
        assert_eq!(state.user_status, VoteStatus::Agree);
        assert_eq!(metadata.read(ENTITY, "inclusionVoteStatus"), Some(VoteStatus::Agree));

        // Removing the vote still reaches the server.
        assert!(controller.handle_vote(VoteStatus::None).await.is_success());
        assert_eq!(controller.state().counts, VoteCounts::new(5, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn skip_status_fetch_keeps_cached_stance() {
        let server = Arc::new(MemoryVoteServer::new());
        server.seed(ENTITY, VoteTier::Inclusion, VoteCounts::new(3, 0));
        let metadata = Arc::new(InMemoryMetadata::new());
        metadata.write(ENTITY, "inclusionVoteStatus", VoteStatus::Agree);

        let controller = controller_for(&server, &metadata);
        controller
            .initialize(InitialVotes::new(3, 0).skip_status_fetch())
            .await;

        assert_eq!(controller.state().user_status, VoteStatus::Agree);
        assert!(server.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_optimistic_and_final_states() {
        let h = harness(5, 2).await;
        let mut rx = h.controller.subscribe();
        rx.borrow_and_update();

        h.server.hold();
        let pending = spawn_vote(&h.controller, VoteStatus::Agree);
        h.server.wait_for_calls(1).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().counts, VoteCounts::new(6, 2));

        h.server.release();
        pending.await.unwrap();
        assert!(!rx.borrow_and_update().is_voting);
    }

    #[test]
    fn outcome_attempts() {
        assert_eq!(VoteOutcome::Rejected.attempts(), 0);
        assert_eq!(VoteOutcome::Abandoned { attempts: 2 }.attempts(), 2);
        assert!(!VoteOutcome::NoOp.is_success());
    }
}
