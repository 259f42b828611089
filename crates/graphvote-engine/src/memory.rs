//! In-memory authoritative vote server.
//!
//! Stands in for the real backend in tests and the simulator. Keeps one tally
//! per (entity, tier) plus the current user's stance, and can be told to fail,
//! hold responses in flight, or record votes from other users.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use graphvote_core::{delta, VoteCounts, VoteStatus, VoteTier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::trace;

use crate::backend::VoteBackend;
use crate::error::{Error, Result};
use crate::wire::{UserVoteStatusResponse, VoteRequest, VoteTally};

/// Which server call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Cast,
    Remove,
    FetchStatus,
}

/// One recorded server call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub kind: CallKind,
    pub endpoint: Option<String>,
    pub entity_id: String,
    pub tier: VoteTier,
    pub status: VoteStatus,
    /// JSON body as it would go on the wire.
    pub body: Option<String>,
    pub at: Instant,
}

type TierKey = (String, VoteTier);

struct ServerInner {
    tallies: HashMap<TierKey, VoteCounts>,
    stances: HashMap<TierKey, VoteStatus>,
    fail_next: u32,
    fail_always: bool,
    fail_status_fetch: bool,
    failure_rate: f64,
    rng: StdRng,
    log: Vec<CallRecord>,
}

impl ServerInner {
    fn should_fail(&mut self) -> bool {
        if self.fail_always {
            return true;
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate)
    }
}

/// In-memory vote server with fault injection.
pub struct MemoryVoteServer {
    inner: Mutex<ServerInner>,
    /// `true` while mutation responses are released.
    gate: watch::Sender<bool>,
    /// `true` while status responses are released.
    status_gate: watch::Sender<bool>,
    calls: watch::Sender<usize>,
}

impl Default for MemoryVoteServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVoteServer {
    pub fn new() -> Self {
        Self::with_failure_rate(0.0, 0)
    }

    /// Server that fails each mutation with probability `rate`.
    pub fn with_failure_rate(rate: f64, seed: u64) -> Self {
        let (gate, _) = watch::channel(true);
        let (status_gate, _) = watch::channel(true);
        let (calls, _) = watch::channel(0);
        Self {
            inner: Mutex::new(ServerInner {
                tallies: HashMap::new(),
                stances: HashMap::new(),
                fail_next: 0,
                fail_always: false,
                fail_status_fetch: false,
                failure_rate: rate.clamp(0.0, 1.0),
                rng: StdRng::seed_from_u64(seed),
                log: Vec::new(),
            }),
            gate,
            status_gate,
            calls,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Setup ---

    /// Register an entity tier with existing counts.
    pub fn seed(&self, entity_id: &str, tier: VoteTier, counts: VoteCounts) {
        self.lock().tallies.insert((entity_id.to_string(), tier), counts);
    }

    /// Set the current user's recorded stance without touching counts.
    pub fn seed_stance(&self, entity_id: &str, tier: VoteTier, status: VoteStatus) {
        self.lock().stances.insert((entity_id.to_string(), tier), status);
    }

    /// Record a vote from some other user.
    pub fn inject_foreign_vote(&self, entity_id: &str, tier: VoteTier, status: VoteStatus) {
        let mut inner = self.lock();
        let counts = inner
            .tallies
            .entry((entity_id.to_string(), tier))
            .or_default();
        *counts = counts.apply(delta(VoteStatus::None, status).delta);
    }

    // --- Fault injection ---

    /// Fail the next `n` mutations.
    pub fn fail_next(&self, n: u32) {
        self.lock().fail_next = n;
    }

    /// Fail every mutation until turned off.
    pub fn fail_always(&self, enabled: bool) {
        self.lock().fail_always = enabled;
    }

    pub fn fail_status_fetch(&self, enabled: bool) {
        self.lock().fail_status_fetch = enabled;
    }

    /// Hold mutation responses until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Hold status responses until [`release_status_fetch`](Self::release_status_fetch).
    /// The stance is read when the query arrives, so a held response can go stale.
    pub fn hold_status_fetch(&self) {
        self.status_gate.send_replace(false);
    }

    pub fn release_status_fetch(&self) {
        self.status_gate.send_replace(true);
    }

    // --- Inspection ---

    pub fn tally(&self, entity_id: &str, tier: VoteTier) -> Option<VoteCounts> {
        self.lock().tallies.get(&(entity_id.to_string(), tier)).copied()
    }

    pub fn stance(&self, entity_id: &str, tier: VoteTier) -> VoteStatus {
        self.lock()
            .stances
            .get(&(entity_id.to_string(), tier))
            .copied()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().log.clone()
    }

    /// Number of mutation calls (cast and remove) received.
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|c| c.kind != CallKind::FetchStatus)
            .count()
    }

    /// Wait until at least `n` calls of any kind have arrived.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    fn record(
        &self,
        kind: CallKind,
        endpoint: Option<&str>,
        entity_id: &str,
        tier: VoteTier,
        status: VoteStatus,
        body: Option<String>,
    ) {
        self.lock().log.push(CallRecord {
            kind,
            endpoint: endpoint.map(str::to_string),
            entity_id: entity_id.to_string(),
            tier,
            status,
            body,
            at: Instant::now(),
        });
        self.calls.send_modify(|count| *count += 1);
    }

    async fn mutate(&self, request: &VoteRequest, kind: CallKind) -> Result<VoteTally> {
        let requested = request.requested_status();
        let body = request.body()?;
        self.record(kind, Some(&request.endpoint), &request.entity_id, request.tier, requested, body);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut inner = self.lock();
        if inner.should_fail() {
            trace!(endpoint = %request.endpoint, "Injected vote failure");
            return Err(Error::Transport("connection reset by peer".into()));
        }

        let key = (request.entity_id.clone(), request.tier);
        let current = inner.stances.get(&key).copied().unwrap_or_default();
        let transition = delta(current, requested);

        let Some(counts) = inner.tallies.get_mut(&key) else {
            return Err(Error::Rejected {
                status: 404,
                message: format!("no {} tally for {}", request.tier, request.entity_id),
            });
        };
        *counts = counts.apply(transition.delta);
        let tally = VoteTally::from(*counts);
        inner.stances.insert(key, transition.next_status);

        Ok(tally)
    }
}

#[async_trait]
impl VoteBackend for MemoryVoteServer {
    async fn cast(&self, request: &VoteRequest) -> Result<VoteTally> {
        self.mutate(request, CallKind::Cast).await
    }

    async fn remove(&self, request: &VoteRequest) -> Result<VoteTally> {
        self.mutate(request, CallKind::Remove).await
    }

    async fn fetch_user_vote_status(&self, entity_id: &str, tier: VoteTier) -> Result<UserVoteStatusResponse> {
        self.record(CallKind::FetchStatus, None, entity_id, tier, VoteStatus::None, None);
        let response = {
            let inner = self.lock();
            if inner.fail_status_fetch {
                Err(Error::Transport("status query timed out".into()))
            } else {
                let status = inner.stances.get(&(entity_id.to_string(), tier)).copied();
                Ok(UserVoteStatusResponse {
                    status: status.filter(|s| s.is_vote()),
                })
            }
        };

        let mut gate = self.status_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        response
    }
}
