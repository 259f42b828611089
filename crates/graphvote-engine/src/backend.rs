//! Network boundary for vote mutations and status queries.
//!
//! Transport, auth and timeouts live beneath this trait. The controller treats
//! every `Err` the same way: roll back, then retry per policy.

use async_trait::async_trait;
use graphvote_core::VoteTier;

use crate::error::Result;
use crate::wire::{UserVoteStatusResponse, VoteRequest, VoteTally};

/// Server calls used by vote controllers.
///
/// Casts are idempotent: repeating a cast with the same stance must not
/// double count.
#[async_trait]
pub trait VoteBackend: Send + Sync {
    /// Record `request.payload`'s stance and return the authoritative tally.
    async fn cast(&self, request: &VoteRequest) -> Result<VoteTally>;

    /// Clear the user's stance and return the authoritative tally.
    async fn remove(&self, request: &VoteRequest) -> Result<VoteTally>;

    /// Current user's stance on one tier of an entity.
    async fn fetch_user_vote_status(
        &self,
        entity_id: &str,
        tier: VoteTier,
    ) -> Result<UserVoteStatusResponse>;

    /// Dispatch to cast or remove depending on the request.
    async fn submit(&self, request: &VoteRequest) -> Result<VoteTally> {
        if request.payload.is_some() {
            self.cast(request).await
        } else {
            self.remove(request).await
        }
    }
}
