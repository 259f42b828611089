//! Per-entity vote controllers.

use std::sync::Arc;

use graphvote_core::{effective_presentation, EntityKind, Presentation, VoteStatus, VoteTier};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::backend::VoteBackend;
use crate::config::EngineConfig;
use crate::context::VoteIntentContext;
use crate::controller::{InitialVotes, VoteController, VoteOutcome};
use crate::error::{Error, Result};
use crate::metadata::MetadataStore;
use crate::visibility::VisibilityWatcher;

/// Vote counts delivered with a node's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVoteSummary {
    pub inclusion_positive_votes: u64,
    pub inclusion_negative_votes: u64,
    #[serde(default)]
    pub content_positive_votes: u64,
    #[serde(default)]
    pub content_negative_votes: u64,
}

/// The vote controllers for one entity: inclusion always, content when the
/// kind supports it. The two never share state.
pub struct EntityVotes {
    kind: EntityKind,
    entity_id: String,
    inclusion: Arc<VoteController>,
    content: Option<Arc<VoteController>>,
    visibility: Arc<VisibilityWatcher>,
}

impl EntityVotes {
    /// Build controllers with default endpoints for each tier of `kind`.
    pub fn new(
        kind: EntityKind,
        entity_id: impl Into<String>,
        backend: Arc<dyn VoteBackend>,
        metadata: Arc<dyn MetadataStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        let entity_id = entity_id.into();
        let build = |tier| -> Result<Arc<VoteController>> {
            let context = VoteIntentContext::for_entity(kind, entity_id.clone(), tier)?;
            Ok(Arc::new(VoteController::new(
                context,
                Arc::clone(&backend),
                Arc::clone(&metadata),
                config,
            )))
        };

        let inclusion = build(VoteTier::Inclusion)?;
        let content = if kind.supports_content_voting() {
            Some(build(VoteTier::Content)?)
        } else {
            None
        };

        let visibility = Arc::new(VisibilityWatcher::new(inclusion.state().net()));
        inclusion.observe(visibility.clone());

        Ok(Self {
            kind,
            entity_id,
            inclusion,
            content,
            visibility,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Seed both tiers and reconcile stances with the server concurrently.
    pub async fn initialize(&self, summary: NodeVoteSummary, skip_status_fetch: bool) {
        let inclusion = InitialVotes {
            positive_votes: summary.inclusion_positive_votes,
            negative_votes: summary.inclusion_negative_votes,
            skip_status_fetch,
        };
        match &self.content {
            Some(content) => {
                let content_votes = InitialVotes {
                    positive_votes: summary.content_positive_votes,
                    negative_votes: summary.content_negative_votes,
                    skip_status_fetch,
                };
                tokio::join!(
                    self.inclusion.initialize(inclusion),
                    content.initialize(content_votes)
                );
            }
            None => self.inclusion.initialize(inclusion).await,
        }
    }

    pub fn inclusion(&self) -> &Arc<VoteController> {
        &self.inclusion
    }

    pub fn content(&self) -> Option<&Arc<VoteController>> {
        self.content.as_ref()
    }

    pub fn controller(&self, tier: VoteTier) -> Result<&Arc<VoteController>> {
        match tier {
            VoteTier::Inclusion => Ok(&self.inclusion),
            VoteTier::Content => self.content.as_ref().ok_or(Error::UnsupportedTier {
                kind: self.kind,
                tier,
            }),
        }
    }

    /// Route a vote intent to the tier's controller.
    pub async fn handle_vote(&self, tier: VoteTier, requested: VoteStatus) -> Result<VoteOutcome> {
        Ok(self.controller(tier)?.handle_vote(requested).await)
    }

    /// Changes whenever detail visibility flips.
    pub fn visibility(&self) -> watch::Receiver<bool> {
        self.visibility.subscribe()
    }

    pub fn can_show_detail(&self) -> bool {
        self.visibility.can_show_detail()
    }

    /// Presentation the node may actually use when `requested` is asked for.
    pub fn presentation(&self, requested: Presentation) -> Presentation {
        effective_presentation(requested, self.inclusion.state().net())
    }

    pub fn teardown(&self) {
        self.inclusion.teardown();
        if let Some(content) = &self.content {
            content.teardown();
        }
    }
}
