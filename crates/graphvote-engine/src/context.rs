//! Per-(entity, tier) vote configuration.

use graphvote_core::{EntityKind, VoteStatus, VoteTier};

use crate::error::{Error, Result};
use crate::wire::{VotePayload, VoteRequest};

/// Endpoint path with an `{id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    pub const ID_PLACEHOLDER: &'static str = "{id}";

    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the entity id.
    pub fn render(&self, entity_id: &str) -> String {
        self.0.replace(Self::ID_PLACEHOLDER, entity_id)
    }
}

/// Immutable configuration bound to one vote controller.
///
/// An entity with both tiers gets two of these and they never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteIntentContext {
    pub entity_id: String,
    pub kind: EntityKind,
    pub tier: VoteTier,
    pub cast_endpoint: EndpointTemplate,
    pub remove_endpoint: EndpointTemplate,
    pub metadata_key: String,
}

impl VoteIntentContext {
    /// Context with the default endpoints `/nodes/{kind}/{id}/vote-{tier}` and
    /// `/nodes/{kind}/{id}/vote-{tier}/remove`.
    pub fn for_entity(kind: EntityKind, entity_id: impl Into<String>, tier: VoteTier) -> Result<Self> {
        if !kind.supports(tier) {
            return Err(Error::UnsupportedTier { kind, tier });
        }
        let cast = format!("/nodes/{}/{}/vote-{}", kind, EndpointTemplate::ID_PLACEHOLDER, tier);
        let remove = format!("{}/remove", cast);
        Ok(Self {
            entity_id: entity_id.into(),
            kind,
            tier,
            cast_endpoint: EndpointTemplate::new(cast),
            remove_endpoint: EndpointTemplate::new(remove),
            metadata_key: tier.metadata_key().to_string(),
        })
    }

    #[must_use]
    pub fn with_endpoints(mut self, cast: EndpointTemplate, remove: EndpointTemplate) -> Self {
        self.cast_endpoint = cast;
        self.remove_endpoint = remove;
        self
    }

    #[must_use]
    pub fn with_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.metadata_key = key.into();
        self
    }

    /// Build the network call for `requested`: remove for `None`, cast otherwise.
    pub fn request_for(&self, requested: VoteStatus) -> VoteRequest {
        let template = if requested.is_vote() {
            &self.cast_endpoint
        } else {
            &self.remove_endpoint
        };
        VoteRequest {
            endpoint: template.render(&self.entity_id),
            entity_id: self.entity_id.clone(),
            tier: self.tier,
            payload: VotePayload::for_status(self.tier, requested),
        }
    }
}
