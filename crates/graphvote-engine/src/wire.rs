//! Request and response shapes exchanged with the vote server.

use graphvote_core::{VoteCounts, VoteStatus, VoteTier};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Authoritative tally returned by cast and remove calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub positive_votes: i64,
    pub negative_votes: i64,
}

impl VoteTally {
    pub fn counts(&self) -> Result<VoteCounts> {
        let positive = u64::try_from(self.positive_votes).map_err(|_| {
            Error::InvalidResponse(format!("negative positiveVotes: {}", self.positive_votes))
        })?;
        let negative = u64::try_from(self.negative_votes).map_err(|_| {
            Error::InvalidResponse(format!("negative negativeVotes: {}", self.negative_votes))
        })?;
        Ok(VoteCounts::new(positive, negative))
    }
}

impl From<VoteCounts> for VoteTally {
    fn from(counts: VoteCounts) -> Self {
        Self {
            positive_votes: i64::try_from(counts.positive).unwrap_or(i64::MAX),
            negative_votes: i64::try_from(counts.negative).unwrap_or(i64::MAX),
        }
    }
}

/// Body of a cast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    pub is_positive: bool,
    pub kind: String,
}

impl VotePayload {
    /// Payload for casting `status` on `tier`. `None` has no cast payload.
    pub fn for_status(tier: VoteTier, status: VoteStatus) -> Option<Self> {
        let is_positive = match status {
            VoteStatus::Agree => true,
            VoteStatus::Disagree => false,
            VoteStatus::None => return None,
        };
        Some(Self {
            is_positive,
            kind: tier.wire_kind().to_string(),
        })
    }

    pub fn status(&self) -> VoteStatus {
        if self.is_positive {
            VoteStatus::Agree
        } else {
            VoteStatus::Disagree
        }
    }
}

/// Response of the user vote status query. `null` means no vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserVoteStatusResponse {
    pub status: Option<VoteStatus>,
}

impl UserVoteStatusResponse {
    pub fn status(&self) -> VoteStatus {
        self.status.unwrap_or_default()
    }
}

/// A rendered cast or remove call for one (entity, tier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub endpoint: String,
    pub entity_id: String,
    pub tier: VoteTier,

    /// `None` for remove calls.
    pub payload: Option<VotePayload>,
}

impl VoteRequest {
    /// Stance this request asks the server to record.
    pub fn requested_status(&self) -> VoteStatus {
        self.payload
            .as_ref()
            .map(VotePayload::status)
            .unwrap_or(VoteStatus::None)
    }

    /// JSON body to send, if any.
    pub fn body(&self) -> Result<Option<String>> {
        self.payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_parses_camel_case() {
        let tally: VoteTally =
            serde_json::from_str(r#"{"positiveVotes":6,"negativeVotes":2}"#).unwrap();
        assert_eq!(tally.counts().unwrap(), VoteCounts::new(6, 2));
    }

    #[test]
    fn negative_tally_is_invalid() {
        let tally = VoteTally {
            positive_votes: -1,
            negative_votes: 0,
        };
        assert!(matches!(tally.counts(), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn oversized_counts_saturate_on_the_wire() {
        let tally = VoteTally::from(VoteCounts::new(u64::MAX, 3));
        assert_eq!(tally.positive_votes, i64::MAX);
        assert_eq!(tally.negative_votes, 3);
    }

    #[test]
    fn payload_shape() {
        let payload = VotePayload::for_status(VoteTier::Content, VoteStatus::Disagree).unwrap();
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"isPositive":false,"kind":"CONTENT"}"#
        );
        assert!(VotePayload::for_status(VoteTier::Inclusion, VoteStatus::None).is_none());
    }

    #[test]
    fn null_status_means_none() {
        let response: UserVoteStatusResponse = serde_json::from_str(r#"{"status":null}"#).unwrap();
        assert_eq!(response.status(), VoteStatus::None);

        let response: UserVoteStatusResponse =
            serde_json::from_str(r#"{"status":"agree"}"#).unwrap();
        assert_eq!(response.status(), VoteStatus::Agree);
    }
}
