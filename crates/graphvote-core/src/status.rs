//! Vote stances, tiers and tallies.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A user's stance on one tier of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VoteStatus {
    Agree,
    Disagree,
    #[default]
    None,
}

impl VoteStatus {
    /// All three stances, in table order.
    pub const ALL: [VoteStatus; 3] = [VoteStatus::Agree, VoteStatus::Disagree, VoteStatus::None];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agree => "agree",
            Self::Disagree => "disagree",
            Self::None => "none",
        }
    }

    /// Whether this stance counts as a vote at all.
    pub const fn is_vote(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agree" => Ok(Self::Agree),
            "disagree" => Ok(Self::Disagree),
            "none" | "" => Ok(Self::None),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Which question a vote answers.
///
/// Inclusion asks whether the entity belongs in the graph at all; content asks
/// whether its content is agreeable. Only some entity kinds carry a content tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VoteTier {
    Inclusion,
    Content,
}

impl VoteTier {
    /// Lowercase name, used in endpoint paths and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inclusion => "inclusion",
            Self::Content => "content",
        }
    }

    /// Uppercase discriminator sent in vote payloads.
    pub const fn wire_kind(self) -> &'static str {
        match self {
            Self::Inclusion => "INCLUSION",
            Self::Content => "CONTENT",
        }
    }

    /// Key under which the resolved stance for this tier is mirrored in node metadata.
    pub const fn metadata_key(self) -> &'static str {
        match self {
            Self::Inclusion => "inclusionVoteStatus",
            Self::Content => "contentVoteStatus",
        }
    }
}

impl fmt::Display for VoteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusion" => Ok(Self::Inclusion),
            "content" => Ok(Self::Content),
            other => Err(Error::InvalidTier(other.to_string())),
        }
    }
}

/// Positive and negative vote counts for one tier.
///
/// Net votes are always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoteCounts {
    pub positive: u64,
    pub negative: u64,
}

impl VoteCounts {
    pub const fn new(positive: u64, negative: u64) -> Self {
        Self { positive, negative }
    }

    /// Positive minus negative, saturating at the bounds of `i64`.
    pub fn net(&self) -> i64 {
        let net = i128::from(self.positive) - i128::from(self.negative);
        i64::try_from(net).unwrap_or(if net > 0 { i64::MAX } else { i64::MIN })
    }

    /// Apply a signed delta, clamping each side at zero.
    #[must_use]
    pub fn apply(self, delta: crate::VoteDelta) -> Self {
        Self {
            positive: self.positive.saturating_add_signed(delta.positive),
            negative: self.negative.saturating_add_signed(delta.negative),
        }
    }
}

impl fmt::Display for VoteCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}/-{} (net {})", self.positive, self.negative, self.net())
    }
}
