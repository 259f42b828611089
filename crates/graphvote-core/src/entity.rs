//! Entity kinds and which vote tiers they carry.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::status::VoteTier;

/// Kind of node in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityKind {
    Word,
    Definition,
    Statement,
    OpenQuestion,
    Answer,
    Quantity,
    Evidence,
    Category,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Word,
        EntityKind::Definition,
        EntityKind::Statement,
        EntityKind::OpenQuestion,
        EntityKind::Answer,
        EntityKind::Quantity,
        EntityKind::Evidence,
        EntityKind::Category,
    ];

    /// Path segment used in endpoint templates. Matches the serde name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Definition => "definition",
            Self::Statement => "statement",
            Self::OpenQuestion => "openquestion",
            Self::Answer => "answer",
            Self::Quantity => "quantity",
            Self::Evidence => "evidence",
            Self::Category => "category",
        }
    }

    /// Whether this kind has a content tier in addition to inclusion.
    pub const fn supports_content_voting(self) -> bool {
        matches!(
            self,
            Self::Definition | Self::Statement | Self::Answer | Self::Quantity | Self::Evidence
        )
    }

    pub const fn supports(self, tier: VoteTier) -> bool {
        match tier {
            VoteTier::Inclusion => true,
            VoteTier::Content => self.supports_content_voting(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidKind(s.to_string()))
    }
}
