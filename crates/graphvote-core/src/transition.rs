//! Vote transition table.
//!
//! Maps (current stance, requested stance) to the change in counts and the
//! resulting stance. Total over all nine inputs; diagonal entries are no-ops.
//!
//! ```text
//! current → requested   Δpositive  Δnegative
//! none    → agree          +1          0
//! none    → disagree        0         +1
//! agree   → none           -1          0
//! disagree→ none            0         -1
//! agree   → disagree       -1         +1
//! disagree→ agree          +1         -1
//! X       → X               0          0
//! ```

use crate::status::VoteStatus;

/// Signed change in vote counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteDelta {
    pub positive: i64,
    pub negative: i64,
}

impl VoteDelta {
    pub const ZERO: VoteDelta = VoteDelta {
        positive: 0,
        negative: 0,
    };
}

/// Result of looking up one entry in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub delta: VoteDelta,
    pub next_status: VoteStatus,
    pub previous_status: VoteStatus,
}

impl Transition {
    /// Requested stance equals the current one; nothing to send.
    pub const fn is_noop(&self) -> bool {
        matches!(
            (self.previous_status, self.next_status),
            (VoteStatus::Agree, VoteStatus::Agree)
                | (VoteStatus::Disagree, VoteStatus::Disagree)
                | (VoteStatus::None, VoteStatus::None)
        )
    }
}

/// Contribution of a single stance to the tally.
const fn weight(status: VoteStatus) -> VoteDelta {
    match status {
        VoteStatus::Agree => VoteDelta {
            positive: 1,
            negative: 0,
        },
        VoteStatus::Disagree => VoteDelta {
            positive: 0,
            negative: 1,
        },
        VoteStatus::None => VoteDelta::ZERO,
    }
}

/// Look up the transition from `current` to `requested`.
///
/// # Examples
///
/// ```
/// use graphvote_core::{delta, VoteStatus};
///
/// let t = delta(VoteStatus::Agree, VoteStatus::Disagree);
/// assert_eq!((t.delta.positive, t.delta.negative), (-1, 1));
/// assert!(delta(VoteStatus::None, VoteStatus::None).is_noop());
/// ```
pub const fn delta(current: VoteStatus, requested: VoteStatus) -> Transition {
    let removed = weight(current);
    let added = weight(requested);
    Transition {
        delta: VoteDelta {
            positive: added.positive - removed.positive,
            negative: added.negative - removed.negative,
        },
        next_status: requested,
        previous_status: current,
    }
}
