//! Graph Vote Model
//!
//! Pure building blocks for dual-tier voting on knowledge-graph nodes.
//!
//! # Tiers
//!
//! Every node carries an **inclusion** tier ("should this exist in the
//! graph"). Definitions, statements, answers, quantities and evidence also
//! carry a **content** tier ("is this agreeable"). The two tiers are fully
//! independent.
//!
//! # Transition Table
//!
//! [`delta`] maps (current stance, requested stance) to a count delta. It is
//! total over the 3×3 input space and never fails. Optimistic counts are
//! always the last confirmed counts plus one table delta.
//!
//! # Threshold
//!
//! [`can_show_detail`] gates expanded presentation on net inclusion votes
//! strictly above zero.
//!
//! # Retry
//!
//! [`RetryPolicy`] is the stateless backoff schedule for failed mutations:
//! attempt 1 immediately, then 1s, then 2s.

mod entity;
mod error;
mod retry;
mod status;
mod threshold;
mod transition;

pub use entity::EntityKind;
pub use error::{Error, Result};
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use status::{VoteCounts, VoteStatus, VoteTier};
pub use threshold::{can_show_detail, effective_presentation, Presentation, DETAIL_THRESHOLD};
pub use transition::{delta, Transition, VoteDelta};
