//! Detail visibility signal driven by inclusion votes.

use graphvote_core::{can_show_detail, VoteTier};
use tokio::sync::watch;
use tracing::debug;

use crate::context::VoteIntentContext;
use crate::state::{VoteObserver, VoteState};

/// Recomputes [`can_show_detail`] on every inclusion-tier change.
///
/// The watch channel only changes on transitions, so a presentation layer can
/// collapse an expanded node as soon as it sees `false`.
pub struct VisibilityWatcher {
    signal: watch::Sender<bool>,
}

impl VisibilityWatcher {
    pub fn new(inclusion_net_votes: i64) -> Self {
        let (signal, _) = watch::channel(can_show_detail(inclusion_net_votes));
        Self { signal }
    }

    pub fn can_show_detail(&self) -> bool {
        *self.signal.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    /// Recompute from a net count. Returns `true` if the flag changed.
    pub fn recompute(&self, inclusion_net_votes: i64) -> bool {
        let visible = can_show_detail(inclusion_net_votes);
        self.signal.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        })
    }
}

impl VoteObserver for VisibilityWatcher {
    fn state_changed(&self, context: &VoteIntentContext, state: &VoteState) {
        if context.tier != VoteTier::Inclusion {
            return;
        }
        if self.recompute(state.net()) {
            debug!(
                entity_id = %context.entity_id,
                net = state.net(),
                can_show_detail = self.can_show_detail(),
                "Detail visibility changed"
            );
        }
    }
}
