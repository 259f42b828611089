//! Visibility threshold for detail presentation.
//!
//! An entity may be shown expanded only while its net inclusion votes are
//! strictly above zero. Content votes never affect visibility.

/// Net inclusion votes must exceed this to show detail.
pub const DETAIL_THRESHOLD: i64 = 0;

/// How an entity is rendered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Presentation {
    #[default]
    Preview,
    Detail,
}

/// Whether an entity with the given net inclusion votes may be shown in detail.
///
/// ```
/// use graphvote_core::can_show_detail;
///
/// assert!(can_show_detail(1));
/// assert!(!can_show_detail(0));
/// assert!(!can_show_detail(-3));
/// ```
pub const fn can_show_detail(inclusion_net_votes: i64) -> bool {
    inclusion_net_votes > DETAIL_THRESHOLD
}

/// Presentation actually allowed for a requested one.
///
/// Detail falls back to preview once the threshold is no longer met.
pub const fn effective_presentation(requested: Presentation, inclusion_net_votes: i64) -> Presentation {
    match requested {
        Presentation::Detail if !can_show_detail(inclusion_net_votes) => Presentation::Preview,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_hidden() {
        assert!(!can_show_detail(0));
        assert!(can_show_detail(1));
    }

    #[test]
    fn detail_collapses_below_threshold() {
        assert_eq!(effective_presentation(Presentation::Detail, 2), Presentation::Detail);
        assert_eq!(effective_presentation(Presentation::Detail, 0), Presentation::Preview);
        assert_eq!(effective_presentation(Presentation::Preview, 10), Presentation::Preview);
    }

    proptest! {
        #[test]
        fn positive_net_always_shows(net in 1i64..i64::MAX) {
            prop_assert!(can_show_detail(net));
        }

        #[test]
        fn non_positive_net_never_shows(net in i64::MIN..=0i64) {
            prop_assert!(!can_show_detail(net));
        }
    }
}
