//! Track descriptor registry.
//!
//! Holds the currently selected track descriptor and every descriptor a
//! processor has been offered during its lifecycle. Descriptors are
//! identified by pointer, not by value.

use std::sync::Arc;

use crate::media::MediaInfo;

/// A track descriptor slot; `None` is the empty descriptor.
pub type TrackSlot = Option<Arc<MediaInfo>>;

/// Identity comparison of two slots. Two empty slots are the same identity.
pub fn same_identity(a: Option<&Arc<MediaInfo>>, b: Option<&Arc<MediaInfo>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Decides whether `candidate` may replace `current` as the selected track.
///
/// The candidate is taken when it is a different identity and either slot
/// is empty or both carry the same media type. A non-empty candidate of a
/// different media type never replaces a non-empty current descriptor.
pub fn accepts_as_current(
    current: Option<&Arc<MediaInfo>>,
    candidate: Option<&Arc<MediaInfo>>,
) -> bool {
    if same_identity(current, candidate) {
        return false;
    }
    match (current, candidate) {
        (Some(current), Some(candidate)) => current.media_type == candidate.media_type,
        _ => true,
    }
}

/// Outcome of [`TrackRegistry::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackUpdate {
    /// The candidate became the current descriptor.
    pub replaced_current: bool,
    /// The candidate was not known before and was recorded.
    pub recorded: bool,
    /// The candidate was refused because its media type differs from the
    /// current descriptor's.
    pub rejected_mismatch: bool,
}

#[derive(Debug, Default)]
pub struct TrackRegistry {
    current: TrackSlot,
    known: Vec<TrackSlot>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers `candidate` to the registry.
    ///
    /// The candidate is recorded among the known descriptors whether or not
    /// it was accepted as current, including mismatched media types.
    pub fn update(&mut self, candidate: TrackSlot) -> TrackUpdate {
        let rejected_mismatch = matches!(
            (&self.current, &candidate),
            (Some(current), Some(new)) if current.media_type != new.media_type
        );
        let replaced_current = accepts_as_current(self.current.as_ref(), candidate.as_ref());
        if replaced_current {
            self.current = candidate.clone();
        }

        let recorded = !self.contains(candidate.as_ref());
        if recorded {
            self.known.push(candidate);
        }

        TrackUpdate {
            replaced_current,
            recorded,
            rejected_mismatch,
        }
    }

    pub fn current(&self) -> Option<&Arc<MediaInfo>> {
        self.current.as_ref()
    }

    /// Every distinct descriptor offered so far, in first-seen order.
    pub fn known(&self) -> &[TrackSlot] {
        &self.known
    }

    pub fn contains(&self, slot: Option<&Arc<MediaInfo>>) -> bool {
        self.known.iter().any(|k| same_identity(k.as_ref(), slot))
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.known.clear();
    }
}
