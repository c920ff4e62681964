//! Event-Frame Linker
//!
//! Maps a ball-loss event onto the frames that surround it.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::{Result, ViewerError};
use crate::store::FrameStore;
use crate::types::{FrameNo, MatchId};

/// Padding of the interactive viewing window
pub const VIEW_PADDING: u32 = 10;

/// Export padding bounds (frames before/after the loss)
pub const DEFAULT_EXPORT_PADDING: u32 = 100;
pub const MIN_EXPORT_PADDING: u32 = 10;
pub const MAX_EXPORT_PADDING: u32 = 150;
pub const EXPORT_PADDING_STEP: u32 = 10;

/// Closed interval `[frame_loss - padding, frame_loss + padding]`, unfiltered.
pub fn candidate_frames(frame_loss: FrameNo, padding: u32) -> RangeInclusive<FrameNo> {
    let padding = FrameNo::from(padding);
    frame_loss.saturating_sub(padding)..=frame_loss.saturating_add(padding)
}

/// Snap a requested export padding onto the allowed grid.
pub fn clamp_export_padding(padding: u32) -> u32 {
    let clamped = padding.clamp(MIN_EXPORT_PADDING, MAX_EXPORT_PADDING);
    let steps = (clamped + EXPORT_PADDING_STEP / 2) / EXPORT_PADDING_STEP;
    (steps * EXPORT_PADDING_STEP).clamp(MIN_EXPORT_PADDING, MAX_EXPORT_PADDING)
}

/// Candidate range clipped to frames present in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameWindow {
    pub match_id: MatchId,
    pub frame_loss: FrameNo,
    pub padding: u32,
    frames: Vec<FrameNo>,
}

impl FrameWindow {
    /// Present frames, strictly ascending
    pub fn frames(&self) -> &[FrameNo] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> FrameNo {
        self.frames[0]
    }

    pub fn last(&self) -> FrameNo {
        self.frames[self.frames.len() - 1]
    }

    pub fn contains(&self, frame: FrameNo) -> bool {
        self.frames.binary_search(&frame).is_ok()
    }

    /// The requested frame if present, else the nearest present one
    /// (ties go to the earlier frame).
    pub fn select(&self, requested: FrameNo) -> FrameNo {
        match self.frames.binary_search(&requested) {
            Ok(_) => requested,
            Err(0) => self.first(),
            Err(i) if i == self.frames.len() => self.last(),
            Err(i) => {
                let before = self.frames[i - 1];
                let after = self.frames[i];
                if requested - before <= after - requested {
                    before
                } else {
                    after
                }
            }
        }
    }

    /// Initial viewing frame: the loss frame, or the closest frame to it.
    pub fn default_frame(&self) -> FrameNo {
        self.select(self.frame_loss)
    }
}

/// Compute the present-frame window around `frame_loss`.
///
/// An empty result is reported as `EmptyFrameWindow`, never as an empty window.
pub fn window<S: FrameStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    frame_loss: FrameNo,
    padding: u32,
) -> Result<FrameWindow> {
    let frames = store.frames_in(match_id, candidate_frames(frame_loss, padding))?;

    if frames.is_empty() {
        return Err(ViewerError::EmptyFrameWindow { match_id, frame_loss, padding });
    }

    debug!(match_id, frame_loss, padding, present = frames.len(), "frame window linked");
    Ok(FrameWindow { match_id, frame_loss, padding, frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store_with_frames;
    use proptest::prelude::*;

    #[test]
    fn test_full_window_nothing_filtered() {
        let store = store_with_frames(1, 100..=120);
        let w = window(&store, 1, 110, 10).unwrap();
        assert_eq!(w.len(), 21);
        assert_eq!(w.frames(), (100..=120).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn test_window_outside_data_is_empty_frame_window() {
        let store = store_with_frames(1, 100..=105);
        let err = window(&store, 1, 110, 3).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::EmptyFrameWindow { match_id: 1, frame_loss: 110, padding: 3 }
        ));
    }

    #[test]
    fn test_window_clipped_on_one_side() {
        let store = store_with_frames(1, 100..=105);
        let w = window(&store, 1, 104, 10).unwrap();
        assert_eq!(w.frames(), &[100, 101, 102, 103, 104, 105]);
        assert_eq!(w.default_frame(), 104);
    }

    #[test]
    fn test_huge_padding_returns_present_frames() {
        let store = store_with_frames(1, 100..=120);
        let w = window(&store, 1, 110, u32::MAX).unwrap();
        assert_eq!(w.len(), 21);
        assert_eq!((w.first(), w.last()), (100, 120));
        assert_eq!(w.padding, u32::MAX);
    }

    #[test]
    fn test_candidate_frames_below_zero() {
        let range = candidate_frames(3, 10);
        assert_eq!(*range.start(), -7);
        assert_eq!(*range.end(), 13);
    }

    #[test]
    fn test_select_snaps_to_nearest() {
        let store = store_with_frames(1, [100, 101, 104, 108]);
        let w = window(&store, 1, 102, 10).unwrap();
        assert_eq!(w.select(101), 101);
        assert_eq!(w.select(102), 101);
        assert_eq!(w.select(103), 104);
        assert_eq!(w.select(106), 104); // tie goes earlier
        assert_eq!(w.select(50), 100);
        assert_eq!(w.select(500), 108);
        assert_eq!(w.default_frame(), 101);
    }

    #[test]
    fn test_clamp_export_padding() {
        assert_eq!(clamp_export_padding(0), 10);
        assert_eq!(clamp_export_padding(100), 100);
        assert_eq!(clamp_export_padding(104), 100);
        assert_eq!(clamp_export_padding(105), 110);
        assert_eq!(clamp_export_padding(1000), 150);
    }

    proptest! {
        /// Window is ascending, unique, in bounds and present in the store
        #[test]
        fn prop_window_is_sorted_bounded_present(
            present in proptest::collection::btree_set(0i64..400, 0..120),
            frame_loss in -20i64..420,
            padding in 0u32..60,
        ) {
            let store = store_with_frames(3, present.iter().copied());
            match window(&store, 3, frame_loss, padding) {
                Ok(w) => {
                    let frames = w.frames();
                    prop_assert!(!frames.is_empty());
                    prop_assert!(frames.windows(2).all(|p| p[0] < p[1]));
                    let bounds = candidate_frames(frame_loss, padding);
                    for f in frames {
                        prop_assert!(bounds.contains(f));
                        prop_assert!(present.contains(f));
                    }
                    let expected = present.iter().filter(|f| bounds.contains(*f)).count();
                    prop_assert_eq!(frames.len(), expected);
                }
                Err(ViewerError::EmptyFrameWindow { .. }) => {
                    let bounds = candidate_frames(frame_loss, padding);
                    prop_assert!(!present.iter().any(|f| bounds.contains(f)));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
