use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;

use crate::error::{Result, ViewerError};
use crate::models::TrackingRecord;
use crate::types::{FrameNo, MatchId};

/// Read access to per-match tracking data.
///
/// Frames are sparse: a frame with no rows is absent, and asking for its rows
/// yields an empty list rather than an error.
pub trait FrameStore {
    fn frames_for(&self, match_id: MatchId) -> Result<BTreeSet<FrameNo>>;

    fn rows_at(&self, match_id: MatchId, frame: FrameNo) -> Result<Vec<TrackingRecord>>;

    fn contains_frame(&self, match_id: MatchId, frame: FrameNo) -> Result<bool> {
        Ok(!self.rows_at(match_id, frame)?.is_empty())
    }

    /// Present frames inside `range`, ascending.
    fn frames_in(&self, match_id: MatchId, range: RangeInclusive<FrameNo>) -> Result<Vec<FrameNo>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.frames_for(match_id)?.range(range).copied().collect())
    }
}

/// All tracking rows of one match, grouped by frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFrames {
    frames: BTreeMap<FrameNo, Vec<TrackingRecord>>,
}

impl MatchFrames {
    /// Group records by frame. A second ball row in one frame is rejected.
    pub fn from_records(records: impl IntoIterator<Item = TrackingRecord>) -> Result<Self> {
        let mut frames: BTreeMap<FrameNo, Vec<TrackingRecord>> = BTreeMap::new();
        for record in records {
            let record = record.normalized();
            let rows = frames.entry(record.frame).or_default();
            if record.is_ball && rows.iter().any(|r| r.is_ball) {
                return Err(ViewerError::malformed(
                    "tracking data",
                    format!("frame {} has more than one ball row", record.frame),
                ));
            }
            rows.push(record);
        }
        Ok(Self { frames })
    }

    pub fn rows_at(&self, frame: FrameNo) -> &[TrackingRecord] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, frame: FrameNo) -> bool {
        self.frames.contains_key(&frame)
    }

    pub fn frame_numbers(&self) -> impl Iterator<Item = FrameNo> + '_ {
        self.frames.keys().copied()
    }

    /// Present frames inside `range`; cost follows the frames found, not the range width.
    pub fn frames_in(&self, range: RangeInclusive<FrameNo>) -> impl Iterator<Item = FrameNo> + '_ {
        // BTreeMap::range panics on an inverted range
        (!range.is_empty()).then(|| self.frames.range(range)).into_iter().flatten().map(|(frame, _)| *frame)
    }

    /// First and last frame with data
    pub fn span(&self) -> Option<(FrameNo, FrameNo)> {
        let first = *self.frames.keys().next()?;
        let last = *self.frames.keys().next_back()?;
        Some((first, last))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn row_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn records(&self) -> impl Iterator<Item = &TrackingRecord> {
        self.frames.values().flatten()
    }
}

/// Tracking data for any number of matches, held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    matches: FxHashMap<MatchId, MatchFrames>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, match_id: MatchId, frames: MatchFrames) {
        self.matches.insert(match_id, frames);
    }

    pub fn is_loaded(&self, match_id: MatchId) -> bool {
        self.matches.contains_key(&match_id)
    }

    pub fn get(&self, match_id: MatchId) -> Result<&MatchFrames> {
        self.matches
            .get(&match_id)
            .ok_or_else(|| ViewerError::not_found("tracking data", format!("match {}", match_id)))
    }
}

impl FrameStore for InMemoryStore {
    fn frames_for(&self, match_id: MatchId) -> Result<BTreeSet<FrameNo>> {
        Ok(self.get(match_id)?.frame_numbers().collect())
    }

    fn rows_at(&self, match_id: MatchId, frame: FrameNo) -> Result<Vec<TrackingRecord>> {
        Ok(self.get(match_id)?.rows_at(frame).to_vec())
    }

    fn contains_frame(&self, match_id: MatchId, frame: FrameNo) -> Result<bool> {
        Ok(self.get(match_id)?.contains(frame))
    }

    fn frames_in(&self, match_id: MatchId, range: RangeInclusive<FrameNo>) -> Result<Vec<FrameNo>> {
        Ok(self.get(match_id)?.frames_in(range).collect())
    }
}
