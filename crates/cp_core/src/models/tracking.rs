use serde::{Deserialize, Serialize};

use super::de;
use crate::types::{FrameNo, PitchPos, PlayerId};

/// One tracked entity at one frame.
///
/// The ball row never carries a `player_id`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackingRecord {
    #[serde(deserialize_with = "de::flex_i64")]
    pub frame: FrameNo,
    #[serde(default, deserialize_with = "de::flex_opt_u32")]
    pub player_id: Option<PlayerId>,
    #[serde(deserialize_with = "de::flex_bool")]
    pub is_ball: bool,
    pub x: f64,
    pub y: f64,
}

impl TrackingRecord {
    pub fn ball(frame: FrameNo, x: f64, y: f64) -> Self {
        Self { frame, player_id: None, is_ball: true, x, y }
    }

    pub fn player(frame: FrameNo, player_id: PlayerId, x: f64, y: f64) -> Self {
        Self { frame, player_id: Some(player_id), is_ball: false, x, y }
    }

    pub fn position(&self) -> PitchPos {
        PitchPos::new(self.x, self.y)
    }

    /// Enforce the ball-row invariant: a ball row has no player id.
    pub(crate) fn normalized(mut self) -> Self {
        if self.is_ball {
            self.player_id = None;
        }
        self
    }
}
