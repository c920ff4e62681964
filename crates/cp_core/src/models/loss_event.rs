use serde::{Deserialize, Serialize};

use super::de;
use crate::types::{FrameNo, MatchId, PitchPos};

/// One ball-loss instance from the counterpress event table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LossEvent {
    #[serde(deserialize_with = "de::flex_u32")]
    pub match_id: MatchId,
    #[serde(deserialize_with = "de::flex_i64")]
    pub frame_loss: FrameNo,
    /// Display name of the focal player this row was computed for
    pub player_tracked: String,
    #[serde(default, deserialize_with = "de::flex_bool")]
    pub player_near_loss: bool,
    #[serde(default, deserialize_with = "de::flex_bool")]
    pub player_involved_in_counterpress: bool,
    #[serde(default, deserialize_with = "de::flex_bool")]
    pub recovered_in_5s: bool,
    #[serde(default)]
    pub recovery_time: Option<f64>,
    #[serde(default)]
    pub third_start: Option<String>,
    #[serde(default)]
    pub channel_start: Option<String>,
    #[serde(default)]
    pub game_state: Option<String>,
    #[serde(default)]
    pub x_loss: Option<f64>,
    #[serde(default)]
    pub y_loss: Option<f64>,
}

impl LossEvent {
    pub fn loss_position(&self) -> Option<PitchPos> {
        match (self.x_loss, self.y_loss) {
            (Some(x), Some(y)) => Some(PitchPos::new(x, y)),
            _ => None,
        }
    }
}
