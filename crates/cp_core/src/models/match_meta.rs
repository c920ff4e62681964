use serde::{Deserialize, Serialize};

use crate::types::{PitchDims, PlayerId, TeamId};

/// Static per-match document: pitch, teams, kits and roster.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MatchMeta {
    pub pitch_length: f64,
    pub pitch_width: f64,
    pub home_team: TeamMeta,
    pub away_team: TeamMeta,
    pub home_team_kit: KitMeta,
    pub away_team_kit: KitMeta,
    pub players: Vec<RosterEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TeamMeta {
    pub id: TeamId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KitMeta {
    pub jersey_color: String,
    pub number_color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RosterEntry {
    pub id: PlayerId,
    /// Jersey number
    pub number: u32,
    pub team_id: TeamId,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl MatchMeta {
    pub fn pitch(&self) -> PitchDims {
        PitchDims { length: self.pitch_length, width: self.pitch_width }
    }
}

impl TeamMeta {
    /// Short label for legends: `short_name`, else `name`, else the id.
    pub fn label(&self) -> String {
        self.short_name.clone().or_else(|| self.name.clone()).unwrap_or_else(|| format!("Team {}", self.id))
    }
}
