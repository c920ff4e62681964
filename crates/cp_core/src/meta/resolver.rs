//! Metadata Resolver
//!
//! Joins the two-row team table with the two-row kit table on team id, then
//! left-joins the roster onto the team table so every player inherits its
//! team's kit colors. Results are memoized per match.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::source::MetaSource;
use crate::error::{Result, ViewerError};
use crate::models::{KitMeta, MatchMeta, TeamMeta};
use crate::types::{MatchId, PitchDims, PlayerId, Rgb8, TeamId};

/// Fill used for players whose colors cannot be resolved
pub const DEFAULT_JERSEY_COLOR: Rgb8 = Rgb8::GREY;
pub const DEFAULT_NUMBER_COLOR: Rgb8 = Rgb8::BLACK;

/// One side of the match with its kit
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDisplay {
    pub id: TeamId,
    pub label: String,
    pub jersey_color: Rgb8,
    pub number_color: Rgb8,
}

/// Display attributes for one rostered player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDisplay {
    /// `None` when the roster names a team that is neither home nor away
    pub team_id: Option<TeamId>,
    pub jersey_number: u32,
    pub jersey_color: Rgb8,
    pub number_color: Rgb8,
}

/// Outcome of looking a tracked id up in the roster
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Known(&'a PlayerDisplay),
    Unknown,
}

/// player_id → display attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterLookup {
    players: FxHashMap<PlayerId, PlayerDisplay>,
}

impl RosterLookup {
    pub fn resolve(&self, player_id: PlayerId) -> Resolution<'_> {
        match self.players.get(&player_id) {
            Some(display) => Resolution::Known(display),
            None => Resolution::Unknown,
        }
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerDisplay> {
        self.players.get(&player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Everything the renderer needs about a match. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub match_id: MatchId,
    pub pitch: PitchDims,
    pub home: TeamDisplay,
    pub away: TeamDisplay,
    pub roster: RosterLookup,
}

impl ResolvedMatch {
    pub fn team(&self, team_id: TeamId) -> Option<&TeamDisplay> {
        [&self.home, &self.away].into_iter().find(|t| t.id == team_id)
    }
}

fn kit_color(raw: &str, fallback: Rgb8, match_id: MatchId, team_id: TeamId, field: &str) -> Rgb8 {
    Rgb8::parse_hex(raw).unwrap_or_else(|| {
        warn!(match_id, team_id, field, value = raw, "unparseable kit color, using default");
        fallback
    })
}

fn team_row(match_id: MatchId, team: &TeamMeta, kit: &KitMeta) -> TeamDisplay {
    TeamDisplay {
        id: team.id,
        label: team.label(),
        jersey_color: kit_color(&kit.jersey_color, DEFAULT_JERSEY_COLOR, match_id, team.id, "jersey_color"),
        number_color: kit_color(&kit.number_color, DEFAULT_NUMBER_COLOR, match_id, team.id, "number_color"),
    }
}

/// Build the roster lookup for one match document.
pub fn resolve_match(match_id: MatchId, meta: &MatchMeta) -> Result<ResolvedMatch> {
    let pitch = meta.pitch();
    if !pitch.is_valid() {
        return Err(ViewerError::malformed(
            "match metadata",
            format!("invalid pitch dimensions {} x {}", meta.pitch_length, meta.pitch_width),
        ));
    }
    if meta.home_team.id == meta.away_team.id {
        return Err(ViewerError::malformed(
            "match metadata",
            format!("home and away share team id {}", meta.home_team.id),
        ));
    }

    let home = team_row(match_id, &meta.home_team, &meta.home_team_kit);
    let away = team_row(match_id, &meta.away_team, &meta.away_team_kit);

    let mut players = FxHashMap::default();
    for entry in &meta.players {
        let team = [&home, &away].into_iter().find(|t| t.id == entry.team_id);
        let display = match team {
            Some(team) => PlayerDisplay {
                team_id: Some(team.id),
                jersey_number: entry.number,
                jersey_color: team.jersey_color,
                number_color: team.number_color,
            },
            None => {
                warn!(match_id, player_id = entry.id, team_id = entry.team_id, "player team not in match, using default style");
                PlayerDisplay {
                    team_id: None,
                    jersey_number: entry.number,
                    jersey_color: DEFAULT_JERSEY_COLOR,
                    number_color: DEFAULT_NUMBER_COLOR,
                }
            }
        };
        if players.insert(entry.id, display).is_some() {
            warn!(match_id, player_id = entry.id, "duplicate roster entry, keeping the last one");
        }
    }

    debug!(match_id, players = players.len(), "roster resolved");

    Ok(ResolvedMatch { match_id, pitch, home, away, roster: RosterLookup { players } })
}

/// Memoizing resolver keyed by match id.
///
/// Source data is static per match, so entries are never invalidated.
pub struct MetadataResolver<S: MetaSource> {
    source: S,
    cache: FxHashMap<MatchId, Arc<ResolvedMatch>>,
}

impl<S: MetaSource> MetadataResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source, cache: FxHashMap::default() }
    }

    pub fn resolve(&mut self, match_id: MatchId) -> Result<Arc<ResolvedMatch>> {
        if let Some(hit) = self.cache.get(&match_id) {
            return Ok(Arc::clone(hit));
        }

        let meta = self.source.load(match_id)?;
        let resolved = Arc::new(resolve_match(match_id, &meta)?);
        self.cache.insert(match_id, Arc::clone(&resolved));
        Ok(resolved)
    }

    pub fn cached_matches(&self) -> usize {
        self.cache.len()
    }
}
