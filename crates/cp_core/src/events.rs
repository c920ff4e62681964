//! Event Table
//!
//! The per-player ball-loss table and the narrowing steps used to pick one
//! event: player, action filter, match, loss frame.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigurationError, Result, ViewerError};
use crate::models::LossEvent;
use crate::store::LoadStats;
use crate::types::{FrameNo, MatchId};

/// Which ball losses to keep for the focal player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFilter {
    #[default]
    All,
    /// Focal player was near the ball when it was lost
    PlayerNear,
    /// Focal player took part in the counterpress
    PlayerInvolved,
}

impl ActionFilter {
    pub const ALL: [ActionFilter; 3] = [ActionFilter::All, ActionFilter::PlayerNear, ActionFilter::PlayerInvolved];

    pub fn keeps(self, event: &LossEvent) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::PlayerNear => event.player_near_loss,
            ActionFilter::PlayerInvolved => event.player_involved_in_counterpress,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionFilter::All => "All",
            ActionFilter::PlayerNear => "Player near",
            ActionFilter::PlayerInvolved => "Player involved",
        }
    }
}

impl fmt::Display for ActionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActionFilter {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "all" => Ok(ActionFilter::All),
            "near" | "player near" => Ok(ActionFilter::PlayerNear),
            "involved" | "player involved" => Ok(ActionFilter::PlayerInvolved),
            other => Err(ConfigurationError::Invalid(format!("unknown action filter '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    events: Vec<LossEvent>,
}

impl EventTable {
    pub fn from_events(events: Vec<LossEvent>) -> Self {
        Self { events }
    }

    /// Parse the event CSV. Unreadable rows are skipped and counted.
    pub fn read_csv<R: Read>(reader: R) -> Result<(Self, LoadStats)> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

        let mut stats = LoadStats::default();
        let mut events = Vec::new();
        for (line, row) in csv_reader.deserialize::<LossEvent>().enumerate() {
            stats.total_rows += 1;
            match row {
                Ok(event) => {
                    stats.parsed += 1;
                    events.push(event);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(line = line + 2, error = %e, "skipping unreadable event row");
                }
            }
        }
        Ok((Self { events }, stats))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ViewerError::not_found("event table", path.display().to_string()));
        }
        let (table, stats) = Self::read_csv(fs::File::open(path)?)?;
        if stats.failed > 0 {
            warn!(failed = stats.failed, total = stats.total_rows, "event rows skipped");
        }
        info!(events = table.len(), path = %path.display(), "event table loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LossEvent] {
        &self.events
    }

    /// Player names that appear in the table, sorted
    pub fn players(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.events.iter().map(|e| e.player_tracked.as_str()).collect();
        names.into_iter().collect()
    }

    /// Rows computed for `player` that pass `filter`, in table order.
    pub fn select(&self, player: &str, filter: ActionFilter) -> EventSelection<'_> {
        let rows = self.events.iter().filter(|e| e.player_tracked == player && filter.keeps(e)).collect();
        EventSelection { rows }
    }
}

/// A player + filter narrowing of the event table
#[derive(Debug, Clone)]
pub struct EventSelection<'a> {
    rows: Vec<&'a LossEvent>,
}

impl<'a> EventSelection<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[&'a LossEvent] {
        &self.rows
    }

    /// Distinct match ids, ascending
    pub fn matches(&self) -> Vec<MatchId> {
        let ids: BTreeSet<MatchId> = self.rows.iter().map(|e| e.match_id).collect();
        ids.into_iter().collect()
    }

    /// Distinct loss frames within one match, ascending
    pub fn frame_losses(&self, match_id: MatchId) -> Vec<FrameNo> {
        let frames: BTreeSet<FrameNo> =
            self.rows.iter().filter(|e| e.match_id == match_id).map(|e| e.frame_loss).collect();
        frames.into_iter().collect()
    }

    /// First row for (match, frame_loss), if any
    pub fn event(&self, match_id: MatchId, frame_loss: FrameNo) -> Option<&'a LossEvent> {
        self.rows.iter().copied().find(|e| e.match_id == match_id && e.frame_loss == frame_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "match_id,frame_loss,player_tracked,player_near_loss,player_involved_in_counterpress,recovered_in_5s,recovery_time,third_start,channel_start,game_state,x_loss,y_loss\n\
        1886347,2410,Mbappé,True,False,True,3.2,middle,center,drawing,10.5,-3.0\n\
        1886347,1200,Mbappé,False,False,False,,defensive,left,drawing,-20.0,12.0\n\
        1886347,2410,Mbappé,True,True,False,,middle,center,drawing,10.5,-3.0\n\
        1899585,900,Mbappé,False,True,True,4.0,attacking,right,winning,30.0,1.0\n\
        1899585,450,Vinicius Jr,True,True,True,1.5,attacking,left,winning,35.0,20.0\n\
        bad,row,Mbappé,,,,,,,,,\n";

    fn table() -> EventTable {
        EventTable::read_csv(CSV.as_bytes()).unwrap().0
    }

    #[test]
    fn test_read_csv_counts_bad_rows() {
        let (table, stats) = EventTable::read_csv(CSV.as_bytes()).unwrap();
        assert_eq!(stats, LoadStats { total_rows: 6, parsed: 5, failed: 1 });
        assert_eq!(table.len(), 5);
        assert_eq!(table.events()[1].recovery_time, None);
        assert_eq!(table.players(), vec!["Mbappé", "Vinicius Jr"]);
    }

    #[test]
    fn test_selection_by_filter() {
        let table = table();
        assert_eq!(table.select("Mbappé", ActionFilter::All).len(), 4);
        assert_eq!(table.select("Mbappé", ActionFilter::PlayerNear).len(), 2);
        assert_eq!(table.select("Mbappé", ActionFilter::PlayerInvolved).len(), 2);
        assert!(table.select("Rodrygo", ActionFilter::All).is_empty());
    }

    #[test]
    fn test_matches_and_frames_sorted_unique() {
        let table = table();
        let selection = table.select("Mbappé", ActionFilter::All);
        assert_eq!(selection.matches(), vec![1886347, 1899585]);
        assert_eq!(selection.frame_losses(1886347), vec![1200, 2410]);
        assert!(selection.frame_losses(42).is_empty());
    }

    #[test]
    fn test_event_picks_first_row() {
        let table = table();
        let selection = table.select("Mbappé", ActionFilter::All);
        let event = selection.event(1886347, 2410).unwrap();
        assert!(!event.player_involved_in_counterpress);
        assert_eq!(event.recovery_time, Some(3.2));

        let involved = table.select("Mbappé", ActionFilter::PlayerInvolved);
        assert!(involved.event(1886347, 2410).unwrap().player_involved_in_counterpress);
        assert!(involved.event(1886347, 1200).is_none());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<ActionFilter>().unwrap(), ActionFilter::All);
        assert_eq!("Player near".parse::<ActionFilter>().unwrap(), ActionFilter::PlayerNear);
        assert_eq!("player-involved".parse::<ActionFilter>().unwrap(), ActionFilter::PlayerInvolved);
        assert!("nearby".parse::<ActionFilter>().is_err());
        assert_eq!(ActionFilter::PlayerNear.to_string(), "Player near");
    }

    #[test]
    fn test_load_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let err = EventTable::load(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, ViewerError::Configuration(ConfigurationError::NotFound { .. })));
    }
}
