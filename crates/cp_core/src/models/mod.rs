pub(crate) mod de;
pub mod loss_event;
pub mod match_meta;
pub mod tracking;

pub use loss_event::LossEvent;
pub use match_meta::{KitMeta, MatchMeta, RosterEntry, TeamMeta};
pub use tracking::TrackingRecord;
