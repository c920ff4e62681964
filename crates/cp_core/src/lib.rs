//! # cp_core - Counterpress Frame Viewer
//!
//! Links ball-loss events to tracking frames and renders what happened
//! around them.
//!
//! ## Features
//! - Per-match metadata resolution (teams, kits, roster) with memoization
//! - Sparse tracking frame store loaded from CSV or a compressed cache
//! - Event → frame window linking with nearest-frame selection
//! - Single-frame rendering to PNG and looping GIF export

pub mod config;
pub mod error;
pub mod events;
pub mod linker;
pub mod meta;
pub mod models;
pub mod render;
pub mod sequence;
pub mod store;
pub mod types;
pub mod viewer;

pub use config::{CanvasSize, ViewerConfig};
pub use error::{ConfigurationError, Result, ViewerError};
pub use events::{ActionFilter, EventSelection, EventTable};
pub use linker::{candidate_frames, window, FrameWindow};
pub use meta::{MetaDir, MetaSource, MetadataResolver, ResolvedMatch, RosterLookup};
pub use models::{LossEvent, MatchMeta, TrackingRecord};
pub use render::{RenderStyle, Snapshot, SnapshotRenderer, TitleStyle};
pub use sequence::{Animation, AnimationSettings, CancelFlag, ExportReport, LoopCount, SequenceAssembler};
pub use store::{FrameStore, InMemoryStore, MatchFrames, TrackingDir};
pub use types::{FocalPlayer, FrameNo, MatchId, PlayerId, TeamId};
pub use viewer::{CounterpressViewer, FrameView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
