//! Frame Store: per-match tracking records keyed by frame number

pub mod cache;
pub mod frames;
pub mod loader;

pub use cache::{decode_frames, encode_frames, CACHE_SCHEMA_VERSION};
pub use frames::{FrameStore, InMemoryStore, MatchFrames};
pub use loader::{load_tracking_cache, load_tracking_csv, load_tracking_parquet, read_tracking_csv, LoadStats, TrackingDir};
