//! Snapshot rendering: scene building, pitch drawing and rasterization

pub mod canvas;
pub mod font;
pub mod pitch;
pub mod scene;
pub mod snapshot;

pub use pitch::PitchTransform;
pub use scene::{build_scene, Mark, RenderStats, Scene, UNKNOWN_LABEL};
pub use snapshot::{RenderStyle, Snapshot, SnapshotRenderer, TitleStyle};
