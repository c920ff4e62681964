//! Sequence Assembler / Animation Exporter
//!
//! Renders every present frame of a window, skipping absent ones, and encodes
//! the ordered buffer into a looping GIF. Nothing touches the filesystem until
//! the whole buffer is collected and encoded; the artifact is then renamed
//! into place, so an abandoned export never leaves a partial file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ViewerError};
use crate::meta::ResolvedMatch;
use crate::render::{Snapshot, SnapshotRenderer, TitleStyle};
use crate::store::FrameStore;
use crate::types::{FocalPlayer, FrameNo, MatchId};

pub const DEFAULT_FRAME_DURATION_MS: u32 = 150;

/// NeuQuant sampling factor handed to the GIF encoder (1 = best, 30 = fastest)
const GIF_SPEED: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

impl From<LoopCount> for Repeat {
    fn from(count: LoopCount) -> Self {
        match count {
            LoopCount::Infinite => Repeat::Infinite,
            LoopCount::Finite(n) => Repeat::Finite(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSettings {
    pub frame_duration_ms: u32,
    pub loop_count: LoopCount,
    /// Render frames on the rayon pool; order is restored before encoding
    pub parallel: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { frame_duration_ms: DEFAULT_FRAME_DURATION_MS, loop_count: LoopCount::Infinite, parallel: false }
    }
}

/// Export lifecycle of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Collecting,
    Empty,
    Encoding,
    Done,
}

impl ExportState {
    pub fn can_transition(self, next: ExportState) -> bool {
        use ExportState::*;
        matches!(
            (self, next),
            (Idle, Collecting) | (Collecting, Empty) | (Collecting, Encoding) | (Encoding, Done)
        )
    }
}

/// Tracks and logs the state of one export.
#[derive(Debug)]
struct ExportRun {
    match_id: MatchId,
    state: ExportState,
}

impl ExportRun {
    fn new(match_id: MatchId) -> Self {
        Self { match_id, state: ExportState::Idle }
    }

    fn advance(&mut self, next: ExportState) {
        debug_assert!(self.state.can_transition(next), "{:?} -> {:?}", self.state, next);
        debug!(match_id = self.match_id, from = ?self.state, to = ?next, "export state");
        self.state = next;
    }
}

/// Shared flag a caller sets to abandon an in-flight export.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ordered rendered frames, ready to encode
#[derive(Debug, Clone)]
pub struct Animation {
    pub match_id: MatchId,
    pub frames: Vec<Snapshot>,
    /// Number of frame numbers asked for, present or not
    pub requested: usize,
    pub settings: AnimationSettings,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_numbers(&self) -> Vec<FrameNo> {
        self.frames.iter().map(|s| s.frame).collect()
    }

    pub fn skipped(&self) -> usize {
        self.requested - self.frames.len()
    }

    /// Encode as GIF: one image per frame, each shown for `frame_duration_ms`.
    pub fn encode_gif(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_SPEED);
            encoder.set_repeat(self.settings.loop_count.into())?;
            for snapshot in &self.frames {
                let delay = Delay::from_numer_denom_ms(self.settings.frame_duration_ms, 1);
                encoder.encode_frame(Frame::from_parts(snapshot.image.clone(), 0, 0, delay))?;
            }
        }
        Ok(bytes)
    }

    /// Encode and write to `path` via a sibling temp file and a rename.
    pub fn write_gif(&self, path: &Path) -> Result<()> {
        let bytes = self.encode_gif()?;
        write_atomically(path, &bytes)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let result = (|| {
        let mut file = fs::File::create(&partial)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&partial, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    Ok(result?)
}

/// `<player>_sequence_<match>_f<frame_loss>.gif`, player lower-cased with spaces as underscores
pub fn artifact_file_name(player_name: &str, match_id: MatchId, frame_loss: FrameNo) -> String {
    format!("{}_sequence_{}_f{}.gif", player_name.to_lowercase().replace(' ', "_"), match_id, frame_loss)
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub frame_numbers: Vec<FrameNo>,
    pub requested: usize,
    pub bytes: usize,
    pub state: ExportState,
}

pub struct SequenceAssembler<'a> {
    renderer: &'a SnapshotRenderer,
    settings: AnimationSettings,
}

impl<'a> SequenceAssembler<'a> {
    pub fn new(renderer: &'a SnapshotRenderer, settings: AnimationSettings) -> Self {
        Self { renderer, settings }
    }

    /// Render each requested frame that has tracking rows, in ascending order.
    ///
    /// Absent frames are skipped; if none is present the result is `EmptySequence`.
    pub fn assemble<S: FrameStore + Sync + ?Sized>(
        &self,
        store: &S,
        resolved: &ResolvedMatch,
        frames: &[FrameNo],
        focal: Option<&FocalPlayer>,
        cancel: &CancelFlag,
    ) -> Result<Animation> {
        let mut run = ExportRun::new(resolved.match_id);
        self.collect(&mut run, store, resolved, frames, focal, cancel)
    }

    fn collect<S: FrameStore + Sync + ?Sized>(
        &self,
        run: &mut ExportRun,
        store: &S,
        resolved: &ResolvedMatch,
        frames: &[FrameNo],
        focal: Option<&FocalPlayer>,
        cancel: &CancelFlag,
    ) -> Result<Animation> {
        let mut ordered = frames.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        run.advance(ExportState::Collecting);

        let render_one = |frame: FrameNo| -> Result<Option<Snapshot>> {
            if cancel.is_cancelled() {
                return Err(ViewerError::Cancelled);
            }
            let rows = store.rows_at(resolved.match_id, frame)?;
            if rows.is_empty() {
                debug!(match_id = resolved.match_id, frame, "no tracking rows, frame skipped");
                return Ok(None);
            }
            self.renderer.render_rows(frame, &rows, resolved, focal, TitleStyle::Sequence).map(Some)
        };

        let mut rendered: Vec<Snapshot> = if self.settings.parallel {
            let collected: Vec<Option<Snapshot>> = ordered.par_iter().map(|f| render_one(*f)).collect::<Result<_>>()?;
            collected.into_iter().flatten().collect()
        } else {
            let mut out = Vec::with_capacity(ordered.len());
            for frame in &ordered {
                if let Some(snapshot) = render_one(*frame)? {
                    out.push(snapshot);
                }
            }
            out
        };
        rendered.sort_by_key(|s| s.frame);

        if rendered.is_empty() {
            run.advance(ExportState::Empty);
            return Err(ViewerError::EmptySequence { match_id: resolved.match_id, requested: frames.len() });
        }

        Ok(Animation {
            match_id: resolved.match_id,
            frames: rendered,
            requested: frames.len(),
            settings: self.settings.clone(),
        })
    }

    /// Assemble, encode and write the GIF to `path`.
    pub fn export<S: FrameStore + Sync + ?Sized>(
        &self,
        store: &S,
        resolved: &ResolvedMatch,
        frames: &[FrameNo],
        focal: Option<&FocalPlayer>,
        cancel: &CancelFlag,
        path: &Path,
    ) -> Result<ExportReport> {
        let mut run = ExportRun::new(resolved.match_id);
        let animation = self.collect(&mut run, store, resolved, frames, focal, cancel)?;

        if cancel.is_cancelled() {
            return Err(ViewerError::Cancelled);
        }

        run.advance(ExportState::Encoding);
        let bytes = animation.encode_gif()?;
        write_atomically(path, &bytes)?;
        run.advance(ExportState::Done);

        info!(
            match_id = resolved.match_id,
            frames = animation.frame_count(),
            requested = animation.requested,
            path = %path.display(),
            "animation exported"
        );

        Ok(ExportReport {
            path: path.to_path_buf(),
            frame_numbers: animation.frame_numbers(),
            requested: animation.requested,
            bytes: bytes.len(),
            state: run.state,
        })
    }
}
