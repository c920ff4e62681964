//! Viewer session
//!
//! Wires tracking, metadata, linker, renderer and assembler behind the two
//! request/response workflows: look at one frame of a ball loss, or export
//! the sequence around it.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::linker::{candidate_frames, clamp_export_padding, window, FrameWindow};
use crate::meta::{MetaDir, MetaSource, MetadataResolver, ResolvedMatch};
use crate::models::LossEvent;
use crate::render::{Snapshot, SnapshotRenderer, TitleStyle};
use crate::sequence::{artifact_file_name, CancelFlag, ExportReport, SequenceAssembler};
use crate::store::{FrameStore, InMemoryStore, MatchFrames, TrackingDir};
use crate::types::{FocalPlayer, FrameNo, MatchId};

/// One frame shown for an event
#[derive(Debug, Clone)]
pub struct FrameView {
    pub window: FrameWindow,
    /// Frame actually rendered, after snapping to a present frame
    pub shown_frame: FrameNo,
    pub snapshot: Snapshot,
}

pub struct CounterpressViewer<M: MetaSource = MetaDir> {
    config: ViewerConfig,
    tracking: TrackingDir,
    store: InMemoryStore,
    resolver: MetadataResolver<M>,
    view_renderer: SnapshotRenderer,
    export_renderer: SnapshotRenderer,
}

impl CounterpressViewer<MetaDir> {
    /// Viewer over the directory layout named by `config`.
    pub fn open(config: ViewerConfig) -> Result<Self> {
        config.check()?;
        let meta = MetaDir::new(config.meta_path());
        let tracking = TrackingDir::new(config.freeze_path());
        Ok(Self::with_sources(config, meta, tracking))
    }
}

impl<M: MetaSource> CounterpressViewer<M> {
    pub fn with_sources(config: ViewerConfig, meta: M, tracking: TrackingDir) -> Self {
        let view_renderer = SnapshotRenderer::new(config.view_size.style());
        let export_renderer = SnapshotRenderer::new(config.export_size.style());
        Self {
            config,
            tracking,
            store: InMemoryStore::new(),
            resolver: MetadataResolver::new(meta),
            view_renderer,
            export_renderer,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Install tracking for a match directly, bypassing the tracking directory.
    pub fn insert_tracking(&mut self, match_id: MatchId, frames: MatchFrames) {
        self.store.insert(match_id, frames);
    }

    fn ensure_tracking(&mut self, match_id: MatchId) -> Result<()> {
        if !self.store.is_loaded(match_id) {
            let frames = self.tracking.load(match_id)?;
            self.store.insert(match_id, frames);
        }
        Ok(())
    }

    pub fn resolve(&mut self, match_id: MatchId) -> Result<Arc<ResolvedMatch>> {
        self.resolver.resolve(match_id)
    }

    /// Frame numbers with tracking rows for a match
    pub fn frames(&mut self, match_id: MatchId) -> Result<BTreeSet<FrameNo>> {
        self.ensure_tracking(match_id)?;
        self.store.frames_for(match_id)
    }

    /// Present-frame window used for interactive viewing
    pub fn view_window(&mut self, event: &LossEvent) -> Result<FrameWindow> {
        self.ensure_tracking(event.match_id)?;
        window(&self.store, event.match_id, event.frame_loss, self.config.view_padding)
    }

    /// Render one frame near the event's loss frame.
    ///
    /// `frame` defaults to `frame_loss` and snaps to the nearest present frame.
    pub fn view(&mut self, event: &LossEvent, focal: Option<&FocalPlayer>, frame: Option<FrameNo>) -> Result<FrameView> {
        let window = self.view_window(event)?;
        let resolved = self.resolver.resolve(event.match_id)?;

        let requested = frame.unwrap_or(event.frame_loss);
        let shown_frame = window.select(requested);
        if shown_frame != requested {
            debug!(match_id = event.match_id, requested, shown_frame, "frame snapped to nearest present frame");
        }

        let snapshot = self.view_renderer.render(&self.store, &resolved, shown_frame, focal, TitleStyle::Freeze)?;
        Ok(FrameView { window, shown_frame, snapshot })
    }

    /// Artifact path for an export of this event
    pub fn export_path(&self, event: &LossEvent, focal: &FocalPlayer) -> PathBuf {
        self.config.output_path().join(artifact_file_name(&focal.name, event.match_id, event.frame_loss))
    }

    /// Export the frames within `padding` of the loss frame as a GIF.
    ///
    /// Absent frames inside the range are skipped. `padding` defaults to the
    /// configured export padding and is snapped onto the allowed grid.
    pub fn export(
        &mut self,
        event: &LossEvent,
        focal: &FocalPlayer,
        padding: Option<u32>,
        cancel: &CancelFlag,
    ) -> Result<ExportReport> {
        self.ensure_tracking(event.match_id)?;
        let resolved = self.resolver.resolve(event.match_id)?;

        let padding = clamp_export_padding(padding.unwrap_or(self.config.export_padding));
        let requested: Vec<FrameNo> = candidate_frames(event.frame_loss, padding).collect();
        let path = self.export_path(event, focal);
        info!(match_id = event.match_id, frame_loss = event.frame_loss, padding, player = %focal.name, "exporting sequence");

        let assembler = SequenceAssembler::new(&self.export_renderer, self.config.animation_settings());
        assembler.export(&self.store, &resolved, &requested, Some(focal), cancel, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, ViewerError};
    use crate::models::{MatchMeta, TrackingRecord};
    use crate::test_support::sample_meta;
    use std::collections::HashMap;
    use std::fs;

    fn event(match_id: MatchId, frame_loss: FrameNo) -> LossEvent {
        LossEvent {
            match_id,
            frame_loss,
            player_tracked: "Mbappé".to_string(),
            player_near_loss: true,
            player_involved_in_counterpress: false,
            recovered_in_5s: false,
            recovery_time: None,
            third_start: None,
            channel_start: None,
            game_state: None,
            x_loss: None,
            y_loss: None,
        }
    }

    fn frames(range: impl IntoIterator<Item = FrameNo>) -> MatchFrames {
        let mut records = Vec::new();
        for f in range {
            records.push(TrackingRecord::ball(f, 0.0, 0.0));
            records.push(TrackingRecord::player(f, 6028, f as f64 * 0.1 - 10.0, 5.0));
            records.push(TrackingRecord::player(f, 501, 3.0, -2.0));
        }
        MatchFrames::from_records(records).unwrap()
    }

    fn small_config(output_dir: PathBuf) -> ViewerConfig {
        ViewerConfig {
            output_dir,
            view_size: crate::config::CanvasSize::new(200, 140),
            export_size: crate::config::CanvasSize::new(160, 120),
            ..ViewerConfig::default()
        }
    }

    fn viewer(config: ViewerConfig) -> CounterpressViewer<HashMap<MatchId, MatchMeta>> {
        let meta = HashMap::from([(1, sample_meta())]);
        let mut viewer = CounterpressViewer::with_sources(config, meta, TrackingDir::new("unused"));
        viewer.insert_tracking(1, frames((100..=104).chain(108..=120)));
        viewer
    }

    #[test]
    fn test_view_defaults_to_loss_frame() {
        let mut viewer = viewer(small_config(PathBuf::from("unused")));
        let focal = FocalPlayer::new(6028, "Mbappé");
        let view = viewer.view(&event(1, 110), Some(&focal), None).unwrap();

        assert_eq!(view.shown_frame, 110);
        assert_eq!(view.window.first(), 100);
        assert_eq!(view.window.last(), 120);
        assert_eq!(view.window.len(), 18);
        assert!(view.snapshot.stats.focal_drawn);
        assert_eq!(view.snapshot.image.dimensions(), (200, 140));
    }

    #[test]
    fn test_view_snaps_to_present_frame() {
        let mut viewer = viewer(small_config(PathBuf::from("unused")));
        // 105..=107 are absent; 106 is equidistant and ties go to the earlier frame
        let view = viewer.view(&event(1, 110), None, Some(106)).unwrap();
        assert_eq!(view.shown_frame, 104);
        let view = viewer.view(&event(1, 110), None, Some(107)).unwrap();
        assert_eq!(view.shown_frame, 108);
    }

    #[test]
    fn test_view_empty_window() {
        let mut viewer = viewer(small_config(PathBuf::from("unused")));
        let err = viewer.view(&event(1, 500), None, None).unwrap_err();
        assert!(matches!(err, ViewerError::EmptyFrameWindow { match_id: 1, frame_loss: 500, padding: 10 }));
        assert!(err.is_no_data());
    }

    #[test]
    fn test_missing_metadata_is_configuration_error() {
        let mut viewer = viewer(small_config(PathBuf::from("unused")));
        viewer.insert_tracking(2, frames(100..=110));
        let err = viewer.view(&event(2, 105), None, None).unwrap_err();
        assert!(matches!(err, ViewerError::Configuration(ConfigurationError::NotFound { .. })));
    }

    #[test]
    fn test_export_skips_gaps_and_names_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer(small_config(dir.path().to_path_buf()));
        let focal = FocalPlayer::new(12253, "Vinicius Jr");

        let report = viewer.export(&event(1, 110), &focal, Some(10), &CancelFlag::new()).unwrap();
        assert_eq!(report.requested, 21);
        assert_eq!(report.frame_numbers.len(), 18);
        assert!(report.frame_numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(report.path, dir.path().join("vinicius_jr_sequence_1_f110.gif"));
        assert!(fs::metadata(&report.path).unwrap().len() > 0);
    }

    #[test]
    fn test_relative_output_dir_lands_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig { data_dir: dir.path().to_path_buf(), ..small_config(PathBuf::from("exports")) };
        let mut viewer = viewer(config);
        let focal = FocalPlayer::new(6028, "Mbappé");

        let report = viewer.export(&event(1, 110), &focal, Some(10), &CancelFlag::new()).unwrap();
        assert_eq!(report.path, dir.path().join("exports").join("mbappé_sequence_1_f110.gif"));
        assert!(report.path.is_file());
    }

    #[test]
    fn test_export_with_no_frames_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer(small_config(dir.path().to_path_buf()));
        let focal = FocalPlayer::new(6028, "Mbappé");

        let err = viewer.export(&event(1, 1000), &focal, Some(10), &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, ViewerError::EmptySequence { match_id: 1, requested: 21 }));
        assert!(!viewer.export_path(&event(1, 1000), &focal).exists());
    }

    #[test]
    fn test_open_reads_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("meta")).unwrap();
        fs::create_dir_all(dir.path().join("freeze")).unwrap();
        fs::write(dir.path().join("meta/7.json"), serde_json::to_string(&sample_meta()).unwrap()).unwrap();
        fs::write(
            dir.path().join("freeze/7.csv"),
            "frame,player_id,is_ball,x,y\n50,,True,0.0,0.0\n50,6028,False,1.0,1.0\n51,,True,0.2,0.0\n",
        )
        .unwrap();

        let config = ViewerConfig {
            data_dir: dir.path().to_path_buf(),
            view_size: crate::config::CanvasSize::new(200, 140),
            ..ViewerConfig::default()
        };
        let mut viewer = CounterpressViewer::open(config).unwrap();
        assert_eq!(viewer.frames(7).unwrap().into_iter().collect::<Vec<_>>(), vec![50, 51]);

        let view = viewer.view(&event(7, 50), None, None).unwrap();
        assert_eq!(view.snapshot.stats.players, 1);
        assert_eq!(viewer.resolve(7).unwrap().match_id, 7);
    }
}
