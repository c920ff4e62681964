//! Viewer configuration
//!
//! Loaded from YAML; every field has a default, so an empty document is a
//! valid configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{ConfigurationError, Result, ViewerError};
use crate::linker::{DEFAULT_EXPORT_PADDING, EXPORT_PADDING_STEP, VIEW_PADDING};
use crate::render::RenderStyle;
use crate::sequence::{AnimationSettings, LoopCount, DEFAULT_FRAME_DURATION_MS};
use crate::types::{FocalPlayer, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CanvasSize {
    #[validate(range(min = 160, max = 4096))]
    pub width: u32,
    #[validate(range(min = 120, max = 4096))]
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn style(self) -> RenderStyle {
        RenderStyle::sized(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_config"))]
pub struct ViewerConfig {
    /// Root of the data layout; relative sub-paths resolve against it
    pub data_dir: PathBuf,
    pub events_csv: PathBuf,
    pub meta_dir: PathBuf,
    pub freeze_dir: PathBuf,
    pub output_dir: PathBuf,

    #[validate(length(min = 1))]
    pub tracked_players: Vec<FocalPlayer>,

    #[validate(range(min = 1, max = 1000))]
    pub view_padding: u32,
    #[validate(range(min = 10, max = 150))]
    pub export_padding: u32,

    #[validate(range(min = 10, max = 10000))]
    pub frame_duration_ms: u32,
    /// Number of plays; absent means loop forever
    pub loop_count: Option<u16>,

    #[validate]
    pub view_size: CanvasSize,
    #[validate]
    pub export_size: CanvasSize,
    pub parallel_render: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            events_csv: PathBuf::from("csv/counterpress_analysis_all.csv"),
            meta_dir: PathBuf::from("meta"),
            freeze_dir: PathBuf::from("freeze"),
            output_dir: PathBuf::from("exports"),
            tracked_players: default_tracked_players(),
            view_padding: VIEW_PADDING,
            export_padding: DEFAULT_EXPORT_PADDING,
            frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            loop_count: None,
            view_size: CanvasSize::new(1000, 700),
            export_size: CanvasSize::new(800, 600),
            parallel_render: false,
        }
    }
}

/// Focal players the event table was computed for
pub fn default_tracked_players() -> Vec<FocalPlayer> {
    vec![
        FocalPlayer::new(6028, "Mbappé"),
        FocalPlayer::new(12253, "Vinicius Jr"),
        FocalPlayer::new(23903, "Rodrygo"),
    ]
}

fn validate_config(config: &ViewerConfig) -> std::result::Result<(), ValidationError> {
    if config.export_padding % EXPORT_PADDING_STEP != 0 {
        return Err(ValidationError::new("export_padding_step"));
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for player in &config.tracked_players {
        if player.name.trim().is_empty() {
            return Err(ValidationError::new("tracked_player_name_empty"));
        }
        if !ids.insert(player.id) || !names.insert(player.name.as_str()) {
            return Err(ValidationError::new("tracked_player_duplicate"));
        }
    }
    Ok(())
}

impl ViewerConfig {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ViewerError::not_found("viewer config", path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_yaml::from_str(text).map_err(|e| ViewerError::malformed("viewer config", e))?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|e| ConfigurationError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_csv)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.data_dir.join(&self.meta_dir)
    }

    pub fn freeze_path(&self) -> PathBuf {
        self.data_dir.join(&self.freeze_dir)
    }

    /// Where exported GIFs go; an absolute `output_dir` is kept as is.
    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_dir)
    }

    pub fn tracked_player(&self, name: &str) -> Option<&FocalPlayer> {
        self.tracked_players.iter().find(|p| p.name == name)
    }

    pub fn tracked_player_by_id(&self, id: PlayerId) -> Option<&FocalPlayer> {
        self.tracked_players.iter().find(|p| p.id == id)
    }

    pub fn animation_settings(&self) -> AnimationSettings {
        AnimationSettings {
            frame_duration_ms: self.frame_duration_ms,
            loop_count: self.loop_count.map_or(LoopCount::Infinite, LoopCount::Finite),
            parallel: self.parallel_render,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.events_path(), Path::new("./csv/counterpress_analysis_all.csv"));
        assert_eq!(config.tracked_player("Vinicius Jr").map(|p| p.id), Some(12253));
        assert_eq!(config.tracked_player_by_id(23903).map(|p| p.name.as_str()), Some("Rodrygo"));
        assert_eq!(config.animation_settings(), AnimationSettings::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ViewerConfig::from_yaml("data_dir: /data/counterpress\nexport_padding: 50\nloop_count: 2\n").unwrap();
        assert_eq!(config.export_padding, 50);
        assert_eq!(config.view_padding, 10);
        assert_eq!(config.meta_path(), Path::new("/data/counterpress/meta"));
        assert_eq!(config.output_path(), Path::new("/data/counterpress/exports"));
        assert_eq!(config.animation_settings().loop_count, LoopCount::Finite(2));
        assert_eq!(config.tracked_players.len(), 3);
    }

    #[test]
    fn test_absolute_output_dir_ignores_data_dir() {
        let config = ViewerConfig::from_yaml("data_dir: /data/counterpress\noutput_dir: /tmp/gifs\n").unwrap();
        assert_eq!(config.output_path(), Path::new("/tmp/gifs"));
    }

    #[test]
    fn test_empty_document_is_default() {
        // an empty YAML document deserializes as unit, not a map
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_export_padding_bounds_and_step() {
        for bad in ["export_padding: 5", "export_padding: 160", "export_padding: 55"] {
            let err = ViewerConfig::from_yaml(bad).unwrap_err();
            assert!(matches!(err, ViewerError::Configuration(ConfigurationError::Invalid(_))), "{}", bad);
        }
        assert!(ViewerConfig::from_yaml("export_padding: 150").is_ok());
    }

    #[test]
    fn test_zero_frame_duration_rejected() {
        assert!(ViewerConfig::from_yaml("frame_duration_ms: 0").is_err());
    }

    #[test]
    fn test_duplicate_tracked_players_rejected() {
        let yaml = "tracked_players:\n  - { id: 1, name: A }\n  - { id: 1, name: B }\n";
        assert!(ViewerConfig::from_yaml(yaml).is_err());
        assert!(ViewerConfig::from_yaml("tracked_players: []").is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ViewerConfig::from_yaml("view_padding: [1, 2").unwrap_err();
        assert!(matches!(err, ViewerError::Configuration(ConfigurationError::Malformed { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        fs::write(&path, "parallel_render: true\nview_size: { width: 500, height: 350 }\n").unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert!(config.parallel_render);
        assert_eq!(config.view_size.style().width, 500);

        assert!(ViewerConfig::load(&dir.path().join("nope.yaml")).is_err());
    }
}
