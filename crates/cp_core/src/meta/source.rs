use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ViewerError};
use crate::models::MatchMeta;
use crate::types::MatchId;

/// Where match metadata documents come from.
pub trait MetaSource {
    fn load(&self, match_id: MatchId) -> Result<MatchMeta>;
}

/// Directory of `<match_id>.json` documents
#[derive(Debug, Clone)]
pub struct MetaDir {
    root: PathBuf,
}

impl MetaDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, match_id: MatchId) -> PathBuf {
        self.root.join(format!("{}.json", match_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MetaSource for MetaDir {
    fn load(&self, match_id: MatchId) -> Result<MatchMeta> {
        let path = self.path_for(match_id);
        if !path.is_file() {
            return Err(ViewerError::not_found("match metadata", path.display().to_string()));
        }

        let data = fs::read_to_string(&path)?;
        parse_match_meta(&data)
    }
}

impl MetaSource for HashMap<MatchId, MatchMeta> {
    fn load(&self, match_id: MatchId) -> Result<MatchMeta> {
        self.get(&match_id)
            .cloned()
            .ok_or_else(|| ViewerError::not_found("match metadata", format!("match {}", match_id)))
    }
}

/// Parse a metadata document. Missing required fields are `Malformed`.
pub fn parse_match_meta(data: &str) -> Result<MatchMeta> {
    serde_json::from_str(data).map_err(|e| ViewerError::malformed("match metadata", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    const META_JSON: &str = r##"{
        "id": 1886347,
        "pitch_length": 105.0,
        "pitch_width": 68.0,
        "home_team": {"id": 262, "name": "Real Madrid CF", "short_name": "Real Madrid", "acronym": "RMA"},
        "away_team": {"id": 63, "name": "FC Barcelona", "short_name": "Barcelona"},
        "home_team_kit": {"id": 1, "team_id": 262, "jersey_color": "#FFFFFF", "number_color": "#000000"},
        "away_team_kit": {"id": 2, "team_id": 63, "jersey_color": "#A50044", "number_color": "#EDBB00"},
        "players": [
            {"id": 6028, "number": 9, "team_id": 262, "short_name": "K. Mbappé"},
            {"id": 501, "number": 8, "team_id": 63}
        ]
    }"##;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let meta = parse_match_meta(META_JSON).unwrap();
        assert_eq!(meta.pitch_length, 105.0);
        assert_eq!(meta.home_team.id, 262);
        assert_eq!(meta.players.len(), 2);
        assert_eq!(meta.away_team_kit.number_color, "#EDBB00");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_match_meta(r#"{"pitch_length": 105.0}"#).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::Configuration(ConfigurationError::Malformed { what: "match metadata", .. })
        ));
    }

    #[test]
    fn test_meta_dir_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = MetaDir::new(dir.path());
        let err = source.load(42).unwrap_err();
        assert!(matches!(err, ViewerError::Configuration(ConfigurationError::NotFound { .. })));
    }

    #[test]
    fn test_meta_dir_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1886347.json"), META_JSON).unwrap();

        let source = MetaDir::new(dir.path());
        let meta = source.load(1886347).unwrap();
        assert_eq!(meta.away_team.short_name.as_deref(), Some("Barcelona"));
    }
}
