//! 트래킹 캐시 파이프라인
//!
//! - `build_tracking_cache`: `<match_id>.parquet` 또는 `<match_id>.csv` → `<match_id>.cache`
//! - `build_directory`: freeze 디렉토리 전체 + 체크섬을 기록한 `manifest.json`
//!
//! 캐시 포맷은 `cp_core::store::cache` 소관; 여기서는 변환과 메타데이터 기록만 한다.

use anyhow::{anyhow, Context, Result};
use cp_core::store::{
    encode_frames, load_tracking_cache, load_tracking_csv, load_tracking_parquet, LoadStats, CACHE_SCHEMA_VERSION,
};
use cp_core::MatchFrames;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{checksum, human_bytes, CacheMetadata};

pub const MANIFEST_FILE: &str = "manifest.json";

/// 디렉토리 단위로 빌드한 캐시들의 체크섬 목록
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub schema_version: String,
    pub entries: BTreeMap<u32, CacheMetadata>,
}

impl CacheManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&text).context("Failed to parse manifest")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write manifest: {}", path.display()))
    }
}

/// 파일명에서 경기 ID 추출 (`1886347.csv` → 1886347)
pub fn match_id_from_path(path: &Path) -> Result<u32> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("No file name: {}", path.display()))?;
    stem.parse()
        .with_context(|| format!("File name is not a match id: {}", path.display()))
}

/// 트래킹 원본 형식 (확장자로 판별)
fn is_tracking_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv" || ext == "parquet")
}

fn load_source(path: &Path) -> Result<(MatchFrames, LoadStats)> {
    let loaded = if path.extension().is_some_and(|ext| ext == "parquet") {
        load_tracking_parquet(path)
    } else {
        load_tracking_csv(path)
    };
    loaded.with_context(|| format!("Failed to parse tracking data: {}", path.display()))
}

/// 트래킹 파일 하나를 캐시 파일로 변환
///
/// # Arguments
///
/// * `source` - `<match_id>.parquet` 또는 `<match_id>.csv`
/// * `output` - 캐시 파일 경로
///
/// # Returns
///
/// 체크섬, 크기, 압축률을 담은 캐시 메타데이터
pub fn build_tracking_cache(source: &Path, output: &Path) -> Result<CacheMetadata> {
    let match_id = match_id_from_path(source)?;

    // 1. 원본 읽기
    let original_size = fs::metadata(source)
        .with_context(|| format!("Failed to read tracking file: {}", source.display()))?
        .len();
    let (frames, stats) = load_source(source)?;

    // 2. MessagePack + LZ4
    let compressed = encode_frames(&frames).context("Failed to encode tracking cache")?;
    let compressed_size = compressed.len() as u64;

    // 3. 출력 파일 쓰기
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(output, &compressed)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    let compression_ratio = if original_size == 0 { 1.0 } else { compressed_size as f64 / original_size as f64 };

    Ok(CacheMetadata {
        schema_version: format!("v{}", CACHE_SCHEMA_VERSION),
        match_id,
        frames: frames.frame_count(),
        rows: frames.row_count(),
        skipped_rows: stats.failed,
        checksum: checksum(&compressed),
        created_at: chrono::Utc::now().to_rfc3339(),
        original_size,
        compressed_size,
        compression_ratio,
    })
}

/// `dir` 안의 모든 트래킹 파일 옆에 `<match_id>.cache` 생성
///
/// 경기 ID가 아닌 파일명은 건너뛴다. 같은 경기의 parquet와 CSV가 모두 있으면
/// parquet를 쓴다. manifest를 `dir`에 저장하고 반환.
pub fn build_directory(dir: &Path) -> Result<CacheManifest> {
    let mut sources: BTreeMap<u32, PathBuf> = BTreeMap::new();
    for path in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_tracking_source(p))
    {
        let Ok(match_id) = match_id_from_path(&path) else {
            continue;
        };
        let is_parquet = path.extension().is_some_and(|ext| ext == "parquet");
        if is_parquet || !sources.contains_key(&match_id) {
            sources.insert(match_id, path);
        }
    }

    let mut manifest = CacheManifest { schema_version: format!("v{}", CACHE_SCHEMA_VERSION), entries: BTreeMap::new() };
    for source in sources.into_values() {
        let output = source.with_extension("cache");
        let meta = build_tracking_cache(&source, &output)?;
        println!(
            "   {} → {} ({} frames, {})",
            source.display(),
            output.display(),
            meta.frames,
            human_bytes(meta.compressed_size)
        );
        manifest.entries.insert(meta.match_id, meta);
    }

    manifest.save(&dir.join(MANIFEST_FILE))?;
    Ok(manifest)
}

/// 캐시 파일을 프레임으로 복원
pub fn load_cache(cache_file: &Path) -> Result<MatchFrames> {
    load_tracking_cache(cache_file)
        .with_context(|| format!("Failed to load cache file: {}", cache_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify_cache;

    const CSV: &str = "frame,player_id,is_ball,x,y\n\
        100,,True,0.0,0.0\n\
        100,6028.0,False,10.0,-5.0\n\
        100,501.0,False,-3.5,7.25\n\
        102,,True,0.5,0.1\n\
        102,6028.0,False,10.4,-5.2\n\
        103,oops,False,1.0,1.0\n";

    #[test]
    fn test_build_verify_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv_path = dir.path().join("1886347.csv");
        fs::write(&csv_path, CSV)?;

        let output = dir.path().join("1886347.cache");
        let meta = build_tracking_cache(&csv_path, &output)?;

        assert_eq!(meta.match_id, 1886347);
        assert_eq!(meta.schema_version, "v1");
        assert_eq!(meta.frames, 2);
        assert_eq!(meta.rows, 5);
        assert_eq!(meta.skipped_rows, 1);
        assert!(verify_cache(&output, &meta.checksum)?);

        let frames = load_cache(&output)?;
        let (from_csv, _) = load_tracking_csv(&csv_path)?;
        assert_eq!(frames, from_csv);
        Ok(())
    }

    #[test]
    fn test_build_directory_writes_manifest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("7.csv"), CSV)?;
        fs::write(dir.path().join("9.csv"), CSV)?;
        fs::write(dir.path().join("notes.csv"), "not,tracking\n")?;

        let manifest = build_directory(dir.path())?;
        assert_eq!(manifest.entries.keys().copied().collect::<Vec<_>>(), vec![7, 9]);
        assert!(dir.path().join("7.cache").is_file());
        assert!(!dir.path().join("notes.cache").exists());

        let reloaded = CacheManifest::load(&dir.path().join(MANIFEST_FILE))?;
        assert_eq!(reloaded.entries.len(), 2);
        assert_eq!(reloaded.entries[&9].checksum, manifest.entries[&9].checksum);
        Ok(())
    }

    #[test]
    fn test_tracking_source_extensions() {
        assert!(is_tracking_source(Path::new("freeze/7.parquet")));
        assert!(is_tracking_source(Path::new("freeze/7.csv")));
        assert!(!is_tracking_source(Path::new("freeze/7.cache")));
        assert!(!is_tracking_source(Path::new(MANIFEST_FILE)));
    }

    #[test]
    fn test_non_numeric_file_name_rejected() {
        assert!(match_id_from_path(Path::new("freeze/abc.csv")).is_err());
        assert_eq!(match_id_from_path(Path::new("freeze/42.csv")).unwrap(), 42);
    }
}
