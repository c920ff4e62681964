//! Cache Builder Library
//!
//! 트래킹 CSV/Parquet → MessagePack → LZ4 압축 → SHA256 체크섬 생성
//! 경기당 캐시 하나, cp_core 프레임 스토어에서 바로 읽힌다.

pub mod tracking_cache;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub use tracking_cache::{build_directory, build_tracking_cache, load_cache, match_id_from_path, CacheManifest};

/// 캐시 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// 스키마 버전 (예: "v1")
    pub schema_version: String,
    pub match_id: u32,
    pub frames: usize,
    pub rows: usize,
    /// 파싱 중 버린 행 수
    pub skipped_rows: u32,
    /// SHA256 체크섬 (hex 문자열)
    pub checksum: String,
    /// 생성 시각 (RFC3339 형식)
    pub created_at: String,
    /// 원본 파일 크기 (bytes)
    pub original_size: u64,
    /// 압축 후 크기 (bytes)
    pub compressed_size: u64,
    /// 압축률 (압축 후 / 원본)
    pub compression_ratio: f64,
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// 캐시 파일 무결성 검증 (SHA256)
pub fn verify_cache(cache_file: &Path, expected_checksum: &str) -> Result<bool> {
    let bytes = fs::read(cache_file)
        .with_context(|| format!("Failed to read cache file: {}", cache_file.display()))?;

    Ok(checksum(&bytes) == expected_checksum)
}

/// 사람이 읽기 쉬운 바이트 크기 포맷
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}
