//! 바이너리 트래킹 캐시
//!
//! 레코드 → MessagePack → LZ4 (크기 정보 포함). CSV보다 로딩이 훨씬 빠르고
//! 용량도 작다.

use serde::{Deserialize, Serialize};

use super::frames::MatchFrames;
use crate::error::{Result, ViewerError};
use crate::models::TrackingRecord;

pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct TrackingCache {
    schema_version: u32,
    records: Vec<TrackingRecord>,
}

pub fn encode_frames(frames: &MatchFrames) -> Result<Vec<u8>> {
    let cache = TrackingCache {
        schema_version: CACHE_SCHEMA_VERSION,
        records: frames.records().cloned().collect(),
    };
    let msgpack = rmp_serde::to_vec(&cache).map_err(|e| ViewerError::Cache(e.to_string()))?;
    Ok(lz4_flex::compress_prepend_size(&msgpack))
}

pub fn decode_frames(bytes: &[u8]) -> Result<MatchFrames> {
    let msgpack = lz4_flex::decompress_size_prepended(bytes)
        .map_err(|e| ViewerError::Cache(format!("decompression failed: {}", e)))?;
    let cache: TrackingCache =
        rmp_serde::from_slice(&msgpack).map_err(|e| ViewerError::Cache(e.to_string()))?;

    if cache.schema_version != CACHE_SCHEMA_VERSION {
        return Err(ViewerError::Cache(format!(
            "schema version mismatch: found {}, expected {}",
            cache.schema_version, CACHE_SCHEMA_VERSION
        )));
    }

    MatchFrames::from_records(cache.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_preserves_sparse_frames() {
        let frames = MatchFrames::from_records(vec![
            TrackingRecord::ball(100, 0.0, 0.0),
            TrackingRecord::player(100, 6028, -10.5, 3.25),
            TrackingRecord::ball(104, 1.0, -1.0),
        ])
        .unwrap();

        let decoded = decode_frames(&encode_frames(&frames).unwrap()).unwrap();
        assert_eq!(decoded, frames);
        assert!(!decoded.contains(101));
    }

    #[test]
    fn test_garbage_is_cache_error() {
        let not_msgpack = lz4_flex::compress_prepend_size(b"not a cache");
        assert!(matches!(decode_frames(&not_msgpack), Err(ViewerError::Cache(_))));
        assert!(matches!(decode_frames(&[3, 0, 0, 0, 0xff]), Err(ViewerError::Cache(_))));
    }
}
