use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Row, RowAccessor};
use parquet::schema::types::Type as SchemaType;
use tracing::{debug, info, warn};

use super::cache::decode_frames;
use super::frames::MatchFrames;
use crate::error::{Result, ViewerError};
use crate::models::TrackingRecord;
use crate::types::MatchId;

/// Row-level outcome of reading a tracking CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

/// Parse a tracking CSV (`frame,player_id,is_ball,x,y`, extra columns ignored).
///
/// Rows that fail to parse are skipped and counted.
pub fn read_tracking_csv<R: Read>(reader: R) -> Result<(MatchFrames, LoadStats)> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    for (line, row) in csv_reader.deserialize::<TrackingRecord>().enumerate() {
        stats.total_rows += 1;
        match row {
            Ok(record) => {
                stats.parsed += 1;
                records.push(record);
            }
            Err(e) => {
                stats.failed += 1;
                // header is line 1
                warn!(line = line + 2, error = %e, "skipping unreadable tracking row");
            }
        }
    }

    Ok((MatchFrames::from_records(records)?, stats))
}

pub fn load_tracking_csv(path: &Path) -> Result<(MatchFrames, LoadStats)> {
    let file = fs::File::open(path)?;
    read_tracking_csv(file)
}

/// parquet 파일 안의 트래킹 컬럼 위치
struct ParquetColumns {
    frame: usize,
    player_id: Option<usize>,
    is_ball: usize,
    x: usize,
    y: usize,
}

impl ParquetColumns {
    fn locate(schema: &SchemaType) -> Result<Self> {
        let fields = schema.get_fields();
        let find = |name: &str| fields.iter().position(|f| f.name() == name);
        let require = |name: &'static str| {
            find(name).ok_or_else(|| ViewerError::malformed("tracking parquet", format!("missing column '{}'", name)))
        };
        Ok(Self {
            frame: require("frame")?,
            player_id: find("player_id"),
            is_ball: require("is_ball")?,
            x: require("x")?,
            y: require("y")?,
        })
    }

    fn record(&self, row: &Row) -> std::result::Result<TrackingRecord, String> {
        let frame = read_int(row, self.frame).ok_or("frame is not an integer")?;
        let is_ball = read_bool(row, self.is_ball).ok_or("is_ball is not a boolean")?;
        let x = read_float(row, self.x).ok_or("x is not a number")?;
        let y = read_float(row, self.y).ok_or("y is not a number")?;
        // NaN/null player ids (ball rows) read as None
        let player_id = self
            .player_id
            .and_then(|i| read_int(row, i))
            .and_then(|id| u32::try_from(id).ok());
        Ok(TrackingRecord { frame, player_id, is_ball, x, y })
    }
}

fn read_int(row: &Row, idx: usize) -> Option<i64> {
    if let Ok(v) = row.get_long(idx) {
        return Some(v);
    }
    if let Ok(v) = row.get_int(idx) {
        return Some(i64::from(v));
    }
    // pandas는 null이 섞인 정수 컬럼을 float64로 저장
    row.get_double(idx).ok().filter(|v| v.is_finite() && v.fract() == 0.0).map(|v| v as i64)
}

fn read_float(row: &Row, idx: usize) -> Option<f64> {
    if let Ok(v) = row.get_double(idx) {
        return Some(v);
    }
    if let Ok(v) = row.get_float(idx) {
        return Some(f64::from(v));
    }
    read_int(row, idx).map(|v| v as f64)
}

fn read_bool(row: &Row, idx: usize) -> Option<bool> {
    if let Ok(v) = row.get_bool(idx) {
        return Some(v);
    }
    if let Ok(s) = row.get_string(idx) {
        return match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        };
    }
    read_int(row, idx).map(|v| v != 0)
}

/// Read a columnar tracking file (`frame`, `player_id`, `is_ball`, `x`, `y`).
///
/// Rows with unreadable fields are skipped and counted, like the CSV reader.
pub fn load_tracking_parquet(path: &Path) -> Result<(MatchFrames, LoadStats)> {
    let file = fs::File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let columns = ParquetColumns::locate(reader.metadata().file_metadata().schema())?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    for (index, row) in reader.get_row_iter(None)?.enumerate() {
        stats.total_rows += 1;
        let parsed = row.map_err(|e| e.to_string()).and_then(|row| columns.record(&row));
        match parsed {
            Ok(record) => {
                stats.parsed += 1;
                records.push(record);
            }
            Err(reason) => {
                stats.failed += 1;
                warn!(row = index, error = %reason, "skipping unreadable tracking row");
            }
        }
    }

    Ok((MatchFrames::from_records(records)?, stats))
}

/// `source`가 존재하고 `cache`보다 나중에 수정됐으면 true
fn newer_than(source: &Path, cache: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(cache)) {
        (Some(source), Some(cache)) => source > cache,
        _ => false,
    }
}

pub fn load_tracking_cache(path: &Path) -> Result<MatchFrames> {
    let bytes = fs::read(path)?;
    decode_frames(&bytes)
}

/// Directory of per-match tracking files: `<match_id>.cache`, `<match_id>.parquet`
/// or `<match_id>.csv`.
#[derive(Debug, Clone)]
pub struct TrackingDir {
    root: PathBuf,
}

impl TrackingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn csv_path(&self, match_id: MatchId) -> PathBuf {
        self.root.join(format!("{}.csv", match_id))
    }

    pub fn cache_path(&self, match_id: MatchId) -> PathBuf {
        self.root.join(format!("{}.cache", match_id))
    }

    pub fn parquet_path(&self, match_id: MatchId) -> PathBuf {
        self.root.join(format!("{}.parquet", match_id))
    }

    /// 경기 하나 로드: 캐시 → parquet → CSV 순서.
    ///
    /// 원본 파일보다 오래된 캐시는 무시한다.
    pub fn load(&self, match_id: MatchId) -> Result<MatchFrames> {
        let parquet_path = self.parquet_path(match_id);
        let csv_path = self.csv_path(match_id);

        let cache_path = self.cache_path(match_id);
        if cache_path.is_file() {
            let stale = [&parquet_path, &csv_path].into_iter().find(|src| newer_than(src, &cache_path));
            match stale {
                Some(source) => {
                    warn!(match_id, source = %source.display(), "tracking cache older than its source, ignoring it");
                }
                None => {
                    let frames = load_tracking_cache(&cache_path)?;
                    debug!(match_id, frames = frames.frame_count(), "tracking loaded from cache");
                    return Ok(frames);
                }
            }
        }

        let (frames, stats) = if parquet_path.is_file() {
            load_tracking_parquet(&parquet_path)?
        } else if csv_path.is_file() {
            load_tracking_csv(&csv_path)?
        } else {
            return Err(ViewerError::not_found("tracking data", parquet_path.display().to_string()));
        };

        if stats.failed > 0 {
            warn!(match_id, failed = stats.failed, total = stats.total_rows, "tracking rows skipped");
        }
        info!(match_id, frames = frames.frame_count(), rows = frames.row_count(), "tracking loaded");
        Ok(frames)
    }
}
