//! Cache Builder CLI
//!
//! 트래킹 CSV/Parquet → MessagePack+LZ4 캐시 (경기 단위 또는 freeze 디렉토리 단위)

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "cache_builder")]
#[command(about = "Build compressed tracking caches from CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Build the cache for one match
    Match {
        /// Input tracking file (<match_id>.parquet or <match_id>.csv)
        #[arg(long)]
        input: PathBuf,

        /// Output cache path (defaults to <match_id>.cache next to the input)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Verify cache after building
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Build caches for every tracking file in a freeze directory
    Dir {
        /// Freeze directory
        #[arg(long)]
        dir: PathBuf,

        /// Verify every cache against the manifest after building
        #[arg(long, default_value = "false")]
        verify: bool,
    },

    /// Decode a cache and print its frame span
    Inspect {
        /// Cache file path
        #[arg(long)]
        cache: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Match { input, out, verify, metadata } => {
            let out = out.unwrap_or_else(|| input.with_extension("cache"));
            println!("🔨 Building tracking cache...");
            println!("   Input:  {}", input.display());
            println!("   Output: {}", out.display());

            let meta = cache_builder::build_tracking_cache(&input, &out)?;

            print_metadata(&meta);

            if verify {
                verify_cache_integrity(&out, &meta.checksum)?;
            }

            if let Some(metadata_path) = metadata {
                save_metadata(&metadata_path, &meta)?;
            }
        }

        Commands::Dir { dir, verify } => {
            println!("🔨 Building tracking caches in {}", dir.display());
            let manifest = cache_builder::build_directory(&dir)?;
            println!("\n✅ {} caches built", manifest.entries.len());

            if verify {
                for (match_id, meta) in &manifest.entries {
                    verify_cache_integrity(&dir.join(format!("{}.cache", match_id)), &meta.checksum)?;
                }
            }
        }

        Commands::Inspect { cache } => {
            let frames = cache_builder::load_cache(&cache)?;
            println!("Frames: {}", frames.frame_count());
            println!("Rows:   {}", frames.row_count());
            if let Some((first, last)) = frames.span() {
                println!("Span:   {}..={}", first, last);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_metadata(meta: &cache_builder::CacheMetadata) {
    println!("\n✅ Cache built successfully!");
    println!("   Match:           {}", meta.match_id);
    println!("   Frames / rows:   {} / {} ({} skipped)", meta.frames, meta.rows, meta.skipped_rows);
    println!("   Original size:   {}", cache_builder::human_bytes(meta.original_size));
    println!("   Compressed size: {}", cache_builder::human_bytes(meta.compressed_size));
    println!("   Compression:     {:.1}%", meta.compression_ratio * 100.0);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

#[cfg(feature = "cli")]
fn verify_cache_integrity(cache_path: &std::path::Path, checksum: &str) -> Result<()> {
    println!("\n🔍 Verifying {}...", cache_path.display());
    let is_valid = cache_builder::verify_cache(cache_path, checksum)?;

    if is_valid {
        println!("✅ Cache verification passed");
        Ok(())
    } else {
        anyhow::bail!("❌ Cache verification failed - checksum mismatch!")
    }
}

#[cfg(feature = "cli")]
fn save_metadata(path: &PathBuf, meta: &cache_builder::CacheMetadata) -> Result<()> {
    let metadata_json = serde_json::to_string_pretty(meta)?;
    std::fs::write(path, metadata_json)?;
    println!("\n📄 Metadata saved to: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("cache_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
