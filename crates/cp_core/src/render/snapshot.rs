//! Snapshot Renderer
//!
//! One frame → one raster image: pitch, players colored and numbered by kit,
//! the ball, and a ring around the focal player.

use std::path::Path;

use image::{ImageFormat, RgbaImage};
use tracing::debug;

use super::canvas::{paint, Canvas};
use super::font::{draw_text_centered, text_height, text_width};
use super::pitch::{draw_pitch, PitchTransform};
use super::scene::{build_scene, Mark, RenderStats, Scene};
use crate::error::{Result, ViewerError};
use crate::meta::ResolvedMatch;
use crate::models::TrackingRecord;
use crate::store::FrameStore;
use crate::types::{FocalPlayer, FrameNo, MatchId, Rgb8};

/// Which title goes above the pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleStyle {
    /// `FREEZE FRAME <f> (MATCH ID: <m>)`, used for interactive viewing
    Freeze,
    /// `FRAME <f>`, used for animation frames
    Sequence,
}

impl TitleStyle {
    pub fn title(self, match_id: MatchId, frame: FrameNo) -> String {
        match self {
            TitleStyle::Freeze => format!("Freeze Frame {} (Match ID: {})", frame, match_id),
            TitleStyle::Sequence => format!("Frame {}", frame),
        }
    }
}

/// Canvas size and marker geometry in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub width: u32,
    pub height: u32,
    pub player_radius: f64,
    pub ball_radius: f64,
    pub ring_radius: f64,
    pub ring_width: f64,
    pub outline_width: f64,
    pub line_width: f64,
    pub label_scale: u32,
    pub title_scale: u32,
    pub surface: Rgb8,
    pub line: Rgb8,
    pub outline: Rgb8,
    pub ball: Rgb8,
    pub ring: Rgb8,
}

impl RenderStyle {
    /// Marker sizes scale with canvas width; 1000px is the reference.
    pub fn sized(width: u32, height: u32) -> Self {
        let k = f64::from(width) / 1000.0;
        let player_radius = (9.0 * k).max(6.0);
        Self {
            width,
            height,
            player_radius,
            ball_radius: (5.5 * k).max(3.0),
            ring_radius: player_radius + (3.0 * k).max(2.0),
            ring_width: (2.0 * k).max(1.5),
            outline_width: (1.2 * k).max(1.0),
            line_width: (1.5 * k).max(1.0),
            label_scale: if k >= 1.8 { 2 } else { 1 },
            title_scale: (2.0 * k).round().max(1.0) as u32,
            surface: Rgb8::WHITE,
            line: Rgb8::BLACK,
            outline: Rgb8::BLACK,
            ball: Rgb8::BLACK,
            ring: Rgb8::BLUE,
        }
    }

    fn band_height(&self) -> f64 {
        f64::from(text_height(self.title_scale)) + 2.0 * f64::from(4 * self.title_scale)
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::sized(1000, 700)
    }
}

/// A rendered frame
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub match_id: MatchId,
    pub frame: FrameNo,
    pub image: RgbaImage,
    pub stats: RenderStats,
}

impl Snapshot {
    pub fn write_png(&self, path: &Path) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotRenderer {
    style: RenderStyle,
}

impl SnapshotRenderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Fetch the frame's rows and render them.
    ///
    /// A frame without rows is a caller error: windows only hold present frames.
    pub fn render<S: FrameStore + ?Sized>(
        &self,
        store: &S,
        resolved: &ResolvedMatch,
        frame: FrameNo,
        focal: Option<&FocalPlayer>,
        title: TitleStyle,
    ) -> Result<Snapshot> {
        let rows = store.rows_at(resolved.match_id, frame)?;
        if rows.is_empty() {
            return Err(ViewerError::NoTrackingRows { match_id: resolved.match_id, frame });
        }
        self.render_rows(frame, &rows, resolved, focal, title)
    }

    pub fn render_rows(
        &self,
        frame: FrameNo,
        rows: &[TrackingRecord],
        resolved: &ResolvedMatch,
        focal: Option<&FocalPlayer>,
        title: TitleStyle,
    ) -> Result<Snapshot> {
        let scene = build_scene(frame, rows, &resolved.roster, focal.map(|f| f.id));
        let title_text = title.title(resolved.match_id, frame);
        let legend = focal.filter(|_| scene.stats.focal_drawn).map(|f| f.name.as_str());
        let image = self.rasterize(&scene, resolved, &title_text, legend)?;

        debug!(match_id = resolved.match_id, frame, players = scene.stats.players, "frame rendered");
        Ok(Snapshot { match_id: resolved.match_id, frame, image, stats: scene.stats })
    }

    /// Pixel transform used for a match at this style's size
    pub fn transform(&self, resolved: &ResolvedMatch) -> PitchTransform {
        let band = self.style.band_height();
        let w = f64::from(self.style.width);
        let h = (f64::from(self.style.height) - 2.0 * band).max(1.0);
        PitchTransform::fit(resolved.pitch, 0.0, band, w, h)
    }

    fn rasterize(&self, scene: &Scene, resolved: &ResolvedMatch, title: &str, legend: Option<&str>) -> Result<RgbaImage> {
        let style = &self.style;
        let t = self.transform(resolved);
        paint(style.width, style.height, style.surface, |canvas| {
            draw_pitch(canvas, &t, style.surface, style.line, style.line_width)?;
            for mark in &scene.marks {
                self.draw_mark(canvas, &t, mark)?;
            }
            self.draw_captions(canvas, title, legend)
        })
    }

    fn draw_mark(&self, canvas: &Canvas<'_>, t: &PitchTransform, mark: &Mark) -> Result<()> {
        let style = &self.style;
        match mark {
            Mark::Player { at, fill, label, label_color, .. } => {
                let (x, y) = t.to_px(*at);
                canvas.fill_disc(x, y, style.player_radius + style.outline_width, style.outline)?;
                canvas.fill_disc(x, y, style.player_radius, *fill)?;
                draw_text_centered(canvas, label, x, y, style.label_scale, *label_color)
            }
            Mark::Ball { at } => {
                let (x, y) = t.to_px(*at);
                canvas.fill_disc(x, y, style.ball_radius, style.ball)
            }
            Mark::FocalRing { at, .. } => {
                let (x, y) = t.to_px(*at);
                canvas.stroke_circle(x, y, style.ring_radius, style.ring_width, style.ring)
            }
        }
    }

    /// Title band on top, focal-player legend in the bottom band
    fn draw_captions(&self, canvas: &Canvas<'_>, title: &str, legend: Option<&str>) -> Result<()> {
        let style = &self.style;
        let band = style.band_height();
        let center_x = f64::from(style.width) / 2.0;
        draw_text_centered(canvas, title, center_x, band / 2.0, style.title_scale, style.line)?;

        if let Some(name) = legend {
            let legend_y = f64::from(style.height) - band / 2.0;
            let text_w = f64::from(text_width(name, style.title_scale));
            let gap = style.ring_radius * 2.0;
            let total = 2.0 * style.ring_radius + gap + text_w;
            let ring_x = center_x - total / 2.0 + style.ring_radius;
            canvas.stroke_circle(ring_x, legend_y, style.ring_radius, style.ring_width, style.ring)?;
            let text_cx = ring_x + style.ring_radius + gap + text_w / 2.0;
            draw_text_centered(canvas, name, text_cx, legend_y, style.title_scale, style.line)?;
        }
        Ok(())
    }
}
