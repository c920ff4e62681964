//! Drawing surface over a plotters bitmap
//!
//! Coordinates are pixels with the origin top-left. The whole frame is drawn
//! into one RGB buffer, then handed back as an RGBA image.

use image::{DynamicImage, RgbImage, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Result, ViewerError};
use crate::types::Rgb8;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn plot_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> ViewerError {
    ViewerError::Render(err.to_string())
}

fn rgb(color: Rgb8) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn px(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn stroke(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

pub struct Canvas<'a> {
    area: Area<'a>,
    width: u32,
    height: u32,
}

/// Allocate a `width` x `height` surface filled with `background`, run
/// `draw` on it and return the result.
pub fn paint<F>(width: u32, height: u32, background: Rgb8, draw: F) -> Result<RgbaImage>
where
    F: FnOnce(&Canvas<'_>) -> Result<()>,
{
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let area = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        area.fill(&rgb(background)).map_err(plot_error)?;
        let canvas = Canvas { area, width, height };
        draw(&canvas)?;
        canvas.area.present().map_err(plot_error)?;
    }
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ViewerError::Render(format!("bitmap buffer does not fit {}x{}", width, height)))?;
    Ok(DynamicImage::ImageRgb8(image).into_rgba8())
}

impl Canvas<'_> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set one pixel; off-surface pixels are dropped by the backend.
    pub fn put_pixel(&self, x: i32, y: i32, color: Rgb8) -> Result<()> {
        self.area.draw_pixel((x, y), &rgb(color)).map_err(plot_error)
    }

    pub fn fill_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb8) -> Result<()> {
        // Rectangle corners are inclusive
        let (ax, ay) = px(x0.min(x1), y0.min(y1));
        let (bx, by) = px(x0.max(x1), y0.max(y1));
        self.area
            .draw(&Rectangle::new([(ax, ay), (bx - 1, by - 1)], rgb(color).filled()))
            .map_err(plot_error)
    }

    /// Filled disc of radius `r` centered on (cx, cy)
    pub fn fill_disc(&self, cx: f64, cy: f64, r: f64, color: Rgb8) -> Result<()> {
        let radius = r.round().max(1.0) as i32;
        self.area
            .draw(&Circle::new(px(cx, cy), radius, rgb(color).filled()))
            .map_err(plot_error)
    }

    /// Ring of stroke `width` around radius `r`
    pub fn stroke_circle(&self, cx: f64, cy: f64, r: f64, width: f64, color: Rgb8) -> Result<()> {
        let radius = r.round().max(1.0) as i32;
        self.area
            .draw(&Circle::new(px(cx, cy), radius, rgb(color).stroke_width(stroke(width))))
            .map_err(plot_error)
    }

    /// Open polyline through `points`
    pub fn polyline(&self, points: &[(f64, f64)], width: f64, color: Rgb8) -> Result<()> {
        let path: Vec<(i32, i32)> = points.iter().map(|&(x, y)| px(x, y)).collect();
        self.area
            .draw(&PathElement::new(path, rgb(color).stroke_width(stroke(width))))
            .map_err(plot_error)
    }

    pub fn line(&self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgb8) -> Result<()> {
        self.polyline(&[(x0, y0), (x1, y1)], width, color)
    }

    pub fn stroke_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgb8) -> Result<()> {
        self.polyline(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)], width, color)
    }
}
