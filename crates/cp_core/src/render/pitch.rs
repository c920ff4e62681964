//! Playing surface drawing
//!
//! Tracking coordinates are centered: x in [-length/2, length/2] toward the
//! right goal, y in [-width/2, width/2] upward. Feature sizes are the
//! standard markings in meters.

use super::canvas::Canvas;
use crate::error::Result;
use crate::types::{PitchDims, PitchPos, Rgb8};

const PENALTY_AREA_DEPTH: f64 = 16.5;
const PENALTY_AREA_WIDTH: f64 = 40.32;
const GOAL_AREA_DEPTH: f64 = 5.5;
const GOAL_AREA_WIDTH: f64 = 18.32;
const PENALTY_SPOT_DISTANCE: f64 = 11.0;
const CIRCLE_RADIUS: f64 = 9.15;
const GOAL_WIDTH: f64 = 7.32;
const GOAL_DEPTH: f64 = 2.0;

const ARC_SEGMENTS: usize = 24;

/// Space kept around the touchlines for goals and players off the field
const RUNOFF: f64 = 4.0;

/// Maps pitch units onto a pixel rectangle, preserving aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTransform {
    pitch: PitchDims,
    scale: f64,
    center_x: f64,
    center_y: f64,
}

impl PitchTransform {
    /// Fit the pitch (plus run-off) into the box `[x0, x0 + w] x [y0, y0 + h]`.
    pub fn fit(pitch: PitchDims, x0: f64, y0: f64, w: f64, h: f64) -> Self {
        let span_x = pitch.length + 2.0 * RUNOFF;
        let span_y = pitch.width + 2.0 * RUNOFF;
        let scale = (w / span_x).min(h / span_y).max(f64::MIN_POSITIVE);
        Self { pitch, scale, center_x: x0 + w / 2.0, center_y: y0 + h / 2.0 }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_px(&self, pos: PitchPos) -> (f64, f64) {
        (self.center_x + pos.x * self.scale, self.center_y - pos.y * self.scale)
    }

    fn px(&self, x: f64, y: f64) -> (f64, f64) {
        self.to_px(PitchPos::new(x, y))
    }

    fn rect(&self, canvas: &Canvas<'_>, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgb8) -> Result<()> {
        let (ax, ay) = self.px(x0, y0);
        let (bx, by) = self.px(x1, y1);
        canvas.stroke_rect(ax, ay, bx, by, width, color)
    }

    /// Pixel points along a circle of pitch radius `r` around (cx, cy),
    /// from angle `from` to `to` in radians.
    fn arc(&self, cx: f64, cy: f64, r: f64, from: f64, to: f64) -> Vec<(f64, f64)> {
        (0..=ARC_SEGMENTS)
            .map(|i| {
                let a = from + (to - from) * i as f64 / ARC_SEGMENTS as f64;
                self.px(cx + r * a.cos(), cy + r * a.sin())
            })
            .collect()
    }
}

/// Draw surface and markings.
pub fn draw_pitch(canvas: &Canvas<'_>, t: &PitchTransform, surface: Rgb8, line: Rgb8, line_width: f64) -> Result<()> {
    let hl = t.pitch.half_length();
    let hw = t.pitch.half_width();

    let (sx0, sy0) = t.px(-hl - RUNOFF, hw + RUNOFF);
    let (sx1, sy1) = t.px(hl + RUNOFF, -hw - RUNOFF);
    canvas.fill_rect(sx0, sy0, sx1, sy1, surface)?;

    t.rect(canvas, -hl, -hw, hl, hw, line_width, line)?;

    let (mx0, my0) = t.px(0.0, hw);
    let (mx1, my1) = t.px(0.0, -hw);
    canvas.line(mx0, my0, mx1, my1, line_width, line)?;

    let (cx, cy) = t.px(0.0, 0.0);
    canvas.stroke_circle(cx, cy, CIRCLE_RADIUS * t.scale, line_width, line)?;
    canvas.fill_disc(cx, cy, (0.25 * t.scale).max(line_width), line)?;

    let box_half = (PENALTY_AREA_WIDTH / 2.0).min(hw);
    let six_half = (GOAL_AREA_WIDTH / 2.0).min(hw);
    let goal_half = GOAL_WIDTH / 2.0;
    // half-angle of the arc part that lies outside the penalty area
    let arc_half = ((PENALTY_AREA_DEPTH - PENALTY_SPOT_DISTANCE) / CIRCLE_RADIUS).clamp(-1.0, 1.0).acos();

    for side in [-1.0, 1.0] {
        let goal_line = side * hl;
        let box_edge = side * (hl - PENALTY_AREA_DEPTH);
        let six_edge = side * (hl - GOAL_AREA_DEPTH);

        t.rect(canvas, goal_line, -box_half, box_edge, box_half, line_width, line)?;
        t.rect(canvas, goal_line, -six_half, six_edge, six_half, line_width, line)?;
        t.rect(canvas, goal_line, -goal_half, goal_line + side * GOAL_DEPTH, goal_half, line_width, line)?;

        let spot = side * (hl - PENALTY_SPOT_DISTANCE);
        let (spot_x, spot_y) = t.px(spot, 0.0);
        canvas.fill_disc(spot_x, spot_y, (0.25 * t.scale).max(line_width), line)?;

        // arc faces the halfway line
        let facing = if side < 0.0 { 0.0 } else { std::f64::consts::PI };
        let points = t.arc(spot, 0.0, CIRCLE_RADIUS, facing - arc_half, facing + arc_half);
        canvas.polyline(&points, line_width, line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::paint;
    use image::Rgba;

    #[test]
    fn test_transform_centers_and_flips_y() {
        let t = PitchTransform::fit(PitchDims::standard(), 0.0, 0.0, 1130.0, 760.0);
        // 1130 / (105 + 8) = 10, 760 / (68 + 8) = 10
        assert!((t.scale() - 10.0).abs() < 1e-9);
        assert_eq!(t.to_px(PitchPos::new(0.0, 0.0)), (565.0, 380.0));
        assert_eq!(t.to_px(PitchPos::new(52.5, 34.0)), (1090.0, 40.0));
        assert_eq!(t.to_px(PitchPos::new(-52.5, -34.0)), (40.0, 720.0));
    }

    #[test]
    fn test_pitch_lines_drawn() {
        let t = PitchTransform::fit(PitchDims::standard(), 0.0, 0.0, 1130.0, 760.0);
        let image = paint(1130, 760, Rgb8::new(200, 200, 200), |canvas| {
            draw_pitch(canvas, &t, Rgb8::WHITE, Rgb8::BLACK, 2.0)
        })
        .unwrap();

        let black = Rgba([0, 0, 0, 255]);
        let white = Rgba([255, 255, 255, 255]);
        // halfway line at x = 565, away from the center circle
        assert_eq!(*image.get_pixel(565, 100), black);
        // touchline at y = 40
        assert_eq!(*image.get_pixel(300, 40), black);
        // open grass between the penalty area and the halfway line
        assert_eq!(*image.get_pixel(350, 200), white);
        // run-off outside the touchline is surface too
        assert_eq!(*image.get_pixel(300, 20), white);
    }

    #[test]
    fn test_penalty_arc_outside_box_only() {
        let t = PitchTransform::fit(PitchDims::standard(), 0.0, 0.0, 1130.0, 760.0);
        let image = paint(1130, 760, Rgb8::WHITE, |canvas| draw_pitch(canvas, &t, Rgb8::WHITE, Rgb8::BLACK, 2.0)).unwrap();

        // left arc apex: spot at x = -41.5, radius 9.15 → x = -32.35 on the center line
        let (ax, ay) = t.to_px(PitchPos::new(-41.5 + 9.15, 0.0));
        assert_eq!(*image.get_pixel(ax.round() as u32, ay.round() as u32), Rgba([0, 0, 0, 255]));
        // the part of the circle inside the box is not drawn
        let (bx, by) = t.to_px(PitchPos::new(-41.5 - 9.15, 0.0));
        assert_eq!(*image.get_pixel(bx.round() as u32, by.round() as u32), Rgba([255, 255, 255, 255]));
    }
}
