//! Detection overlay rendering for the visualization output.
//!
//! Draws one rectangle per detection plus four running-statistics lines.
//! Rendering is pure: the same detections and statistics always produce the
//! same pixels, and all cumulative state arrives through [`RunningStats`]
//! rather than living here.

use adscan_models::Detection;
use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::frames::RgbFrame;

/// Cumulative statistics threaded through the frame loop.
///
/// `segment_count` and `target_duration_secs` cover segments closed so far;
/// the on-screen area ratio is intentionally recomputed per frame from the
/// current detections instead (the historical display behavior).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    /// Segments closed so far.
    pub segment_count: usize,
    /// Total duration of closed segments, in seconds.
    pub target_duration_secs: f64,
    /// Total video duration, the ratio denominator.
    pub video_duration_secs: f64,
}

impl RunningStats {
    /// Cumulative target time as a percentage of the whole video.
    pub fn time_ratio_percent(&self) -> f64 {
        if self.video_duration_secs > 0.0 {
            self.target_duration_secs / self.video_duration_secs * 100.0
        } else {
            0.0
        }
    }
}

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const STATS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const STATS_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const BOX_THICKNESS: u32 = 2;
const TEXT_SCALE: u32 = 2;
const LINE_SPACING: i32 = 50;

/// Draws detection boxes and running statistics onto frames.
pub struct OverlayRenderer;

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Annotate `frame` in place with the given detections and statistics.
    ///
    /// `class_names` is the detector's label table; detections with an
    /// out-of-table id are drawn without a label.
    pub fn render(
        &self,
        frame: &mut RgbFrame,
        detections: &[Detection],
        class_names: &[String],
        stats: &RunningStats,
    ) {
        let (width, height) = (frame.width, frame.height);
        // Reuse the frame's own buffer; written back below.
        let mut img: RgbImage =
            match ImageBuffer::from_raw(width, height, std::mem::take(&mut frame.data)) {
                Some(img) => img,
                None => return,
            };

        let mut area_sum = 0.0f64;
        for detection in detections {
            let bbox = detection.bbox.clamped(width, height);
            area_sum += bbox.area() as f64;

            draw_detection_box(&mut img, bbox.x1 as i32, bbox.y1 as i32, bbox.width() as u32, bbox.height() as u32);

            if let Some(name) = class_names.get(detection.class_id) {
                let label_y = (bbox.y1 as i32 - glyph_height(TEXT_SCALE) - 4).max(0);
                draw_text(&mut img, name, bbox.x1 as i32, label_y, TEXT_SCALE, BOX_COLOR);
            }
        }

        let area_ratio = if frame_area(width, height) > 0.0 {
            area_sum / frame_area(width, height) * 100.0
        } else {
            0.0
        };

        let lines = [
            format!("Segments: {}", stats.segment_count),
            format!("Time: {:.1}s", stats.target_duration_secs),
            format!("Time Ratio: {:.2}%", stats.time_ratio_percent()),
            format!("Area Ratio: {:.1}%", area_ratio),
        ];
        for (i, line) in lines.iter().enumerate() {
            draw_stat_line(&mut img, line, 10, 50 + i as i32 * LINE_SPACING);
        }

        frame.data = img.into_raw();
    }
}

fn frame_area(width: u32, height: u32) -> f64 {
    width as f64 * height as f64
}

/// Hollow rectangle with a fixed border thickness.
fn draw_detection_box(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32) {
    for inset in 0..BOX_THICKNESS {
        let (w, h) = (w.saturating_sub(inset * 2), h.saturating_sub(inset * 2));
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(w, h);
        draw_hollow_rect_mut(img, rect, BOX_COLOR);
    }
}

/// One statistics line with a backing rectangle for legibility.
fn draw_stat_line(img: &mut RgbImage, text: &str, x: i32, y: i32) {
    let text_w = text_width(text, TEXT_SCALE);
    let text_h = glyph_height(TEXT_SCALE);
    if text_w > 0 {
        let pad = 2;
        let bg = Rect::at((x - pad).max(0), (y - pad).max(0))
            .of_size((text_w + pad * 2) as u32, (text_h + pad * 2) as u32);
        draw_filled_rect_mut(img, bg, STATS_BACKGROUND);
    }
    draw_text(img, text, x, y, TEXT_SCALE, STATS_COLOR);
}

const GLYPH_WIDTH: i32 = 8;
const GLYPH_HEIGHT: i32 = 12;

fn glyph_height(scale: u32) -> i32 {
    GLYPH_HEIGHT * scale as i32
}

fn text_width(text: &str, scale: u32) -> i32 {
    text.chars().count() as i32 * GLYPH_WIDTH * scale as i32
}

/// Render text with the embedded 8x12 bitmap font. Characters outside the
/// glyph table advance the cursor but draw nothing.
fn draw_text(img: &mut RgbImage, text: &str, start_x: i32, start_y: i32, scale: u32, color: Rgb<u8>) {
    let scale = scale as i32;
    let mut x = start_x;

    for ch in text.chars() {
        if let Some(pattern) = glyph(ch) {
            for (row, bits) in pattern.iter().enumerate() {
                for col in 0..8 {
                    if (bits >> (7 - col)) & 1 == 1 {
                        fill_block(
                            img,
                            x + col * scale,
                            start_y + row as i32 * scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
        x += GLYPH_WIDTH * scale;
        if x >= img.width() as i32 {
            break;
        }
    }
}

fn fill_block(img: &mut RgbImage, x: i32, y: i32, scale: i32, color: Rgb<u8>) {
    for dy in 0..scale {
        for dx in 0..scale {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// 8x12 bitmap glyphs, one byte per row, MSB leftmost.
fn glyph(ch: char) -> Option<[u8; 12]> {
    let pattern = match ch {
        'A' => [0x00, 0x18, 0x24, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'B' => [0x00, 0x7C, 0x42, 0x42, 0x7C, 0x42, 0x42, 0x42, 0x42, 0x7C, 0x00, 0x00],
        'C' => [0x00, 0x3C, 0x42, 0x40, 0x40, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'D' => [0x00, 0x78, 0x44, 0x42, 0x42, 0x42, 0x42, 0x42, 0x44, 0x78, 0x00, 0x00],
        'E' => [0x00, 0x7E, 0x40, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x7E, 0x00, 0x00],
        'F' => [0x00, 0x7E, 0x40, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        'G' => [0x00, 0x3C, 0x42, 0x40, 0x40, 0x4E, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'H' => [0x00, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'I' => [0x00, 0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'L' => [0x00, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00, 0x00],
        'M' => [0x00, 0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'N' => [0x00, 0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'O' => [0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'P' => [0x00, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        'R' => [0x00, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x48, 0x44, 0x42, 0x42, 0x00, 0x00],
        'S' => [0x00, 0x3C, 0x42, 0x40, 0x30, 0x0C, 0x02, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'T' => [0x00, 0x7F, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x00],
        'U' => [0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'Y' => [0x00, 0x41, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x00],
        'a' => [0x00, 0x00, 0x00, 0x3C, 0x02, 0x3E, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'b' => [0x00, 0x40, 0x40, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x62, 0x5C, 0x00, 0x00],
        'c' => [0x00, 0x00, 0x00, 0x3C, 0x42, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'd' => [0x00, 0x02, 0x02, 0x3A, 0x46, 0x42, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'e' => [0x00, 0x00, 0x00, 0x3C, 0x42, 0x7E, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'g' => [0x00, 0x00, 0x00, 0x3A, 0x46, 0x42, 0x46, 0x3A, 0x02, 0x3C, 0x00, 0x00],
        'h' => [0x00, 0x40, 0x40, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'i' => [0x00, 0x08, 0x00, 0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'k' => [0x00, 0x40, 0x40, 0x44, 0x48, 0x70, 0x48, 0x44, 0x42, 0x41, 0x00, 0x00],
        'l' => [0x00, 0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'm' => [0x00, 0x00, 0x00, 0x76, 0x49, 0x49, 0x49, 0x49, 0x49, 0x49, 0x00, 0x00],
        'n' => [0x00, 0x00, 0x00, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'o' => [0x00, 0x00, 0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'p' => [0x00, 0x00, 0x00, 0x5C, 0x62, 0x42, 0x62, 0x5C, 0x40, 0x40, 0x00, 0x00],
        'r' => [0x00, 0x00, 0x00, 0x5C, 0x62, 0x40, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        's' => [0x00, 0x00, 0x00, 0x3E, 0x40, 0x3C, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        't' => [0x00, 0x10, 0x10, 0x7C, 0x10, 0x10, 0x10, 0x10, 0x10, 0x0C, 0x00, 0x00],
        'u' => [0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'v' => [0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x24, 0x24, 0x18, 0x18, 0x00, 0x00],
        'w' => [0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x5A, 0x66, 0x42, 0x42, 0x00, 0x00],
        'x' => [0x00, 0x00, 0x00, 0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x00, 0x00],
        'y' => [0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x26, 0x1A, 0x02, 0x3C, 0x00, 0x00],
        '0' => [0x00, 0x3C, 0x42, 0x46, 0x4A, 0x52, 0x62, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '1' => [0x00, 0x08, 0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        '2' => [0x00, 0x3C, 0x42, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00, 0x00],
        '3' => [0x00, 0x3C, 0x42, 0x02, 0x1C, 0x02, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        '4' => [0x00, 0x04, 0x0C, 0x14, 0x24, 0x44, 0x7E, 0x04, 0x04, 0x04, 0x00, 0x00],
        '5' => [0x00, 0x7E, 0x40, 0x40, 0x7C, 0x02, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        '6' => [0x00, 0x1C, 0x20, 0x40, 0x7C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '7' => [0x00, 0x7E, 0x02, 0x04, 0x08, 0x08, 0x10, 0x10, 0x20, 0x20, 0x00, 0x00],
        '8' => [0x00, 0x3C, 0x42, 0x42, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '9' => [0x00, 0x3C, 0x42, 0x42, 0x42, 0x3E, 0x02, 0x04, 0x08, 0x70, 0x00, 0x00],
        ':' => [0x00, 0x00, 0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00, 0x00],
        '%' => [0x00, 0x62, 0x64, 0x08, 0x10, 0x10, 0x20, 0x26, 0x46, 0x00, 0x00, 0x00],
        ' ' => [0x00; 12],
        _ => return None,
    };
    Some(pattern)
}
