//! Annotation renderer.
//!
//! Draws detection overlays directly into a frame's RGB bytes: a box outline,
//! a filled label background band above the box, and the corrected label text
//! inside the band. All writes go through `Frame::put_pixel`, so geometry that
//! extends past the frame edges (a label band above a box touching the top of
//! the frame) is drawn where visible and dropped where not.
//!
//! Rendering is a pure function of `(frame, bbox, label)`: repeated calls with
//! identical inputs produce byte-identical frames.

use crate::detect::BoundingBox;
use crate::frame::Frame;

/// Outline and label-background color.
pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
/// Label text color.
pub const TEXT_COLOR: [u8; 3] = [0, 0, 0];
/// Outline stroke width in pixels.
pub const BOX_STROKE: i64 = 3;
/// Label background band height: the band spans `y1 - 30 .. y1`.
pub const LABEL_BAND_HEIGHT: i64 = 30;
/// Text baseline sits this far above the box's top edge.
const BASELINE_OFFSET: i64 = 5;

const GLYPH_WIDTH: i64 = 8;
const GLYPH_HEIGHT: i64 = 12;
/// Row of the glyph cell that carries the baseline.
const BASELINE_ROW: i64 = 9;

/// Rendered pixel size of a label: `(width, height)`.
pub fn text_size(text: &str) -> (i64, i64) {
    (text.chars().count() as i64 * GLYPH_WIDTH, GLYPH_HEIGHT)
}

/// Draw one detection overlay onto the frame, in place.
///
/// `label` must already be the corrected display name; this module never
/// consults the model's own class names.
pub fn annotate(frame: &mut Frame, bbox: &BoundingBox, label: &str) {
    draw_box_outline(frame, bbox);
    draw_label(frame, bbox, label);
}

fn draw_box_outline(frame: &mut Frame, bbox: &BoundingBox) {
    let (x1, y1, x2, y2) = (bbox.x1, bbox.y1, bbox.x2, bbox.y2);

    // Four filled strips, stroke pixels thick, growing inward.
    fill_rect(frame, x1, y1, x2, (y1 + BOX_STROKE - 1).min(y2));
    fill_rect(frame, x1, (y2 - BOX_STROKE + 1).max(y1), x2, y2);
    fill_rect(frame, x1, y1, (x1 + BOX_STROKE - 1).min(x2), y2);
    fill_rect(frame, (x2 - BOX_STROKE + 1).max(x1), y1, x2, y2);
}

fn draw_label(frame: &mut Frame, bbox: &BoundingBox, label: &str) {
    let (text_w, _) = text_size(label);

    // Filled background band directly above the box top edge. The band's
    // coordinates are not clamped; off-frame rows simply do not appear.
    fill_rect(
        frame,
        bbox.x1,
        bbox.y1 - LABEL_BAND_HEIGHT,
        bbox.x1 + text_w,
        bbox.y1 - 1,
    );

    let cell_top = bbox.y1 - BASELINE_OFFSET - BASELINE_ROW;
    draw_text(frame, label, bbox.x1, cell_top);
}

/// Fill an inclusive rectangle with the box color.
fn fill_rect(frame: &mut Frame, x1: i64, y1: i64, x2: i64, y2: i64) {
    for y in y1..=y2 {
        for x in x1..=x2 {
            frame.put_pixel(x, y, BOX_COLOR);
        }
    }
}

fn draw_text(frame: &mut Frame, text: &str, origin_x: i64, origin_y: i64) {
    let mut x = origin_x;
    for ch in text.chars() {
        if let Some(pattern) = glyph(ch) {
            for (row, bits) in pattern.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if (bits >> (7 - col)) & 1 == 1 {
                        frame.put_pixel(x + col, origin_y + row as i64, TEXT_COLOR);
                    }
                }
            }
        }
        x += GLYPH_WIDTH;
    }
}

/// 8x12 bitmap glyphs. One byte per row, MSB is the leftmost column.
/// Characters without a pattern (including space) advance the pen untouched.
fn glyph(ch: char) -> Option<&'static [u8; 12]> {
    let pattern: &[u8; 12] = match ch {
        'A' => &[0x00, 0x18, 0x24, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'B' => &[0x00, 0x7C, 0x42, 0x42, 0x7C, 0x42, 0x42, 0x42, 0x42, 0x7C, 0x00, 0x00],
        'C' => &[0x00, 0x3C, 0x42, 0x40, 0x40, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'D' => &[0x00, 0x78, 0x44, 0x42, 0x42, 0x42, 0x42, 0x42, 0x44, 0x78, 0x00, 0x00],
        'E' => &[0x00, 0x7E, 0x40, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x7E, 0x00, 0x00],
        'F' => &[0x00, 0x7E, 0x40, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        'G' => &[0x00, 0x3C, 0x42, 0x40, 0x40, 0x4E, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'H' => &[0x00, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'I' => &[0x00, 0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'J' => &[0x00, 0x1E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x44, 0x44, 0x38, 0x00, 0x00],
        'K' => &[0x00, 0x42, 0x44, 0x48, 0x50, 0x60, 0x50, 0x48, 0x44, 0x42, 0x00, 0x00],
        'L' => &[0x00, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00, 0x00],
        'M' => &[0x00, 0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'N' => &[0x00, 0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'O' => &[0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'P' => &[0x00, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        'Q' => &[0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x4A, 0x44, 0x3A, 0x00, 0x00],
        'R' => &[0x00, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x48, 0x44, 0x42, 0x42, 0x00, 0x00],
        'S' => &[0x00, 0x3C, 0x42, 0x40, 0x30, 0x0C, 0x02, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'T' => &[0x00, 0x7F, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x00],
        'U' => &[0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'V' => &[0x00, 0x41, 0x41, 0x41, 0x22, 0x22, 0x14, 0x14, 0x08, 0x08, 0x00, 0x00],
        'W' => &[0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x5A, 0x5A, 0x66, 0x42, 0x00, 0x00],
        'X' => &[0x00, 0x42, 0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x42, 0x00, 0x00],
        'Y' => &[0x00, 0x41, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x00],
        'Z' => &[0x00, 0x7E, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x40, 0x7E, 0x00, 0x00],
        'a' => &[0x00, 0x00, 0x00, 0x3C, 0x02, 0x3E, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'b' => &[0x00, 0x40, 0x40, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x62, 0x5C, 0x00, 0x00],
        'c' => &[0x00, 0x00, 0x00, 0x3C, 0x42, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'd' => &[0x00, 0x02, 0x02, 0x3A, 0x46, 0x42, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'e' => &[0x00, 0x00, 0x00, 0x3C, 0x42, 0x7E, 0x40, 0x40, 0x42, 0x3C, 0x00, 0x00],
        'f' => &[0x00, 0x0C, 0x10, 0x10, 0x7C, 0x10, 0x10, 0x10, 0x10, 0x10, 0x00, 0x00],
        'g' => &[0x00, 0x00, 0x00, 0x3A, 0x46, 0x42, 0x46, 0x3A, 0x02, 0x3C, 0x00, 0x00],
        'h' => &[0x00, 0x40, 0x40, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'i' => &[0x00, 0x08, 0x00, 0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'j' => &[0x00, 0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x44, 0x38, 0x00, 0x00],
        'k' => &[0x00, 0x40, 0x40, 0x44, 0x48, 0x70, 0x48, 0x44, 0x42, 0x41, 0x00, 0x00],
        'l' => &[0x00, 0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        'm' => &[0x00, 0x00, 0x00, 0x76, 0x49, 0x49, 0x49, 0x49, 0x49, 0x49, 0x00, 0x00],
        'n' => &[0x00, 0x00, 0x00, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x42, 0x42, 0x00, 0x00],
        'o' => &[0x00, 0x00, 0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        'p' => &[0x00, 0x00, 0x00, 0x5C, 0x62, 0x42, 0x62, 0x5C, 0x40, 0x40, 0x00, 0x00],
        'q' => &[0x00, 0x00, 0x00, 0x3A, 0x46, 0x42, 0x46, 0x3A, 0x02, 0x02, 0x00, 0x00],
        'r' => &[0x00, 0x00, 0x00, 0x5C, 0x62, 0x40, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00],
        's' => &[0x00, 0x00, 0x00, 0x3E, 0x40, 0x3C, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        't' => &[0x00, 0x10, 0x10, 0x7C, 0x10, 0x10, 0x10, 0x10, 0x10, 0x0C, 0x00, 0x00],
        'u' => &[0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x46, 0x3A, 0x00, 0x00],
        'v' => &[0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x24, 0x24, 0x18, 0x18, 0x00, 0x00],
        'w' => &[0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x5A, 0x66, 0x42, 0x42, 0x00, 0x00],
        'x' => &[0x00, 0x00, 0x00, 0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x00, 0x00],
        'y' => &[0x00, 0x00, 0x00, 0x42, 0x42, 0x42, 0x26, 0x1A, 0x02, 0x3C, 0x00, 0x00],
        'z' => &[0x00, 0x00, 0x00, 0x7E, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00, 0x00],
        '0' => &[0x00, 0x3C, 0x42, 0x46, 0x4A, 0x52, 0x62, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '1' => &[0x00, 0x08, 0x18, 0x28, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00, 0x00],
        '2' => &[0x00, 0x3C, 0x42, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00, 0x00],
        '3' => &[0x00, 0x3C, 0x42, 0x02, 0x1C, 0x02, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        '4' => &[0x00, 0x04, 0x0C, 0x14, 0x24, 0x44, 0x7E, 0x04, 0x04, 0x04, 0x00, 0x00],
        '5' => &[0x00, 0x7E, 0x40, 0x40, 0x7C, 0x02, 0x02, 0x02, 0x42, 0x3C, 0x00, 0x00],
        '6' => &[0x00, 0x3C, 0x42, 0x40, 0x7C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '7' => &[0x00, 0x7E, 0x02, 0x04, 0x04, 0x08, 0x08, 0x10, 0x10, 0x10, 0x00, 0x00],
        '8' => &[0x00, 0x3C, 0x42, 0x42, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00, 0x00],
        '9' => &[0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x3E, 0x02, 0x42, 0x3C, 0x00, 0x00],
        '-' => &[0x00, 0x00, 0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '.' => &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00, 0x00],
        _ => return None,
    };
    Some(pattern)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
