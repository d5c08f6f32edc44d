//! Placeholder figure stored next to each lesson.
//!
//! The picture carries no chapter-specific meaning: a framed plot area with
//! axes and the polyline (0,0) → (1,1) → (2,0) with round markers. Lessons
//! reference it as `chapter<N>_graph.png`.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const GRAPH_WIDTH: u32 = 600;
pub const GRAPH_HEIGHT: u32 = 400;

const MARGIN: i64 = 50;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const LINE: Rgb<u8> = Rgb([31, 119, 180]);

/// Render the placeholder plot.
pub fn render_placeholder() -> RgbImage {
    let mut img = RgbImage::from_pixel(GRAPH_WIDTH, GRAPH_HEIGHT, WHITE);
    let (w, h) = (GRAPH_WIDTH as i64, GRAPH_HEIGHT as i64);
    let (left, right, top, bottom) = (MARGIN, w - MARGIN, MARGIN, h - MARGIN);

    // frame
    draw_line(&mut img, (left, bottom), (right, bottom), AXIS);
    draw_line(&mut img, (left, top), (left, bottom), AXIS);
    draw_line(&mut img, (left, top), (right, top), AXIS);
    draw_line(&mut img, (right, top), (right, bottom), AXIS);

    // data space x ∈ [0, 2], y ∈ [0, 1], padded inside the frame
    let pad = 30;
    let to_px = |x: f64, y: f64| -> (i64, i64) {
        let px = left + pad + (x / 2.0 * (right - left - 2 * pad) as f64).round() as i64;
        let py = bottom - pad - (y * (bottom - top - 2 * pad) as f64).round() as i64;
        (px, py)
    };
    let points = [to_px(0.0, 0.0), to_px(1.0, 1.0), to_px(2.0, 0.0)];

    for pair in points.windows(2) {
        draw_thick_line(&mut img, pair[0], pair[1], LINE);
    }
    for &p in &points {
        fill_circle(&mut img, p, 6, LINE);
    }
    img
}

/// Placeholder plot encoded as PNG bytes.
pub fn placeholder_png() -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    render_placeholder().write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

// Bresenham
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_thick_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    for offset in -1..=1 {
        draw_line(img, (from.0, from.1 + offset), (to.0, to.1 + offset), color);
        draw_line(img, (from.0 + offset, from.1), (to.0 + offset, to.1), color);
    }
}

fn fill_circle(img: &mut RgbImage, center: (i64, i64), radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, center.0 + dx, center.1 + dy, color);
            }
        }
    }
}
