//! Raster primitives for the overlay layers.
//!
//! All shapes are sampled at pixel centers and blended source-over, so
//! translucent marker colours mix with the map underneath. Coordinates are
//! screen pixels and may lie partly (or entirely) off the surface.

use image::{Rgba, RgbaImage};

use super::viewport::ViewportGeometry;

/// Colour with alpha given as a 0..1 fraction.
#[inline]
pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Blend `color` over the pixel at `(x, y)`; out-of-bounds writes are skipped.
pub fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let dst = image.get_pixel_mut(x as u32, y as u32);

    let sa = color[3] as f32 / 255.0;
    if sa >= 1.0 {
        *dst = color;
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let v = (color[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / oa;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (oa * 255.0).round() as u8;
}

/// Fill the whole image with one opaque colour.
pub fn fill(image: &mut RgbaImage, color: Rgba<u8>) {
    for px in image.pixels_mut() {
        *px = color;
    }
}

/// Pixel index range covering `[lo, hi]` clipped to `0..limit`.
fn span(lo: f64, hi: f64, limit: u32) -> std::ops::Range<i64> {
    let start = lo.floor().max(0.0) as i64;
    let end = (hi.ceil() as i64).min(limit as i64);
    start..end.max(start)
}

/// Visit every pixel whose center passes `inside`, within a bounding box.
fn fill_where(
    image: &mut RgbaImage,
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
    color: Rgba<u8>,
    inside: impl Fn(f64, f64) -> bool,
) {
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return;
    }
    let (w, h) = image.dimensions();
    for y in span(min_y, max_y, h) {
        for x in span(min_x, max_x, w) {
            if inside(x as f64 + 0.5, y as f64 + 0.5) {
                blend_pixel(image, x, y, color);
            }
        }
    }
}

/// Filled disc.
pub fn fill_circle(image: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let r2 = radius * radius;
    fill_where(
        image,
        (cx - radius, cy - radius, cx + radius, cy + radius),
        color,
        |x, y| (x - cx).powi(2) + (y - cy).powi(2) <= r2,
    );
}

/// Circle outline of the given stroke width, centered on `radius`.
pub fn stroke_circle(
    image: &mut RgbaImage,
    cx: f64,
    cy: f64,
    radius: f64,
    width: f64,
    color: Rgba<u8>,
) {
    let half = width / 2.0;
    let (inner, outer) = ((radius - half).max(0.0), radius + half);
    fill_where(
        image,
        (cx - outer, cy - outer, cx + outer, cy + outer),
        color,
        |x, y| {
            let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            d >= inner && d <= outer
        },
    );
}

/// Distance from `(px, py)` to the segment `a-b`.
fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qy) = (ax + t * dx, ay + t * dy);
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}

/// Line segment of the given width with round caps.
pub fn draw_line(
    image: &mut RgbaImage,
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
    width: f64,
    color: Rgba<u8>,
) {
    let half = (width / 2.0).max(0.5);
    fill_where(
        image,
        (
            x0.min(x1) - half,
            y0.min(y1) - half,
            x0.max(x1) + half,
            y0.max(y1) + half,
        ),
        color,
        |x, y| segment_distance(x, y, x0, y0, x1, y1) <= half,
    );
}

/// Filled triangle (either winding).
pub fn fill_triangle(
    image: &mut RgbaImage,
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    color: Rgba<u8>,
) {
    let edge = |p: (f64, f64), q: (f64, f64), x: f64, y: f64| {
        (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
    };
    fill_where(
        image,
        (
            a.0.min(b.0).min(c.0),
            a.1.min(b.1).min(c.1),
            a.0.max(b.0).max(c.0),
            a.1.max(b.1).max(c.1),
        ),
        color,
        |x, y| {
            let e0 = edge(a, b, x, y);
            let e1 = edge(b, c, x, y);
            let e2 = edge(c, a, x, y);
            (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
        },
    );
}

/// Copy `src` into the drawn rectangle of `dst` with nearest-neighbor sampling.
pub fn blit_nearest(dst: &mut RgbaImage, src: &RgbaImage, geometry: &ViewportGeometry) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || geometry.scale <= 0.0 {
        return;
    }
    let (dw, dh) = dst.dimensions();
    let x0 = geometry.offset_x.max(0.0) as u32;
    let y0 = geometry.offset_y.max(0.0) as u32;
    let x1 = (geometry.offset_x as i64 + geometry.draw_width as i64).clamp(0, dw as i64) as u32;
    let y1 = (geometry.offset_y as i64 + geometry.draw_height as i64).clamp(0, dh as i64) as u32;

    for y in y0..y1 {
        let sy = (((y as f64 + 0.5 - geometry.offset_y) / geometry.scale) as u32).min(sh - 1);
        for x in x0..x1 {
            let sx = (((x as f64 + 0.5 - geometry.offset_x) / geometry.scale) as u32).min(sw - 1);
            dst.put_pixel(x, y, *src.get_pixel(sx, sy));
        }
    }
}
