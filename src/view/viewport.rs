//! Raster ↔ screen geometry.
//!
//! The raster is fitted into the screen without stretching and centered:
//!
//! ```text
//! scale    = min(screen_w / raster_w, screen_h / raster_h)
//! draw_w   = floor(raster_w * scale)
//! offset_x = floor((screen_w - draw_w) / 2)
//! ```
//!
//! World ↔ screen goes through raster pixels and undoes the Y-flip applied
//! when the grid was decoded:
//!
//! ```text
//! gx = (wx - origin_x) / resolution      px = gx
//! gy = (wy - origin_y) / resolution      py = (h - 1) - gy
//! sx = offset_x + px * scale             sy = offset_y + py * scale
//! ```

use crate::core::types::Point2D;
use crate::grid::MapMeta;

/// Scale and offset placing the raster on the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    /// Screen pixels per raster pixel
    pub scale: f64,
    /// Left edge of the drawn raster in screen pixels
    pub offset_x: f64,
    /// Top edge of the drawn raster in screen pixels
    pub offset_y: f64,
    /// Drawn raster width in screen pixels
    pub draw_width: u32,
    /// Drawn raster height in screen pixels
    pub draw_height: u32,
}

impl ViewportGeometry {
    /// Fit a `raster_w × raster_h` raster into a `screen_w × screen_h` screen.
    ///
    /// Sizes are clamped to at least one pixel.
    pub fn compute(raster_w: u32, raster_h: u32, screen_w: u32, screen_h: u32) -> Self {
        let (rw, rh) = (raster_w.max(1) as f64, raster_h.max(1) as f64);
        let (sw, sh) = (screen_w.max(1) as f64, screen_h.max(1) as f64);

        let scale = (sw / rw).min(sh / rh);
        let draw_w = (rw * scale).floor();
        let draw_h = (rh * scale).floor();

        Self {
            scale,
            offset_x: ((sw - draw_w) / 2.0).floor(),
            offset_y: ((sh - draw_h) / 2.0).floor(),
            draw_width: draw_w as u32,
            draw_height: draw_h as u32,
        }
    }

    /// True if the screen point lies inside the drawn raster rectangle.
    #[inline]
    pub fn contains(&self, sx: f64, sy: f64) -> bool {
        sx >= self.offset_x
            && sy >= self.offset_y
            && sx < self.offset_x + self.draw_width as f64
            && sy < self.offset_y + self.draw_height as f64
    }
}

/// Screen pixel → world point in map meters.
///
/// `None` when the point is non-finite, outside the drawn rectangle, outside
/// the raster after inverse scaling, or the result is not finite.
pub fn screen_to_world(
    sx: f64,
    sy: f64,
    geometry: &ViewportGeometry,
    meta: &MapMeta,
) -> Option<Point2D> {
    if !sx.is_finite() || !sy.is_finite() || !geometry.contains(sx, sy) {
        return None;
    }

    let px = (sx - geometry.offset_x) / geometry.scale;
    let py = (sy - geometry.offset_y) / geometry.scale;
    if px < 0.0 || py < 0.0 || px >= meta.width as f64 || py >= meta.height as f64 {
        return None;
    }

    let gx = px;
    let gy = (meta.height as f64 - 1.0) - py;

    let world = Point2D::new(
        meta.origin_x + gx * meta.resolution,
        meta.origin_y + gy * meta.resolution,
    );
    world.is_finite().then_some(world)
}

/// World point → screen pixel. Exact inverse of [`screen_to_world`].
pub fn world_to_screen(wx: f64, wy: f64, geometry: &ViewportGeometry, meta: &MapMeta) -> Point2D {
    let gx = (wx - meta.origin_x) / meta.resolution;
    let gy = (wy - meta.origin_y) / meta.resolution;

    let px = gx;
    let py = (meta.height as f64 - 1.0) - gy;

    Point2D::new(
        geometry.offset_x + px * geometry.scale,
        geometry.offset_y + py * geometry.scale,
    )
}

/// Raster and screen sizes a geometry was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GeometryKey {
    raster: (u32, u32),
    screen: (u32, u32),
}

/// Geometry cache shared by drawing and pointer conversion.
///
/// Recomputes whenever the raster or screen size differs from the last call,
/// so callers can never see a geometry computed for a stale size pair.
#[derive(Debug, Default, Clone)]
pub struct ViewportMapper {
    cached: Option<(GeometryKey, ViewportGeometry)>,
    recomputes: u64,
}

impl ViewportMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry for the given raster and screen sizes.
    pub fn geometry(&mut self, raster: (u32, u32), screen: (u32, u32)) -> ViewportGeometry {
        let key = GeometryKey { raster, screen };
        match self.cached {
            Some((cached_key, geometry)) if cached_key == key => geometry,
            _ => {
                let geometry = ViewportGeometry::compute(raster.0, raster.1, screen.0, screen.1);
                tracing::debug!(
                    "Viewport {}x{} -> {}x{}: scale {:.3}, offset ({}, {})",
                    raster.0,
                    raster.1,
                    screen.0,
                    screen.1,
                    geometry.scale,
                    geometry.offset_x,
                    geometry.offset_y
                );
                self.cached = Some((key, geometry));
                self.recomputes += 1;
                geometry
            }
        }
    }

    /// Last computed geometry, if any.
    #[inline]
    pub fn last(&self) -> Option<ViewportGeometry> {
        self.cached.map(|(_, g)| g)
    }

    /// Number of times the geometry was (re)computed.
    #[inline]
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Forget the cached geometry.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn meta(width: u32, height: u32, resolution: f64, origin: (f64, f64)) -> MapMeta {
        MapMeta {
            width,
            height,
            resolution,
            origin_x: origin.0,
            origin_y: origin.1,
        }
    }

    #[test]
    fn test_wide_raster_letterboxed() {
        let g = ViewportGeometry::compute(400, 200, 800, 600);
        assert_relative_eq!(g.scale, 2.0);
        assert_eq!((g.draw_width, g.draw_height), (800, 400));
        assert_relative_eq!(g.offset_x, 0.0);
        assert_relative_eq!(g.offset_y, 100.0);
    }

    #[test]
    fn test_tall_raster_pillarboxed() {
        let g = ViewportGeometry::compute(100, 300, 800, 600);
        assert_relative_eq!(g.scale, 2.0);
        assert_eq!((g.draw_width, g.draw_height), (200, 600));
        assert_relative_eq!(g.offset_x, 300.0);
        assert_relative_eq!(g.offset_y, 0.0);
    }

    #[test]
    fn test_fractional_scale_floors() {
        let g = ViewportGeometry::compute(3, 3, 10, 7);
        assert_relative_eq!(g.scale, 7.0 / 3.0);
        assert_eq!((g.draw_width, g.draw_height), (7, 7));
        assert_relative_eq!(g.offset_x, 1.0);
        assert_relative_eq!(g.offset_y, 0.0);
    }

    #[test]
    fn test_screen_to_world_corners() {
        let m = meta(400, 200, 0.05, (-10.0, -5.0));
        let g = ViewportGeometry::compute(400, 200, 800, 600);

        // Top-left of the drawn map is the last source row
        let tl = screen_to_world(0.0, 100.0, &g, &m).unwrap();
        assert_relative_eq!(tl.x, -10.0);
        assert_relative_eq!(tl.y, -5.0 + 199.0 * 0.05, epsilon = 1e-9);

        // Bottom-left pixel maps to the origin cell
        let bl = screen_to_world(0.0, 100.0 + 199.0 * 2.0, &g, &m).unwrap();
        assert_relative_eq!(bl.x, -10.0);
        assert_relative_eq!(bl.y, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_screen_to_world_outside_is_none() {
        let m = meta(400, 200, 0.05, (0.0, 0.0));
        let g = ViewportGeometry::compute(400, 200, 800, 600);

        // Letterbox bands above and below the map
        assert!(screen_to_world(400.0, 50.0, &g, &m).is_none());
        assert!(screen_to_world(400.0, 550.0, &g, &m).is_none());
        // Off-screen
        assert!(screen_to_world(-1.0, 300.0, &g, &m).is_none());
        assert!(screen_to_world(800.0, 300.0, &g, &m).is_none());
        assert!(screen_to_world(f64::NAN, 300.0, &g, &m).is_none());
    }

    #[test]
    fn test_non_finite_world_is_none() {
        let m = meta(10, 10, f64::INFINITY, (0.0, 0.0));
        let g = ViewportGeometry::compute(10, 10, 100, 100);
        assert!(screen_to_world(50.0, 50.0, &g, &m).is_none());
    }

    #[test]
    fn test_roundtrip_inside_map() {
        let m = meta(400, 200, 0.05, (-3.0, 2.0));
        let g = ViewportGeometry::compute(400, 200, 1024, 700);

        for &(wx, wy) in &[(-2.5, 3.0), (0.0, 5.0), (15.0, 11.5), (-2.99, 2.01)] {
            let s = world_to_screen(wx, wy, &g, &m);
            let w = screen_to_world(s.x, s.y, &g, &m).unwrap();
            assert!((w.x - wx).abs() <= m.resolution, "x {} vs {}", w.x, wx);
            assert!((w.y - wy).abs() <= m.resolution, "y {} vs {}", w.y, wy);
        }
    }

    #[test]
    fn test_mapper_caches_until_size_changes() {
        let mut mapper = ViewportMapper::new();
        let a = mapper.geometry((400, 200), (800, 600));
        let b = mapper.geometry((400, 200), (800, 600));
        assert_eq!(a, b);
        assert_eq!(mapper.recomputes(), 1);

        let c = mapper.geometry((400, 200), (400, 600));
        assert_relative_eq!(c.scale, 1.0);
        assert_relative_eq!(c.offset_y, 200.0);
        assert_eq!(mapper.recomputes(), 2);
        assert_eq!(mapper.last(), Some(c));

        mapper.geometry((200, 200), (400, 600));
        assert_eq!(mapper.recomputes(), 3);

        mapper.invalidate();
        assert!(mapper.last().is_none());
    }
}
