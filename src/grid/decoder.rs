//! Occupancy grid decoding.
//!
//! Cell encoding on the wire:
//! - `-1` = unknown
//! - `0..49` = free (with some uncertainty)
//! - `>= 50` = occupied
//!
//! The raster is flipped vertically: source row 0 (the row at the map origin)
//! lands on the bottom raster row, so +Y in the map points up on screen.

use image::{Rgba, RgbaImage};

use crate::core::types::Point2D;

/// Value marking an unknown cell.
pub const UNKNOWN_CELL: i8 = -1;

/// Cells at or above this value are drawn as obstacles.
pub const OCCUPIED_THRESHOLD: i8 = 50;

/// Gray level for unknown cells.
pub const UNKNOWN_GRAY: u8 = 205;

/// Gray level for occupied cells.
pub const OCCUPIED_GRAY: u8 = 0;

/// Gray level for free cells.
pub const FREE_GRAY: u8 = 255;

/// Palette class of a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Unknown,
    Free,
    Occupied,
}

impl CellClass {
    /// Classify a raw cell value.
    ///
    /// Only `-1` is unknown; any other value below the occupied threshold,
    /// negative ones included, paints as free.
    #[inline]
    pub fn of(value: i8) -> Self {
        if value == UNKNOWN_CELL {
            CellClass::Unknown
        } else if value >= OCCUPIED_THRESHOLD {
            CellClass::Occupied
        } else {
            CellClass::Free
        }
    }

    /// Opaque palette colour.
    #[inline]
    pub fn color(self) -> Rgba<u8> {
        let c = match self {
            CellClass::Unknown => UNKNOWN_GRAY,
            CellClass::Free => FREE_GRAY,
            CellClass::Occupied => OCCUPIED_GRAY,
        };
        Rgba([c, c, c, 255])
    }
}

/// Occupancy grid message.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Meters per cell
    pub resolution: f64,
    /// World position of cell (0, 0) in map meters
    pub origin: Point2D,
    /// Row-major cell values, row 0 at the origin
    pub cells: Vec<i8>,
}

impl OccupancyGrid {
    /// True if the grid is non-empty and carries exactly one value per cell.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.cells.len() as u64 == self.width as u64 * self.height as u64
    }

    /// Metadata used for world ↔ raster conversion.
    pub fn meta(&self) -> MapMeta {
        MapMeta {
            width: self.width,
            height: self.height,
            resolution: self.resolution,
            origin_x: self.origin.x,
            origin_y: self.origin.y,
        }
    }

    /// Count cells per palette class.
    pub fn count_by_class(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for &v in &self.cells {
            match CellClass::of(v) {
                CellClass::Unknown => counts.unknown += 1,
                CellClass::Free => counts.free += 1,
                CellClass::Occupied => counts.occupied += 1,
            }
        }
        counts
    }
}

/// Cell counts by palette class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub unknown: usize,
    pub free: usize,
    pub occupied: usize,
}

/// Grid metadata kept alongside the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMeta {
    /// Width in cells (= raster pixels)
    pub width: u32,
    /// Height in cells (= raster pixels)
    pub height: u32,
    /// Meters per cell
    pub resolution: f64,
    /// World X of cell (0, 0)
    pub origin_x: f64,
    /// World Y of cell (0, 0)
    pub origin_y: f64,
}

/// Decoded map image, one pixel per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Pixel at raster coordinates (row 0 at the top).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Underlying image.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes, row-major from the top row.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Decode a grid into a fresh raster.
///
/// Returns `None` for malformed grids (zero size or a cell count that does not
/// match `width * height`); no partial image is ever produced.
pub fn decode(grid: &OccupancyGrid) -> Option<Raster> {
    if !grid.is_well_formed() {
        return None;
    }

    let (w, h) = (grid.width, grid.height);
    let mut image = RgbaImage::new(w, h);

    for (src_row, row) in grid.cells.chunks_exact(w as usize).enumerate() {
        let dst_row = h - 1 - src_row as u32;
        for (x, &value) in row.iter().enumerate() {
            image.put_pixel(x as u32, dst_row, CellClass::of(value).color());
        }
    }

    Some(Raster { image })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: Rgba<u8> = Rgba([UNKNOWN_GRAY, UNKNOWN_GRAY, UNKNOWN_GRAY, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn grid(width: u32, height: u32, cells: Vec<i8>) -> OccupancyGrid {
        OccupancyGrid {
            width,
            height,
            resolution: 1.0,
            origin: Point2D::new(0.0, 0.0),
            cells,
        }
    }

    #[test]
    fn test_two_by_two_flip() {
        let raster = decode(&grid(2, 2, vec![-1, 100, 0, 50])).unwrap();
        assert_eq!(raster.dimensions(), (2, 2));

        // Top-left comes from the bottom source row (index 2)
        assert_eq!(raster.pixel(0, 0), WHITE);
        assert_eq!(raster.pixel(1, 0), BLACK);
        // Source row 0 ends up at the bottom
        assert_eq!(raster.pixel(0, 1), GRAY);
        assert_eq!(raster.pixel(1, 1), BLACK);
    }

    #[test]
    fn test_palette_thresholds() {
        assert_eq!(CellClass::of(-1), CellClass::Unknown);
        assert_eq!(CellClass::of(0), CellClass::Free);
        assert_eq!(CellClass::of(49), CellClass::Free);
        assert_eq!(CellClass::of(50), CellClass::Occupied);
        assert_eq!(CellClass::of(127), CellClass::Occupied);
        assert_eq!(CellClass::of(-7), CellClass::Free);
    }

    #[test]
    fn test_every_pixel_opaque() {
        let raster = decode(&grid(3, 2, vec![-1, 0, 100, 20, 60, -1])).unwrap();
        assert!(raster.as_bytes().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let g = grid(4, 3, vec![0, 1, 2, 50, -1, -1, 99, 100, 10, 20, 30, 40]);
        let a = decode(&g).unwrap();
        let b = decode(&g).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_rejects_cell_count_mismatch() {
        assert!(decode(&grid(2, 2, vec![0, 0, 0])).is_none());
        assert!(decode(&grid(2, 2, vec![0; 5])).is_none());
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        assert!(decode(&grid(0, 3, vec![])).is_none());
        assert!(decode(&grid(3, 0, vec![])).is_none());
    }

    #[test]
    fn test_non_square_orientation() {
        // 3 wide, 2 tall: occupied cell at source (2, 0) -> raster (2, 1)
        let raster = decode(&grid(3, 2, vec![0, 0, 100, 0, 0, 0])).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.pixel(2, 1), BLACK);
        assert_eq!(raster.pixel(2, 0), WHITE);
    }

    #[test]
    fn test_count_by_class() {
        let counts = grid(2, 2, vec![-1, 100, 0, 50]).count_by_class();
        assert_eq!(
            counts,
            CellCounts {
                unknown: 1,
                free: 1,
                occupied: 2
            }
        );
    }
}
