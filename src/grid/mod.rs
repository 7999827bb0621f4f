//! Occupancy grid messages and their raster form.
//!
//! - [`OccupancyGrid`]: grid as received from the map topic
//! - [`MapMeta`]: size, resolution and origin needed for coordinate conversion
//! - [`Raster`]: fixed-palette RGBA image, Y-flipped so up is up on screen
//! - [`decode`]: grid → raster

pub mod decoder;

pub use decoder::{CellClass, CellCounts, MapMeta, OccupancyGrid, Raster, decode};
