//! Screen-side of the console: viewport math and the render pipeline.
//!
//! - [`viewport`]: raster ↔ screen geometry and world ↔ screen conversion
//! - [`scheduler`]: one-redraw-per-frame coalescing state machine
//! - [`draw`]: blending raster primitives for overlays
//! - [`pipeline`]: surface ownership and layered frame drawing

pub mod draw;
pub mod pipeline;
pub mod scheduler;
pub mod viewport;

pub use pipeline::{DragOverlay, FrameScene, RenderPipeline, RenderStyle};
pub use scheduler::{RedrawScheduler, RedrawState};
pub use viewport::{ViewportGeometry, ViewportMapper, screen_to_world, world_to_screen};
