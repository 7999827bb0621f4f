//! Drishti - operator map console engine
//!
//! Renders a live occupancy-grid map with the robot pose on top and turns
//! drag gestures on the map into pose-estimate and navigation-goal commands.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Bus adapter
//! │     (wire framing, bridge client, receiver, gate)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              console + operator                     │  ← Orchestration
//! │   (single-writer MapConsole, pose label, commands)  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────┬──────────────┬───────────────────────┐
//! │    grid/     │     tf/      │  view/ + interaction/ │  ← Engine parts
//! │  (decoder)   │ (store, pose)│ (viewport, pipeline,  │
//! │              │              │  gestures, commands)  │
//! └──────────────┴──────────────┴───────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │          (points, poses, transforms, math)          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never blocks and never fails hard: malformed input is dropped,
//! a missing pose or map is an explicit `None`, and outbound failures are
//! logged without retry.

// ============================================================================
// Foundation
// ============================================================================
pub mod core;
pub mod error;

// ============================================================================
// Engine parts
// ============================================================================
pub mod grid;
pub mod interaction;
pub mod tf;
pub mod view;

// ============================================================================
// Orchestration and I/O
// ============================================================================
pub mod config;
pub mod console;
pub mod io;
pub mod operator;
pub mod utils;

// ============================================================================
// Convenience re-exports
// ============================================================================
pub use config::DrishtiConfig;
pub use console::{ConsoleStats, MapConsole, PoseLabel};
pub use core::types::{Point2D, Pose2D, Quaternion, Transform, Vec3};
pub use error::{DrishtiError, Result};
pub use grid::{MapMeta, OccupancyGrid, Raster};
pub use interaction::{Direction, DragState, InteractionController, NavCommand, NavTool, Twist};
pub use io::{BridgeClient, BridgeLink, CommandPublisher, InboundEvent, LinkStatus};
pub use operator::OperatorInput;
pub use tf::{PoseEstimator, PoseSource, TransformEntry, TransformStore};
pub use view::{RenderPipeline, ViewportGeometry, ViewportMapper};
