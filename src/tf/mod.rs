//! Coordinate-frame transforms and robot pose resolution.
//!
//! - [`TransformStore`]: last-write-wins table of `(parent, child)` transforms
//! - [`PoseEstimator`]: resolves the robot pose in the map frame from the store

mod estimator;
mod store;

pub use estimator::{PoseEstimator, PoseSource, ResolvedPose};
pub use store::{TransformEntry, TransformStore, compose, normalize_frame_id};
