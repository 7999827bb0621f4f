//! Core data types.
//!
//! - [`Point2D`]: 2D point in meters
//! - [`Pose2D`]: Robot pose (x, y, yaw) in meters and radians
//! - [`Vec3`], [`Quaternion`]: translation and rotation of a rigid transform
//! - [`Transform`]: parent-to-child rigid transform

mod pose;
mod transform;

pub use pose::{Point2D, Pose2D};
pub use transform::{Quaternion, Transform, Vec3};
