//! Robot pose resolution from the transform table.
//!
//! The frame tree is collapsed to a fixed two-hop policy:
//!
//! ```text
//! 1. map -> robot            (first candidate found, in order)
//! 2. map -> odom -> robot    (first candidate found, in order)
//! 3. nothing yet
//! ```
//!
//! This is not a general frame graph search; trees that need more hops (or
//! inverted edges) resolve to no pose.

use crate::config::FrameConfig;
use crate::core::types::{Pose2D, Transform};

use super::store::{TransformStore, compose};

/// Which path produced a pose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseSource {
    /// `map -> frame` was present
    Direct(String),
    /// `map -> odom -> frame` was composed
    ViaOdom(String),
}

/// A resolved pose together with its source path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPose {
    pub pose: Pose2D,
    pub transform: Transform,
    pub source: PoseSource,
}

/// Resolves `map -> robot` with a fixed candidate list.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    map_frame: String,
    odom_frame: String,
    robot_frames: Vec<String>,
}

impl PoseEstimator {
    pub fn new(
        map_frame: impl Into<String>,
        odom_frame: impl Into<String>,
        robot_frames: Vec<String>,
    ) -> Self {
        Self {
            map_frame: map_frame.into(),
            odom_frame: odom_frame.into(),
            robot_frames,
        }
    }

    pub fn from_config(frames: &FrameConfig) -> Self {
        Self::new(&frames.map, &frames.odom, frames.robot.clone())
    }

    /// Resolve the robot pose in the map frame.
    ///
    /// Pure with respect to the store: two calls without an intervening
    /// mutation return the same result.
    pub fn resolve(&self, store: &TransformStore) -> Option<ResolvedPose> {
        // 1) direct map -> robot
        for frame in &self.robot_frames {
            if let Some(t) = store.lookup(&self.map_frame, frame) {
                return Some(ResolvedPose {
                    pose: t.to_pose2d(),
                    transform: t,
                    source: PoseSource::Direct(frame.clone()),
                });
            }
        }

        // 2) map -> odom -> robot
        let map_to_odom = store.lookup(&self.map_frame, &self.odom_frame)?;
        for frame in &self.robot_frames {
            if let Some(odom_to_robot) = store.lookup(&self.odom_frame, frame) {
                let t = compose(&map_to_odom, &odom_to_robot);
                return Some(ResolvedPose {
                    pose: t.to_pose2d(),
                    transform: t,
                    source: PoseSource::ViaOdom(frame.clone()),
                });
            }
        }

        None
    }
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_empty_store_has_no_pose() {
        let estimator = PoseEstimator::default();
        assert!(estimator.resolve(&TransformStore::new()).is_none());
    }

    #[test]
    fn test_direct_preferred_over_odom_chain() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::planar(10.0, 10.0, 0.0));
        store.upsert("odom", "base_footprint", Transform::planar(1.0, 0.0, 0.0));
        store.upsert("map", "base_footprint", Transform::planar(3.0, 4.0, 0.5));

        let resolved = PoseEstimator::default().resolve(&store).unwrap();
        assert_eq!(resolved.source, PoseSource::Direct("base_footprint".into()));
        assert_relative_eq!(resolved.pose.x, 3.0);
        assert_relative_eq!(resolved.pose.y, 4.0);
        assert_relative_eq!(resolved.pose.yaw, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_candidate_order_for_direct() {
        let mut store = TransformStore::new();
        store.upsert("map", "base_link", Transform::planar(7.0, 0.0, 0.0));
        store.upsert("map", "base_footprint", Transform::planar(1.0, 0.0, 0.0));

        let resolved = PoseEstimator::default().resolve(&store).unwrap();
        assert_eq!(resolved.source, PoseSource::Direct("base_footprint".into()));
    }

    #[test]
    fn test_later_direct_candidate_beats_odom_chain() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::identity());
        store.upsert("odom", "base_footprint", Transform::planar(1.0, 0.0, 0.0));
        store.upsert("map", "base_link", Transform::planar(2.0, 0.0, 0.0));

        let resolved = PoseEstimator::default().resolve(&store).unwrap();
        assert_eq!(resolved.source, PoseSource::Direct("base_link".into()));
    }

    #[test]
    fn test_odom_chain_composes() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::planar(1.0, 1.0, FRAC_PI_2));
        store.upsert("odom", "base_link", Transform::planar(2.0, 0.0, 0.0));

        let resolved = PoseEstimator::default().resolve(&store).unwrap();
        assert_eq!(resolved.source, PoseSource::ViaOdom("base_link".into()));
        assert_relative_eq!(resolved.pose.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(resolved.pose.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(resolved.pose.yaw, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_odom_without_map_link_is_none() {
        let mut store = TransformStore::new();
        store.upsert("odom", "base_footprint", Transform::planar(1.0, 0.0, 0.0));
        assert!(PoseEstimator::default().resolve(&store).is_none());
    }

    #[test]
    fn test_map_odom_without_robot_is_none() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::identity());
        store.upsert("odom", "laser", Transform::identity());
        assert!(PoseEstimator::default().resolve(&store).is_none());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut store = TransformStore::new();
        store.upsert("map", "odom", Transform::planar(0.5, -0.5, 0.3));
        store.upsert("odom", "base_footprint", Transform::planar(1.5, 2.0, -1.0));

        let estimator = PoseEstimator::default();
        assert_eq!(estimator.resolve(&store), estimator.resolve(&store));
    }

    #[test]
    fn test_custom_frames() {
        let mut store = TransformStore::new();
        store.upsert("world", "robot", Transform::planar(4.0, 2.0, 0.0));
        let estimator = PoseEstimator::new("world", "odom", vec!["robot".into()]);
        let pose = estimator.resolve(&store).unwrap().pose;
        assert_relative_eq!(pose.x, 4.0);
        assert_relative_eq!(pose.y, 2.0);
    }
}
