//! Outbound operator commands.

use serde::{Deserialize, Serialize};

use crate::config::TeleopConfig;
use crate::core::types::Pose2D;

/// Command produced by a completed map gesture, in the map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavCommand {
    /// Re-localize the robot at this pose
    PoseEstimate(Pose2D),
    /// Drive to this pose
    NavigationGoal(Pose2D),
}

impl NavCommand {
    #[inline]
    pub fn pose(&self) -> Pose2D {
        match self {
            NavCommand::PoseEstimate(p) | NavCommand::NavigationGoal(p) => *p,
        }
    }
}

/// Row-major 6×6 covariance sent with a pose estimate.
///
/// Only x, y and yaw variances are set: `[0] = 0.25`, `[7] = 0.25`,
/// `[35] = 0.0685`.
pub fn pose_covariance() -> [f64; 36] {
    let mut cov = [0.0; 36];
    cov[0] = 0.25; // x
    cov[7] = 0.25; // y
    cov[35] = 0.0685; // yaw
    cov
}

/// Direction pad button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

/// Planar velocity command (`linear.x`, `angular.z`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Forward speed in m/s
    pub linear: f64,
    /// Turn rate in rad/s, counter-clockwise positive
    pub angular: f64,
}

impl Twist {
    pub const STOP: Twist = Twist {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}

impl Direction {
    /// Velocity for this button at the configured speeds.
    pub fn twist(self, teleop: &TeleopConfig) -> Twist {
        match self {
            Direction::Forward => Twist::new(teleop.linear_speed, 0.0),
            Direction::Backward => Twist::new(-teleop.linear_speed, 0.0),
            Direction::Left => Twist::new(0.0, teleop.angular_speed),
            Direction::Right => Twist::new(0.0, -teleop.angular_speed),
            Direction::Stop => Twist::STOP,
        }
    }
}
