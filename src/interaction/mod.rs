//! Operator input: drag gestures on the map and direction-pad teleop.

mod commands;
mod controller;

pub use commands::{Direction, NavCommand, Twist, pose_covariance};
pub use controller::{CLICK_EPSILON, DragState, InteractionController, NavTool};
