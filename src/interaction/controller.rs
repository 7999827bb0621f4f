//! Drag gesture state machine.
//!
//! ```text
//! Idle --pointer_down(valid)--> Dragging --pointer_move--> Dragging
//!                                   |
//!                                   +--pointer_up--> Idle (+ one command)
//!                                   +--cancel-----> Idle
//! ```
//!
//! Pointer positions arrive already converted to world coordinates; `None`
//! means the pointer is outside the drawn map.

use serde::Deserialize;

use crate::core::math::heading_or_zero;
use crate::core::types::{Point2D, Pose2D};
use crate::view::DragOverlay;

use super::commands::NavCommand;

/// Below this displacement on both axes a gesture counts as a click (heading 0).
pub const CLICK_EPSILON: f64 = 1e-4;

/// Which command a completed gesture produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTool {
    /// Re-localize the robot (pose estimate)
    SetPose,
    /// Send a navigation goal
    #[default]
    SetGoal,
}

/// Gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { start: Point2D, current: Point2D },
}

/// Turns pointer gestures into pose/goal commands.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    enabled: bool,
    tool: NavTool,
    state: DragState,
}

impl InteractionController {
    pub fn new(enabled: bool, tool: NavTool) -> Self {
        Self {
            enabled,
            tool,
            state: DragState::Idle,
        }
    }

    /// Start a gesture. Returns `true` if the gesture started.
    pub fn pointer_down(&mut self, world: Option<Point2D>) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(p) = world else {
            return false;
        };
        self.state = DragState::Dragging {
            start: p,
            current: p,
        };
        true
    }

    /// Track the pointer. Returns `true` if the gesture changed.
    pub fn pointer_move(&mut self, world: Option<Point2D>) -> bool {
        if !self.enabled {
            return false;
        }
        match (&mut self.state, world) {
            (DragState::Dragging { current, .. }, Some(p)) => {
                *current = p;
                true
            }
            _ => false,
        }
    }

    /// Finish the gesture and produce its command.
    ///
    /// The command carries the start point; the heading points from start to
    /// the last valid pointer position.
    pub fn pointer_up(&mut self) -> Option<NavCommand> {
        if !self.enabled {
            return None;
        }
        let DragState::Dragging { start, current } = std::mem::take(&mut self.state) else {
            return None;
        };

        let yaw = heading_or_zero(start.x, start.y, current.x, current.y, CLICK_EPSILON);
        let pose = Pose2D::new(start.x, start.y, yaw);
        let command = match self.tool {
            NavTool::SetPose => NavCommand::PoseEstimate(pose),
            NavTool::SetGoal => NavCommand::NavigationGoal(pose),
        };
        tracing::debug!("Gesture complete: {:?}", command);
        Some(command)
    }

    /// Abort a gesture without producing a command. Returns `true` if one was active.
    pub fn cancel(&mut self) -> bool {
        !matches!(std::mem::take(&mut self.state), DragState::Idle)
    }

    /// Overlay for the active gesture, if any.
    pub fn overlay(&self) -> Option<DragOverlay> {
        match self.state {
            DragState::Dragging { start, current } => Some(DragOverlay {
                start,
                current,
                tool: self.tool,
            }),
            DragState::Idle => None,
        }
    }

    /// Switch tools; an active gesture keeps going with the new tool.
    pub fn set_tool(&mut self, tool: NavTool) {
        self.tool = tool;
    }

    /// Enable or disable gestures. Disabling drops an active gesture.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.state = DragState::Idle;
        }
    }

    #[inline]
    pub fn tool(&self) -> NavTool {
        self.tool
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn p(x: f64, y: f64) -> Option<Point2D> {
        Some(Point2D::new(x, y))
    }

    #[test]
    fn test_default_tool_is_goal() {
        assert_eq!(NavTool::default(), NavTool::SetGoal);
        assert_eq!(InteractionController::default().tool(), NavTool::SetGoal);
    }

    #[test]
    fn test_diagonal_drag_heading() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        assert!(c.pointer_down(p(0.0, 0.0)));
        assert!(c.pointer_move(p(1.0, 1.0)));

        match c.pointer_up() {
            Some(NavCommand::NavigationGoal(pose)) => {
                assert_relative_eq!(pose.x, 0.0);
                assert_relative_eq!(pose.y, 0.0);
                assert_relative_eq!(pose.yaw, FRAC_PI_4, epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.state(), DragState::Idle);
    }

    #[test]
    fn test_click_has_zero_heading() {
        let mut c = InteractionController::new(true, NavTool::SetPose);
        c.pointer_down(p(2.0, 3.0));
        c.pointer_move(p(2.00005, 2.99995));
        match c.pointer_up() {
            Some(NavCommand::PoseEstimate(pose)) => {
                assert_relative_eq!(pose.x, 2.0);
                assert_relative_eq!(pose.y, 3.0);
                assert_eq!(pose.yaw, 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_one_command_per_gesture() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        c.pointer_down(p(0.0, 0.0));
        assert!(c.pointer_up().is_some());
        assert!(c.pointer_up().is_none());
    }

    #[test]
    fn test_down_outside_map_is_ignored() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        assert!(!c.pointer_down(None));
        assert!(!c.pointer_move(p(1.0, 1.0)));
        assert!(c.pointer_up().is_none());
    }

    #[test]
    fn test_invalid_move_keeps_last_point() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        c.pointer_down(p(0.0, 0.0));
        c.pointer_move(p(0.0, 2.0));
        assert!(!c.pointer_move(None));

        let overlay = c.overlay().unwrap();
        assert_eq!(overlay.current, Point2D::new(0.0, 2.0));

        let Some(NavCommand::NavigationGoal(pose)) = c.pointer_up() else {
            panic!("expected goal");
        };
        assert_relative_eq!(pose.yaw, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_disabled_ignores_everything() {
        let mut c = InteractionController::new(false, NavTool::SetGoal);
        assert!(!c.pointer_down(p(0.0, 0.0)));
        assert!(c.overlay().is_none());
        assert!(c.pointer_up().is_none());
    }

    #[test]
    fn test_disable_mid_gesture_drops_it() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        c.pointer_down(p(0.0, 0.0));
        c.set_enabled(false);
        c.set_enabled(true);
        assert!(c.pointer_up().is_none());
    }

    #[test]
    fn test_cancel_emits_nothing() {
        let mut c = InteractionController::new(true, NavTool::SetPose);
        c.pointer_down(p(1.0, 1.0));
        assert!(c.cancel());
        assert!(!c.cancel());
        assert!(c.pointer_up().is_none());
    }

    #[test]
    fn test_overlay_uses_current_tool() {
        let mut c = InteractionController::new(true, NavTool::SetGoal);
        c.pointer_down(p(0.0, 0.0));
        c.set_tool(NavTool::SetPose);
        assert_eq!(c.overlay().unwrap().tool, NavTool::SetPose);
        assert!(matches!(c.pointer_up(), Some(NavCommand::PoseEstimate(_))));
    }
}
