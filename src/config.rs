//! Configuration loading for Drishti

use crate::error::{DrishtiError, Result};
use crate::interaction::NavTool;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Accepted display refresh rates (Hz)
pub const FRAME_RATE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1000.0;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DrishtiConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub teleop: TeleopConfig,
}

/// Topic bridge connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Bridge IP address (default: 127.0.0.1)
    #[serde(default = "default_bridge_ip")]
    pub bridge_ip: String,

    /// TCP port number (default: 9090)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Delay between reconnect attempts in milliseconds (0 exits on disconnect)
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

/// Bus topic names
#[derive(Clone, Debug, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_map_topic")]
    pub map: String,
    #[serde(default = "default_tf_topic")]
    pub tf: String,
    #[serde(default = "default_tf_static_topic")]
    pub tf_static: String,
    #[serde(default = "default_initial_pose_topic")]
    pub initial_pose: String,
    #[serde(default = "default_goal_pose_topic")]
    pub goal_pose: String,
    #[serde(default = "default_cmd_vel_topic")]
    pub cmd_vel: String,
}

/// Coordinate frame names used for pose resolution
#[derive(Clone, Debug, Deserialize)]
pub struct FrameConfig {
    /// Fixed frame the map is expressed in
    #[serde(default = "default_map_frame")]
    pub map: String,

    /// Odometry frame used for the two-hop fallback
    #[serde(default = "default_odom_frame")]
    pub odom: String,

    /// Robot frame candidates, tried in order
    #[serde(default = "default_robot_frames")]
    pub robot: Vec<String>,
}

/// Drawing surface and overlay settings
#[derive(Clone, Debug, Deserialize)]
pub struct DisplayConfig {
    /// Initial surface width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Initial surface height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Display refresh rate driving the redraw ticker (Hz)
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f32,

    /// Minimum interval between pose label updates (milliseconds)
    #[serde(default = "default_pose_label_interval")]
    pub pose_label_interval_ms: u64,

    /// Robot dot radius in screen pixels
    #[serde(default = "default_marker_radius")]
    pub marker_radius_px: f32,

    /// Heading line length in screen pixels
    #[serde(default = "default_heading_length")]
    pub heading_length_px: f32,

    /// Heading line width in screen pixels
    #[serde(default = "default_heading_width")]
    pub heading_width_px: f32,

    /// Drag arrow line width in screen pixels
    #[serde(default = "default_drag_width")]
    pub drag_width_px: f32,

    /// Drag arrow head side length in screen pixels
    #[serde(default = "default_arrow_head")]
    pub arrow_head_px: f32,

    /// Where frame snapshots are written
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Snapshot interval in seconds (0 disables periodic snapshots)
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
}

/// Navigation interaction settings
#[derive(Clone, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Allow pose/goal gestures and outbound commands
    #[serde(default)]
    pub enabled: bool,

    /// Tool selected at startup
    #[serde(default)]
    pub default_tool: NavTool,
}

/// Direction pad speeds
#[derive(Clone, Debug, Deserialize)]
pub struct TeleopConfig {
    /// Forward/backward speed in m/s (default: 0.15)
    #[serde(default = "default_linear_speed")]
    pub linear_speed: f64,

    /// Turn rate in rad/s (default: 0.6)
    #[serde(default = "default_angular_speed")]
    pub angular_speed: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bridge_ip: default_bridge_ip(),
            port: default_port(),
            timeout_ms: default_timeout(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            map: default_map_topic(),
            tf: default_tf_topic(),
            tf_static: default_tf_static_topic(),
            initial_pose: default_initial_pose_topic(),
            goal_pose: default_goal_pose_topic(),
            cmd_vel: default_cmd_vel_topic(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            map: default_map_frame(),
            odom: default_odom_frame(),
            robot: default_robot_frames(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frame_rate_hz: default_frame_rate(),
            pose_label_interval_ms: default_pose_label_interval(),
            marker_radius_px: default_marker_radius(),
            heading_length_px: default_heading_length(),
            heading_width_px: default_heading_width(),
            drag_width_px: default_drag_width(),
            arrow_head_px: default_arrow_head(),
            snapshot_path: default_snapshot_path(),
            snapshot_interval_secs: default_snapshot_interval(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_tool: NavTool::default(),
        }
    }
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            linear_speed: default_linear_speed(),
            angular_speed: default_angular_speed(),
        }
    }
}

// Default value functions
fn default_bridge_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    9090
}
fn default_timeout() -> u64 {
    5000
}
fn default_reconnect_delay() -> u64 {
    2000
}
fn default_map_topic() -> String {
    "/map".to_string()
}
fn default_tf_topic() -> String {
    "/tf".to_string()
}
fn default_tf_static_topic() -> String {
    "/tf_static".to_string()
}
fn default_initial_pose_topic() -> String {
    "/initialpose".to_string()
}
fn default_goal_pose_topic() -> String {
    "/goal_pose".to_string()
}
fn default_cmd_vel_topic() -> String {
    "/cmd_vel".to_string()
}
fn default_map_frame() -> String {
    "map".to_string()
}
fn default_odom_frame() -> String {
    "odom".to_string()
}
fn default_robot_frames() -> Vec<String> {
    vec!["base_footprint".to_string(), "base_link".to_string()]
}

// Display defaults
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_frame_rate() -> f32 {
    60.0
}
fn default_pose_label_interval() -> u64 {
    100
} // ~10Hz label, redraw stays at frame rate
fn default_marker_radius() -> f32 {
    9.0
}
fn default_heading_length() -> f32 {
    45.0
}
fn default_heading_width() -> f32 {
    4.0
}
fn default_drag_width() -> f32 {
    3.0
}
fn default_arrow_head() -> f32 {
    10.0
}
fn default_snapshot_path() -> String {
    "output/frame.png".to_string()
}
fn default_snapshot_interval() -> u64 {
    5
}

// Teleop defaults
fn default_linear_speed() -> f64 {
    0.15
}
fn default_angular_speed() -> f64 {
    0.6
}

impl DrishtiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DrishtiError::Config(format!("Failed to read config file: {}", e)))?;
        let config: DrishtiConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.frames.robot.is_empty() {
            return Err(DrishtiError::Config(
                "frames.robot must list at least one frame".into(),
            ));
        }
        let rate = self.display.frame_rate_hz;
        if !rate.is_finite() || !FRAME_RATE_RANGE.contains(&rate) {
            return Err(DrishtiError::Config(format!(
                "display.frame_rate_hz must be within {}..={}, got {}",
                FRAME_RATE_RANGE.start(),
                FRAME_RATE_RANGE.end(),
                rate
            )));
        }
        Ok(())
    }

    /// Get the full address string for connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.bridge_ip, self.connection.port)
    }
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before reconnecting, or `None` when reconnecting is disabled
    pub fn reconnect_delay(&self) -> Option<Duration> {
        (self.reconnect_delay_ms > 0).then(|| Duration::from_millis(self.reconnect_delay_ms))
    }
}

impl DisplayConfig {
    /// Interval between display frames; rates outside the accepted range are clamped
    pub fn frame_interval(&self) -> Duration {
        let rate = if self.frame_rate_hz.is_nan() {
            default_frame_rate()
        } else {
            self.frame_rate_hz
                .clamp(*FRAME_RATE_RANGE.start(), *FRAME_RATE_RANGE.end())
        };
        Duration::from_secs_f32(1.0 / rate)
    }

    /// Minimum interval between pose label updates
    pub fn pose_label_interval(&self) -> Duration {
        Duration::from_millis(self.pose_label_interval_ms)
    }
}
