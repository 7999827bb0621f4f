//! Bus message shapes.
//!
//! Field names follow the ROS message definitions as the bridge serializes
//! them to JSON. Only the fields the console reads or writes are modelled;
//! unknown fields are ignored on input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::{Point2D, Quaternion, Transform, Vec3};
use crate::grid::OccupancyGrid;
use crate::interaction::{NavCommand, Twist, pose_covariance};
use crate::tf::TransformEntry;

pub const OCCUPANCY_GRID_TYPE: &str = "nav_msgs/OccupancyGrid";
pub const TF_MESSAGE_TYPE: &str = "tf2_msgs/TFMessage";
pub const POSE_WITH_COVARIANCE_STAMPED_TYPE: &str = "geometry_msgs/PoseWithCovarianceStamped";
pub const POSE_STAMPED_TYPE: &str = "geometry_msgs/PoseStamped";
pub const TWIST_TYPE: &str = "geometry_msgs/Twist";

/// Operation envelope exchanged with the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    Subscribe {
        topic: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        msg_type: Option<String>,
    },
    Unsubscribe {
        topic: String,
    },
    Advertise {
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
    },
    Unadvertise {
        topic: String,
    },
    Publish {
        topic: String,
        msg: Value,
    },
}

impl BridgeOp {
    /// Topic the operation refers to.
    pub fn topic(&self) -> &str {
        match self {
            BridgeOp::Subscribe { topic, .. }
            | BridgeOp::Unsubscribe { topic }
            | BridgeOp::Advertise { topic, .. }
            | BridgeOp::Unadvertise { topic }
            | BridgeOp::Publish { topic, .. } => topic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stamp {
    #[serde(alias = "sec", default)]
    pub secs: i64,
    #[serde(alias = "nanosec", default)]
    pub nsecs: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub stamp: Stamp,
    #[serde(default)]
    pub frame_id: String,
}

impl Header {
    /// Header with a zero stamp; the receiving stack fills in time.
    pub fn unstamped(frame_id: &str) -> Self {
        Self {
            stamp: Stamp::default(),
            frame_id: frame_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3Msg {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuaternionMsg {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "one")]
    pub w: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for QuaternionMsg {
    fn default() -> Self {
        Quaternion::IDENTITY.into()
    }
}

impl From<QuaternionMsg> for Quaternion {
    fn from(q: QuaternionMsg) -> Self {
        Quaternion::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quaternion> for QuaternionMsg {
    fn from(q: Quaternion) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseMsg {
    #[serde(default)]
    pub position: Vector3Msg,
    #[serde(default)]
    pub orientation: QuaternionMsg,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapMetaDataMsg {
    pub resolution: f64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub origin: PoseMsg,
}

/// `nav_msgs/OccupancyGrid`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OccupancyGridMsg {
    #[serde(default)]
    pub header: Header,
    pub info: MapMetaDataMsg,
    pub data: Vec<i8>,
}

impl From<OccupancyGridMsg> for OccupancyGrid {
    fn from(msg: OccupancyGridMsg) -> Self {
        let origin = msg.info.origin.position;
        OccupancyGrid {
            width: msg.info.width,
            height: msg.info.height,
            resolution: msg.info.resolution,
            origin: Point2D::new(origin.x, origin.y),
            cells: msg.data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformMsg {
    #[serde(default)]
    pub translation: Vector3Msg,
    #[serde(default)]
    pub rotation: QuaternionMsg,
}

/// `geometry_msgs/TransformStamped`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformStampedMsg {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub child_frame_id: String,
    #[serde(default)]
    pub transform: TransformMsg,
}

impl From<&TransformStampedMsg> for TransformEntry {
    fn from(msg: &TransformStampedMsg) -> Self {
        let t = &msg.transform.translation;
        TransformEntry::new(
            msg.header.frame_id.as_str(),
            msg.child_frame_id.as_str(),
            Transform::new(Vec3::new(t.x, t.y, t.z), msg.transform.rotation.into()),
        )
    }
}

/// `tf2_msgs/TFMessage`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TfMessage {
    #[serde(default)]
    pub transforms: Vec<TransformStampedMsg>,
}

impl TfMessage {
    pub fn entries(&self) -> Vec<TransformEntry> {
        self.transforms.iter().map(TransformEntry::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCovarianceMsg {
    pub pose: PoseMsg,
    pub covariance: Vec<f64>,
}

/// `geometry_msgs/PoseWithCovarianceStamped`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCovarianceStampedMsg {
    pub header: Header,
    pub pose: PoseWithCovarianceMsg,
}

/// `geometry_msgs/PoseStamped`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStampedMsg {
    pub header: Header,
    pub pose: PoseMsg,
}

/// `geometry_msgs/Twist`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TwistMsg {
    pub linear: Vector3Msg,
    pub angular: Vector3Msg,
}

impl From<Twist> for TwistMsg {
    fn from(t: Twist) -> Self {
        Self {
            linear: Vector3Msg {
                x: t.linear,
                ..Default::default()
            },
            angular: Vector3Msg {
                z: t.angular,
                ..Default::default()
            },
        }
    }
}

fn planar_pose_msg(x: f64, y: f64, yaw: f64) -> PoseMsg {
    PoseMsg {
        position: Vector3Msg { x, y, z: 0.0 },
        orientation: Quaternion::from_yaw(yaw).into(),
    }
}

/// Outbound message body for a gesture command, stamped in `frame_id`.
pub fn nav_command_msg(command: &NavCommand, frame_id: &str) -> serde_json::Result<Value> {
    let pose = command.pose();
    let body = planar_pose_msg(pose.x, pose.y, pose.yaw);
    match command {
        NavCommand::PoseEstimate(_) => serde_json::to_value(PoseWithCovarianceStampedMsg {
            header: Header::unstamped(frame_id),
            pose: PoseWithCovarianceMsg {
                pose: body,
                covariance: pose_covariance().to_vec(),
            },
        }),
        NavCommand::NavigationGoal(_) => serde_json::to_value(PoseStampedMsg {
            header: Header::unstamped(frame_id),
            pose: body,
        }),
    }
}
