//! Gated publishing of operator commands.
//!
//! Gesture commands go out only while the link is active and navigation
//! interaction is enabled; velocity commands only need an active link. A
//! command that cannot be sent is logged and dropped, never retried: the
//! operator re-issues the gesture.

use serde_json::Value;

use crate::config::{DrishtiConfig, TeleopConfig, TopicConfig};
use crate::error::{DrishtiError, Result};
use crate::interaction::{Direction, NavCommand, Twist};

use super::bridge::BridgeClient;
use super::messages::{
    POSE_STAMPED_TYPE, POSE_WITH_COVARIANCE_STAMPED_TYPE, TWIST_TYPE, TwistMsg, nav_command_msg,
};

/// Anything that can put a message body on a topic.
pub trait CommandSink {
    fn advertise(&mut self, topic: &str, msg_type: &str) -> Result<()>;
    fn publish(&mut self, topic: &str, msg: Value) -> Result<()>;
}

impl CommandSink for BridgeClient {
    fn advertise(&mut self, topic: &str, msg_type: &str) -> Result<()> {
        BridgeClient::advertise(self, topic, msg_type).map(|_| ())
    }

    fn publish(&mut self, topic: &str, msg: Value) -> Result<()> {
        self.publish_value(topic, msg)
    }
}

/// A sink that may be between connections; sends fail while it is empty.
impl<S: CommandSink> CommandSink for Option<S> {
    fn advertise(&mut self, topic: &str, msg_type: &str) -> Result<()> {
        match self {
            Some(sink) => sink.advertise(topic, msg_type),
            None => Err(DrishtiError::Protocol("not connected".into())),
        }
    }

    fn publish(&mut self, topic: &str, msg: Value) -> Result<()> {
        match self {
            Some(sink) => sink.publish(topic, msg),
            None => Err(DrishtiError::Protocol("not connected".into())),
        }
    }
}

/// Bus connection state as reported by the connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    Active,
    #[default]
    Inactive,
}

/// Why a command was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    LinkInactive,
    NavigationDisabled,
    Failed,
}

impl SendOutcome {
    #[inline]
    pub fn is_sent(self) -> bool {
        self == SendOutcome::Sent
    }
}

/// Publishes gesture and teleop commands through a [`CommandSink`].
pub struct CommandPublisher<S: CommandSink> {
    sink: S,
    topics: TopicConfig,
    map_frame: String,
    teleop: TeleopConfig,
    link: LinkStatus,
    navigation_enabled: bool,
    sent: u64,
    dropped: u64,
}

impl<S: CommandSink> CommandPublisher<S> {
    pub fn new(sink: S, config: &DrishtiConfig) -> Self {
        Self {
            sink,
            topics: config.topics.clone(),
            map_frame: config.frames.map.clone(),
            teleop: config.teleop.clone(),
            link: LinkStatus::Inactive,
            navigation_enabled: config.navigation.enabled,
            sent: 0,
            dropped: 0,
        }
    }

    /// Advertise every outbound topic; the first failure is returned.
    pub fn advertise_all(&mut self) -> Result<()> {
        self.sink
            .advertise(&self.topics.initial_pose, POSE_WITH_COVARIANCE_STAMPED_TYPE)?;
        self.sink
            .advertise(&self.topics.goal_pose, POSE_STAMPED_TYPE)?;
        self.sink.advertise(&self.topics.cmd_vel, TWIST_TYPE)?;
        Ok(())
    }

    pub fn set_link_status(&mut self, status: LinkStatus) {
        if self.link != status {
            tracing::info!("Link {:?}", status);
        }
        self.link = status;
    }

    #[inline]
    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    pub fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }

    #[inline]
    pub fn navigation_enabled(&self) -> bool {
        self.navigation_enabled
    }

    /// Publish a completed gesture as a pose estimate or navigation goal.
    pub fn send_nav(&mut self, command: &NavCommand) -> SendOutcome {
        if !self.navigation_enabled {
            return self.drop_command("navigation disabled", SendOutcome::NavigationDisabled);
        }
        if self.link != LinkStatus::Active {
            return self.drop_command("link inactive", SendOutcome::LinkInactive);
        }

        let topic = match command {
            NavCommand::PoseEstimate(_) => self.topics.initial_pose.clone(),
            NavCommand::NavigationGoal(_) => self.topics.goal_pose.clone(),
        };
        let body = match nav_command_msg(command, &self.map_frame) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to encode {:?}: {}", command, e);
                return self.drop_command("encode failed", SendOutcome::Failed);
            }
        };

        let pose = command.pose();
        let outcome = self.publish(&topic, body);
        if outcome.is_sent() {
            tracing::info!(
                "Published {} ({:.2}, {:.2}, yaw {:.2})",
                topic,
                pose.x,
                pose.y,
                pose.yaw
            );
        }
        outcome
    }

    /// Publish a direction-pad press at the configured speeds.
    pub fn send_direction(&mut self, direction: Direction) -> SendOutcome {
        let twist = direction.twist(&self.teleop);
        self.send_twist(twist)
    }

    /// Publish a raw velocity command.
    pub fn send_twist(&mut self, twist: Twist) -> SendOutcome {
        if self.link != LinkStatus::Active {
            return self.drop_command("link inactive", SendOutcome::LinkInactive);
        }
        let body = match serde_json::to_value(TwistMsg::from(twist)) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to encode twist: {}", e);
                return self.drop_command("encode failed", SendOutcome::Failed);
            }
        };
        let topic = self.topics.cmd_vel.clone();
        self.publish(&topic, body)
    }

    fn publish(&mut self, topic: &str, body: Value) -> SendOutcome {
        match self.sink.publish(topic, body) {
            Ok(()) => {
                self.sent += 1;
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("Publish to {} failed: {}", topic, e);
                self.drop_command("publish failed", SendOutcome::Failed)
            }
        }
    }

    fn drop_command(&mut self, reason: &str, outcome: SendOutcome) -> SendOutcome {
        self.dropped += 1;
        tracing::debug!("Command not sent: {}", reason);
        outcome
    }

    /// Commands published so far.
    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Commands dropped by the gate or by a failed publish.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
