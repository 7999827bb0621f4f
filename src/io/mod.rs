//! Topic bridge I/O.
//!
//! - [`messages`]: bus message shapes and the bridge operation envelope
//! - [`wire`]: length-prefixed JSON framing
//! - [`bridge`]: TCP client managing subscriptions and advertisements
//! - [`receiver`]: reader thread feeding inbound events into a channel
//! - [`link`]: one connection (client, receiver thread, event channel)
//! - [`outbound`]: gated publishing of operator commands

pub mod bridge;
pub mod link;
pub mod messages;
pub mod outbound;
pub mod receiver;
pub mod wire;

pub use bridge::BridgeClient;
pub use link::BridgeLink;
pub use messages::BridgeOp;
pub use outbound::{CommandPublisher, CommandSink, LinkStatus};
pub use receiver::{BridgeReceiver, InboundEvent, TopicRouter};
pub use wire::{FrameReader, MAX_FRAME_SIZE, write_frame};
