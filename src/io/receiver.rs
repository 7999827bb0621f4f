//! Bridge reader thread.
//!
//! Decodes frames from the bridge socket, routes `publish` operations by
//! topic and hands the results to the console thread over a bounded
//! crossbeam channel:
//!
//! ```text
//! socket ──frames──> BridgeReceiver ──InboundEvent──> console thread
//! ```
//!
//! The loop exits when the shared running flag clears (checked on every read
//! timeout), when the socket closes, or when the console side hangs up.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::config::TopicConfig;
use crate::error::Result;
use crate::grid::OccupancyGrid;
use crate::tf::TransformEntry;

use super::messages::{BridgeOp, OccupancyGridMsg, TfMessage};
use super::wire::FrameReader;

/// Channel capacity between the reader and the console thread.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Socket read timeout, bounds how long shutdown takes to be noticed.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Event delivered to the console thread.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// New occupancy grid
    Grid(OccupancyGrid),
    /// One transform message, static or dynamic
    Transforms {
        entries: Vec<TransformEntry>,
        is_static: bool,
    },
    /// The bridge connection ended
    Disconnected,
}

/// Maps bridge topics onto inbound events.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    map: String,
    tf: String,
    tf_static: String,
}

impl TopicRouter {
    pub fn new(topics: &TopicConfig) -> Self {
        Self {
            map: topics.map.clone(),
            tf: topics.tf.clone(),
            tf_static: topics.tf_static.clone(),
        }
    }

    /// Turn one bridge operation into an event, if it carries one.
    ///
    /// Bodies that fail to parse are logged and dropped.
    pub fn route(&self, op: BridgeOp) -> Option<InboundEvent> {
        let (topic, msg) = match op {
            BridgeOp::Publish { topic, msg } => (topic, msg),
            other => {
                tracing::trace!("Ignoring bridge op on {}", other.topic());
                return None;
            }
        };

        if topic == self.map {
            match serde_json::from_value::<OccupancyGridMsg>(msg) {
                Ok(grid) => Some(InboundEvent::Grid(grid.into())),
                Err(e) => {
                    tracing::warn!("Dropping malformed grid on {}: {}", topic, e);
                    None
                }
            }
        } else if topic == self.tf || topic == self.tf_static {
            match serde_json::from_value::<TfMessage>(msg) {
                Ok(tf) => Some(InboundEvent::Transforms {
                    entries: tf.entries(),
                    is_static: topic == self.tf_static,
                }),
                Err(e) => {
                    tracing::warn!("Dropping malformed transforms on {}: {}", topic, e);
                    None
                }
            }
        } else {
            tracing::trace!("Ignoring message on unrouted topic {}", topic);
            None
        }
    }
}

/// Reader loop over the bridge socket.
pub struct BridgeReceiver {
    stream: TcpStream,
    router: TopicRouter,
    running: Arc<AtomicBool>,
    event_tx: Sender<InboundEvent>,
}

impl BridgeReceiver {
    /// Create a receiver and the channel end the console thread drains.
    pub fn new(
        stream: TcpStream,
        topics: &TopicConfig,
        running: Arc<AtomicBool>,
    ) -> Result<(Self, Receiver<InboundEvent>)> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);

        Ok((
            Self {
                stream,
                router: TopicRouter::new(topics),
                running,
                event_tx,
            },
            event_rx,
        ))
    }

    /// Run the receiver loop (blocking).
    pub fn run(mut self) {
        tracing::info!("Bridge receiver started");

        let mut reader = FrameReader::new();
        let mut frames: u64 = 0;

        while self.running.load(Ordering::Relaxed) {
            let op = match reader.read_frame(&mut self.stream) {
                Ok(Some(op)) => op,
                Ok(None) => continue,
                Err(e) => {
                    if self.running.load(Ordering::Relaxed) {
                        tracing::warn!("Bridge connection lost: {}", e);
                    }
                    self.event_tx.send(InboundEvent::Disconnected).ok();
                    break;
                }
            };
            frames += 1;

            if let Some(event) = self.router.route(op)
                && self.event_tx.send(event).is_err()
            {
                tracing::debug!("Event channel closed, stopping receiver");
                break;
            }
        }

        tracing::info!(
            "Bridge receiver stopped after {} frames ({} undecodable)",
            frames,
            reader.skipped()
        );
    }
}
