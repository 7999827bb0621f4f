//! TCP client for the topic bridge.
//!
//! Writes go through this client; reads happen on a cloned stream owned by
//! [`BridgeReceiver`](super::receiver::BridgeReceiver). Subscribe, advertise
//! and their inverses are idempotent per topic.

use std::collections::HashSet;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{DrishtiError, Result};

use super::messages::BridgeOp;
use super::wire::write_frame;

/// Connection to the topic bridge.
pub struct BridgeClient {
    stream: TcpStream,
    subscriptions: HashSet<String>,
    advertised: HashSet<String>,
}

impl BridgeClient {
    /// Connect with timeout.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let peer: SocketAddr = addr
            .parse()
            .map_err(|e| DrishtiError::Config(format!("Invalid address: {}", e)))?;
        let stream = TcpStream::connect_timeout(&peer, timeout)?;
        stream.set_nodelay(true)?;

        tracing::info!("Connected to bridge at {}", peer);

        Ok(Self {
            stream,
            subscriptions: HashSet::new(),
            advertised: HashSet::new(),
        })
    }

    /// Second handle on the socket for the reader thread.
    pub fn reader_stream(&self) -> Result<TcpStream> {
        Ok(self.stream.try_clone()?)
    }

    fn send(&mut self, op: &BridgeOp) -> Result<()> {
        write_frame(&mut self.stream, op)
    }

    /// Subscribe to `topic`. Returns `false` if already subscribed.
    pub fn subscribe(&mut self, topic: &str, msg_type: &str) -> Result<bool> {
        if self.subscriptions.contains(topic) {
            return Ok(false);
        }
        self.send(&BridgeOp::Subscribe {
            topic: topic.to_string(),
            msg_type: Some(msg_type.to_string()),
        })?;
        self.subscriptions.insert(topic.to_string());
        tracing::info!("Subscribed to {} ({})", topic, msg_type);
        Ok(true)
    }

    /// Unsubscribe from `topic`. Returns `false` if not subscribed.
    pub fn unsubscribe(&mut self, topic: &str) -> Result<bool> {
        if !self.subscriptions.remove(topic) {
            return Ok(false);
        }
        self.send(&BridgeOp::Unsubscribe {
            topic: topic.to_string(),
        })?;
        tracing::debug!("Unsubscribed from {}", topic);
        Ok(true)
    }

    /// Drop every subscription; send failures are logged, not returned.
    ///
    /// Returns how many subscriptions were released. Calling it again is a
    /// no-op.
    pub fn unsubscribe_all(&mut self) -> usize {
        let topics: Vec<String> = self.subscriptions.iter().cloned().collect();
        for topic in &topics {
            if let Err(e) = self.unsubscribe(topic) {
                tracing::warn!("Unsubscribe from {} failed: {}", topic, e);
            }
        }
        topics.len()
    }

    /// Announce a topic we will publish on. Returns `false` if already done.
    pub fn advertise(&mut self, topic: &str, msg_type: &str) -> Result<bool> {
        if self.advertised.contains(topic) {
            return Ok(false);
        }
        self.send(&BridgeOp::Advertise {
            topic: topic.to_string(),
            msg_type: msg_type.to_string(),
        })?;
        self.advertised.insert(topic.to_string());
        tracing::debug!("Advertised {} ({})", topic, msg_type);
        Ok(true)
    }

    /// Withdraw every advertisement; failures are logged.
    pub fn unadvertise_all(&mut self) -> usize {
        let topics: Vec<String> = self.advertised.drain().collect();
        for topic in &topics {
            if let Err(e) = self.send(&BridgeOp::Unadvertise {
                topic: topic.clone(),
            }) {
                tracing::warn!("Unadvertise {} failed: {}", topic, e);
            }
        }
        topics.len()
    }

    /// Publish an already serialized message body.
    pub fn publish_value(&mut self, topic: &str, msg: serde_json::Value) -> Result<()> {
        self.send(&BridgeOp::Publish {
            topic: topic.to_string(),
            msg,
        })
    }

    #[inline]
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }

    #[inline]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Close both directions; wakes a reader blocked on the cloned stream.
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!("Bridge socket shutdown: {}", e);
        }
    }
}
