//! One live connection to the bridge.
//!
//! A [`BridgeLink`] bundles the client, its receiver thread and the inbound
//! event channel. The main loop opens a fresh link after every disconnect;
//! closing a link releases everything it registered on the bridge.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use serde_json::Value;

use crate::config::{DrishtiConfig, TopicConfig};
use crate::error::Result;

use super::bridge::BridgeClient;
use super::messages::{OCCUPANCY_GRID_TYPE, TF_MESSAGE_TYPE};
use super::outbound::{CommandPublisher, CommandSink, LinkStatus};
use super::receiver::{BridgeReceiver, InboundEvent};

/// Connected client plus the thread reading from it.
pub struct BridgeLink {
    client: BridgeClient,
    events: Receiver<InboundEvent>,
    receiver: JoinHandle<()>,
}

impl BridgeLink {
    /// Connect, start the receiver thread and subscribe to the map and
    /// transform topics.
    pub fn open(config: &DrishtiConfig, running: Arc<AtomicBool>) -> Result<Self> {
        let client =
            BridgeClient::connect_timeout(&config.address(), config.connection.timeout())?;
        let (receiver, events) =
            BridgeReceiver::new(client.reader_stream()?, &config.topics, running)?;
        let receiver = thread::Builder::new()
            .name("bridge-rx".into())
            .spawn(move || receiver.run())?;

        let mut link = Self {
            client,
            events,
            receiver,
        };
        if let Err(e) = link.subscribe_streams(&config.topics) {
            link.close();
            return Err(e);
        }
        Ok(link)
    }

    fn subscribe_streams(&mut self, topics: &TopicConfig) -> Result<()> {
        self.client.subscribe(&topics.map, OCCUPANCY_GRID_TYPE)?;
        self.client.subscribe(&topics.tf, TF_MESSAGE_TYPE)?;
        self.client.subscribe(&topics.tf_static, TF_MESSAGE_TYPE)?;
        Ok(())
    }

    /// Inbound grid and transform events; ends with `Disconnected`.
    #[inline]
    pub fn events(&self) -> &Receiver<InboundEvent> {
        &self.events
    }

    #[inline]
    pub fn client(&self) -> &BridgeClient {
        &self.client
    }

    /// Release subscriptions and advertisements, close the socket and join
    /// the receiver thread.
    pub fn close(self) {
        let Self {
            mut client,
            events,
            receiver,
        } = self;

        let unsubscribed = client.unsubscribe_all();
        let unadvertised = client.unadvertise_all();
        client.shutdown();
        // A receiver blocked on a full channel wakes up once this end is gone
        drop(events);

        if let Err(e) = receiver.join() {
            tracing::error!("Receiver thread panicked: {:?}", e);
        }
        tracing::debug!(
            "Link closed ({} subscriptions, {} advertisements released)",
            unsubscribed,
            unadvertised
        );
    }
}

impl CommandSink for BridgeLink {
    fn advertise(&mut self, topic: &str, msg_type: &str) -> Result<()> {
        CommandSink::advertise(&mut self.client, topic, msg_type)
    }

    fn publish(&mut self, topic: &str, msg: Value) -> Result<()> {
        CommandSink::publish(&mut self.client, topic, msg)
    }
}

impl CommandPublisher<Option<BridgeLink>> {
    /// Install a freshly opened link, advertise the command topics and open
    /// the gate. A link still installed is released first.
    pub fn attach(&mut self, link: BridgeLink) -> Result<()> {
        self.release();
        *self.sink_mut() = Some(link);
        if let Err(e) = self.advertise_all() {
            self.release();
            return Err(e);
        }
        self.set_link_status(LinkStatus::Active);
        Ok(())
    }

    /// Close the gate and the current link. Returns `false` if there was none.
    pub fn release(&mut self) -> bool {
        self.set_link_status(LinkStatus::Inactive);
        match self.sink_mut().take() {
            Some(link) => {
                link.close();
                true
            }
            None => false,
        }
    }
}
