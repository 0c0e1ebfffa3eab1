//! MQTT session management
//!
//! Owns the broker session plumbing: topic layout, connection state,
//! the caller-facing event surface, and the background driver that turns
//! raw transport events into [`LinkEvent`]s for the façade. Reconnection
//! after a transient drop is the transport's job; the driver only reports
//! the transitions it observes.

use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::config::StreamConfig;
use crate::constants::{KEEP_ALIVE, RECONNECT_DELAY, TRANSPORT_CAPACITY};
use crate::error::TransportError;

/// Lifecycle of the broker session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session exists
    Disconnected,
    /// Session requested, broker not yet acknowledged
    Connecting,
    /// Session ready; writes are admitted
    Online,
    /// Session lost; the transport is reconnecting
    Offline,
}

/// Asynchronous notifications delivered to the caller
///
/// Emitted at least once per transition, with no ordering guarantee
/// relative to concurrent writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Session became ready (including automatic resumption)
    Online,
    /// Session was lost
    Offline,
    /// Non-fatal transport or decode error description
    Error(String),
    /// Device reported its buffered-frame count
    Queue(u32),
}

/// Topic set under one base prefix
#[derive(Debug, Clone)]
pub struct Topics {
    /// Binary container chunks, sender to device
    pub write: String,
    /// ASCII decimal buffered-frame count, device to sender
    pub queue: String,
    /// Empty payload flush/restart signal, sender to device
    pub stop: String,
}

impl Topics {
    pub fn new(base: &str) -> Self {
        Self {
            write: format!("{base}/streamy/write"),
            queue: format!("{base}/streamy/queue"),
            stop: format!("{base}/streamy/stop"),
        }
    }
}

/// Transport events relevant to the engine
#[derive(Debug)]
pub(crate) enum LinkEvent {
    /// Broker acknowledged the session
    Up,
    /// Session dropped
    Down,
    /// Transport-level error, not fatal
    Fault(String),
    /// Payload received on the feedback topic
    Feedback(Bytes),
}

/// Create the broker session for the configured endpoint
///
/// Nothing touches the network until the event loop is polled.
pub(crate) fn session(config: &StreamConfig) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(KEEP_ALIVE);
    AsyncClient::new(options, TRANSPORT_CAPACITY)
}

/// Poll the event loop forever, forwarding engine-relevant events
///
/// Runs as one background task per session; aborted on disconnect. The
/// feedback subscription is re-issued after every acknowledgment so it
/// survives clean-session reconnects.
pub(crate) async fn drive<F>(
    mut eventloop: EventLoop,
    client: AsyncClient,
    topics: Topics,
    mut on_event: F,
) where
    F: FnMut(LinkEvent),
{
    let mut online = false;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if let Err(e) = client.try_subscribe(&topics.queue, QoS::AtMostOnce) {
                    let fault = TransportError::SubscribeFailed(e.to_string());
                    on_event(LinkEvent::Fault(fault.to_string()));
                }
                online = true;
                on_event(LinkEvent::Up);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic == topics.queue {
                    on_event(LinkEvent::Feedback(publish.payload));
                }
            }
            Ok(_) => {}
            Err(e) => {
                if online {
                    online = false;
                    on_event(LinkEvent::Down);
                }
                on_event(LinkEvent::Fault(e.to_string()));
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
