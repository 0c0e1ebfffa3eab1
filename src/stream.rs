//! Stream façade
//!
//! [`AudioStream`] composes the container encoder, queue tracker,
//! connection state and pacing policy behind one lock. Every public
//! operation takes the lock for its whole critical section and only makes
//! bounded, non-blocking transport calls while holding it; the engine
//! never sleeps internally. Pacing happens in the caller, which sleeps
//! the returned delay outside any lock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, QoS};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::codec::{ChunkEncoder, EncoderStats};
use crate::config::StreamConfig;
use crate::error::{Result, TransportError};
use crate::pacing;
use crate::queue::QueueTracker;
use crate::transport::{self, ConnectionState, LinkEvent, StreamEvent, Topics};

/// Result of one write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Queue depth after the write (unchanged if rejected)
    pub queue: u32,
    /// Delay the caller should sleep before the next write
    pub delay: Duration,
    /// Whether the frame was sent and why not if it wasn't
    pub status: WriteStatus,
}

/// Admission result of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Frame was encoded and published
    Sent,
    /// Session not online; the frame was dropped
    Offline,
    /// Device at the backpressure ceiling; the frame was dropped
    Saturated,
}

struct Inner {
    state: ConnectionState,
    tracker: QueueTracker,
    encoder: ChunkEncoder,
    client: Option<AsyncClient>,
    driver: Option<JoinHandle<()>>,
}

/// Adaptive-paced PCM stream to one playback device
pub struct AudioStream {
    config: StreamConfig,
    topics: Topics,
    inner: Arc<Mutex<Inner>>,
    events: UnboundedSender<StreamEvent>,
}

impl AudioStream {
    /// Create a stream and the channel its events are delivered on
    pub fn new(config: StreamConfig) -> Result<(Self, UnboundedReceiver<StreamEvent>)> {
        config.validate()?;
        let encoder = ChunkEncoder::new(config.sample_rate, config.bit_depth)?;
        let topics = Topics::new(&config.base_topic);
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Self {
            config,
            topics,
            inner: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                tracker: QueueTracker::new(),
                encoder,
                client: None,
                driver: None,
            })),
            events: tx,
        };
        Ok((stream, rx))
    }

    /// Begin asynchronous session establishment
    ///
    /// Returns immediately; readiness is signaled by
    /// [`StreamEvent::Online`]. No-op while a session already exists.
    /// Must be called within a Tokio runtime.
    pub fn connect(&self) {
        let mut inner = self.inner.lock();
        if inner.client.is_some() {
            return;
        }

        let (client, eventloop) = transport::session(&self.config);
        let shared = Arc::clone(&self.inner);
        let events = self.events.clone();
        let driver = tokio::spawn(transport::drive(
            eventloop,
            client.clone(),
            self.topics.clone(),
            move |event| handle_link_event(&shared, &events, event),
        ));

        inner.state = ConnectionState::Connecting;
        inner.client = Some(client);
        inner.driver = Some(driver);
        tracing::info!(
            broker = %self.config.broker_host,
            port = self.config.broker_port,
            "connecting"
        );
    }

    /// Tear the session down
    ///
    /// Idempotent, and safe to call concurrently with an in-flight
    /// [`write`](Self::write): the write either completes against the old
    /// session or observes the torn-down state and no-ops.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        if let Some(client) = inner.client.take() {
            let _ = client.try_disconnect();
        }
        if let Some(driver) = inner.driver.take() {
            driver.abort();
        }
        inner.state = ConnectionState::Disconnected;
        inner.encoder.reset();
        tracing::info!("disconnected");
    }

    /// Submit one frame of samples
    ///
    /// Rejected frames (offline, at the ceiling) are dropped, not
    /// buffered; the outcome says which. Encode failures are fatal for
    /// the session. Publish failures are reported on the event channel
    /// and do not fail the write.
    pub fn write(&self, samples: &[i16]) -> Result<WriteOutcome> {
        let mut inner = self.inner.lock();

        if inner.state != ConnectionState::Online {
            return Ok(WriteOutcome {
                queue: inner.tracker.depth(),
                delay: Duration::ZERO,
                status: WriteStatus::Offline,
            });
        }

        if inner.tracker.depth() >= self.config.max_queue {
            return Ok(WriteOutcome {
                queue: inner.tracker.depth(),
                delay: Duration::ZERO,
                status: WriteStatus::Saturated,
            });
        }

        let chunk = inner.encoder.encode(samples)?;
        if let Some(client) = &inner.client {
            if let Err(e) =
                client.try_publish(&self.topics.write, QoS::AtMostOnce, false, chunk)
            {
                let fault = TransportError::PublishFailed(e.to_string());
                tracing::warn!("{fault}");
                let _ = self.events.send(StreamEvent::Error(fault.to_string()));
            }
        }

        // pace on the depth before counting this frame, then count it
        let delay = pacing::next_delay(
            inner.tracker.depth(),
            samples.len(),
            self.config.sample_rate,
            self.config.device_queue,
        );
        inner.tracker.bump();

        Ok(WriteOutcome {
            queue: inner.tracker.depth(),
            delay,
            status: WriteStatus::Sent,
        })
    }

    /// Discard the container session and signal the device to flush
    ///
    /// The next write starts a fresh container. Connection state is
    /// untouched. Idempotent.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.encoder.reset();
        if let Some(client) = &inner.client {
            if let Err(e) =
                client.try_publish(&self.topics.stop, QoS::AtMostOnce, false, Vec::new())
            {
                let fault = TransportError::PublishFailed(e.to_string());
                tracing::warn!("{fault}");
                let _ = self.events.send(StreamEvent::Error(fault.to_string()));
            }
        }
        tracing::debug!("stream reset");
    }

    /// Snapshot of the device's last-reported queue depth
    pub fn queue(&self) -> u32 {
        self.inner.lock().tracker.depth()
    }

    /// Snapshot of the connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Encoder statistics for this stream
    pub fn stats(&self) -> EncoderStats {
        self.inner.lock().encoder.stats()
    }

    /// The configuration this stream was built with
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

/// Apply one transport event to the shared state and notify the caller
fn handle_link_event(
    inner: &Mutex<Inner>,
    events: &UnboundedSender<StreamEvent>,
    event: LinkEvent,
) {
    let mut guard = inner.lock();

    // An aborted driver only stops at its next await, so an event that was
    // already waiting on the lock can arrive after teardown. Without a
    // session it must not touch state: a stale `Up` would otherwise leave
    // the stream "online" with nowhere to publish.
    if guard.client.is_none() {
        return;
    }

    match event {
        LinkEvent::Up => {
            guard.state = ConnectionState::Online;
            tracing::info!("session online");
            let _ = events.send(StreamEvent::Online);
        }
        LinkEvent::Down => {
            guard.state = ConnectionState::Offline;
            tracing::warn!("session offline");
            let _ = events.send(StreamEvent::Offline);
        }
        LinkEvent::Fault(message) => {
            tracing::warn!("transport fault: {message}");
            let _ = events.send(StreamEvent::Error(message));
        }
        LinkEvent::Feedback(payload) => {
            match guard.tracker.record(&payload) {
                Ok(depth) => {
                    let _ = events.send(StreamEvent::Queue(depth));
                }
                // depth is left unchanged on a malformed report
                Err(e) => {
                    tracing::warn!("feedback decode failed: {e}");
                    let _ = events.send(StreamEvent::Error(e.to_string()));
                }
            }
        }
    }
}
