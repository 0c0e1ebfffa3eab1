//! # Streamy
//!
//! Adaptive-paced streaming of live, mono, 16-bit PCM audio to a remote
//! playback device over MQTT.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           SENDER                             │
//! │                                                              │
//! │   caller ──frame──▶ ┌─────────────────────────────────┐      │
//! │     ▲               │   AudioStream (stream::...)     │      │
//! │     │ delay         │  ┌──────────────┐ ┌──────────┐  │      │
//! │     └────────────── │  │ ChunkEncoder │ │  Pacing  │  │      │
//! │                     │  │   (codec)    │ │ (pacing) │  │      │
//! │                     │  └──────┬───────┘ └────▲─────┘  │      │
//! │                     │         │chunk         │depth   │      │
//! │                     │         ▼        ┌─────┴──────┐ │      │
//! │                     │   MQTT publish   │QueueTracker│ │      │
//! │                     │         │        └─────▲──────┘ │      │
//! │                     └─────────┼──────────────┼────────┘      │
//! └───────────────────────────────┼──────────────┼───────────────┘
//!                                 │ {base}/streamy/write
//!                                 ▼              │ {base}/streamy/queue
//! ┌───────────────────────────────┼──────────────┼───────────────┐
//! │                         MQTT broker                          │
//! └───────────────────────────────┼──────────────┼───────────────┘
//!                                 ▼              │
//!                     playback device ───reports─┘
//! ```
//!
//! The device reports its buffered-frame count asynchronously; each write
//! returns the delay the caller should sleep before the next one, so the
//! device buffer neither drains dry nor grows without bound.

pub mod codec;
pub mod config;
pub mod error;
pub mod pacing;
pub mod queue;
pub mod stream;
pub mod transport;

pub use codec::EncoderStats;
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use stream::{AudioStream, WriteOutcome, WriteStatus};
pub use transport::{ConnectionState, StreamEvent};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// Default sample rate for audio processing
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    /// Default sample bit depth (the only depth the container supports)
    pub const DEFAULT_BIT_DEPTH: u16 = 16;

    /// Default device buffer capacity in frames
    pub const DEFAULT_DEVICE_QUEUE: u32 = 16;

    /// Default backpressure ceiling in frames
    pub const DEFAULT_MAX_QUEUE: u32 = 32;

    /// Default MQTT broker port
    pub const DEFAULT_BROKER_PORT: u16 = 1883;

    /// Outbound request channel capacity of the MQTT client
    pub const TRANSPORT_CAPACITY: usize = 100;

    /// Delay between reconnect attempts after a transport fault
    pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

    /// MQTT keep-alive interval
    pub const KEEP_ALIVE: Duration = Duration::from_secs(10);

    /// Frame size used by the sender harness (~26 ms at 44.1 kHz)
    pub const DEFAULT_FRAME_SAMPLES: usize = 1152;
}
