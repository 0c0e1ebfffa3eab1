//! Audio container encoding
//!
//! Wraps PCM sample blocks into WAV container chunks that can be
//! concatenated on the receiving side into one continuous stream.

pub mod encoder;

pub use encoder::{ChunkEncoder, EncoderStats};
