//! Stateful WAV chunk encoder
//!
//! One container session spans all frames between two resets. The first
//! chunk of a session carries the RIFF/WAVE header, later chunks carry
//! bare sample bytes; concatenating every chunk of one session yields a
//! single well-formed container holding the exact input samples.

use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use bytes::Bytes;
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::error::CodecError;

/// In-memory sink collecting container bytes between chunk drains.
///
/// `WavWriter` wants `Seek` so it can patch chunk lengths on finalize;
/// a streaming session is never finalized, so seeks are ignored and any
/// bytes a dropped writer appends are cleared before the next session.
#[derive(Clone, Default)]
struct ChunkSink(Arc<Mutex<Vec<u8>>>);

impl ChunkSink {
    fn drain(&self) -> Bytes {
        Bytes::from(std::mem::take(&mut *self.0.lock()))
    }

    fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Write for ChunkSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for ChunkSink {
    fn seek(&mut self, _pos: SeekFrom) -> std::io::Result<u64> {
        Ok(0)
    }
}

/// Stateful container encoder for one streaming session
pub struct ChunkEncoder {
    spec: WavSpec,
    sink: ChunkSink,
    writer: Option<WavWriter<ChunkSink>>,
    /// Frame counter for statistics
    frames_encoded: u64,
    /// Total container bytes produced
    bytes_produced: u64,
}

impl ChunkEncoder {
    /// Create an encoder for mono 16-bit PCM at the given sample rate
    pub fn new(sample_rate: u32, bit_depth: u16) -> Result<Self, CodecError> {
        if bit_depth != 16 {
            return Err(CodecError::UnsupportedBitDepth(bit_depth));
        }
        Ok(Self {
            spec: WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: bit_depth,
                sample_format: SampleFormat::Int,
            },
            sink: ChunkSink::default(),
            writer: None,
            frames_encoded: 0,
            bytes_produced: 0,
        })
    }

    /// Encode one frame of samples into a container chunk
    ///
    /// Implicitly opens a new container session on the first call after
    /// construction or [`reset`](Self::reset).
    pub fn encode(&mut self, samples: &[i16]) -> Result<Bytes, CodecError> {
        if self.writer.is_none() {
            self.sink.clear();
            let writer = WavWriter::new(self.sink.clone(), self.spec)
                .map_err(|e| CodecError::SessionInit(e.to_string()))?;
            self.writer = Some(writer);
        }

        // open session exists past this point
        let writer = self.writer.as_mut().ok_or_else(|| {
            CodecError::EncodingFailed("container session missing".into())
        })?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;
        }

        let chunk = self.sink.drain();
        self.frames_encoded += 1;
        self.bytes_produced += chunk.len() as u64;
        Ok(chunk)
    }

    /// Discard the open container session
    ///
    /// The next [`encode`](Self::encode) starts a fresh container.
    pub fn reset(&mut self) {
        // dropping the writer appends its finalize bytes to the sink
        self.writer = None;
        self.sink.clear();
    }

    /// Whether a container session is currently open
    pub fn session_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Get statistics
    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            frames_encoded: self.frames_encoded,
            bytes_produced: self.bytes_produced,
        }
    }
}

/// Encoder statistics
#[derive(Debug, Clone)]
pub struct EncoderStats {
    pub frames_encoded: u64,
    pub bytes_produced: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // RIFF(4) + size(4) + WAVE(4) + fmt chunk(24) + data id/size(8)
    const HEADER_LEN: usize = 44;

    /// Patch the RIFF and data chunk lengths of a concatenated session
    /// so a standard reader accepts it.
    fn finalize(mut bytes: Vec<u8>) -> Vec<u8> {
        let riff_len = (bytes.len() - 8) as u32;
        let data_len = (bytes.len() - HEADER_LEN) as u32;
        bytes[4..8].copy_from_slice(&riff_len.to_le_bytes());
        bytes[40..44].copy_from_slice(&data_len.to_le_bytes());
        bytes
    }

    #[test]
    fn test_first_chunk_carries_header() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        let chunk = encoder.encode(&[0i16; 4]).unwrap();
        assert_eq!(&chunk[0..4], b"RIFF");
        assert_eq!(&chunk[8..12], b"WAVE");
        assert_eq!(chunk.len(), HEADER_LEN + 4 * 2);
    }

    #[test]
    fn test_later_chunks_are_bare_samples() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        encoder.encode(&[0i16; 4]).unwrap();
        let chunk = encoder.encode(&[1i16, -1, 2, -2]).unwrap();
        assert_eq!(chunk.len(), 4 * 2);
        assert_eq!(&chunk[0..2], &1i16.to_le_bytes());
    }

    #[test]
    fn test_session_round_trip() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        let frames: Vec<Vec<i16>> = (0..5)
            .map(|f| (0..1152).map(|i| ((f * 1152 + i) % 32768) as i16).collect())
            .collect();

        let mut session = Vec::new();
        for frame in &frames {
            session.extend_from_slice(&encoder.encode(frame).unwrap());
        }

        let reader = hound::WavReader::new(Cursor::new(finalize(session))).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44_100);
        let decoded: Vec<i16> = reader
            .into_samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        let original: Vec<i16> = frames.concat();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_reset_starts_new_container() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        encoder.encode(&[7i16; 8]).unwrap();
        assert!(encoder.session_open());

        encoder.reset();
        assert!(!encoder.session_open());

        let chunk = encoder.encode(&[7i16; 8]).unwrap();
        assert_eq!(&chunk[0..4], b"RIFF");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        encoder.encode(&[0i16; 8]).unwrap();
        encoder.reset();
        encoder.reset();
        let chunk = encoder.encode(&[0i16; 8]).unwrap();
        assert_eq!(&chunk[0..4], b"RIFF");
    }

    #[test]
    fn test_rejects_unsupported_bit_depth() {
        assert!(matches!(
            ChunkEncoder::new(44_100, 24),
            Err(CodecError::UnsupportedBitDepth(24))
        ));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut encoder = ChunkEncoder::new(44_100, 16).unwrap();
        encoder.encode(&[0i16; 4]).unwrap();
        encoder.encode(&[0i16; 4]).unwrap();
        let stats = encoder.stats();
        assert_eq!(stats.frames_encoded, 2);
        assert_eq!(stats.bytes_produced, (HEADER_LEN + 8 + 8) as u64);
    }
}
