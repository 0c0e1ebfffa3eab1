//! Send pacing
//!
//! Converts the device's reported queue depth into the delay a caller
//! should sleep between writes. The tiers are monotonic in queue depth:
//! a near-starved device is refilled immediately, a half-full one faster
//! than real time, and a comfortably filled one at exactly real time.

use std::time::Duration;

/// Compute the delay before the next write
///
/// `nominal` is the real-time playback duration of the frame just sent
/// (`samples / sample_rate`), computed in integer nanoseconds.
pub fn next_delay(
    queue_depth: u32,
    samples: usize,
    sample_rate: u32,
    device_queue: u32,
) -> Duration {
    let nominal = Duration::from_secs(1) * samples as u32 / sample_rate;
    if queue_depth < 2 {
        Duration::ZERO
    } else if queue_depth < device_queue / 2 {
        nominal / 2
    } else {
        nominal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;
    const FRAME: usize = 1152;
    const CAPACITY: u32 = 16;

    // 1152 samples at 44.1 kHz, truncated integer nanoseconds
    const NOMINAL: Duration = Duration::from_nanos(26_122_448);

    #[test]
    fn test_starved_device_gets_immediate_send() {
        assert_eq!(next_delay(0, FRAME, RATE, CAPACITY), Duration::ZERO);
        assert_eq!(next_delay(1, FRAME, RATE, CAPACITY), Duration::ZERO);
    }

    #[test]
    fn test_below_half_capacity_catches_up() {
        assert_eq!(next_delay(2, FRAME, RATE, CAPACITY), NOMINAL / 2);
        assert_eq!(next_delay(5, FRAME, RATE, CAPACITY), NOMINAL / 2);
        assert_eq!(next_delay(7, FRAME, RATE, CAPACITY), NOMINAL / 2);
    }

    #[test]
    fn test_at_half_capacity_paces_real_time() {
        assert_eq!(next_delay(8, FRAME, RATE, CAPACITY), NOMINAL);
        assert_eq!(next_delay(10, FRAME, RATE, CAPACITY), NOMINAL);
        assert_eq!(next_delay(100, FRAME, RATE, CAPACITY), NOMINAL);
    }

    #[test]
    fn test_nominal_matches_frame_duration() {
        // ~26.12 ms for 1152 samples at 44.1 kHz
        let nominal = next_delay(8, FRAME, RATE, CAPACITY);
        assert_eq!(nominal, NOMINAL);
        assert!((nominal.as_secs_f64() - 0.026122).abs() < 1e-5);
    }

    #[test]
    fn test_tiers_are_monotonic() {
        let mut last = Duration::ZERO;
        for depth in 0..2 * CAPACITY {
            let delay = next_delay(depth, FRAME, RATE, CAPACITY);
            assert!(delay >= last);
            last = delay;
        }
    }
}
