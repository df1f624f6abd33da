//! Ultrasonic distance sampling.

use std::time::Duration;

use eyre::WrapErr;
use sortline_traits::RangeFinder;

use crate::error::{Result, map_hw_error};

/// Speed of sound, millimeters per microsecond.
const SOUND_MM_PER_US: f32 = 0.343;

/// Converts a round-trip echo time into millimeters.
///
/// `Ok(None)` means no echo arrived within the timeout; the caller
/// re-polls on the next cycle, so transient misses are tolerated.
#[derive(Debug)]
pub struct DistanceSampler<R: RangeFinder> {
    ranger: R,
    timeout: Duration,
}

impl<R: RangeFinder> DistanceSampler<R> {
    pub fn new(ranger: R, timeout: Duration) -> Self {
        Self { ranger, timeout }
    }

    pub fn measure(&mut self) -> Result<Option<f32>> {
        let echo = self
            .ranger
            .echo_time(self.timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("ranging")?;
        Ok(echo.map(|d| echo_to_mm(d)))
    }
}

/// Half the round trip at the speed of sound.
pub fn echo_to_mm(echo: Duration) -> f32 {
    echo.as_micros() as f32 * SOUND_MM_PER_US * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_round_trip_to_distance() {
        // 408 us round trip ~= 70 mm
        let mm = echo_to_mm(Duration::from_micros(408));
        assert!((mm - 69.972).abs() < 0.01, "got {mm}");
    }

    #[test]
    fn zero_echo_is_zero_distance() {
        assert_eq!(echo_to_mm(Duration::ZERO), 0.0);
    }
}
