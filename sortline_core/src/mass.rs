//! Calibrated mass sampling over a load-cell front end.

use std::time::Duration;

use eyre::WrapErr;
use sortline_traits::LoadCell;

use crate::config::Calibration;
use crate::error::{Result, map_hw_error};

/// Averages raw ADC readings and applies the fixed linear calibration.
#[derive(Debug)]
pub struct MassSampler<L: LoadCell> {
    cell: L,
    calibration: Calibration,
    timeout: Duration,
}

impl<L: LoadCell> MassSampler<L> {
    pub fn new(cell: L, calibration: Calibration, timeout: Duration) -> Self {
        Self {
            cell,
            calibration,
            timeout,
        }
    }

    /// Average `samples` raw readings and convert to grams.
    pub fn read(&mut self, samples: u32) -> Result<f32> {
        let raw = self
            .cell
            .read_raw_avg(samples, self.timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading load cell")?;
        let delta = raw.saturating_sub(self.calibration.tare_offset);
        Ok(delta as f32 / self.calibration.scale_factor)
    }

    /// Rebase the tare offset to the current raw average.
    pub fn tare(&mut self, samples: u32) -> Result<()> {
        let raw = self
            .cell
            .read_raw_avg(samples, self.timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("taring load cell")?;
        self.calibration.tare_offset = raw;
        tracing::info!(zero_counts = raw, "tare baseline set");
        Ok(())
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}

/// Dead-zone policy for displayed values: negative readings and small
/// magnitudes are shown as exactly 0 to suppress drift. Threshold
/// comparisons must keep using the raw grams value.
pub fn dead_zoned(grams: f32, dead_zone_g: f32) -> f32 {
    if grams <= 0.0 || grams.abs() < dead_zone_g {
        0.0
    } else {
        grams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_zone_clamps_noise_and_negatives() {
        assert_eq!(dead_zoned(-5.0, 2.0), 0.0);
        assert_eq!(dead_zoned(0.0, 2.0), 0.0);
        assert_eq!(dead_zoned(1.9, 2.0), 0.0);
        assert_eq!(dead_zoned(2.1, 2.0), 2.1);
        assert_eq!(dead_zoned(35.0, 2.0), 35.0);
    }
}
