#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the sorting line.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! Every field has a default matching the deployed line, so an empty
//! file is a valid config.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scale: ScaleSection,
    pub sort: SortSection,
    pub logging: Logging,
    pub calibration: PersistedCalibration,
}

/// Scale node thresholds, windows, and pusher angles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScaleSection {
    /// Mass above this starts a measurement (g)
    pub trigger_g: f32,
    /// Mass below this counts as removed (g)
    pub remove_g: f32,
    /// Displayed values inside this band show as 0 (g)
    pub dead_zone_g: f32,
    /// Fixed measurement window (ms)
    pub measure_ms: u64,
    /// Settle delay before the removal re-check (ms)
    pub removal_settle_ms: u64,
    pub live_samples: u32,
    pub measure_samples: u32,
    pub final_samples: u32,
    /// Max wait per load-cell read (ms)
    pub sensor_timeout_ms: u64,
    pub eject_angle: u8,
    pub neutral_angle: u8,
    pub ramp_step_deg: u8,
    pub ramp_step_ms: u64,
    pub banner_ms: u64,
    pub tare_banner_ms: u64,
    pub poll_period_ms: u64,
}

impl Default for ScaleSection {
    fn default() -> Self {
        Self {
            trigger_g: 30.0,
            remove_g: 10.0,
            dead_zone_g: 2.0,
            measure_ms: 3000,
            removal_settle_ms: 500,
            live_samples: 5,
            measure_samples: 3,
            final_samples: 10,
            sensor_timeout_ms: 150,
            eject_angle: 180,
            neutral_angle: 90,
            ramp_step_deg: 2,
            ramp_step_ms: 25,
            banner_ms: 2000,
            tare_banner_ms: 1000,
            poll_period_ms: 200,
        }
    }
}

/// Sort node detection, weight bands, diverter angles, and dwells.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SortSection {
    /// Object-in-zone distance threshold (mm)
    pub detect_mm: f32,
    /// Echo wait bound per ranging attempt (ms)
    pub echo_timeout_ms: u64,
    /// Minimum gap between two counted objects (ms)
    pub count_cooldown_ms: u64,
    pub weight_min_g: i32,
    pub weight_max_g: i32,
    pub weight_step_g: i32,
    /// Bin-1 band upper bound, inclusive (g)
    pub bin1_max_g: i32,
    /// Bin-2 band upper bound, inclusive (g)
    pub bin2_max_g: i32,
    pub servo_a_home: u8,
    pub servo_a_sort: u8,
    pub servo_b_home: u8,
    pub servo_b_sort: u8,
    /// Diverter hold for bins 1 and 2 (ms)
    pub divert_dwell_ms: u64,
    /// Pass-through hold for bin 3 (ms)
    pub pass_dwell_ms: u64,
    pub debounce_ms: u64,
    pub banner_ms: u64,
    pub poll_period_ms: u64,
    /// Belt direction applied on START
    pub forward: bool,
}

impl Default for SortSection {
    fn default() -> Self {
        Self {
            detect_mm: 70.0,
            echo_timeout_ms: 10,
            count_cooldown_ms: 500,
            weight_min_g: 100,
            weight_max_g: 1000,
            weight_step_g: 100,
            bin1_max_g: 50,
            bin2_max_g: 200,
            servo_a_home: 175,
            servo_a_sort: 45,
            servo_b_home: 180,
            servo_b_sort: 115,
            divert_dwell_ms: 4000,
            pass_dwell_ms: 1500,
            debounce_ms: 25,
            banner_ms: 2000,
            poll_period_ms: 10,
            forward: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

/// Persisted load-cell calibration.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PersistedCalibration {
    /// raw counts per gram
    pub scale_factor: f32,
    /// tare zero in raw counts
    pub zero_counts: i32,
}

impl Default for PersistedCalibration {
    fn default() -> Self {
        Self {
            scale_factor: 401.94,
            zero_counts: 0,
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scale
        if self.scale.trigger_g <= 0.0 {
            eyre::bail!("scale.trigger_g must be > 0");
        }
        if self.scale.remove_g < 0.0 {
            eyre::bail!("scale.remove_g must be >= 0");
        }
        if self.scale.remove_g >= self.scale.trigger_g {
            eyre::bail!("scale.remove_g must be below scale.trigger_g");
        }
        if self.scale.dead_zone_g < 0.0 {
            eyre::bail!("scale.dead_zone_g must be >= 0");
        }
        if self.scale.measure_ms == 0 {
            eyre::bail!("scale.measure_ms must be >= 1");
        }
        if self.scale.live_samples == 0
            || self.scale.measure_samples == 0
            || self.scale.final_samples == 0
        {
            eyre::bail!("scale sample counts must be >= 1");
        }
        if self.scale.sensor_timeout_ms == 0 {
            eyre::bail!("scale.sensor_timeout_ms must be >= 1");
        }
        if self.scale.eject_angle > 180 || self.scale.neutral_angle > 180 {
            eyre::bail!("scale servo angles must be in 0..=180");
        }
        if self.scale.ramp_step_deg == 0 {
            eyre::bail!("scale.ramp_step_deg must be >= 1");
        }
        if self.scale.poll_period_ms == 0 {
            eyre::bail!("scale.poll_period_ms must be >= 1");
        }

        // Sort
        if self.sort.detect_mm <= 0.0 {
            eyre::bail!("sort.detect_mm must be > 0");
        }
        if self.sort.echo_timeout_ms == 0 {
            eyre::bail!("sort.echo_timeout_ms must be >= 1");
        }
        if self.sort.weight_step_g <= 0 {
            eyre::bail!("sort.weight_step_g must be >= 1");
        }
        if self.sort.weight_min_g <= 0 || self.sort.weight_min_g >= self.sort.weight_max_g {
            eyre::bail!("sort weight bounds must satisfy 0 < min < max");
        }
        if self.sort.bin1_max_g <= 0 || self.sort.bin1_max_g >= self.sort.bin2_max_g {
            eyre::bail!("sort bin bounds must satisfy 0 < bin1_max < bin2_max");
        }
        let angles = [
            self.sort.servo_a_home,
            self.sort.servo_a_sort,
            self.sort.servo_b_home,
            self.sort.servo_b_sort,
        ];
        if angles.iter().any(|a| *a > 180) {
            eyre::bail!("sort servo angles must be in 0..=180");
        }
        if self.sort.divert_dwell_ms == 0 || self.sort.pass_dwell_ms == 0 {
            eyre::bail!("sort dwell times must be >= 1");
        }
        if self.sort.poll_period_ms == 0 {
            eyre::bail!("sort.poll_period_ms must be >= 1");
        }

        // Calibration
        if self.calibration.scale_factor == 0.0 || !self.calibration.scale_factor.is_finite() {
            eyre::bail!("calibration.scale_factor must be finite and non-zero");
        }

        Ok(())
    }
}
