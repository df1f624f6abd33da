//! Runtime configuration for the two node state machines.
//!
//! These structs carry every threshold, window, and angle the nodes
//! compare against. They are separate from the TOML-deserialized
//! schema in `sortline_config`; defaults match the deployed line.

/// Linear load-cell calibration: grams = (raw_avg - tare_offset) / scale_factor.
#[derive(Debug, Clone)]
pub struct Calibration {
    /// Raw ADC counts per gram.
    pub scale_factor: f32,
    /// Tare baseline in raw counts, rebased by `MassSampler::tare`.
    pub tare_offset: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            scale_factor: 401.94,
            tare_offset: 0,
        }
    }
}

/// Scale node configuration.
#[derive(Debug, Clone)]
pub struct ScaleCfg {
    /// Raw mass above this starts a measurement (grams).
    pub trigger_g: f32,
    /// Mass below this counts as "object removed" (grams).
    pub remove_g: f32,
    /// Magnitude band around zero displayed as exactly 0 (grams).
    pub dead_zone_g: f32,
    /// Fixed measurement window (ms).
    pub measure_ms: u64,
    /// Settle delay before re-checking removal (ms).
    pub removal_settle_ms: u64,
    /// Samples averaged for the live display read.
    pub live_samples: u32,
    /// Samples averaged while measuring (fast reads).
    pub measure_samples: u32,
    /// Samples averaged for the final result.
    pub final_samples: u32,
    /// Max wait per load-cell read (ms).
    pub sensor_timeout_ms: u64,
    /// Servo angle that ejects the object onto the belt (degrees).
    pub eject_angle: u8,
    /// Servo neutral angle (degrees).
    pub neutral_angle: u8,
    /// Ramp step size for slow servo motion (degrees per step).
    pub ramp_step_deg: u8,
    /// Delay between ramp steps (ms).
    pub ramp_step_ms: u64,
    /// How long result/status banners stay on the display (ms).
    pub banner_ms: u64,
    /// Banner duration after a tare command (ms).
    pub tare_banner_ms: u64,
    /// Main loop poll period (ms).
    pub poll_period_ms: u64,
}

impl Default for ScaleCfg {
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

/// Sort node configuration.
#[derive(Debug, Clone)]
pub struct SortCfg {
    /// Distance below this counts as an object in the zone (mm).
    pub detect_mm: f32,
    /// Echo wait bound per ranging attempt (ms).
    pub echo_timeout_ms: u64,
    /// Minimum gap between two counted objects (ms).
    pub count_cooldown_ms: u64,
    /// Manual weight-adjust lower bound (grams).
    pub weight_min_g: i32,
    /// Manual weight-adjust upper bound (grams).
    pub weight_max_g: i32,
    /// Manual weight-adjust step (grams).
    pub weight_step_g: i32,
    /// Upper bound of the bin-1 band, inclusive (grams).
    pub bin1_max_g: i32,
    /// Upper bound of the bin-2 band, inclusive (grams).
    pub bin2_max_g: i32,
    /// Diverter A home / sort angles (degrees).
    pub servo_a_home: u8,
    pub servo_a_sort: u8,
    /// Diverter B home / sort angles (degrees).
    pub servo_b_home: u8,
    pub servo_b_sort: u8,
    /// Diverting hold time for bins 1 and 2 (ms).
    pub divert_dwell_ms: u64,
    /// Pass-through hold time for bin 3 (ms).
    pub pass_dwell_ms: u64,
    /// Button debounce window (ms).
    pub debounce_ms: u64,
    /// How long transient status banners stay on the display (ms).
    pub banner_ms: u64,
    /// Main loop poll period (ms).
    pub poll_period_ms: u64,
}

impl Default for SortCfg {
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
        }
    }
}
