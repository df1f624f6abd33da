pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error type used at every hardware seam.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Load-cell amplifier front end (HX711 or simulated).
///
/// Returns the average of `samples` raw ADC counts. Calibration and
/// taring are applied on top of this by the core's mass sampler.
pub trait LoadCell {
    fn read_raw_avg(&mut self, samples: u32, timeout: std::time::Duration) -> HwResult<i32>;
}

/// Ultrasonic ranging primitive: emit a trigger pulse and wait for the
/// echo up to `timeout`. `Ok(None)` means no echo arrived in time.
pub trait RangeFinder {
    fn echo_time(&mut self, timeout: std::time::Duration) -> HwResult<Option<std::time::Duration>>;
}

/// Best-effort point-to-point byte stream between the two nodes.
///
/// FIFO per connection, no delivery guarantee. `write` returns whether
/// the link reported write-readiness (the closest thing to "peer
/// reachable" the transport offers; there is no acknowledgment).
pub trait LinkPort {
    fn write(&mut self, bytes: &[u8]) -> HwResult<bool>;
    fn read_byte(&mut self) -> HwResult<Option<u8>>;
    fn available(&self) -> usize;
}

/// Positional servo.
pub trait Servo {
    fn move_to(&mut self, degrees: u8) -> HwResult<()>;
    fn position(&self) -> u8;
}

/// Conveyor drive (stepper behind a driver board).
pub trait Conveyor {
    fn run_forward(&mut self) -> HwResult<()>;
    fn run_backward(&mut self) -> HwResult<()>;
    /// Immediate halt, not a ramped stop.
    fn halt(&mut self) -> HwResult<()>;
}

/// Character display (16x2 LCD or a stand-in).
pub trait Display {
    fn clear(&mut self);
    fn set_cursor(&mut self, row: u8, col: u8);
    fn print(&mut self, text: &str);
}

/// Raw digital input level for a button. `true` means pressed; the
/// implementation owns the active-low mapping.
pub trait DigitalInput {
    fn is_active(&mut self) -> bool;
}
