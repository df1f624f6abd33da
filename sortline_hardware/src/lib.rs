//! Simulated peripherals and the in-process link.
//!
//! Everything here implements the `sortline_traits` seams, so the node
//! state machines run unchanged against this crate in tests and in the
//! single-process demo.

pub mod error;
pub mod link;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use sortline_traits::{Conveyor, DigitalInput, Display, HwResult, LoadCell, RangeFinder, Servo};

use crate::error::HwError;

/// Simulated load cell; the shared handle sets the mass on the pan.
pub struct SimLoadCell {
    grams: Rc<Cell<f32>>,
    stuck: Rc<Cell<bool>>,
    scale_factor: f32,
}

impl SimLoadCell {
    /// Returns the cell and a handle that controls what it weighs.
    pub fn new(scale_factor: f32) -> (Self, Rc<Cell<f32>>) {
        let grams = Rc::new(Cell::new(0.0));
        (
            Self {
                grams: grams.clone(),
                stuck: Rc::new(Cell::new(false)),
                scale_factor,
            },
            grams,
        )
    }

    /// Handle that makes reads time out while set, like an HX711 whose
    /// data line never goes ready.
    pub fn stuck_handle(&self) -> Rc<Cell<bool>> {
        self.stuck.clone()
    }
}

impl LoadCell for SimLoadCell {
    fn read_raw_avg(&mut self, _samples: u32, _timeout: Duration) -> HwResult<i32> {
        if self.stuck.get() {
            return Err(HwError::Timeout.into());
        }
        let raw = (self.grams.get() * self.scale_factor) as i32;
        tracing::trace!(raw, "simulated load cell read");
        Ok(raw)
    }
}

/// Simulated ultrasonic rangefinder; `None` on the handle means no
/// object in front of the sensor (no echo within the timeout).
pub struct SimRangeFinder {
    mm: Rc<Cell<Option<f32>>>,
}

impl SimRangeFinder {
    pub fn new() -> (Self, Rc<Cell<Option<f32>>>) {
        let mm = Rc::new(Cell::new(None));
        (Self { mm: mm.clone() }, mm)
    }
}

impl RangeFinder for SimRangeFinder {
    fn echo_time(&mut self, _timeout: Duration) -> HwResult<Option<Duration>> {
        // Round trip at 0.343 mm/us.
        Ok(self
            .mm
            .get()
            .map(|d| Duration::from_micros((d * 2.0 / 0.343) as u64)))
    }
}

/// Simulated hobby servo; moves are instantaneous.
pub struct SimServo {
    position: u8,
    name: &'static str,
}

impl SimServo {
    pub fn new(name: &'static str, initial: u8) -> Self {
        Self {
            position: initial,
            name,
        }
    }
}

impl Servo for SimServo {
    fn move_to(&mut self, degrees: u8) -> HwResult<()> {
        tracing::debug!(servo = self.name, degrees, "servo move (simulated)");
        self.position = degrees;
        Ok(())
    }

    fn position(&self) -> u8 {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeltState {
    Stopped,
    Forward,
    Backward,
}

/// Simulated conveyor stepper.
pub struct SimConveyor {
    state: Rc<Cell<BeltState>>,
}

impl SimConveyor {
    pub fn new() -> (Self, Rc<Cell<BeltState>>) {
        let state = Rc::new(Cell::new(BeltState::Stopped));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl Conveyor for SimConveyor {
    fn run_forward(&mut self) -> HwResult<()> {
        tracing::debug!("conveyor forward (simulated)");
        self.state.set(BeltState::Forward);
        Ok(())
    }

    fn run_backward(&mut self) -> HwResult<()> {
        tracing::debug!("conveyor backward (simulated)");
        self.state.set(BeltState::Backward);
        Ok(())
    }

    fn halt(&mut self) -> HwResult<()> {
        tracing::debug!("conveyor halt (simulated)");
        self.state.set(BeltState::Stopped);
        Ok(())
    }
}

/// Simulated momentary button; the handle drives the raw level.
pub struct SimButton {
    level: Rc<Cell<bool>>,
}

impl SimButton {
    pub fn new() -> (Self, Rc<Cell<bool>>) {
        let level = Rc::new(Cell::new(false));
        (
            Self {
                level: level.clone(),
            },
            level,
        )
    }
}

impl DigitalInput for SimButton {
    fn is_active(&mut self) -> bool {
        self.level.get()
    }
}

/// 16x2 character LCD stand-in that mirrors writes to stdout, one
/// `[tag] row: text` line per print.
pub struct ConsoleDisplay {
    tag: &'static str,
    row: u8,
}

impl ConsoleDisplay {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, row: 0 }
    }
}

impl Display for ConsoleDisplay {
    fn clear(&mut self) {
        self.row = 0;
    }

    fn set_cursor(&mut self, row: u8, _col: u8) {
        self.row = row;
    }

    fn print(&mut self, text: &str) {
        println!("[{}] {}: {}", self.tag, self.row, text);
    }
}

/// Display that drops everything, for tests.
pub struct NullDisplay;

impl Display for NullDisplay {
    fn clear(&mut self) {}
    fn set_cursor(&mut self, _row: u8, _col: u8) {}
    fn print(&mut self, _text: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_load_cell_tracks_handle() {
        let (mut cell, grams) = SimLoadCell::new(401.94);
        grams.set(100.0);
        let raw = cell
            .read_raw_avg(5, Duration::from_millis(100))
            .unwrap();
        assert_eq!(raw, 40194);
    }

    #[test]
    fn stuck_load_cell_times_out() {
        let (mut cell, _grams) = SimLoadCell::new(401.94);
        let stuck = cell.stuck_handle();
        stuck.set(true);
        let err = cell
            .read_raw_avg(5, Duration::from_millis(100))
            .expect_err("data line never ready");
        assert!(format!("{err}").contains("timeout"));
        stuck.set(false);
        assert_eq!(cell.read_raw_avg(5, Duration::from_millis(100)).unwrap(), 0);
    }

    #[test]
    fn sim_ranger_echo_matches_distance() {
        let (mut ranger, mm) = SimRangeFinder::new();
        assert_eq!(ranger.echo_time(Duration::from_millis(10)).unwrap(), None);
        mm.set(Some(70.0));
        let echo = ranger
            .echo_time(Duration::from_millis(10))
            .unwrap()
            .unwrap();
        // 70 mm each way at 0.343 mm/us ~= 408 us round trip
        assert_eq!(echo.as_micros(), 408);
    }

    #[test]
    fn sim_conveyor_reports_state() {
        let (mut belt, state) = SimConveyor::new();
        belt.run_forward().unwrap();
        assert_eq!(state.get(), BeltState::Forward);
        belt.halt().unwrap();
        assert_eq!(state.get(), BeltState::Stopped);
    }
}
