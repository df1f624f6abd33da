//! Contact-bounce filtering for button inputs.

/// Clean event produced by a debounced input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Stable transition from pressed back to released. Firing on
    /// release rather than press-down avoids multi-fire from bounce
    /// without interrupts.
    Press,
}

/// Debounce state for one physical button.
///
/// Any raw-level change restarts the window; the stable level only
/// follows the raw level after it has held still for `debounce_ms`.
/// Pure state fed by the poll loop, so it tests without GPIO.
#[derive(Debug, Clone)]
pub struct Debouncer {
    debounce_ms: u64,
    last_raw: bool,
    stable: bool,
    changed_at_ms: u64,
    pressed_at_ms: u64,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            last_raw: false,
            stable: false,
            changed_at_ms: 0,
            pressed_at_ms: 0,
        }
    }

    /// Feed the current raw level (`true` = pressed) at `now_ms`.
    pub fn poll(&mut self, raw: bool, now_ms: u64) -> Option<ButtonEvent> {
        if raw != self.last_raw {
            self.changed_at_ms = now_ms;
            self.last_raw = raw;
        }

        if now_ms.saturating_sub(self.changed_at_ms) > self.debounce_ms && self.stable != raw {
            self.stable = raw;
            if self.stable {
                self.pressed_at_ms = now_ms;
            } else {
                return Some(ButtonEvent::Press);
            }
        }
        None
    }

    /// Timestamp of the last stable press-down, for hold detection.
    pub fn pressed_at_ms(&self) -> u64 {
        self.pressed_at_ms
    }
}
