//! Sort node: receives weights over the link, runs the conveyor,
//! counts objects past the rangefinder, and diverts them by weight.
//!
//! Logically `{stopped, running}` composed with independent event
//! handling. Within one tick the order is fixed: link RX first, then
//! buttons, then dwell expiry, then product detection, so a weight
//! that arrives this tick is visible to detection on the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sortline_traits::{Clock, Conveyor, DigitalInput, Display, LinkPort, RangeFinder, Servo};

use crate::config::SortCfg;
use crate::debounce::{ButtonEvent, Debouncer};
use crate::distance::DistanceSampler;
use crate::error::Result;
use crate::protocol::{Decoded, LineAssembler, decode_line};

/// Destination bin chosen by weight band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bin {
    One,
    Two,
    /// Pass-through to the end of the belt.
    Three,
}

/// Weight bands with inclusive upper bounds: (0, bin1_max] -> bin 1,
/// (bin1_max, bin2_max] -> bin 2, everything else (including 0 and
/// overweight) -> bin 3.
pub fn classify(weight_g: i32, cfg: &SortCfg) -> Bin {
    if weight_g > 0 && weight_g <= cfg.bin1_max_g {
        Bin::One
    } else if weight_g > cfg.bin1_max_g && weight_g <= cfg.bin2_max_g {
        Bin::Two
    } else {
        Bin::Three
    }
}

/// The three operator buttons, raw inputs.
pub struct Buttons<I: DigitalInput> {
    pub start: I,
    pub stop: I,
    pub weight: I,
}

pub struct SortNode<P, R, C, V, D, I>
where
    P: LinkPort,
    R: RangeFinder,
    C: Conveyor,
    V: Servo,
    D: Display,
    I: DigitalInput,
{
    link: P,
    distance: DistanceSampler<R>,
    conveyor: C,
    servo_a: V,
    servo_b: V,
    display: D,
    buttons: Buttons<I>,
    cfg: SortCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    assembler: LineAssembler,
    start_db: Debouncer,
    stop_db: Debouncer,
    weight_db: Debouncer,

    running: bool,
    forward: bool,
    product_count: u32,
    /// Single-slot, last-write-wins. A second weight arriving before
    /// the previous object is detected overwrites it; concurrent
    /// objects on the belt cannot each carry their own weight.
    pending_weight_g: i32,
    weight_increasing: bool,
    object_present: bool,
    last_count_ms: Option<u64>,
    /// While set, detection is blocked and the diverters hold position.
    diverting_until_ms: Option<u64>,
    banner_until_ms: Option<u64>,
    last_bin: Option<Bin>,
}

impl<P, R, C, V, D, I> SortNode<P, R, C, V, D, I>
where
    P: LinkPort,
    R: RangeFinder,
    C: Conveyor,
    V: Servo,
    D: Display,
    I: DigitalInput,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        link: P,
        ranger: R,
        conveyor: C,
        servo_a: V,
        servo_b: V,
        display: D,
        buttons: Buttons<I>,
        cfg: SortCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let epoch = clock.now();
        let distance = DistanceSampler::new(ranger, Duration::from_millis(cfg.echo_timeout_ms));
        let debounce = cfg.debounce_ms;
        let mut node = Self {
            link,
            distance,
            conveyor,
            servo_a,
            servo_b,
            display,
            buttons,
            cfg,
            clock,
            epoch,
            assembler: LineAssembler::new(),
            start_db: Debouncer::new(debounce),
            stop_db: Debouncer::new(debounce),
            weight_db: Debouncer::new(debounce),
            running: false,
            forward: true,
            product_count: 0,
            pending_weight_g: 0,
            weight_increasing: true,
            object_present: false,
            last_count_ms: None,
            diverting_until_ms: None,
            banner_until_ms: None,
            last_bin: None,
        };
        node.home_servos();
        node.update_status_screen();
        node
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn product_count(&self) -> u32 {
        self.product_count
    }

    pub fn pending_weight_g(&self) -> i32 {
        self.pending_weight_g
    }

    pub fn is_diverting(&self) -> bool {
        self.diverting_until_ms.is_some()
    }

    /// Bin chosen by the most recent dispatch.
    pub fn last_bin(&self) -> Option<Bin> {
        self.last_bin
    }

    /// Belt direction used by the next START.
    pub fn set_direction_forward(&mut self, forward: bool) {
        self.forward = forward;
    }

    /// Poll period the caller should sleep between ticks.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.cfg.poll_period_ms)
    }

    /// One pass of the cooperative loop.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.now_ms();

        self.drain_link(now);

        if let Some(until) = self.banner_until_ms
            && now >= until
        {
            self.banner_until_ms = None;
            self.update_status_screen();
        }

        self.poll_buttons(now);

        if let Some(until) = self.diverting_until_ms
            && now >= until
        {
            self.home_servos();
            self.diverting_until_ms = None;
            self.update_status_screen();
        }

        if self.running && self.diverting_until_ms.is_none() {
            self.check_detection(now);
        }

        Ok(())
    }

    /// Process every byte waiting on the link before anything else.
    fn drain_link(&mut self, now: u64) {
        loop {
            let byte = match self.link.read_byte() {
                Ok(Some(b)) => b,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "link read failed");
                    break;
                }
            };
            if let Some(line) = self.assembler.push(byte) {
                self.handle_line(&line, now);
            }
        }
    }

    fn handle_line(&mut self, line: &str, now: u64) {
        let decoded = decode_line(line);
        let Some(grams) = decoded.grams() else {
            tracing::debug!(line, "ignoring non-weight line");
            return;
        };
        if decoded == Decoded::Unparsable {
            tracing::warn!(line, "unparsable weight payload, reading as 0 g");
        }
        // Truncation toward zero matches the original integer cast:
        // 75.5 g arrives as 75 g.
        self.pending_weight_g = grams as i32;
        tracing::info!(grams = self.pending_weight_g, "weight received");

        if !self.running && self.pending_weight_g > 0 {
            self.start_conveyor();
            tracing::info!("autostart: conveyor started on received weight");
        }

        self.show(
            "Received:",
            &format!("{}g - ready", self.pending_weight_g),
            now,
        );
    }

    fn poll_buttons(&mut self, now: u64) {
        let start_raw = self.buttons.start.is_active();
        let stop_raw = self.buttons.stop.is_active();
        let weight_raw = self.buttons.weight.is_active();

        if self.start_db.poll(start_raw, now) == Some(ButtonEvent::Press) {
            tracing::info!("START pressed");
            self.handle_start(now);
        }
        if self.stop_db.poll(stop_raw, now) == Some(ButtonEvent::Press) {
            tracing::info!("STOP pressed");
            self.handle_stop(now);
        }
        if self.weight_db.poll(weight_raw, now) == Some(ButtonEvent::Press) {
            tracing::info!("WEIGHT pressed");
            self.adjust_weight(now);
        }
    }

    fn handle_start(&mut self, now: u64) {
        if self.running {
            return;
        }
        self.start_conveyor();
        self.show("START", "conveyor on", now);
    }

    /// Immediate halt. Works mid-dwell too: the belt stops at once
    /// while the diverters hold until the dwell expires.
    fn handle_stop(&mut self, now: u64) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Err(e) = self.conveyor.halt() {
            tracing::warn!(error = %e, "conveyor halt failed");
        }
        tracing::info!("conveyor stopped");
        self.show("STOP", "conveyor off", now);
    }

    /// Bench-mode manual weight: step between min and max, reversing
    /// direction at each bound (ping-pong, not wraparound).
    fn adjust_weight(&mut self, now: u64) {
        if self.weight_increasing {
            self.pending_weight_g += self.cfg.weight_step_g;
            if self.pending_weight_g >= self.cfg.weight_max_g {
                self.pending_weight_g = self.cfg.weight_max_g;
                self.weight_increasing = false;
            }
        } else {
            self.pending_weight_g -= self.cfg.weight_step_g;
            if self.pending_weight_g <= self.cfg.weight_min_g {
                self.pending_weight_g = self.cfg.weight_min_g;
                self.weight_increasing = true;
            }
        }
        tracing::info!(grams = self.pending_weight_g, "manual weight adjusted");
        self.show(
            "Weight set:",
            &format!("{}g", self.pending_weight_g),
            now,
        );
    }

    fn check_detection(&mut self, now: u64) {
        let distance = match self.distance.measure() {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "ranging failed, retrying next tick");
                return;
            }
        };

        match distance {
            Some(mm) if mm < self.cfg.detect_mm => {
                let cooled = self
                    .last_count_ms
                    .is_none_or(|t| now.saturating_sub(t) > self.cfg.count_cooldown_ms);
                if !self.object_present && cooled {
                    self.object_present = true;
                    self.product_count += 1;
                    self.last_count_ms = Some(now);
                    let weight = self.pending_weight_g;
                    tracing::info!(
                        count = self.product_count,
                        distance_mm = mm,
                        weight_g = weight,
                        "product detected"
                    );
                    self.dispatch(weight, now);
                }
            }
            // No echo or out of range: the zone is clear, un-latch.
            _ => self.object_present = false,
        }
    }

    /// Route one object: position the diverters and hold them for the
    /// transit dwell. Detection stays blocked until the dwell expires.
    fn dispatch(&mut self, weight_g: i32, now: u64) {
        let bin = classify(weight_g, &self.cfg);
        self.last_bin = Some(bin);
        let dwell = match bin {
            Bin::One => {
                tracing::info!(weight_g, "sorting to bin 1 (light)");
                self.show("Sorting: BIN 1", &format!("Light: {weight_g}g"), now);
                self.move_servo_a(self.cfg.servo_a_sort);
                self.move_servo_b(self.cfg.servo_b_home);
                self.cfg.divert_dwell_ms
            }
            Bin::Two => {
                tracing::info!(weight_g, "sorting to bin 2 (medium)");
                self.show("Sorting: BIN 2", &format!("Medium: {weight_g}g"), now);
                self.move_servo_a(self.cfg.servo_a_home);
                self.move_servo_b(self.cfg.servo_b_sort);
                self.cfg.divert_dwell_ms
            }
            Bin::Three => {
                tracing::info!(weight_g, "passing through to bin 3");
                self.show("Sorting: BIN 3", &format!("Pass: {weight_g}g"), now);
                self.home_servos();
                self.cfg.pass_dwell_ms
            }
        };
        self.diverting_until_ms = Some(now + dwell);
    }

    fn start_conveyor(&mut self) {
        let res = if self.forward {
            self.conveyor.run_forward()
        } else {
            self.conveyor.run_backward()
        };
        if let Err(e) = res {
            tracing::warn!(error = %e, "conveyor start failed");
            return;
        }
        self.running = true;
        tracing::info!(forward = self.forward, "conveyor running");
    }

    fn home_servos(&mut self) {
        self.move_servo_a(self.cfg.servo_a_home);
        self.move_servo_b(self.cfg.servo_b_home);
    }

    fn move_servo_a(&mut self, deg: u8) {
        if let Err(e) = self.servo_a.move_to(deg) {
            tracing::warn!(error = %e, deg, "diverter A move failed");
        }
    }

    fn move_servo_b(&mut self, deg: u8) {
        if let Err(e) = self.servo_b.move_to(deg) {
            tracing::warn!(error = %e, deg, "diverter B move failed");
        }
    }

    fn update_status_screen(&mut self) {
        self.display.clear();
        self.display.set_cursor(0, 0);
        self.display.print(&format!("Count: {}", self.product_count));
        self.display.set_cursor(1, 0);
        self.display
            .print(&format!("Weight: {}g", self.pending_weight_g));
    }

    /// Transient two-line banner; the status screen returns when it
    /// expires.
    fn show(&mut self, line1: &str, line2: &str, now: u64) {
        self.display.clear();
        self.display.set_cursor(0, 0);
        self.display.print(line1);
        self.display.set_cursor(1, 0);
        self.display.print(line2);
        self.banner_until_ms = Some(now + self.cfg.banner_ms);
    }

    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }
}
