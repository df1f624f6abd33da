//! Scale node: weighs one object at a time and hands the result to the
//! sort node over the link.
//!
//! The main loop calls [`ScaleNode::tick`] once per poll period. All
//! waits the original firmware spent in blocking delays (banners, the
//! removal settle check, the slow servo ramps) are timed sub-states
//! checked against the injected clock, so the node stays responsive
//! between steps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sortline_traits::{Clock, Display, LinkPort, LoadCell, Servo};

use crate::config::ScaleCfg;
use crate::error::Result;
use crate::mass::{MassSampler, dead_zoned};
use crate::protocol::encode_mass;

/// Weighing lifecycle. Exactly one object is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleState {
    /// Probing the link until it reports write-readiness. A peer that
    /// never comes up leaves the node here forever; that liveness gap
    /// is accepted and only logged.
    Connecting,
    /// Live-displaying mass, waiting for an object above the trigger.
    Waiting,
    /// Sampling for the fixed measurement window.
    Measuring,
    /// Result shown and sent; ejecting and waiting for removal.
    Displaying,
}

/// External commands accepted between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleCommand {
    /// Rebase the tare offset. Honored in Waiting and Displaying.
    Tare,
}

/// Slow stepped servo motion: one bounded step per elapsed interval.
#[derive(Debug, Clone, Copy)]
struct Ramp {
    target: u8,
    step_deg: u8,
    step_ms: u64,
    next_step_at_ms: u64,
}

impl Ramp {
    fn new(target: u8, step_deg: u8, step_ms: u64, now_ms: u64) -> Self {
        Self {
            target,
            step_deg: step_deg.max(1),
            step_ms,
            next_step_at_ms: now_ms,
        }
    }

    /// Advance at most one step; true once the target is reached.
    fn advance<V: Servo>(&mut self, servo: &mut V, now_ms: u64) -> bool {
        if now_ms < self.next_step_at_ms {
            return false;
        }
        let current = servo.position();
        if current == self.target {
            return true;
        }
        let step = self.step_deg;
        let next = if current < self.target {
            current.saturating_add(step).min(self.target)
        } else {
            current.saturating_sub(step).max(self.target)
        };
        if let Err(e) = servo.move_to(next) {
            tracing::warn!(error = %e, angle = next, "servo move failed");
        }
        self.next_step_at_ms = now_ms + self.step_ms;
        next == self.target
    }
}

/// Sub-states of `Displaying`, in order of traversal.
#[derive(Debug, Clone, Copy)]
enum DisplayPhase {
    /// Result on screen; message goes out when this expires.
    Announce { until_ms: u64 },
    /// "Ejecting" banner before the servo starts moving.
    EjectBanner { until_ms: u64 },
    /// Ramping the pusher to the eject angle.
    Eject(Ramp),
    /// Polling for the pan to drop below the removal threshold.
    AwaitRemoval,
    /// Below threshold once; re-check after the settle delay.
    ConfirmRemoval { at_ms: u64 },
    /// Ramping the pusher back to neutral, then back to Waiting.
    Return(Ramp),
}

pub struct ScaleNode<L: LoadCell, P: LinkPort, V: Servo, D: Display> {
    mass: MassSampler<L>,
    link: P,
    servo: V,
    display: D,
    cfg: ScaleCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    state: ScaleState,
    phase: Option<DisplayPhase>,
    measure_started_ms: u64,
    final_g: f32,
    /// Suppresses the live display while a transient banner is up.
    banner_until_ms: Option<u64>,
    logged_connecting: bool,
}

impl<L: LoadCell, P: LinkPort, V: Servo, D: Display> ScaleNode<L, P, V, D> {
    pub fn new(
        mass: MassSampler<L>,
        link: P,
        servo: V,
        display: D,
        cfg: ScaleCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            mass,
            link,
            servo,
            display,
            cfg,
            clock,
            epoch,
            state: ScaleState::Connecting,
            phase: None,
            measure_started_ms: 0,
            final_g: 0.0,
            banner_until_ms: None,
            logged_connecting: false,
        }
    }

    pub fn state(&self) -> ScaleState {
        self.state
    }

    /// Final mass of the last completed measurement, grams.
    pub fn final_weight_g(&self) -> f32 {
        self.final_g
    }

    /// Poll period the caller should sleep between ticks.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.cfg.poll_period_ms)
    }

    pub fn handle_command(&mut self, cmd: ScaleCommand) -> Result<()> {
        match cmd {
            ScaleCommand::Tare => {
                if !matches!(self.state, ScaleState::Waiting | ScaleState::Displaying) {
                    return Ok(());
                }
                self.mass.tare(self.cfg.live_samples)?;
                let now = self.now_ms();
                self.show("Tared", "");
                self.banner_until_ms = Some(now + self.cfg.tare_banner_ms);
                self.state = ScaleState::Waiting;
                self.phase = None;
                tracing::info!("tare command handled");
                Ok(())
            }
        }
    }

    /// One pass of the cooperative loop.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.now_ms();
        match self.state {
            ScaleState::Connecting => self.tick_connecting(now),
            ScaleState::Waiting => self.tick_waiting(now),
            ScaleState::Measuring => self.tick_measuring(now),
            ScaleState::Displaying => self.tick_displaying(now),
        }
        Ok(())
    }

    fn tick_connecting(&mut self, now: u64) {
        if !self.logged_connecting {
            self.show("Connecting to", "conveyor...");
            tracing::info!("probing link for peer");
            self.logged_connecting = true;
        }
        // Banner after the link came up; fall through to Waiting.
        if let Some(until) = self.banner_until_ms {
            if now >= until {
                self.banner_until_ms = None;
                self.enter_waiting();
            }
            return;
        }
        let probe = encode_mass(0.0);
        match self.link.write(probe.as_bytes()) {
            Ok(true) => {
                tracing::info!("link ready, peer reachable");
                self.show("Connected!", "");
                self.banner_until_ms = Some(now + self.cfg.banner_ms);
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "link probe failed"),
        }
    }

    fn tick_waiting(&mut self, now: u64) {
        if let Some(until) = self.banner_until_ms {
            if now < until {
                return;
            }
            self.banner_until_ms = None;
            self.enter_waiting();
        }
        let Some(grams) = self.read_mass(self.cfg.live_samples) else {
            return;
        };

        // Live value in kg; the dead zone only shapes what is shown.
        let display_kg = dead_zoned(grams, self.cfg.dead_zone_g) / 1000.0;
        self.display.set_cursor(1, 0);
        self.display.print(&format!("{display_kg:.3} kg "));

        // Trigger compares the raw reading.
        if grams > self.cfg.trigger_g {
            tracing::info!(grams, "object detected, measuring");
            self.state = ScaleState::Measuring;
            self.measure_started_ms = now;
            self.show("Measuring...", "");
        }
    }

    fn tick_measuring(&mut self, now: u64) {
        if let Some(grams) = self.read_mass(self.cfg.measure_samples) {
            let display_kg = dead_zoned(grams, self.cfg.dead_zone_g) / 1000.0;
            self.display.set_cursor(1, 0);
            self.display.print(&format!("{display_kg:.3} kg"));
        }

        if now.saturating_sub(self.measure_started_ms) >= self.cfg.measure_ms {
            let Some(final_g) = self.read_mass(self.cfg.final_samples) else {
                return; // retry next tick; window already elapsed
            };
            self.final_g = final_g;
            tracing::info!(final_g, "measurement window elapsed");
            self.show("Weight:", &format!("{:.3} kg", final_g / 1000.0));
            self.state = ScaleState::Displaying;
            self.phase = Some(DisplayPhase::Announce {
                until_ms: now + self.cfg.banner_ms,
            });
        }
    }

    fn tick_displaying(&mut self, now: u64) {
        let Some(phase) = self.phase else {
            // Defensive re-entry; resume polling for removal.
            self.phase = Some(DisplayPhase::AwaitRemoval);
            return;
        };
        match phase {
            DisplayPhase::Announce { until_ms } => {
                if now >= until_ms {
                    self.send_result();
                    self.show("Ejecting onto", "conveyor...");
                    self.phase = Some(DisplayPhase::EjectBanner {
                        until_ms: now + self.cfg.banner_ms,
                    });
                }
            }
            DisplayPhase::EjectBanner { until_ms } => {
                if now >= until_ms {
                    tracing::debug!(target_deg = self.cfg.eject_angle, "eject ramp start");
                    self.phase = Some(DisplayPhase::Eject(Ramp::new(
                        self.cfg.eject_angle,
                        self.cfg.ramp_step_deg,
                        self.cfg.ramp_step_ms,
                        now,
                    )));
                }
            }
            DisplayPhase::Eject(mut ramp) => {
                if ramp.advance(&mut self.servo, now) {
                    self.show("Waiting for", "pickup...");
                    self.phase = Some(DisplayPhase::AwaitRemoval);
                } else {
                    self.phase = Some(DisplayPhase::Eject(ramp));
                }
            }
            DisplayPhase::AwaitRemoval => {
                let Some(grams) = self.read_mass(self.cfg.live_samples) else {
                    return;
                };
                if grams < self.cfg.remove_g {
                    self.phase = Some(DisplayPhase::ConfirmRemoval {
                        at_ms: now + self.cfg.removal_settle_ms,
                    });
                }
            }
            DisplayPhase::ConfirmRemoval { at_ms } => {
                if now < at_ms {
                    return;
                }
                let Some(grams) = self.read_mass(self.cfg.live_samples) else {
                    return;
                };
                if grams < self.cfg.remove_g {
                    tracing::info!("pan cleared, returning pusher");
                    self.show("Returning", "pusher...");
                    self.phase = Some(DisplayPhase::Return(Ramp::new(
                        self.cfg.neutral_angle,
                        self.cfg.ramp_step_deg,
                        self.cfg.ramp_step_ms,
                        now,
                    )));
                } else {
                    // Momentary bounce during unload; keep waiting.
                    self.phase = Some(DisplayPhase::AwaitRemoval);
                }
            }
            DisplayPhase::Return(mut ramp) => {
                if ramp.advance(&mut self.servo, now) {
                    self.phase = None;
                    self.enter_waiting();
                } else {
                    self.phase = Some(DisplayPhase::Return(ramp));
                }
            }
        }
    }

    /// Fire-and-forget transmit of the final weight. No retry, no ack.
    fn send_result(&mut self) {
        let msg = encode_mass(self.final_g);
        match self.link.write(msg.as_bytes()) {
            Ok(true) => tracing::info!(grams = self.final_g, "weight sent"),
            Ok(false) => tracing::warn!("link not ready, weight dropped"),
            Err(e) => tracing::warn!(error = %e, "weight send failed"),
        }
    }

    fn enter_waiting(&mut self) {
        self.state = ScaleState::Waiting;
        self.show("Ready to weigh!", "");
    }

    /// Sensor failures are never surfaced: warn and skip the tick.
    fn read_mass(&mut self, samples: u32) -> Option<f32> {
        match self.mass.read(samples) {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(error = %e, "mass read failed, retrying next tick");
                None
            }
        }
    }

    fn show(&mut self, line1: &str, line2: &str) {
        self.display.clear();
        self.display.set_cursor(0, 0);
        self.display.print(line1);
        if !line2.is_empty() {
            self.display.set_cursor(1, 0);
            self.display.print(line2);
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }
}
