//! Node assembly and run loops: config mapping, simulated peripheral
//! wiring, and the scripted single-process demo.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::Result;
use sortline_config::Config;
use sortline_core::scale_node::{ScaleNode, ScaleState};
use sortline_core::sort_node::{Buttons, SortNode};
use sortline_core::{Calibration, MassSampler, ScaleCfg, SortCfg};
use sortline_hardware::link::pair;
use sortline_hardware::{
    ConsoleDisplay, SimButton, SimConveyor, SimLoadCell, SimRangeFinder, SimServo,
};
use sortline_traits::clock::{ManualClock, MonotonicClock};
use sortline_traits::{Clock, LinkPort};

pub fn scale_cfg(cfg: &Config) -> ScaleCfg {
    let s = &cfg.scale;
    ScaleCfg {
        trigger_g: s.trigger_g,
        remove_g: s.remove_g,
        dead_zone_g: s.dead_zone_g,
        measure_ms: s.measure_ms,
        removal_settle_ms: s.removal_settle_ms,
        live_samples: s.live_samples,
        measure_samples: s.measure_samples,
        final_samples: s.final_samples,
        sensor_timeout_ms: s.sensor_timeout_ms,
        eject_angle: s.eject_angle,
        neutral_angle: s.neutral_angle,
        ramp_step_deg: s.ramp_step_deg,
        ramp_step_ms: s.ramp_step_ms,
        banner_ms: s.banner_ms,
        tare_banner_ms: s.tare_banner_ms,
        poll_period_ms: s.poll_period_ms,
    }
}

pub fn sort_cfg(cfg: &Config) -> SortCfg {
    let s = &cfg.sort;
    SortCfg {
        detect_mm: s.detect_mm,
        echo_timeout_ms: s.echo_timeout_ms,
        count_cooldown_ms: s.count_cooldown_ms,
        weight_min_g: s.weight_min_g,
        weight_max_g: s.weight_max_g,
        weight_step_g: s.weight_step_g,
        bin1_max_g: s.bin1_max_g,
        bin2_max_g: s.bin2_max_g,
        servo_a_home: s.servo_a_home,
        servo_a_sort: s.servo_a_sort,
        servo_b_home: s.servo_b_home,
        servo_b_sort: s.servo_b_sort,
        divert_dwell_ms: s.divert_dwell_ms,
        pass_dwell_ms: s.pass_dwell_ms,
        debounce_ms: s.debounce_ms,
        banner_ms: s.banner_ms,
        poll_period_ms: s.poll_period_ms,
    }
}

pub fn calibration(cfg: &Config) -> Calibration {
    Calibration {
        scale_factor: cfg.calibration.scale_factor,
        tare_offset: cfg.calibration.zero_counts,
    }
}

/// Run the scale node against simulated peripherals until shutdown.
pub fn run_scale(cfg: &Config, ticks: Option<u64>, shutdown: Arc<AtomicBool>) -> Result<()> {
    let clock = Arc::new(MonotonicClock::new());
    let cal = calibration(cfg);
    let scfg = scale_cfg(cfg);

    let (cell, _pan) = SimLoadCell::new(cal.scale_factor);
    let sampler = MassSampler::new(cell, cal, Duration::from_millis(scfg.sensor_timeout_ms));
    let (local, mut peer) = pair();
    let servo = SimServo::new("pusher", scfg.neutral_angle);
    let display = ConsoleDisplay::new("scale");

    let mut node = ScaleNode::new(sampler, local, servo, display, scfg, clock.clone());
    tracing::info!("scale node running (simulated peripherals)");

    let mut remaining = ticks;
    while !shutdown.load(Ordering::Relaxed) && take_tick(&mut remaining) {
        node.tick()?;
        // Keep the unused peer endpoint drained.
        while peer.read_byte().ok().flatten().is_some() {}
        clock.sleep(node.poll_period());
    }
    tracing::info!("scale node stopped");
    Ok(())
}

/// Run the sort node against simulated peripherals until shutdown.
pub fn run_sort(cfg: &Config, ticks: Option<u64>, shutdown: Arc<AtomicBool>) -> Result<()> {
    let clock = Arc::new(MonotonicClock::new());
    let sfg = sort_cfg(cfg);

    let (local, _peer) = pair();
    let (ranger, _zone) = SimRangeFinder::new();
    let (belt, _belt_state) = SimConveyor::new();
    let servo_a = SimServo::new("diverter-a", sfg.servo_a_home);
    let servo_b = SimServo::new("diverter-b", sfg.servo_b_home);
    let (start, _) = SimButton::new();
    let (stop, _) = SimButton::new();
    let (weight, _) = SimButton::new();
    let display = ConsoleDisplay::new("sort");

    let mut node = SortNode::new(
        local,
        ranger,
        belt,
        servo_a,
        servo_b,
        display,
        Buttons {
            start,
            stop,
            weight,
        },
        sfg,
        clock.clone(),
    );
    node.set_direction_forward(cfg.sort.forward);
    tracing::info!("sort node running (simulated peripherals, no peer)");

    let mut remaining = ticks;
    while !shutdown.load(Ordering::Relaxed) && take_tick(&mut remaining) {
        node.tick()?;
        clock.sleep(node.poll_period());
    }
    tracing::info!("sort node stopped");
    Ok(())
}

/// Both nodes in one process over a paired link, on a manually advanced
/// clock: one object is placed on the pan, weighed, handed over, and
/// sorted. Runs in milliseconds of wall time.
pub fn run_demo(cfg: &Config, mass_g: f32, max_ticks: u64) -> Result<()> {
    let clock = ManualClock::new();
    let shared: Arc<dyn Clock + Send + Sync> = Arc::new(clock.clone());
    let cal = calibration(cfg);
    let scfg = scale_cfg(cfg);
    let sfg = sort_cfg(cfg);
    let step = Duration::from_millis(sfg.poll_period_ms);

    let (scale_link, sort_link) = pair();

    let (cell, pan) = SimLoadCell::new(cal.scale_factor);
    let sampler = MassSampler::new(cell, cal, Duration::from_millis(scfg.sensor_timeout_ms));
    let mut scale = ScaleNode::new(
        sampler,
        scale_link,
        SimServo::new("pusher", scfg.neutral_angle),
        ConsoleDisplay::new("scale"),
        scfg,
        shared.clone(),
    );

    let (ranger, zone) = SimRangeFinder::new();
    let (belt, _belt_state) = SimConveyor::new();
    let (start, _) = SimButton::new();
    let (stop, _) = SimButton::new();
    let (weight, _) = SimButton::new();
    let mut sort = SortNode::new(
        sort_link,
        ranger,
        belt,
        SimServo::new("diverter-a", sfg.servo_a_home),
        SimServo::new("diverter-b", sfg.servo_b_home),
        ConsoleDisplay::new("sort"),
        Buttons {
            start,
            stop,
            weight,
        },
        sfg,
        shared,
    );
    sort.set_direction_forward(cfg.sort.forward);

    tracing::info!(mass_g, "demo start");
    let mut placed = false;
    let mut handed_over = false;
    let mut presented = false;

    for _ in 0..max_ticks {
        scale.tick()?;
        sort.tick()?;

        // Place the object once the scale is ready for it.
        if !placed && scale.state() == ScaleState::Waiting {
            pan.set(mass_g);
            placed = true;
            tracing::info!(mass_g, "object placed on pan");
        }

        // The sort node autostarts when the weight arrives; treat that
        // as the hand-over and clear the pan so the scale recovers.
        if placed && !handed_over && sort.pending_weight_g() > 0 {
            pan.set(0.0);
            handed_over = true;
            tracing::info!(pending_g = sort.pending_weight_g(), "weight handed over");
        }

        // Object reaches the detection zone on the belt.
        if handed_over && !presented && sort.running() {
            zone.set(Some(30.0));
            presented = true;
        }
        if presented && sort.product_count() >= 1 {
            zone.set(None);
        }

        if sort.product_count() >= 1
            && !sort.is_diverting()
            && scale.state() == ScaleState::Waiting
        {
            let bin = sort.last_bin();
            tracing::info!(?bin, "demo complete");
            println!(
                "demo complete: sorted {}g object to {:?}",
                sort.pending_weight_g(),
                bin
            );
            return Ok(());
        }

        clock.advance(step);
    }

    eyre::bail!("demo did not complete within {max_ticks} ticks")
}

/// Decrement a tick budget; `None` means unbounded.
fn take_tick(remaining: &mut Option<u64>) -> bool {
    match remaining {
        None => true,
        Some(0) => false,
        Some(n) => {
            *n -= 1;
            true
        }
    }
}
