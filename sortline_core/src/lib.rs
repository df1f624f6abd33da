#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core sorting-line logic (hardware-agnostic).
//!
//! Two cooperating node state machines drive a weigh-and-sort line. All
//! hardware interactions go through the `sortline_traits` seams, so the
//! crate runs identically against real peripherals and simulations.
//!
//! ## Architecture
//!
//! - **Protocol**: the `Khoi_luong:<mass>g` wire line (`protocol` module)
//! - **Sampling**: calibrated mass and ultrasonic distance (`mass`, `distance`)
//! - **Debounce**: poll-driven contact-bounce filtering (`debounce`)
//! - **Scale node**: weigh, announce, eject, await removal (`scale_node`)
//! - **Sort node**: receive, count, classify, divert (`sort_node`)
//!
//! ## Tick model
//!
//! Both nodes are single-threaded tick machines: the caller invokes
//! `tick()` once per poll period and sleeps in between. Every wait is a
//! deadline against an injected [`sortline_traits::Clock`], never a
//! blocking delay, so the machines stay responsive and test without
//! real time.

pub mod config;
pub mod debounce;
pub mod distance;
pub mod error;
pub mod mass;
pub mod protocol;
pub mod scale_node;
pub mod sort_node;

pub use config::{Calibration, ScaleCfg, SortCfg};
pub use debounce::{ButtonEvent, Debouncer};
pub use distance::DistanceSampler;
pub use error::{NodeError, Result};
pub use mass::MassSampler;
pub use protocol::{Decoded, LineAssembler, decode_line, encode_mass};
pub use scale_node::{ScaleCommand, ScaleNode, ScaleState};
pub use sort_node::{Bin, Buttons, SortNode, classify};
