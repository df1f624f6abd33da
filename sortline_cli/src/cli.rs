//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sortline", version, about = "Weighing and sorting line CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/sortline.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scale node against simulated peripherals
    Scale {
        /// Stop after this many ticks (run until Ctrl-C when omitted)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
    },
    /// Run the sort node against simulated peripherals
    Sort {
        /// Stop after this many ticks (run until Ctrl-C when omitted)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
    },
    /// Run both nodes in one process over a paired link and push one
    /// scripted object through the line
    Demo {
        /// Mass placed on the scale pan (grams)
        #[arg(long, value_name = "GRAMS", default_value_t = 250.0)]
        mass_g: f32,
        /// Upper bound on simulated ticks before giving up
        #[arg(long, value_name = "N", default_value_t = 20_000)]
        max_ticks: u64,
    },
}
