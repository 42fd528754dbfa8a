//! # Salahtime Library
//!
//! Prayer-time engine and companion tools behind the `salahtime` binary.
//!
//! This library exists to enable testing of the engine and to keep the CLI
//! dispatch (main.rs) separate from the application logic.
//!
//! ## Architecture
//!
//! - **Geographic**: `geo` holds coordinates, the standalone solar model, time
//!   zone lookup and location acquisition with a bounded wait and fallback
//! - **Engine**: `prayer` computes the daily times for one or every method
//!   preset, with madhab, high-latitude rule and per-prayer adjustments
//! - **Qibla**: `qibla` gives the bearing and distance to the Kaaba and fuses
//!   heading sources into a smoothed compass reading
//! - **Scheduling**: `schedule` finds the next and previous event, the
//!   day/night variant and the timers that keep both current
//! - **Planning**: `planner` ties a location, zone and settings to the engine
//! - **State**: `state` persists preferences and writes the widget file
//! - **Configuration**: `config` loads `salahtime.toml`
//! - **Commands**: `commands` implements the CLI subcommands
//! - **Infrastructure**: logging, time source, signal handling and the
//!   single-instance lock

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod geo;
pub mod io;
pub mod planner;
pub mod prayer;
pub mod qibla;
pub mod schedule;
pub mod signals;
pub mod state;
pub mod time_source;

pub use error::SalahError;
pub use planner::{DayPlanner, PlannerSettings};
