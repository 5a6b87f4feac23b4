//! # hostscope-core
//!
//! **A small, steady heartbeat for a machine's vital signs.**
//!
//! `hostscope-core` samples CPU load, drive and network throughput,
//! temperatures and fan speed once per period, turns cumulative kernel
//! counters into per-interval deltas, and keeps the last W samples of every
//! series in a rolling window ready for plotting.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostscope_core::{MonitorConfig, build_sampler};
//!
//! let config = MonitorConfig::default();
//! let (mut sampler, inventory) = build_sampler(&config).expect("CPU counters");
//! println!("{} cores, {} drives", inventory.cpu_cores, inventory.drives.len());
//!
//! let report = sampler.tick();
//! for chart in sampler.snapshots() {
//!     println!("{} up to {}", chart.display_title(), chart.y_max);
//! }
//! println!("tick {} took {:?}", report.tick, report.elapsed);
//! ```
//!
//! ## Architecture
//!
//! Counter sources → Adapters (delta) → Sampler (one tick) → Charts
//! (rolling window + unit scale) → snapshots
//!
//! Every source implements [`MetricAdapter`] and yields one [`Reading`] per
//! series per tick. A failed reading becomes "no data" for that series only;
//! the rest of the tick carries on. Throughput charts pick a unit from a
//! ladder (Bytes/s, KiB/s, MiB/s, GiB/s), moving at most one rung per tick,
//! and advertise a power-of-two ceiling that fits the visible data.

pub mod adapter;
pub mod adapters;
pub mod chart;
pub mod config;
pub mod counters;
pub mod error;
pub mod platform;
pub mod sampler;
pub mod scale;
pub mod window;

pub use adapter::{MetricAdapter, MetricKind, Reading};
pub use chart::{Chart, ChartSnapshot, ScaleChange};
pub use config::{Config, HostPaths, MonitorConfig};
pub use counters::{BlockStat, CounterSet, CpuTicks, NetBytes, Snapshot};
pub use error::{Result, SampleError};
pub use platform::{DriveInfo, Inventory, build_sampler};
pub use sampler::{
    ChartId, Diagnostic, Sampler, SamplerState, SharedSampler, TickOutcome, TickReport, run_loop,
};
pub use scale::{ScaleLadder, ScaleState, best_fit_ceiling};
pub use window::{RollingWindow, Sample, SeriesSnapshot};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
