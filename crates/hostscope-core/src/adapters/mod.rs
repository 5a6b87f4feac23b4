//! Metric source adapters.
//!
//! | Adapter | Source | Series |
//! |---|---|---|
//! | [`CpuLoadAdapter`] | `/proc/stat` | `cpu`, `cpu0`… (% busy) |
//! | [`DriveIoAdapter`] | `/sys/block/<dev>/stat` | `<dev> Read`, `<dev> Write` (bytes) |
//! | [`NetworkIoAdapter`] | `/proc/net/dev` | `<iface> Rx`, `<iface> Tx` (bytes) |
//! | [`TemperatureAdapter`] | thermal zone + drive-health probe | `CPU`, `<dev>`… (°C) |
//! | [`FanSpeedAdapter`] | hwmon `fan*_input` | `RPM` |

pub mod cpu;
pub mod drive;
pub mod fan;
pub mod helpers;
pub mod network;
pub mod temperature;

pub use cpu::CpuLoadAdapter;
pub use drive::{DriveIoAdapter, discover_drives, drive_size_bytes};
pub use fan::FanSpeedAdapter;
pub use network::{NetworkIoAdapter, discover_interfaces};
pub use temperature::{DriveProbe, SmartctlProbe, TemperatureAdapter, parse_smart_temperature};
