//! Host discovery: the standard chart set wired to this machine's sources.

use std::path::PathBuf;

use serde::Serialize;

use crate::adapters::{
    CpuLoadAdapter, DriveIoAdapter, FanSpeedAdapter, NetworkIoAdapter, SmartctlProbe,
    TemperatureAdapter, discover_drives, discover_interfaces, drive_size_bytes,
};
use crate::chart::Chart;
use crate::config::{MonitorConfig, is_ignored};
use crate::error::Result;
use crate::sampler::Sampler;
use crate::scale::ScaleLadder;

pub const CPU_CHART: &str = "CPU Utilization";
pub const DISK_CHART: &str = "Disk I/O";
pub const NETWORK_CHART: &str = "Network I/O";
pub const TEMPERATURE_CHART: &str = "Temperature (°C)";
pub const FAN_CHART: &str = "Fan Speed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveInfo {
    pub name: String,
    pub size_bytes: u64,
}

/// What was found on the host when the sampler was built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inventory {
    pub cpu_cores: usize,
    pub drives: Vec<DriveInfo>,
    pub interfaces: Vec<String>,
    pub temperature_drives: Vec<String>,
    pub fan_input: Option<PathBuf>,
}

/// Build a [`Sampler`] with the standard charts for the host described by `cfg`.
///
/// Only an unreadable CPU counter source is an error; every other missing
/// source leaves its chart with fewer series or "no data" readings.
pub fn build_sampler(cfg: &MonitorConfig) -> Result<(Sampler, Inventory)> {
    let paths = &cfg.paths;
    let cpu = CpuLoadAdapter::new(&paths.proc_root)?;
    let cpu_cores = cpu.core_count();

    let drives = discover_drives(&paths.sys_root, &cfg.drive_ignore).unwrap_or_else(|e| {
        log::warn!("drive discovery failed: {e}");
        Vec::new()
    });
    let interfaces =
        discover_interfaces(&paths.proc_root, &cfg.net_ignore).unwrap_or_else(|e| {
            log::warn!("interface discovery failed: {e}");
            Vec::new()
        });
    let temperature_drives: Vec<String> = drives
        .iter()
        .filter(|d| !is_ignored(d, &cfg.temperature_ignore))
        .cloned()
        .collect();

    let mut sampler = Sampler::new();
    let w = cfg.window;

    let cpu_chart = sampler.add_chart(Chart::fixed(CPU_CHART, w, 0.0, 100.0));
    sampler.attach(cpu_chart, Box::new(cpu));

    let disk_chart = sampler.add_chart(Chart::auto_scaled(
        DISK_CHART,
        w,
        ScaleLadder::bytes_per_second(),
    ));
    for drive in &drives {
        sampler.attach(disk_chart, Box::new(DriveIoAdapter::new(&paths.sys_root, drive)));
    }

    let net_chart = sampler.add_chart(Chart::auto_scaled(
        NETWORK_CHART,
        w,
        ScaleLadder::bytes_per_second(),
    ));
    for iface in &interfaces {
        sampler.attach(net_chart, Box::new(NetworkIoAdapter::new(&paths.proc_root, iface)));
    }

    let temp_chart = sampler.add_chart(Chart::fixed(TEMPERATURE_CHART, w, 20.0, 80.0));
    let probe = SmartctlProbe::new(
        cfg.smartctl_command.clone(),
        &paths.dev_root,
        cfg.smartctl_timeout,
    );
    sampler.attach(
        temp_chart,
        Box::new(TemperatureAdapter::new(
            &paths.sys_root,
            temperature_drives.clone(),
            Box::new(probe),
        )),
    );

    let fan = FanSpeedAdapter::new(&paths.sys_root, cfg.fan_path.clone());
    let fan_input = fan.path().map(PathBuf::from);
    let fan_chart = sampler.add_chart(Chart::fixed(FAN_CHART, w, 0.0, 6000.0));
    sampler.attach(fan_chart, Box::new(fan));

    let inventory = Inventory {
        cpu_cores,
        drives: drives
            .iter()
            .map(|name| DriveInfo {
                name: name.clone(),
                size_bytes: drive_size_bytes(&paths.sys_root, name),
            })
            .collect(),
        interfaces,
        temperature_drives,
        fan_input,
    };
    Ok((sampler, inventory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostPaths;
    use crate::error::SampleError;

    #[test]
    fn unreadable_cpu_counters_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = MonitorConfig {
            paths: HostPaths::under(dir.path()),
            ..MonitorConfig::default()
        };
        assert!(matches!(
            build_sampler(&cfg),
            Err(SampleError::Unavailable(_))
        ));
    }

    #[test]
    fn bare_host_still_gets_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::under(dir.path());
        std::fs::create_dir_all(&paths.proc_root).unwrap();
        std::fs::write(paths.proc_root.join("stat"), "cpu 1 0 1 8 0 0 0 0 0 0\n").unwrap();
        let cfg = MonitorConfig {
            paths,
            ..MonitorConfig::default()
        };

        let (sampler, inventory) = build_sampler(&cfg).unwrap();
        let titles: Vec<&str> = sampler.charts().iter().map(Chart::title).collect();
        assert_eq!(
            titles,
            [CPU_CHART, DISK_CHART, NETWORK_CHART, TEMPERATURE_CHART, FAN_CHART]
        );
        assert_eq!(inventory.cpu_cores, 0);
        assert!(inventory.drives.is_empty());
        assert!(inventory.fan_input.is_none());
    }
}
