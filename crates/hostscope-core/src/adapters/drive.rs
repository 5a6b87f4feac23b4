//! Per-drive read/write throughput from `/sys/block/<dev>/stat`.
//!
//! One adapter per tracked device. Readings are bytes moved during the
//! interval (sector delta × 512), which is a per-second rate when the
//! sampling period is one second.

use std::path::{Path, PathBuf};

use super::helpers;
use crate::adapter::{MetricAdapter, MetricKind, Reading, fail_all};
use crate::config::is_ignored;
use crate::counters::{self, BlockStat, SECTOR_BYTES};
use crate::error::{Result, SampleError};

/// Block devices under `<sys>/block`, minus loop/ram devices and `ignore`.
pub fn discover_drives(sys_root: &Path, ignore: &[String]) -> Result<Vec<String>> {
    let drives: Vec<String> = helpers::list_dir(&sys_root.join("block"))?
        .into_iter()
        .filter(|name| !name.contains("loop") && !name.contains("ram"))
        .filter(|name| !is_ignored(name, ignore))
        .collect();
    log::info!("tracking drives: {drives:?}");
    Ok(drives)
}

/// Capacity of `device` in bytes, 0 when unknown.
pub fn drive_size_bytes(sys_root: &Path, device: &str) -> u64 {
    helpers::read_integer(&sys_root.join("block").join(device).join("size"))
        .ok()
        .and_then(|sectors| u64::try_from(sectors).ok())
        .map_or(0, |sectors| sectors.saturating_mul(SECTOR_BYTES))
}

pub struct DriveIoAdapter {
    name: String,
    device: String,
    stat_path: PathBuf,
    previous: Option<BlockStat>,
    series: Vec<String>,
}

impl DriveIoAdapter {
    pub fn new(sys_root: &Path, device: &str) -> Self {
        let stat_path = sys_root.join("block").join(device).join("stat");
        let previous = match Self::read(&stat_path) {
            Ok(stat) => Some(stat),
            Err(e) => {
                log::warn!("no baseline for {device}: {e}");
                None
            }
        };
        Self {
            name: format!("drive:{device}"),
            device: device.to_string(),
            stat_path,
            previous,
            series: vec![format!("{device} Read"), format!("{device} Write")],
        }
    }

    fn read(path: &Path) -> Result<BlockStat> {
        let raw = std::fs::read_to_string(path).map_err(|e| SampleError::read(path, &e))?;
        BlockStat::parse(&raw)
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl MetricAdapter for DriveIoAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Throughput
    }

    fn series(&self) -> &[String] {
        &self.series
    }

    fn sample(&mut self) -> Vec<Reading> {
        let current = match Self::read(&self.stat_path) {
            Ok(stat) => stat,
            Err(e) => return fail_all(self.series.len(), &e),
        };
        let d = counters::delta_one(&self.device, self.previous.as_ref(), &current);
        self.previous = Some(current);
        vec![Ok(d.read_bytes() as f64), Ok(d.write_bytes() as f64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_device(sys: &Path, name: &str, stat: &str) {
        let dir = sys.join("block").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), stat).unwrap();
    }

    #[test]
    fn discovery_skips_loop_ram_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["loop0", "ram1", "zram0", "sda", "sdb", "nvme0n1"] {
            add_device(dir.path(), name, "0 0 0 0 0 0 0 0 0 0 0");
        }
        let drives = discover_drives(dir.path(), &["SDB".to_string()]).unwrap();
        assert_eq!(drives, vec!["nvme0n1", "sda"]);
    }

    #[test]
    fn ignore_list_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sda", "sdb", "sdc"] {
            add_device(dir.path(), name, "0 0 0 0 0 0 0 0 0 0 0");
        }
        let a = discover_drives(dir.path(), &["sdc".into(), "sda".into()]).unwrap();
        let b = discover_drives(dir.path(), &["sda".into(), "sdc".into()]).unwrap();
        assert_eq!(a, vec!["sdb"]);
        assert_eq!(a, b);
    }

    #[test]
    fn throughput_is_sector_delta_times_512() {
        let dir = tempfile::tempdir().unwrap();
        add_device(dir.path(), "sda", "10 0 100 0 5 0 40 0 0 0 0");
        let mut adapter = DriveIoAdapter::new(dir.path(), "sda");
        assert_eq!(adapter.series(), ["sda Read", "sda Write"]);

        add_device(dir.path(), "sda", "12 0 108 0 9 0 60 0 1 0 0");
        assert_eq!(adapter.sample(), vec![Ok(8.0 * 512.0), Ok(20.0 * 512.0)]);
    }

    #[test]
    fn counter_reset_reports_raw_value() {
        let dir = tempfile::tempdir().unwrap();
        add_device(dir.path(), "sda", "10 0 100 0 5 0 50 0 0 0 0");
        let mut adapter = DriveIoAdapter::new(dir.path(), "sda");
        add_device(dir.path(), "sda", "1 0 10 0 1 0 5 0 0 0 0");
        assert_eq!(adapter.sample(), vec![Ok(10.0 * 512.0), Ok(5.0 * 512.0)]);
    }

    #[test]
    fn missing_baseline_reports_since_boot_then_deltas() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = DriveIoAdapter::new(dir.path(), "sdz");
        assert!(adapter.sample().iter().all(|r| r.is_err()));

        add_device(dir.path(), "sdz", "0 0 4 0 0 0 2 0 0 0 0");
        assert_eq!(adapter.sample(), vec![Ok(4.0 * 512.0), Ok(2.0 * 512.0)]);
        add_device(dir.path(), "sdz", "0 0 6 0 0 0 2 0 0 0 0");
        assert_eq!(adapter.sample(), vec![Ok(2.0 * 512.0), Ok(0.0)]);
    }

    #[test]
    fn drive_size_from_sector_count() {
        let dir = tempfile::tempdir().unwrap();
        add_device(dir.path(), "sda", "0 0 0 0 0 0 0 0 0 0 0");
        std::fs::write(dir.path().join("block/sda/size"), "2048\n").unwrap();
        assert_eq!(drive_size_bytes(dir.path(), "sda"), 2048 * 512);
        assert_eq!(drive_size_bytes(dir.path(), "sdq"), 0);
    }
}
