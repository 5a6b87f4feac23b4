//! Fan speed from a hwmon `fan*_input` file (plain integer RPM).

use std::path::{Path, PathBuf};

use super::helpers;
use crate::adapter::{MetricAdapter, MetricKind, Reading};
use crate::error::SampleError;

pub const RPM_SERIES: &str = "RPM";

/// First fan input: the platform cooling fan, then any hwmon chip.
pub fn locate_fan_input(sys_root: &Path) -> Option<PathBuf> {
    let cooling = sys_root.join("devices/platform/cooling_fan/hwmon");
    if let Ok(chips) = helpers::list_dir(&cooling) {
        for chip in chips {
            let candidate = cooling.join(chip).join("fan1_input");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let hwmon = sys_root.join("class/hwmon");
    for chip in helpers::list_dir(&hwmon).ok()? {
        let dir = hwmon.join(&chip);
        let Ok(files) = helpers::list_dir(&dir) else {
            continue;
        };
        if let Some(file) = files
            .iter()
            .find(|f| f.starts_with("fan") && f.ends_with("_input"))
        {
            return Some(dir.join(file));
        }
    }
    None
}

pub struct FanSpeedAdapter {
    sys_root: PathBuf,
    configured: Option<PathBuf>,
    path: Option<PathBuf>,
    series: Vec<String>,
}

impl FanSpeedAdapter {
    /// Use `configured` when given, otherwise search under `sys_root`.
    pub fn new(sys_root: &Path, configured: Option<PathBuf>) -> Self {
        let path = configured.clone().or_else(|| locate_fan_input(sys_root));
        match &path {
            Some(p) => log::info!("fan input: {}", p.display()),
            None => log::warn!("no fan input found under {}", sys_root.display()),
        }
        Self {
            sys_root: sys_root.to_path_buf(),
            configured,
            path,
            series: vec![RPM_SERIES.to_string()],
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&mut self) -> Reading {
        // hwmon indices can change when drivers reload; search again.
        if self.path.is_none() && self.configured.is_none() {
            self.path = locate_fan_input(&self.sys_root);
        }
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| SampleError::Missing("fan input".to_string()))?;
        let result = helpers::read_integer(path).map(|rpm| rpm as f64);
        if result.is_err() && self.configured.is_none() {
            self.path = None;
        }
        result
    }
}

impl MetricAdapter for FanSpeedAdapter {
    fn name(&self) -> &str {
        "fan"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::FanSpeed
    }

    fn series(&self) -> &[String] {
        &self.series
    }

    fn sample(&mut self) -> Vec<Reading> {
        vec![self.read()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn prefers_platform_cooling_fan() {
        let dir = tempfile::tempdir().unwrap();
        let sys = dir.path();
        write(&sys.join("class/hwmon/hwmon0/fan2_input"), "900");
        write(
            &sys.join("devices/platform/cooling_fan/hwmon/hwmon3/fan1_input"),
            "2950",
        );
        let mut adapter = FanSpeedAdapter::new(sys, None);
        assert_eq!(adapter.sample(), vec![Ok(2950.0)]);
    }

    #[test]
    fn falls_back_to_any_hwmon_fan() {
        let dir = tempfile::tempdir().unwrap();
        let sys = dir.path();
        write(&sys.join("class/hwmon/hwmon0/temp1_input"), "41000");
        write(&sys.join("class/hwmon/hwmon1/fan3_input"), "1200\n");
        let mut adapter = FanSpeedAdapter::new(sys, None);
        assert_eq!(adapter.sample(), vec![Ok(1200.0)]);
    }

    #[test]
    fn configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom_fan");
        write(&custom, "777");
        write(&dir.path().join("class/hwmon/hwmon1/fan1_input"), "1");
        let mut adapter = FanSpeedAdapter::new(dir.path(), Some(custom.clone()));
        assert_eq!(adapter.path(), Some(custom.as_path()));
        assert_eq!(adapter.sample(), vec![Ok(777.0)]);
    }

    #[test]
    fn no_fan_is_no_data_until_one_appears() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = FanSpeedAdapter::new(dir.path(), None);
        assert!(matches!(adapter.sample()[0], Err(SampleError::Missing(_))));

        write(&dir.path().join("class/hwmon/hwmon2/fan1_input"), "1500");
        assert_eq!(adapter.sample(), vec![Ok(1500.0)]);
    }
}
