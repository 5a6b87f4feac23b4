//! CPU and drive temperatures.
//!
//! The CPU reading comes from the first thermal zone (millidegrees). Drive
//! readings come from a drive-health probe (`smartctl -A` by default) whose
//! free-form output is searched for a temperature attribute. Each series
//! fails independently: a drive whose probe times out reads as no data while
//! the others still report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::helpers;
use crate::adapter::{MetricAdapter, MetricKind, Reading};
use crate::error::{Result, SampleError};

/// Series name of the CPU temperature.
pub const CPU_SERIES: &str = "CPU";

/// Candidate line prefixes, tried in order; first match wins.
///
/// `Temperature:` is the NVMe health log (value is the 2nd token); `194`
/// and `190` are ATA SMART attribute rows (value is RAW_VALUE, the 10th).
const SMART_LABELS: [(&str, usize); 3] = [("Temperature:", 1), ("194", 9), ("190", 9)];

/// Extract a temperature in °C from drive-health output.
///
/// A matching line too short to hold the value falls through to the next
/// label.
pub fn parse_smart_temperature(text: &str) -> Result<f64> {
    let mut short = None;
    for (label, column) in SMART_LABELS {
        let Some(line) = text.lines().map(str::trim_start).find(|l| l.starts_with(label)) else {
            continue;
        };
        let Some(token) = line.split_whitespace().nth(column) else {
            short = Some(SampleError::parse(
                "drive temperature",
                format!("short {label} line: {line:?}"),
            ));
            continue;
        };
        return token
            .parse::<f64>()
            .map_err(|e| SampleError::parse("drive temperature", format!("{token:?}: {e}")));
    }
    Err(short.unwrap_or_else(|| SampleError::Missing("temperature attribute".to_string())))
}

/// Source of raw drive-health text for one drive.
pub trait DriveProbe: Send {
    fn query(&self, drive: &str) -> Result<String>;
}

/// Runs the configured health command against `<dev>/<drive>` with a timeout.
pub struct SmartctlProbe {
    command: Vec<String>,
    dev_root: PathBuf,
    timeout: Duration,
}

impl SmartctlProbe {
    /// `command` is the program and any prefix arguments, e.g. `["sudo", "smartctl"]`.
    pub fn new(command: Vec<String>, dev_root: &Path, timeout: Duration) -> Self {
        Self {
            command,
            dev_root: dev_root.to_path_buf(),
            timeout,
        }
    }
}

impl DriveProbe for SmartctlProbe {
    fn query(&self, drive: &str) -> Result<String> {
        let Some((program, prefix)) = self.command.split_first() else {
            return Err(SampleError::Command {
                command: String::new(),
                reason: "no probe command configured".to_string(),
            });
        };
        let device = self.dev_root.join(drive).to_string_lossy().into_owned();
        let mut args: Vec<&str> = prefix.iter().map(String::as_str).collect();
        args.extend(["-A", device.as_str()]);
        helpers::run_command(program, &args, self.timeout)
    }
}

pub struct TemperatureAdapter {
    cpu_path: PathBuf,
    drives: Vec<String>,
    probe: Box<dyn DriveProbe>,
    series: Vec<String>,
}

impl TemperatureAdapter {
    pub fn new(sys_root: &Path, drives: Vec<String>, probe: Box<dyn DriveProbe>) -> Self {
        let mut series = vec![CPU_SERIES.to_string()];
        series.extend(drives.iter().cloned());
        Self {
            cpu_path: sys_root.join("class/thermal/thermal_zone0/temp"),
            drives,
            probe,
            series,
        }
    }

    fn cpu_temperature(&self) -> Reading {
        helpers::read_integer(&self.cpu_path).map(|milli| milli as f64 / 1000.0)
    }
}

impl MetricAdapter for TemperatureAdapter {
    fn name(&self) -> &str {
        "temperature"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Temperature
    }

    fn series(&self) -> &[String] {
        &self.series
    }

    fn sample(&mut self) -> Vec<Reading> {
        let mut readings = Vec::with_capacity(self.series.len());
        readings.push(self.cpu_temperature());
        for drive in &self.drives {
            readings.push(
                self.probe
                    .query(drive)
                    .and_then(|text| parse_smart_temperature(&text)),
            );
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const NVME_OUT: &str = "\
smartctl 7.3 2022-02-28 r5338 [aarch64-linux-6.6.31+rpt-rpi-2712] (local build)
=== START OF SMART DATA SECTION ===
SMART/Health Information (NVMe Log 0x02)
Critical Warning:                   0x00
Temperature:                        38 Celsius
Available Spare:                    100%
";

    const ATA_OUT: &str = "\
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  9 Power_On_Hours          0x0032   099   099   000    Old_age   Always       -       1234
190 Airflow_Temperature_Cel 0x0032   067   052   000    Old_age   Always       -       33
194 Temperature_Celsius     0x0022   067   052   000    Old_age   Always       -       33 (Min/Max 18/48)
";

    struct FakeProbe(HashMap<String, Result<String>>);

    impl DriveProbe for FakeProbe {
        fn query(&self, drive: &str) -> Result<String> {
            self.0
                .get(drive)
                .cloned()
                .unwrap_or_else(|| Err(SampleError::Missing(drive.to_string())))
        }
    }

    #[test]
    fn parses_nvme_health_log() {
        assert_eq!(parse_smart_temperature(NVME_OUT), Ok(38.0));
    }

    #[test]
    fn parses_ata_attribute_raw_value() {
        assert_eq!(parse_smart_temperature(ATA_OUT), Ok(33.0));
    }

    #[test]
    fn short_nvme_line_falls_through_to_ata_attribute() {
        let text = format!("Temperature:\n{ATA_OUT}");
        assert_eq!(parse_smart_temperature(&text), Ok(33.0));
    }

    #[test]
    fn only_short_lines_is_a_parse_error() {
        assert!(matches!(
            parse_smart_temperature("Temperature:\n194 Temperature_Celsius 0x0022\n"),
            Err(SampleError::Parse { .. })
        ));
    }

    #[test]
    fn no_temperature_attribute_is_missing() {
        assert!(matches!(
            parse_smart_temperature("nothing useful here"),
            Err(SampleError::Missing(_))
        ));
    }

    #[test]
    fn per_drive_failures_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("class/thermal/thermal_zone0");
        std::fs::create_dir_all(&zone).unwrap();
        std::fs::write(zone.join("temp"), "52312\n").unwrap();

        let mut outputs = HashMap::new();
        outputs.insert("nvme0n1".to_string(), Ok(NVME_OUT.to_string()));
        outputs.insert(
            "sda".to_string(),
            Err(SampleError::Timeout {
                command: "smartctl -A /dev/sda".to_string(),
                after: Duration::from_millis(10),
            }),
        );
        let mut adapter = TemperatureAdapter::new(
            dir.path(),
            vec!["nvme0n1".to_string(), "sda".to_string()],
            Box::new(FakeProbe(outputs)),
        );

        assert_eq!(adapter.series(), ["CPU", "nvme0n1", "sda"]);
        let readings = adapter.sample();
        assert!((readings[0].clone().unwrap() - 52.312).abs() < 1e-9);
        assert_eq!(readings[1], Ok(38.0));
        assert!(matches!(readings[2], Err(SampleError::Timeout { .. })));
    }

    #[test]
    fn missing_thermal_zone_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter =
            TemperatureAdapter::new(dir.path(), Vec::new(), Box::new(FakeProbe(HashMap::new())));
        let readings = adapter.sample();
        assert_eq!(readings.len(), 1);
        assert!(readings[0].is_err());
    }

    #[test]
    fn empty_probe_command_is_an_error() {
        let probe = SmartctlProbe::new(Vec::new(), Path::new("/dev"), Duration::from_millis(10));
        assert!(matches!(probe.query("sda"), Err(SampleError::Command { .. })));
    }
}
