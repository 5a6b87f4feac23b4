//! INI-style configuration with lookups that always fall back to a default.
//!
//! ```text
//! [drives]
//! ignore = mmcblk0, "sdb"
//! ```
//!
//! A missing file, section, key, or an unparsable value never fails: the
//! caller-supplied default is returned instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Parsed section → key → value text.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: HashMap<String, HashMap<String, String>>,
}

fn unquote(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

impl Config {
    /// Read `path`. Missing or unreadable files yield an empty config.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                log::warn!("config {} not loaded ({e}); using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parse configuration text. Lines outside a section and lines without
    /// `=` or `:` are ignored.
    pub fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            let Some(section) = current.as_ref() else {
                continue;
            };
            let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
                continue;
            };
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Self { sections }
    }

    fn raw(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn has(&self, section: &str, key: &str) -> bool {
        self.raw(section, key).is_some()
    }

    /// Value with double quotes removed, or `default`.
    pub fn get_value(&self, section: &str, key: &str, default: &str) -> String {
        self.raw(section, key)
            .map(unquote)
            .unwrap_or_else(|| default.to_string())
    }

    /// Comma-separated list value, or `default`.
    pub fn get_list(&self, section: &str, key: &str, default: &[&str]) -> Vec<String> {
        match self.raw(section, key) {
            Some(raw) => raw
                .split(',')
                .map(unquote)
                .filter(|item| !item.is_empty())
                .collect(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Value parsed as `T`, or `default` when absent or malformed.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str, default: T) -> T {
        let Some(raw) = self.raw(section, key) else {
            return default;
        };
        match unquote(raw).parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("[{section}] {key} = {raw:?} is not valid; using default");
                default
            }
        }
    }
}

/// Roots of the counter and sensor sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub dev_root: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            dev_root: PathBuf::from("/dev"),
        }
    }
}

impl HostPaths {
    /// All three roots under one directory (`<root>/proc`, `<root>/sys`, `<root>/dev`).
    pub fn under(root: &Path) -> Self {
        Self {
            proc_root: root.join("proc"),
            sys_root: root.join("sys"),
            dev_root: root.join("dev"),
        }
    }
}

/// Resolved monitor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub refresh: Duration,
    pub window: usize,
    pub drive_ignore: Vec<String>,
    pub net_ignore: Vec<String>,
    pub temperature_ignore: Vec<String>,
    pub smartctl_command: Vec<String>,
    pub smartctl_timeout: Duration,
    pub fan_path: Option<PathBuf>,
    pub paths: HostPaths,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl MonitorConfig {
    pub const DEFAULT_REFRESH_MS: u64 = 1000;
    pub const DEFAULT_WINDOW: usize = 120;
    /// Largest accepted W: one day of samples at the default period.
    pub const MAX_WINDOW: usize = 86_400;
    pub const DEFAULT_SMARTCTL_TIMEOUT_MS: u64 = 2000;

    pub fn from_config(cfg: &Config) -> Self {
        let refresh_ms = cfg
            .get_parsed("monitor", "refresh_ms", Self::DEFAULT_REFRESH_MS)
            .max(1);
        let requested = cfg.get_parsed("monitor", "window", Self::DEFAULT_WINDOW);
        if requested > Self::MAX_WINDOW {
            log::warn!(
                "[monitor] window = {requested} exceeds {}; clamping",
                Self::MAX_WINDOW
            );
        }
        let window = requested.clamp(1, Self::MAX_WINDOW);
        let smartctl_command: Vec<String> = cfg
            .get_value("smartctl", "command", "smartctl")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let fan_path = cfg
            .has("fan", "path")
            .then(|| PathBuf::from(cfg.get_value("fan", "path", "")))
            .filter(|p| !p.as_os_str().is_empty());
        let defaults = HostPaths::default();

        Self {
            refresh: Duration::from_millis(refresh_ms),
            window,
            drive_ignore: cfg.get_list("drives", "ignore", &[]),
            net_ignore: cfg.get_list("network", "ignore", &["lo"]),
            temperature_ignore: cfg.get_list("temperature", "ignore", &[]),
            smartctl_command,
            smartctl_timeout: Duration::from_millis(cfg.get_parsed(
                "smartctl",
                "timeout_ms",
                Self::DEFAULT_SMARTCTL_TIMEOUT_MS,
            )),
            fan_path,
            paths: HostPaths {
                proc_root: PathBuf::from(cfg.get_value(
                    "paths",
                    "proc",
                    &defaults.proc_root.to_string_lossy(),
                )),
                sys_root: PathBuf::from(cfg.get_value(
                    "paths",
                    "sys",
                    &defaults.sys_root.to_string_lossy(),
                )),
                dev_root: PathBuf::from(cfg.get_value(
                    "paths",
                    "dev",
                    &defaults.dev_root.to_string_lossy(),
                )),
            },
        }
    }

    pub fn load(path: &Path) -> Self {
        Self::from_config(&Config::load(path))
    }
}

/// Whether `name` appears in `ignore` (ASCII case-insensitive, whole name).
pub fn is_ignored(name: &str, ignore: &[String]) -> bool {
    ignore.iter().any(|i| i.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# system monitor settings
[monitor]
refresh_ms = 500
window = 60

[temperature]
ignore = "sda", sdb ,

[smartctl]
command = sudo smartctl
sda: -d sat
"#;

    #[test]
    fn values_are_unquoted_and_trimmed() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get_value("monitor", "refresh_ms", "x"), "500");
        assert_eq!(cfg.get_value("smartctl", "sda", ""), "-d sat");
    }

    #[test]
    fn lists_split_on_commas() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get_list("temperature", "ignore", &[]), vec!["sda", "sdb"]);
    }

    #[test]
    fn missing_section_or_key_returns_default() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get_value("performance", "ignore", "dflt"), "dflt");
        assert_eq!(cfg.get_value("monitor", "nope", ""), "");
        assert_eq!(cfg.get_list("performance", "ignore", &["a"]), vec!["a"]);
    }

    #[test]
    fn malformed_number_returns_default() {
        let cfg = Config::parse("[monitor]\nwindow = lots\n");
        assert_eq!(cfg.get_parsed("monitor", "window", 7usize), 7);
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("missingfile.ini"));
        assert_eq!(cfg.get_value("smartctl", "sda", "fallback"), "fallback");
    }

    #[test]
    fn monitor_config_defaults() {
        let mc = MonitorConfig::default();
        assert_eq!(mc.refresh, Duration::from_millis(1000));
        assert_eq!(mc.window, 120);
        assert_eq!(mc.net_ignore, vec!["lo"]);
        assert!(mc.drive_ignore.is_empty());
        assert_eq!(mc.smartctl_command, vec!["smartctl"]);
        assert_eq!(mc.fan_path, None);
        assert_eq!(mc.paths, HostPaths::default());
    }

    #[test]
    fn monitor_config_from_text() {
        let mc = MonitorConfig::from_config(&Config::parse(SAMPLE));
        assert_eq!(mc.refresh, Duration::from_millis(500));
        assert_eq!(mc.window, 60);
        assert_eq!(mc.temperature_ignore, vec!["sda", "sdb"]);
        assert_eq!(mc.smartctl_command, vec!["sudo", "smartctl"]);
    }

    #[test]
    fn zero_window_is_raised_to_one() {
        let mc = MonitorConfig::from_config(&Config::parse("[monitor]\nwindow = 0\n"));
        assert_eq!(mc.window, 1);
    }

    #[test]
    fn huge_window_is_clamped() {
        let mc = MonitorConfig::from_config(&Config::parse(
            "[monitor]\nwindow = 1000000000000000\n",
        ));
        assert_eq!(mc.window, MonitorConfig::MAX_WINDOW);
    }

    #[test]
    fn ignore_match_is_whole_name_and_case_insensitive() {
        let ignore = vec!["SDA".to_string(), "nvme0n1".to_string()];
        assert!(is_ignored("sda", &ignore));
        assert!(is_ignored("nvme0n1", &ignore));
        assert!(!is_ignored("sdab", &ignore));
        assert!(!is_ignored("nvme0", &ignore));
    }
}
