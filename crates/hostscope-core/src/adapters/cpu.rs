//! CPU utilization from `/proc/stat` tick counters.
//!
//! The baseline is captured at construction, so the first sample covers the
//! time since the adapter was built rather than exactly one period. That
//! first-sample skew is accepted, not corrected.

use std::path::{Path, PathBuf};

use crate::adapter::{MetricAdapter, MetricKind, Reading, fail_all};
use crate::counters::{self, CpuTicks, Snapshot};
use crate::error::{Result, SampleError};

/// Series name of the all-CPU aggregate line.
pub const AGGREGATE: &str = "cpu";

pub struct CpuLoadAdapter {
    stat_path: PathBuf,
    previous: Snapshot<CpuTicks>,
    series: Vec<String>,
}

fn core_order(name: &str) -> (u8, u32) {
    match name.strip_prefix(AGGREGATE).and_then(|n| n.parse::<u32>().ok()) {
        Some(n) => (1, n),
        None => (0, 0),
    }
}

impl CpuLoadAdapter {
    /// Open the CPU counter source under `proc_root`.
    ///
    /// Fails with [`SampleError::Unavailable`] when the counters cannot be
    /// read at all; this is the one startup failure that should stop the
    /// process.
    pub fn new(proc_root: &Path) -> Result<Self> {
        let stat_path = proc_root.join("stat");
        let previous = Self::read(&stat_path).map_err(|e| {
            SampleError::Unavailable(format!("CPU counters at {} ({e})", stat_path.display()))
        })?;
        let mut series: Vec<String> = previous.keys().map(str::to_string).collect();
        series.sort_by_key(|name| core_order(name));
        log::info!("tracking {} cpu series", series.len());
        Ok(Self {
            stat_path,
            previous,
            series,
        })
    }

    fn read(path: &Path) -> Result<Snapshot<CpuTicks>> {
        let raw = std::fs::read_to_string(path).map_err(|e| SampleError::read(path, &e))?;
        counters::parse_proc_stat(&raw)
    }

    /// Number of individual cores (excluding the aggregate).
    pub fn core_count(&self) -> usize {
        self.series.iter().filter(|s| s.as_str() != AGGREGATE).count()
    }
}

impl MetricAdapter for CpuLoadAdapter {
    fn name(&self) -> &str {
        "cpu_load"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Utilization
    }

    fn series(&self) -> &[String] {
        &self.series
    }

    fn sample(&mut self) -> Vec<Reading> {
        let current = match Self::read(&self.stat_path) {
            Ok(snapshot) => snapshot,
            Err(e) => return fail_all(self.series.len(), &e),
        };
        let readings: Vec<Reading> = self
            .series
            .iter()
            .map(|name| {
                let cur = current
                    .get(name)
                    .ok_or_else(|| SampleError::Missing(format!("{name} in /proc/stat")))?;
                Ok(counters::delta_one(name, self.previous.get(name), cur).utilization())
            })
            .collect();
        self.previous = current;
        readings
    }
}
