//! Counter snapshots and the delta engine.
//!
//! The kernel exposes activity as monotonically increasing counters (CPU
//! ticks, block-device sectors, interface bytes). A [`Snapshot`] captures a
//! set of named counter tuples at one instant; [`delta`] turns two
//! consecutive snapshots into per-interval activity.
//!
//! Rules:
//! - key present in both snapshots: component-wise `current - previous`;
//! - key new in `current`: the raw value (activity since first observed);
//! - any cumulative component went backwards (device replaced, driver
//!   reload): the raw value, i.e. the baseline restarts. Never an error.

use std::collections::BTreeMap;

use crate::error::{Result, SampleError};

/// Bytes per block-layer sector, independent of the device's physical sector size.
pub const SECTOR_BYTES: u64 = 512;

/// A tuple of cumulative counters that can be differenced.
pub trait CounterSet: Copy + std::fmt::Debug {
    /// `self - previous`, or `None` when any cumulative component decreased.
    fn checked_delta(&self, previous: &Self) -> Option<Self>;
}

/// Named counter tuples captured at one instant. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    counters: BTreeMap<String, T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }
}

impl<T: CounterSet> Snapshot<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.counters.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl<T, K: Into<String>> FromIterator<(K, T)> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Delta for a single key. See the module docs for the reset policy.
pub fn delta_one<T: CounterSet>(key: &str, previous: Option<&T>, current: &T) -> T {
    match previous {
        None => *current,
        Some(prev) => current.checked_delta(prev).unwrap_or_else(|| {
            log::debug!("counter reset on {key}: {prev:?} -> {current:?}, restarting baseline");
            *current
        }),
    }
}

/// Per-key deltas for every key in `current`.
pub fn delta<T: CounterSet>(previous: &Snapshot<T>, current: &Snapshot<T>) -> BTreeMap<String, T> {
    current
        .counters
        .iter()
        .map(|(key, cur)| (key.clone(), delta_one(key, previous.get(key), cur)))
        .collect()
}

/// `part / total * 100`; a zero denominator yields 0.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// CPU ticks
// ---------------------------------------------------------------------------

/// Aggregate (total, idle) tick counters for one CPU line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    pub idle: u64,
}

impl CpuTicks {
    pub fn new(total: u64, idle: u64) -> Self {
        Self { total, idle }
    }

    /// Parse one `cpu…` line into its identifier and tick counters.
    ///
    /// `total` sums user through steal; guest and guest_nice are already
    /// accounted inside user and nice. `idle` is idle plus iowait.
    pub fn parse_line(line: &str) -> Option<(&str, Self)> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?;
        if !name.starts_with("cpu") {
            return None;
        }
        let fields: Vec<u64> = parts.map(|s| s.parse::<u64>().ok()).collect::<Option<_>>()?;
        if fields.len() < 4 {
            return None;
        }
        let total = fields.iter().take(8).sum();
        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        Some((name, Self { total, idle }))
    }

    /// Busy share of this interval, rounded to 2 decimals.
    pub fn utilization(&self) -> f64 {
        round2(percent(self.total.saturating_sub(self.idle), self.total))
    }
}

impl CounterSet for CpuTicks {
    fn checked_delta(&self, previous: &Self) -> Option<Self> {
        Some(Self {
            total: self.total.checked_sub(previous.total)?,
            idle: self.idle.checked_sub(previous.idle)?,
        })
    }
}

/// Parse the CPU lines of `/proc/stat` (aggregate `cpu` plus `cpuN`).
pub fn parse_proc_stat(raw: &str) -> Result<Snapshot<CpuTicks>> {
    let snapshot: Snapshot<CpuTicks> = raw
        .lines()
        .filter_map(CpuTicks::parse_line)
        .collect();
    if snapshot.is_empty() {
        return Err(SampleError::parse("/proc/stat", "no cpu lines"));
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Block device statistics
// ---------------------------------------------------------------------------

/// One line of `/sys/block/<dev>/stat`, by field name.
///
/// Kernels before 4.18 stop after `time_in_queue`; before 5.5 after the
/// discard group. Missing trailing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStat {
    pub read_ios: u64,
    pub read_merges: u64,
    pub read_sectors: u64,
    pub read_ticks: u64,
    pub write_ios: u64,
    pub write_merges: u64,
    pub write_sectors: u64,
    pub write_ticks: u64,
    /// Gauge, not a counter: carried through deltas unchanged.
    pub in_flight: u64,
    pub io_ticks: u64,
    pub time_in_queue: u64,
    pub discard_ios: u64,
    pub discard_merges: u64,
    pub discard_sectors: u64,
    pub discard_ticks: u64,
    pub flush_ios: u64,
    pub flush_ticks: u64,
}

impl BlockStat {
    pub const MIN_FIELDS: usize = 11;

    pub fn parse(raw: &str) -> Result<Self> {
        let fields: Vec<u64> = raw
            .split_whitespace()
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|e| SampleError::parse("block stat", format!("{s:?}: {e}")))
            })
            .collect::<Result<_>>()?;
        if fields.len() < Self::MIN_FIELDS {
            return Err(SampleError::parse(
                "block stat",
                format!("expected at least {} fields, got {}", Self::MIN_FIELDS, fields.len()),
            ));
        }
        let f = |i: usize| fields.get(i).copied().unwrap_or(0);
        Ok(Self {
            read_ios: f(0),
            read_merges: f(1),
            read_sectors: f(2),
            read_ticks: f(3),
            write_ios: f(4),
            write_merges: f(5),
            write_sectors: f(6),
            write_ticks: f(7),
            in_flight: f(8),
            io_ticks: f(9),
            time_in_queue: f(10),
            discard_ios: f(11),
            discard_merges: f(12),
            discard_sectors: f(13),
            discard_ticks: f(14),
            flush_ios: f(15),
            flush_ticks: f(16),
        })
    }

    pub fn read_bytes(&self) -> u64 {
        self.read_sectors.saturating_mul(SECTOR_BYTES)
    }

    pub fn write_bytes(&self) -> u64 {
        self.write_sectors.saturating_mul(SECTOR_BYTES)
    }
}

impl CounterSet for BlockStat {
    fn checked_delta(&self, p: &Self) -> Option<Self> {
        Some(Self {
            read_ios: self.read_ios.checked_sub(p.read_ios)?,
            read_merges: self.read_merges.checked_sub(p.read_merges)?,
            read_sectors: self.read_sectors.checked_sub(p.read_sectors)?,
            read_ticks: self.read_ticks.checked_sub(p.read_ticks)?,
            write_ios: self.write_ios.checked_sub(p.write_ios)?,
            write_merges: self.write_merges.checked_sub(p.write_merges)?,
            write_sectors: self.write_sectors.checked_sub(p.write_sectors)?,
            write_ticks: self.write_ticks.checked_sub(p.write_ticks)?,
            in_flight: self.in_flight,
            io_ticks: self.io_ticks.checked_sub(p.io_ticks)?,
            time_in_queue: self.time_in_queue.checked_sub(p.time_in_queue)?,
            discard_ios: self.discard_ios.checked_sub(p.discard_ios)?,
            discard_merges: self.discard_merges.checked_sub(p.discard_merges)?,
            discard_sectors: self.discard_sectors.checked_sub(p.discard_sectors)?,
            discard_ticks: self.discard_ticks.checked_sub(p.discard_ticks)?,
            flush_ios: self.flush_ios.checked_sub(p.flush_ios)?,
            flush_ticks: self.flush_ticks.checked_sub(p.flush_ticks)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Network interface byte counters
// ---------------------------------------------------------------------------

/// Received/transmitted byte counters for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetBytes {
    pub rx: u64,
    pub tx: u64,
}

impl CounterSet for NetBytes {
    fn checked_delta(&self, previous: &Self) -> Option<Self> {
        Some(Self {
            rx: self.rx.checked_sub(previous.rx)?,
            tx: self.tx.checked_sub(previous.tx)?,
        })
    }
}

/// Parse `/proc/net/dev`. Malformed interface lines are skipped.
pub fn parse_net_dev(raw: &str) -> Snapshot<NetBytes> {
    raw.lines()
        .skip(2)
        .filter_map(|line| {
            let (iface, stats) = line.split_once(':')?;
            let fields: Vec<u64> = stats
                .split_whitespace()
                .filter_map(|s| s.parse::<u64>().ok())
                .collect();
            if fields.len() < 16 {
                return None;
            }
            Some((
                iface.trim().to_string(),
                NetBytes {
                    rx: fields[0],
                    tx: fields[8],
                },
            ))
        })
        .collect()
}
