//! Rolling window store.
//!
//! A [`RollingWindow`] holds one bounded FIFO buffer per named series.
//! Appends are O(1) amortized; eviction pops from the front of each
//! `VecDeque` until only ticks in `(current - W, current]` remain, so a
//! series never holds more than W samples and its ticks are always a
//! contiguous suffix of the ticks it has seen.
//!
//! "No data" is stored as `None` and never coerced to zero.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub tick: u64,
    pub value: Option<f64>,
}

/// Immutable copy of one series, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl SeriesSnapshot {
    /// Most recent present value.
    pub fn latest(&self) -> Option<f64> {
        self.samples.iter().rev().find_map(|s| s.value)
    }
}

#[derive(Debug, Clone)]
struct Series {
    name: String,
    samples: VecDeque<Sample>,
}

/// Samples reserved up front per series; the deque grows to W on demand.
const PREALLOC: usize = 256;

/// Fixed-capacity per-series sample buffers.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    series: Vec<Series>,
    last_tick: Option<u64>,
}

impl RollingWindow {
    /// `capacity` is W; values below 1 are raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: Vec::new(),
            last_tick: None,
        }
    }

    pub fn with_series<S: Into<String>>(capacity: usize, names: impl IntoIterator<Item = S>) -> Self {
        let mut window = Self::new(capacity);
        for name in names {
            window.add_series(name);
        }
        window
    }

    /// Register a series; returns its index.
    pub fn add_series(&mut self, name: impl Into<String>) -> usize {
        self.series.push(Series {
            name: name.into(),
            samples: VecDeque::with_capacity(self.capacity.min(PREALLOC)),
        });
        self.series.len() - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Append one value per series at `tick`, then evict expired samples.
    ///
    /// `values` pairs with series by position: missing trailing entries are
    /// stored as no data, extra entries are ignored. A tick that is not newer
    /// than the last appended one is dropped so ticks stay strictly increasing.
    /// Returns whether the tick was stored.
    pub fn append(&mut self, tick: u64, values: &[Option<f64>]) -> bool {
        if self.last_tick.is_some_and(|last| tick <= last) {
            log::debug!("dropping stale tick {tick} (last {:?})", self.last_tick);
            return false;
        }
        for (i, series) in self.series.iter_mut().enumerate() {
            let value = values.get(i).copied().flatten().filter(|v| v.is_finite());
            series.samples.push_back(Sample { tick, value });
        }
        self.last_tick = Some(tick);
        self.evict(tick);
        true
    }

    fn evict(&mut self, current: u64) {
        let capacity = self.capacity as u64;
        for series in &mut self.series {
            while series
                .samples
                .front()
                .is_some_and(|s| s.tick.saturating_add(capacity) <= current)
            {
                series.samples.pop_front();
            }
        }
    }

    /// Values of one series, oldest first.
    pub fn values(&self, index: usize) -> Vec<Option<f64>> {
        self.series
            .get(index)
            .map(|s| s.samples.iter().map(|p| p.value).collect())
            .unwrap_or_default()
    }

    pub fn len(&self, index: usize) -> usize {
        self.series.get(index).map_or(0, |s| s.samples.len())
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.samples.is_empty())
    }

    /// Largest present value across all series.
    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flat_map(|s| s.samples.iter().filter_map(|p| p.value))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }

    /// Multiply every buffered value by `factor` (unit rescaling).
    pub fn rescale(&mut self, factor: f64) {
        for series in &mut self.series {
            for sample in &mut series.samples {
                if let Some(v) = sample.value.as_mut() {
                    *v *= factor;
                }
            }
        }
    }

    pub fn snapshot(&self) -> Vec<SeriesSnapshot> {
        self.series
            .iter()
            .map(|s| SeriesSnapshot {
                name: s.name.clone(),
                samples: s.samples.iter().copied().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_capacity_does_not_reserve_up_front() {
        let mut window = RollingWindow::with_series(usize::MAX, ["a", "b"]);
        assert_eq!(window.capacity(), usize::MAX);
        assert!(window.append(0, &[Some(1.0), None]));
        assert!(window.append(1, &[Some(2.0), Some(3.0)]));
        assert_eq!(window.values(0), vec![Some(1.0), Some(2.0)]);
        assert_eq!(window.values(1), vec![None, Some(3.0)]);
    }

    fn ticks(window: &RollingWindow, index: usize) -> Vec<u64> {
        window.snapshot()[index].samples.iter().map(|s| s.tick).collect()
    }

    #[test]
    fn length_is_bounded_by_capacity() {
        for capacity in [1usize, 3, 10] {
            for n in 0..25u64 {
                let mut w = RollingWindow::with_series(capacity, ["a", "b"]);
                for t in 0..n {
                    w.append(t, &[Some(t as f64), None]);
                }
                assert_eq!(w.len(0), (n as usize).min(capacity));
                assert_eq!(w.len(1), (n as usize).min(capacity));
            }
        }
    }

    #[test]
    fn stored_ticks_are_contiguous_suffix() {
        let mut w = RollingWindow::with_series(4, ["a"]);
        for t in 10..20 {
            w.append(t, &[Some(1.0)]);
        }
        assert_eq!(ticks(&w, 0), vec![16, 17, 18, 19]);
    }

    #[test]
    fn absence_is_preserved() {
        let mut w = RollingWindow::with_series(5, ["a"]);
        w.append(0, &[Some(0.0)]);
        w.append(1, &[None]);
        w.append(2, &[Some(f64::NAN)]);
        assert_eq!(w.values(0), vec![Some(0.0), None, None]);
    }

    #[test]
    fn short_value_list_pads_with_no_data() {
        let mut w = RollingWindow::with_series(5, ["a", "b"]);
        w.append(0, &[Some(2.0)]);
        assert_eq!(w.values(1), vec![None]);
    }

    #[test]
    fn stale_tick_is_rejected() {
        let mut w = RollingWindow::with_series(5, ["a"]);
        assert!(w.append(3, &[Some(1.0)]));
        assert!(!w.append(3, &[Some(2.0)]));
        assert!(!w.append(1, &[Some(2.0)]));
        assert_eq!(w.values(0), vec![Some(1.0)]);
    }

    #[test]
    fn gap_in_ticks_evicts_by_tick_not_count() {
        let mut w = RollingWindow::with_series(3, ["a"]);
        w.append(0, &[Some(1.0)]);
        w.append(1, &[Some(2.0)]);
        w.append(10, &[Some(3.0)]);
        assert_eq!(ticks(&w, 0), vec![10]);
    }

    #[test]
    fn max_skips_absent_values() {
        let mut w = RollingWindow::with_series(5, ["a", "b"]);
        assert_eq!(w.max_value(), None);
        w.append(0, &[None, Some(3.5)]);
        w.append(1, &[Some(2.0), None]);
        assert_eq!(w.max_value(), Some(3.5));
    }

    #[test]
    fn rescale_touches_only_present_values() {
        let mut w = RollingWindow::with_series(5, ["a"]);
        w.append(0, &[Some(2048.0)]);
        w.append(1, &[None]);
        w.rescale(1.0 / 1024.0);
        assert_eq!(w.values(0), vec![Some(2.0), None]);
    }

    #[test]
    fn latest_skips_trailing_gaps() {
        let mut w = RollingWindow::with_series(5, ["a"]);
        w.append(0, &[Some(7.0)]);
        w.append(1, &[None]);
        assert_eq!(w.snapshot()[0].latest(), Some(7.0));
    }
}
