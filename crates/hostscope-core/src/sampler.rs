//! Sampling scheduler.
//!
//! A [`Sampler`] owns every chart and every adapter. One call to
//! [`Sampler::tick`] is one sampling activation: take the next tick index,
//! run each adapter once, turn failures into "no data" plus a
//! [`Diagnostic`], and append one row per chart at that tick.
//!
//! Ticks never overlap. `tick` needs `&mut self`; across threads,
//! [`SharedSampler::try_tick`] skips a tick rather than waiting when one is
//! already in flight, since interleaved reads would corrupt the adapters'
//! baselines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use crate::adapter::{MetricAdapter, Reading, fail_all};
use crate::chart::{Chart, ChartSnapshot, ScaleChange};
use crate::error::SampleError;

/// Handle to a chart registered with a [`Sampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Sampling,
}

/// One series that produced no data in a tick, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub tick: u64,
    pub adapter: String,
    pub series: String,
    pub error: SampleError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}/{}: {}", self.tick, self.adapter, self.series, self.error)
    }
}

/// Outcome of one sampling activation.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub elapsed: Duration,
    /// Series that received a value (not "no data").
    pub values: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Charts whose unit changed, by title.
    pub scale_changes: Vec<(String, ScaleChange)>,
}

struct Binding {
    adapter: Box<dyn MetricAdapter>,
    chart: usize,
    offset: usize,
    width: usize,
    /// Per-series failure state, so warnings are logged on transitions only.
    failing: Vec<bool>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Binding {
    fn sample(&mut self) -> Vec<Reading> {
        let adapter = &mut self.adapter;
        let mut readings =
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| adapter.sample())) {
                Ok(readings) => readings,
                Err(payload) => fail_all(
                    self.width,
                    &SampleError::Panicked(panic_message(payload.as_ref())),
                ),
            };
        if readings.len() != self.width {
            log::debug!(
                "{} returned {} readings for {} series",
                self.adapter.name(),
                readings.len(),
                self.width
            );
            readings.resize_with(self.width, || {
                Err(SampleError::Missing("reading".to_string()))
            });
        }
        readings
    }
}

/// Owns charts and adapters; drives one tick at a time.
pub struct Sampler {
    charts: Vec<Chart>,
    bindings: Vec<Binding>,
    next_tick: u64,
    state: SamplerState,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            charts: Vec::new(),
            bindings: Vec::new(),
            next_tick: 0,
            state: SamplerState::Idle,
        }
    }

    pub fn add_chart(&mut self, chart: Chart) -> ChartId {
        self.charts.push(chart);
        ChartId(self.charts.len() - 1)
    }

    /// Feed `adapter`'s series into `chart`, after any series already there.
    pub fn attach(&mut self, chart: ChartId, adapter: Box<dyn MetricAdapter>) {
        let target = &mut self.charts[chart.0];
        let offset = target.series_count();
        for name in adapter.series() {
            target.add_series(name.clone());
        }
        let width = adapter.series().len();
        log::debug!(
            "{} -> {} ({width} series)",
            adapter.name(),
            target.title()
        );
        self.bindings.push(Binding {
            adapter,
            chart: chart.0,
            offset,
            width,
            failing: vec![false; width],
        });
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn chart(&self, id: ChartId) -> &Chart {
        &self.charts[id.0]
    }

    pub fn snapshots(&self) -> Vec<ChartSnapshot> {
        self.charts.iter().map(Chart::snapshot).collect()
    }

    pub fn adapter_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Index of the most recent completed tick.
    pub fn last_tick(&self) -> Option<u64> {
        self.next_tick.checked_sub(1)
    }

    /// Run one sampling activation.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        self.state = SamplerState::Sampling;
        let tick = self.next_tick;
        self.next_tick += 1;

        let mut rows: Vec<Vec<Option<f64>>> = self
            .charts
            .iter()
            .map(|c| vec![None; c.series_count()])
            .collect();
        let mut diagnostics = Vec::new();
        let mut values = 0;

        for binding in &mut self.bindings {
            let readings = binding.sample();
            let row = &mut rows[binding.chart];
            for (i, reading) in readings.into_iter().enumerate() {
                let series = &binding.adapter.series()[i];
                match reading {
                    Ok(v) => {
                        row[binding.offset + i] = Some(v);
                        values += 1;
                        if std::mem::take(&mut binding.failing[i]) {
                            log::info!("{series}: readings resumed");
                        }
                    }
                    Err(error) => {
                        if !std::mem::replace(&mut binding.failing[i], true) {
                            log::warn!("{series}: no data ({error})");
                        }
                        diagnostics.push(Diagnostic {
                            tick,
                            adapter: binding.adapter.name().to_string(),
                            series: series.clone(),
                            error,
                        });
                    }
                }
            }
        }

        let mut scale_changes = Vec::new();
        for (chart, row) in self.charts.iter_mut().zip(&rows) {
            if let Some(change) = chart.append(tick, row) {
                scale_changes.push((chart.title().to_string(), change));
            }
        }

        self.state = SamplerState::Idle;
        TickReport {
            tick,
            elapsed: started.elapsed(),
            values,
            diagnostics,
            scale_changes,
        }
    }
}

/// Result of [`SharedSampler::try_tick`].
#[derive(Debug, Clone)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick was still in flight.
    Skipped,
}

/// A [`Sampler`] shared between a sampling thread and readers.
#[derive(Clone)]
pub struct SharedSampler {
    inner: Arc<Mutex<Sampler>>,
}

impl SharedSampler {
    pub fn new(sampler: Sampler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sampler)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sampler> {
        // A panic mid-tick leaves charts valid (rows are appended whole).
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Tick unless one is already running.
    pub fn try_tick(&self) -> TickOutcome {
        match self.inner.try_lock() {
            Ok(mut sampler) => TickOutcome::Completed(sampler.tick()),
            Err(TryLockError::Poisoned(p)) => TickOutcome::Completed(p.into_inner().tick()),
            Err(TryLockError::WouldBlock) => {
                log::debug!("tick skipped: previous tick still running");
                TickOutcome::Skipped
            }
        }
    }

    /// Read access to the sampler (blocks while a tick is running).
    pub fn with<R>(&self, f: impl FnOnce(&Sampler) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshots(&self) -> Vec<ChartSnapshot> {
        self.with(Sampler::snapshots)
    }
}

/// Tick `sampler` every `period` until `shutdown` is set.
///
/// Deadlines missed because a tick overran are skipped, not replayed.
/// `on_tick` runs on this thread after every attempt.
pub fn run_loop(
    sampler: &SharedSampler,
    period: Duration,
    shutdown: &AtomicBool,
    mut on_tick: impl FnMut(&TickOutcome),
) {
    const SLICE: Duration = Duration::from_millis(50);
    let period = period.max(Duration::from_millis(1));
    let mut deadline = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let outcome = sampler.try_tick();
        on_tick(&outcome);

        deadline += period;
        let now = Instant::now();
        if now > deadline {
            let behind = now.duration_since(deadline).as_nanos() / period.as_nanos();
            let missed = u32::try_from(behind).unwrap_or(u32::MAX).saturating_add(1);
            log::debug!("tick overran; skipping {missed} deadline(s)");
            deadline += period.saturating_mul(missed);
        }

        while !shutdown.load(Ordering::Relaxed) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(SLICE));
        }
    }
    log::debug!("sampling loop stopped");
}
