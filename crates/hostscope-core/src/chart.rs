//! Chart groups: the consumer-facing unit of the core.
//!
//! A [`Chart`] is a titled group of series sharing one rolling window and
//! one Y axis. Fixed charts store raw values against a fixed range;
//! auto-scaled charts store values in the current ladder unit and rescale
//! the whole window when the unit changes.

use serde::{Deserialize, Serialize};

use crate::scale::{self, LOWER_THRESHOLD, ScaleLadder, ScaleState, UPPER_THRESHOLD};
use crate::window::{RollingWindow, SeriesSnapshot};

/// Axis ceiling of an auto-scaled chart before it has seen data.
const INITIAL_CEILING: f64 = 512.0;

/// Direction of a unit change during one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleChange {
    Up,
    Down,
}

#[derive(Debug, Clone)]
enum Axis {
    Fixed { min: f64, max: f64 },
    Scaled { state: ScaleState, ceiling: f64 },
}

/// Immutable copy of a chart for rendering or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub title: String,
    /// Current unit label for auto-scaled charts.
    pub unit: Option<String>,
    pub y_min: f64,
    pub y_max: f64,
    pub last_tick: Option<u64>,
    pub series: Vec<SeriesSnapshot>,
}

impl ChartSnapshot {
    /// Title with the unit appended, e.g. `"Disk I/O (MiB/s)"`.
    pub fn display_title(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} ({unit})", self.title),
            None => self.title.clone(),
        }
    }
}

/// A titled group of series with one Y axis.
#[derive(Debug, Clone)]
pub struct Chart {
    title: String,
    window: RollingWindow,
    axis: Axis,
}

impl Chart {
    /// A chart whose values are stored as-is against `[min, max]`.
    pub fn fixed(title: impl Into<String>, capacity: usize, min: f64, max: f64) -> Self {
        Self {
            title: title.into(),
            window: RollingWindow::new(capacity),
            axis: Axis::Fixed { min, max },
        }
    }

    /// A chart that picks its unit from `ladder` as magnitudes change.
    pub fn auto_scaled(title: impl Into<String>, capacity: usize, ladder: ScaleLadder) -> Self {
        Self {
            title: title.into(),
            window: RollingWindow::new(capacity),
            axis: Axis::Scaled {
                state: ScaleState::new(ladder),
                ceiling: INITIAL_CEILING,
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Register a series; returns its index within this chart.
    pub fn add_series(&mut self, name: impl Into<String>) -> usize {
        self.window.add_series(name)
    }

    pub fn series_count(&self) -> usize {
        self.window.series_count()
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Current unit label, `None` for fixed charts.
    pub fn unit(&self) -> Option<&str> {
        match &self.axis {
            Axis::Fixed { .. } => None,
            Axis::Scaled { state, .. } => Some(state.label()),
        }
    }

    pub fn y_range(&self) -> (f64, f64) {
        match &self.axis {
            Axis::Fixed { min, max } => (*min, *max),
            Axis::Scaled { ceiling, .. } => (0.0, *ceiling),
        }
    }

    /// Append one raw value (or no data) per series at `tick`.
    ///
    /// On auto-scaled charts, an incoming value above 1024 in the current
    /// unit steps one unit up and a window maximum below 1 steps one unit
    /// down; either way every buffered value is rescaled with it, and the
    /// axis ceiling is refitted.
    pub fn append(&mut self, tick: u64, values: &[Option<f64>]) -> Option<ScaleChange> {
        let Axis::Scaled { state, ceiling } = &mut self.axis else {
            self.window.append(tick, values);
            return None;
        };

        let scaled: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.map(|raw| state.scale_value(raw)))
            .collect();
        let overflow = scaled.iter().flatten().any(|&v| v > UPPER_THRESHOLD);
        if !self.window.append(tick, &scaled) {
            return None;
        }

        let mut change = None;
        if overflow && let Some(factor) = state.step_up() {
            self.window.rescale(factor);
            log::info!("{}: scale up to {}", self.title, state.label());
            change = Some(ScaleChange::Up);
        }

        if let Some(max) = self.window.max_value()
            && max < LOWER_THRESHOLD
            && change.is_none()
            && let Some(factor) = state.step_down()
        {
            self.window.rescale(factor);
            log::info!("{}: scale down to {}", self.title, state.label());
            change = Some(ScaleChange::Down);
        }

        if let Some(max) = self.window.max_value() {
            *ceiling = scale::best_fit_ceiling(max);
        }
        change
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        let (y_min, y_max) = self.y_range();
        ChartSnapshot {
            title: self.title.clone(),
            unit: self.unit().map(str::to_string),
            y_min,
            y_max,
            last_tick: self.window.last_tick(),
            series: self.window.snapshot(),
        }
    }
}
