//! Auto-scaling unit selection for wide-range metrics.
//!
//! A [`ScaleLadder`] is an ordered list of `(label, multiplier)` rungs, e.g.
//! Bytes/s → KiB/s → MiB/s → GiB/s. [`ScaleState`] tracks the current rung.
//! Stepping up happens when an incoming scaled value exceeds
//! [`UPPER_THRESHOLD`]; stepping down when the whole window's maximum falls
//! below [`LOWER_THRESHOLD`]. The gap between the two thresholds keeps the
//! unit from flapping on values near a boundary.

use serde::{Deserialize, Serialize};

/// Step up when any incoming scaled value is above this.
pub const UPPER_THRESHOLD: f64 = 1024.0;
/// Step down when the window maximum (scaled) is below this.
pub const LOWER_THRESHOLD: f64 = 1.0;

/// Round axis ceilings, ascending.
pub const CEILINGS: [f64; 9] = [4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0];

/// One unit of a ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rung {
    pub label: String,
    pub multiplier: f64,
}

/// Ordered units, smallest multiplier first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleLadder {
    rungs: Vec<Rung>,
}

impl ScaleLadder {
    /// Build a ladder; rungs are sorted by multiplier. An empty list yields
    /// a single unit rung so the ladder is never empty.
    pub fn new<S: Into<String>>(rungs: impl IntoIterator<Item = (S, f64)>) -> Self {
        let mut rungs: Vec<Rung> = rungs
            .into_iter()
            .filter(|(_, m)| m.is_finite() && *m > 0.0)
            .map(|(label, multiplier)| Rung {
                label: label.into(),
                multiplier,
            })
            .collect();
        rungs.sort_by(|a, b| a.multiplier.total_cmp(&b.multiplier));
        if rungs.is_empty() {
            rungs.push(Rung {
                label: String::new(),
                multiplier: 1.0,
            });
        }
        Self { rungs }
    }

    /// Bytes/s, KiB/s, MiB/s, GiB/s.
    pub fn bytes_per_second() -> Self {
        Self::new([
            ("Bytes/s", 1.0),
            ("KiB/s", 1024.0),
            ("MiB/s", 1024.0 * 1024.0),
            ("GiB/s", 1024.0 * 1024.0 * 1024.0),
        ])
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn rung(&self, index: usize) -> &Rung {
        &self.rungs[index.min(self.rungs.len() - 1)]
    }
}

/// Current position on a ladder. Created with a chart, never persisted.
#[derive(Debug, Clone)]
pub struct ScaleState {
    ladder: ScaleLadder,
    index: usize,
}

impl ScaleState {
    pub fn new(ladder: ScaleLadder) -> Self {
        Self { ladder, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &str {
        &self.ladder.rung(self.index).label
    }

    pub fn multiplier(&self) -> f64 {
        self.ladder.rung(self.index).multiplier
    }

    pub fn is_top(&self) -> bool {
        self.index + 1 >= self.ladder.len()
    }

    pub fn is_bottom(&self) -> bool {
        self.index == 0
    }

    /// Raw value expressed in the current unit.
    pub fn scale_value(&self, raw: f64) -> f64 {
        raw / self.multiplier()
    }

    /// Move one rung up. Returns the factor buffered values must be
    /// multiplied by to stay in the current unit, or `None` at the top.
    pub fn step_up(&mut self) -> Option<f64> {
        if self.is_top() {
            return None;
        }
        let old = self.multiplier();
        self.index += 1;
        Some(old / self.multiplier())
    }

    /// Move one rung down. Same contract as [`step_up`](Self::step_up).
    pub fn step_down(&mut self) -> Option<f64> {
        if self.is_bottom() {
            return None;
        }
        let old = self.multiplier();
        self.index -= 1;
        Some(old / self.multiplier())
    }
}

/// Smallest entry of [`CEILINGS`] strictly greater than `max`.
///
/// Values at or beyond the largest entry clamp to it rather than wrapping
/// back to the smallest; the chart then draws clipped lines instead of a
/// misleadingly tiny axis.
pub fn best_fit_ceiling(max: f64) -> f64 {
    CEILINGS
        .iter()
        .copied()
        .find(|&c| max < c)
        .unwrap_or(CEILINGS[CEILINGS.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_sorts_and_never_empties() {
        let ladder = ScaleLadder::new([("k", 1000.0), ("u", 1.0)]);
        assert_eq!(ladder.rung(0).label, "u");
        assert_eq!(ladder.rung(1).label, "k");

        let empty = ScaleLadder::new(Vec::<(String, f64)>::new());
        assert_eq!(empty.len(), 1);
        assert_eq!(empty.rung(0).multiplier, 1.0);
    }

    #[test]
    fn step_up_and_down_are_bounded() {
        let mut s = ScaleState::new(ScaleLadder::bytes_per_second());
        assert_eq!(s.step_down(), None);
        assert_eq!(s.step_up(), Some(1.0 / 1024.0));
        assert_eq!(s.label(), "KiB/s");
        assert_eq!(s.step_up(), Some(1.0 / 1024.0));
        assert_eq!(s.step_up(), Some(1.0 / 1024.0));
        assert_eq!(s.label(), "GiB/s");
        assert_eq!(s.step_up(), None);
        assert_eq!(s.step_down(), Some(1024.0));
        assert_eq!(s.label(), "MiB/s");
    }

    #[test]
    fn rescale_round_trip_restores_value() {
        let mut s = ScaleState::new(ScaleLadder::bytes_per_second());
        let original = 1234.5678;
        let up = s.step_up().unwrap();
        let down = s.step_down().unwrap();
        assert!((original * up * down - original).abs() < 1e-9);
    }

    #[test]
    fn scale_value_divides_by_multiplier() {
        let mut s = ScaleState::new(ScaleLadder::bytes_per_second());
        s.step_up();
        assert_eq!(s.scale_value(2048.0), 2.0);
    }

    #[test]
    fn best_fit_picks_next_round_number() {
        assert_eq!(best_fit_ceiling(0.5), 4.0);
        assert_eq!(best_fit_ceiling(4.0), 8.0);
        assert_eq!(best_fit_ceiling(100.0), 128.0);
        assert_eq!(best_fit_ceiling(1023.9), 1024.0);
    }

    #[test]
    fn best_fit_clamps_instead_of_wrapping() {
        assert_eq!(best_fit_ceiling(1024.0), 1024.0);
        assert_eq!(best_fit_ceiling(5000.0), 1024.0);
    }
}
