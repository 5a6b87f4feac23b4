//! The metric adapter capability.
//!
//! Every metric source implements [`MetricAdapter`]: it names the series it
//! produces and, once per tick, yields one [`Reading`] per series. An adapter
//! exclusively owns its previous-snapshot baseline; nothing else reads or
//! mutates it.

use crate::error::SampleError;

/// One series' outcome for a tick: a value, or the reason there is none.
pub type Reading = Result<f64, SampleError>;

/// What kind of quantity an adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Busy percentage, 0–100.
    Utilization,
    /// Bytes per sampling interval.
    Throughput,
    /// Degrees Celsius.
    Temperature,
    /// Revolutions per minute.
    FanSpeed,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utilization => write!(f, "utilization"),
            Self::Throughput => write!(f, "throughput"),
            Self::Temperature => write!(f, "temperature"),
            Self::FanSpeed => write!(f, "fan_speed"),
        }
    }
}

/// Trait that every metric source must implement.
pub trait MetricAdapter: Send {
    /// Stable identifier used in diagnostics (e.g. `"drive:sda"`).
    fn name(&self) -> &str;

    fn kind(&self) -> MetricKind;

    /// Series produced by this adapter, in the order of [`sample`](Self::sample).
    fn series(&self) -> &[String];

    /// Read the source once and return exactly one reading per series.
    ///
    /// Failures stay inside the returned readings; implementations must not
    /// panic on I/O or parse errors.
    fn sample(&mut self) -> Vec<Reading>;
}

/// The same error for each of `n` series.
pub fn fail_all(n: usize, err: &SampleError) -> Vec<Reading> {
    (0..n).map(|_| Err(err.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_all_repeats_error_per_series() {
        let err = SampleError::Missing("fan".to_string());
        let readings = fail_all(3, &err);
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| r.as_ref().is_err_and(|e| *e == err)));
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(MetricKind::FanSpeed.to_string(), "fan_speed");
    }
}
