use std::path::Path;
use std::time::Duration;

/// `--refresh` in seconds, or `fallback` when it is absent, non-positive or
/// not representable as a `Duration`.
fn resolve_refresh(requested: Option<f64>, fallback: Duration) -> Duration {
    requested
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or(fallback)
}

pub fn run(config_path: &Path, refresh_secs: Option<f64>) {
    let (config, sampler, inventory) = super::make_sampler(config_path);
    let refresh = resolve_refresh(refresh_secs, config.refresh);
    let mut app = crate::tui::app::App::new(sampler, inventory, refresh);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: Duration = Duration::from_secs(1);

    #[test]
    fn refresh_seconds_become_a_duration() {
        assert_eq!(resolve_refresh(Some(0.5), FALLBACK), Duration::from_millis(500));
        assert_eq!(resolve_refresh(None, FALLBACK), FALLBACK);
    }

    #[test]
    fn unrepresentable_refresh_falls_back() {
        for bad in [1e30, f64::INFINITY, f64::NAN, 0.0, -2.0] {
            assert_eq!(resolve_refresh(Some(bad), FALLBACK), FALLBACK, "{bad}");
        }
    }
}
