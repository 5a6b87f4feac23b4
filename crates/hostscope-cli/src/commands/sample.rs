use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hostscope_core::{ChartSnapshot, SharedSampler, TickOutcome, TickReport, run_loop};

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "—".to_string(),
    }
}

fn print_tick(report: &TickReport, charts: &[ChartSnapshot]) {
    println!(
        "#{}  {}ms  {} values  {} no-data",
        report.tick,
        report.elapsed.as_millis(),
        report.values,
        report.diagnostics.len()
    );
    for chart in charts {
        if chart.series.is_empty() {
            continue;
        }
        let cells: Vec<String> = chart
            .series
            .iter()
            .map(|s| format!("{}={}", s.name, format_value(s.latest())))
            .collect();
        println!("  {:<24} {}", chart.display_title(), cells.join("  "));
    }
    for (title, change) in &report.scale_changes {
        println!("  {title}: unit stepped {change:?}");
    }
}

pub fn run(config_path: &Path, ticks: Option<u64>, json: bool) {
    let (config, sampler, inventory) = super::make_sampler(config_path);
    if !json {
        super::print_inventory(&inventory);
    }
    let shared = SharedSampler::new(sampler);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        eprintln!("Warning: Ctrl+C handler not installed: {e}");
    }

    let mut completed = 0u64;
    run_loop(&shared, config.refresh, &shutdown, |outcome| {
        let TickOutcome::Completed(report) = outcome else {
            return;
        };
        completed += 1;
        if !json {
            print_tick(report, &shared.snapshots());
        }
        if ticks.is_some_and(|n| completed >= n) {
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    if json {
        match serde_json::to_string_pretty(&shared.snapshots()) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error encoding charts: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{completed} ticks sampled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_renders_as_dash() {
        assert_eq!(format_value(None), "—");
        assert_eq!(format_value(Some(12.347)), "12.35");
    }
}
