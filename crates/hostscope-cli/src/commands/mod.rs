pub mod monitor;
pub mod sample;

use std::path::Path;

use hostscope_core::{Inventory, MonitorConfig, Sampler, build_sampler};

/// Load settings and build the sampler, exiting with status 1 when the CPU
/// counters cannot be read.
pub fn make_sampler(config_path: &Path) -> (MonitorConfig, Sampler, Inventory) {
    let config = MonitorConfig::load(config_path);
    match build_sampler(&config) {
        Ok((sampler, inventory)) => (config, sampler, inventory),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Human-readable byte count (binary units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn print_inventory(inventory: &Inventory) {
    println!("hostscope v{}", hostscope_core::VERSION);
    println!("  CPU cores:   {}", inventory.cpu_cores);
    if inventory.drives.is_empty() {
        println!("  Drives:      none");
    } else {
        let drives: Vec<String> = inventory
            .drives
            .iter()
            .map(|d| format!("{} ({})", d.name, format_bytes(d.size_bytes)))
            .collect();
        println!("  Drives:      {}", drives.join(", "));
    }
    println!(
        "  Interfaces:  {}",
        if inventory.interfaces.is_empty() {
            "none".to_string()
        } else {
            inventory.interfaces.join(", ")
        }
    );
    match &inventory.fan_input {
        Some(path) => println!("  Fan input:   {}", path.display()),
        None => println!("  Fan input:   none"),
    }
    println!();
}
