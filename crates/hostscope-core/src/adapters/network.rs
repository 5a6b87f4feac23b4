//! Per-interface receive/transmit throughput from `/proc/net/dev`.

use std::path::{Path, PathBuf};

use crate::adapter::{MetricAdapter, MetricKind, Reading, fail_all};
use crate::config::is_ignored;
use crate::counters::{self, NetBytes, Snapshot};
use crate::error::{Result, SampleError};

fn read_net_dev(path: &Path) -> Result<Snapshot<NetBytes>> {
    let raw = std::fs::read_to_string(path).map_err(|e| SampleError::read(path, &e))?;
    Ok(counters::parse_net_dev(&raw))
}

/// Interfaces listed in `<proc>/net/dev`, minus `ignore`.
pub fn discover_interfaces(proc_root: &Path, ignore: &[String]) -> Result<Vec<String>> {
    let snapshot = read_net_dev(&proc_root.join("net").join("dev"))?;
    let ifaces: Vec<String> = snapshot
        .keys()
        .filter(|name| !is_ignored(name, ignore))
        .map(str::to_string)
        .collect();
    log::info!("tracking interfaces: {ifaces:?}");
    Ok(ifaces)
}

pub struct NetworkIoAdapter {
    name: String,
    iface: String,
    dev_path: PathBuf,
    previous: Option<NetBytes>,
    series: Vec<String>,
}

impl NetworkIoAdapter {
    pub fn new(proc_root: &Path, iface: &str) -> Self {
        let dev_path = proc_root.join("net").join("dev");
        let previous = read_net_dev(&dev_path)
            .ok()
            .and_then(|s| s.get(iface).copied());
        if previous.is_none() {
            log::warn!("no baseline for interface {iface}");
        }
        Self {
            name: format!("net:{iface}"),
            iface: iface.to_string(),
            dev_path,
            previous,
            series: vec![format!("{iface} Rx"), format!("{iface} Tx")],
        }
    }

    pub fn interface(&self) -> &str {
        &self.iface
    }
}

impl MetricAdapter for NetworkIoAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Throughput
    }

    fn series(&self) -> &[String] {
        &self.series
    }

    fn sample(&mut self) -> Vec<Reading> {
        let current = match read_net_dev(&self.dev_path).and_then(|s| {
            s.get(&self.iface)
                .copied()
                .ok_or_else(|| SampleError::Missing(format!("interface {}", self.iface)))
        }) {
            Ok(bytes) => bytes,
            Err(e) => return fail_all(self.series.len(), &e),
        };
        let d = counters::delta_one(&self.iface, self.previous.as_ref(), &current);
        self.previous = Some(current);
        vec![Ok(d.rx as f64), Ok(d.tx as f64)]
    }
}
