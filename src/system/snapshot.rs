use serde::Serialize;

use super::sampler::DiskSample;
use crate::format::render_aligned;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricsSnapshot {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub load_avg: f64,
    pub disk_tps: f64,
    pub reads: f64,
    pub writes: f64,
    pub read_mbps: f64,
    pub write_mbps: f64,
    pub util: f64,
}

impl MetricsSnapshot {
    pub fn new(cpu_usage: f64, memory_usage: f64, load_avg: f64, disk: DiskSample) -> Self {
        MetricsSnapshot {
            cpu_usage,
            memory_usage,
            load_avg,
            disk_tps: disk.tps,
            reads: disk.reads,
            writes: disk.writes,
            read_mbps: disk.read_mbps,
            write_mbps: disk.write_mbps,
            util: disk.util,
        }
    }
}

/// Ordered key/value rows describing the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfoReport {
    rows: Vec<(&'static str, String)>,
}

impl HostInfoReport {
    pub fn new(rows: Vec<(&'static str, String)>) -> Self {
        HostInfoReport { rows }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Right-aligned two-column text block.
    pub fn render(&self) -> String {
        render_aligned(&self.rows)
    }
}
