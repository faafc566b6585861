use std::thread;
use std::time::Duration;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use super::collector::{CollectionError, MetricSource};

#[derive(Debug, Clone, PartialEq)]
pub struct HostIdentity {
    pub os: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub uptime_secs: u64,
    pub process_count: usize,
}

/// One CPU unit as reported by the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuUnit {
    pub model: String,
    pub cores: usize,
    pub mhz: u64,
}

/// Memory counters from a single refresh, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

/// OS facilities the collector reads from.
pub trait HostProbe {
    fn identity(&mut self) -> Result<HostIdentity, CollectionError>;
    fn cpu_units(&mut self) -> Result<Vec<CpuUnit>, CollectionError>;
    /// Global CPU utilization measured across `window`. Blocks for `window`.
    fn cpu_usage(&mut self, window: Duration) -> Result<f64, CollectionError>;
    fn load_average(&mut self) -> Result<f64, CollectionError>;
    fn memory(&mut self) -> Result<MemorySample, CollectionError>;
}

pub struct SysinfoProbe {
    sys: System,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        SysinfoProbe { sys: System::new() }
    }

    fn ensure_supported(source: MetricSource) -> Result<(), CollectionError> {
        if sysinfo::IS_SUPPORTED_SYSTEM {
            Ok(())
        } else {
            Err(CollectionError::unavailable(
                source,
                format!("unsupported platform {}", std::env::consts::OS),
            ))
        }
    }
}

impl HostProbe for SysinfoProbe {
    fn identity(&mut self) -> Result<HostIdentity, CollectionError> {
        Self::ensure_supported(MetricSource::Host)?;

        let kernel_version = System::kernel_version().ok_or_else(|| {
            CollectionError::unavailable(MetricSource::Host, "kernel version not reported")
        })?;

        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        Ok(HostIdentity {
            os: std::env::consts::OS.to_string(),
            platform: System::distribution_id(),
            platform_version: System::os_version().unwrap_or_default(),
            kernel_version,
            uptime_secs: System::uptime(),
            process_count: self.sys.processes().len(),
        })
    }

    fn cpu_units(&mut self) -> Result<Vec<CpuUnit>, CollectionError> {
        Self::ensure_supported(MetricSource::Cpu)?;

        self.sys.refresh_cpu_all();
        let cpus = self.sys.cpus();
        // host-wide count; sysinfo has no per-package topology
        let cores = System::physical_core_count().unwrap_or(cpus.len());
        Ok(cpus
            .iter()
            .map(|cpu| CpuUnit {
                model: cpu.brand().trim().to_string(),
                cores,
                mhz: cpu.frequency(),
            })
            .collect())
    }

    fn cpu_usage(&mut self, window: Duration) -> Result<f64, CollectionError> {
        Self::ensure_supported(MetricSource::Cpu)?;

        // usage is a delta between two refreshes
        self.sys.refresh_cpu_usage();
        thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();

        if self.sys.cpus().is_empty() {
            return Err(CollectionError::unavailable(
                MetricSource::Cpu,
                "no cpu reported",
            ));
        }
        Ok(f64::from(self.sys.global_cpu_usage()))
    }

    fn load_average(&mut self) -> Result<f64, CollectionError> {
        Self::ensure_supported(MetricSource::Load)?;
        Ok(System::load_average().one)
    }

    fn memory(&mut self) -> Result<MemorySample, CollectionError> {
        Self::ensure_supported(MetricSource::Memory)?;

        self.sys.refresh_memory();
        Ok(MemorySample {
            total: self.sys.total_memory(),
            free: self.sys.free_memory(),
            used: self.sys.used_memory(),
        })
    }
}
