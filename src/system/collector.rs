use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::probe::{HostProbe, MemorySample, SysinfoProbe};
use super::sampler::{DiskSampler, IostatSampler, SamplingError};
use super::snapshot::{HostInfoReport, MetricsSnapshot};
use crate::format::bytes_to_gb;

pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    Host,
    Cpu,
    Load,
    Memory,
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricSource::Host => "host",
            MetricSource::Cpu => "cpu",
            MetricSource::Load => "load",
            MetricSource::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("error while getting {facility} info: {reason}")]
    Unavailable {
        facility: MetricSource,
        reason: String,
    },
    #[error("error while getting disk metrics: {0}")]
    Disk(#[from] SamplingError),
}

impl CollectionError {
    pub fn unavailable(facility: MetricSource, reason: impl Into<String>) -> Self {
        CollectionError::Unavailable {
            facility,
            reason: reason.into(),
        }
    }

    /// Which facility failed; disk failures come from the sampler.
    pub fn facility_name(&self) -> String {
        match self {
            CollectionError::Unavailable { facility, .. } => facility.to_string(),
            CollectionError::Disk(_) => "disk".to_string(),
        }
    }
}

/// `(total - free) / total * 100`, from one memory sample.
pub fn memory_usage_percent(sample: &MemorySample) -> Result<f64, CollectionError> {
    if sample.total == 0 {
        return Err(CollectionError::unavailable(
            MetricSource::Memory,
            "total memory reported as zero",
        ));
    }
    let in_use = sample.total.saturating_sub(sample.free);
    Ok(in_use as f64 / sample.total as f64 * 100.0)
}

pub struct HostStatCollector<P, S> {
    probe: P,
    sampler: S,
}

impl HostStatCollector<SysinfoProbe, IostatSampler> {
    pub fn with_pipeline(pipeline: &str) -> Self {
        HostStatCollector::new(SysinfoProbe::new(), IostatSampler::new(pipeline))
    }
}

impl<P: HostProbe, S: DiskSampler> HostStatCollector<P, S> {
    pub fn new(probe: P, sampler: S) -> Self {
        HostStatCollector { probe, sampler }
    }

    pub fn describe_host(&mut self) -> Result<HostInfoReport, CollectionError> {
        let host = self.probe.identity()?;
        let cpus = self.probe.cpu_units()?;
        let first = cpus
            .first()
            .ok_or_else(|| CollectionError::unavailable(MetricSource::Cpu, "no cpu reported"))?;
        let load = self.probe.load_average()?;
        let mem = self.probe.memory()?;

        Ok(HostInfoReport::new(vec![
            ("OS", host.os),
            (
                "Platform",
                format!("{}-{}", host.platform, host.platform_version),
            ),
            ("Kernel", host.kernel_version),
            ("Uptime", host.uptime_secs.to_string()),
            ("Total Processes", host.process_count.to_string()),
            ("Load Avg", load.to_string()),
            ("CPU", first.model.clone()),
            ("CPU Count", cpus.len().to_string()),
            ("CPU Cores", first.cores.to_string()),
            ("CPU Mhz", first.mhz.to_string()),
            ("Total Memory(GB)", bytes_to_gb(mem.total).to_string()),
            ("Free Memory(GB)", bytes_to_gb(mem.free).to_string()),
            ("Used Memory(GB)", bytes_to_gb(mem.used).to_string()),
        ]))
    }

    /// All-or-nothing: the first failing source fails the snapshot.
    pub fn collect_metrics(&mut self) -> Result<MetricsSnapshot, CollectionError> {
        let cpu = self.probe.cpu_usage(CPU_SAMPLE_WINDOW)?;
        let memory = memory_usage_percent(&self.probe.memory()?)?;
        let load = self.probe.load_average()?;
        let disk = self.sampler.sample()?;

        Ok(MetricsSnapshot::new(cpu, memory, load, disk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::probe::{CpuUnit, HostIdentity};
    use crate::system::sampler::{DiskSample, parse_iostat_output};

    const GIB: u64 = 1024 * 1024 * 1024;

    struct FakeProbe {
        cpus: Vec<CpuUnit>,
        memory: MemorySample,
        load_fails: bool,
    }

    impl Default for FakeProbe {
        fn default() -> Self {
            FakeProbe {
                cpus: vec![
                    CpuUnit {
                        model: "Test CPU @ 2.50GHz".into(),
                        cores: 4,
                        mhz: 2500,
                    };
                    8
                ],
                memory: MemorySample {
                    total: 16 * GIB,
                    free: 6 * GIB + GIB / 2,
                    used: 9 * GIB,
                },
                load_fails: false,
            }
        }
    }

    impl HostProbe for FakeProbe {
        fn identity(&mut self) -> Result<HostIdentity, CollectionError> {
            Ok(HostIdentity {
                os: "linux".into(),
                platform: "ubuntu".into(),
                platform_version: "22.04".into(),
                kernel_version: "5.15.0-91-generic".into(),
                uptime_secs: 86400,
                process_count: 312,
            })
        }

        fn cpu_units(&mut self) -> Result<Vec<CpuUnit>, CollectionError> {
            Ok(self.cpus.clone())
        }

        fn cpu_usage(&mut self, _window: Duration) -> Result<f64, CollectionError> {
            Ok(37.5)
        }

        fn load_average(&mut self) -> Result<f64, CollectionError> {
            if self.load_fails {
                return Err(CollectionError::unavailable(
                    MetricSource::Load,
                    "/proc/loadavg unreadable",
                ));
            }
            Ok(1.25)
        }

        fn memory(&mut self) -> Result<MemorySample, CollectionError> {
            Ok(self.memory)
        }
    }

    struct FixedSampler(&'static str);

    impl DiskSampler for FixedSampler {
        fn sample(&self) -> Result<DiskSample, SamplingError> {
            parse_iostat_output(self.0)
        }
    }

    #[test]
    fn memory_percent_from_single_sample() {
        let sample = MemorySample {
            total: 100,
            free: 30,
            used: 70,
        };
        assert_eq!(memory_usage_percent(&sample).unwrap(), 70.0);
    }

    #[test]
    fn memory_percent_rejects_zero_total() {
        let sample = MemorySample {
            total: 0,
            free: 0,
            used: 0,
        };
        let err = memory_usage_percent(&sample).unwrap_err();
        assert_eq!(err.facility_name(), "memory");
    }

    #[test]
    fn collects_full_snapshot() {
        let mut collector =
            HostStatCollector::new(FakeProbe::default(), FixedSampler("4 6 0.5 1.5 20"));
        let snapshot = collector.collect_metrics().unwrap();
        assert_eq!(snapshot.cpu_usage, 37.5);
        assert_eq!(snapshot.memory_usage, 59.375);
        assert_eq!(snapshot.load_avg, 1.25);
        assert_eq!(snapshot.disk_tps, 10.0);
        assert_eq!(snapshot.reads, 4.0);
        assert_eq!(snapshot.writes, 6.0);
        assert_eq!(snapshot.read_mbps, 0.5);
        assert_eq!(snapshot.write_mbps, 1.5);
        assert_eq!(snapshot.util, 20.0);
    }

    #[test]
    fn sampler_failure_fails_whole_snapshot() {
        let mut collector =
            HostStatCollector::new(FakeProbe::default(), FixedSampler("4 6 0.5"));
        let err = collector.collect_metrics().unwrap_err();
        assert_eq!(err.facility_name(), "disk");
        assert!(matches!(
            err,
            CollectionError::Disk(SamplingError::FieldCount { .. })
        ));
    }

    #[test]
    fn load_failure_names_source() {
        let probe = FakeProbe {
            load_fails: true,
            ..FakeProbe::default()
        };
        let mut collector = HostStatCollector::new(probe, FixedSampler("1 1 1 1 1"));
        let err = collector.collect_metrics().unwrap_err();
        assert_eq!(err.facility_name(), "load");
        assert_eq!(
            err.to_string(),
            "error while getting load info: /proc/loadavg unreadable"
        );
    }

    #[test]
    fn describe_host_uses_first_cpu_and_whole_gigabytes() {
        let mut collector =
            HostStatCollector::new(FakeProbe::default(), FixedSampler("1 1 1 1 1"));
        let report = collector.describe_host().unwrap();
        assert_eq!(report.get("Platform"), Some("ubuntu-22.04"));
        assert_eq!(report.get("CPU"), Some("Test CPU @ 2.50GHz"));
        assert_eq!(report.get("CPU Count"), Some("8"));
        assert_eq!(report.get("CPU Cores"), Some("4"));
        assert_eq!(report.get("Load Avg"), Some("1.25"));
        assert_eq!(report.get("Total Memory(GB)"), Some("16"));
        assert_eq!(report.get("Free Memory(GB)"), Some("6"));
        assert_eq!(report.get("Used Memory(GB)"), Some("9"));
    }

    #[test]
    fn describe_host_layout() {
        let mut collector =
            HostStatCollector::new(FakeProbe::default(), FixedSampler("1 1 1 1 1"));
        let rendered = collector.describe_host().unwrap().render();
        let expected = concat!(
            "               OS linux\n",
            "         Platform ubuntu-22.04\n",
            "           Kernel 5.15.0-91-generic\n",
            "           Uptime 86400\n",
            "  Total Processes 312\n",
            "         Load Avg 1.25\n",
            "              CPU Test CPU @ 2.50GHz\n",
            "        CPU Count 8\n",
            "        CPU Cores 4\n",
            "          CPU Mhz 2500\n",
            " Total Memory(GB) 16\n",
            "  Free Memory(GB) 6\n",
            "  Used Memory(GB) 9\n",
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn describe_host_without_cpus_fails() {
        let probe = FakeProbe {
            cpus: Vec::new(),
            ..FakeProbe::default()
        };
        let mut collector = HostStatCollector::new(probe, FixedSampler("1 1 1 1 1"));
        assert_eq!(collector.describe_host().unwrap_err().facility_name(), "cpu");
    }
}
