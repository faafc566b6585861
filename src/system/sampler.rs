//! Block-device I/O rates from an external `iostat` pipeline.
//!
//! The pipeline is configured once and must print exactly five numeric
//! fields: reads/s, writes/s, MB read/s, MB written/s and utilization %.

use std::fmt;
use std::num::ParseFloatError;

use thiserror::Error;
use tracing::debug;

use super::exec::run_shell;

pub const DEFAULT_IOSTAT_CMD: &str =
    "iostat -dmx 1 2 nvme3n1|tail -n 2|tr -s ' '|cut -d ' ' -f2,3,4,5,16";

const FIELD_COUNT: usize = 5;

/// Positional fields of the sampler output, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskField {
    Read,
    Write,
    ReadMb,
    WriteMb,
    Util,
}

impl DiskField {
    pub const ORDER: [DiskField; FIELD_COUNT] = [
        DiskField::Read,
        DiskField::Write,
        DiskField::ReadMb,
        DiskField::WriteMb,
        DiskField::Util,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DiskField::Read => "read",
            DiskField::Write => "write",
            DiskField::ReadMb => "readmb",
            DiskField::WriteMb => "writemb",
            DiskField::Util => "util",
        }
    }
}

impl fmt::Display for DiskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("error while getting iostat: failed to run command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("error while getting iostat: exit status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },
    #[error("error while getting iostat: {0}")]
    Stderr(String),
    #[error("error while parsing iostat: expected {expected} fields, found {found} in {output:?}")]
    FieldCount {
        expected: usize,
        found: usize,
        output: String,
    },
    #[error("error while parsing {field} iostat: invalid value {token:?}: {source}")]
    Field {
        field: DiskField,
        token: String,
        #[source]
        source: ParseFloatError,
    },
}

/// One successful sampler invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskSample {
    pub tps: f64,
    pub reads: f64,
    pub writes: f64,
    pub read_mbps: f64,
    pub write_mbps: f64,
    pub util: f64,
}

pub trait DiskSampler {
    fn sample(&self) -> Result<DiskSample, SamplingError>;
}

/// Runs the configured pipeline through `bash -c`.
#[derive(Debug, Clone)]
pub struct IostatSampler {
    pipeline: String,
}

impl IostatSampler {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
        }
    }
}

impl DiskSampler for IostatSampler {
    fn sample(&self) -> Result<DiskSample, SamplingError> {
        let output = run_shell(&self.pipeline).map_err(SamplingError::Spawn)?;

        if !output.success() {
            return Err(SamplingError::ExitStatus {
                code: output.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        // stdout must be machine-parsed, so any stderr noise is fatal here
        if !output.stderr.is_empty() {
            return Err(SamplingError::Stderr(output.stderr.trim().to_string()));
        }

        debug!(stdout = %output.stdout.trim(), "iostat sample");
        parse_iostat_output(&output.stdout)
    }
}

/// Parses `reads writes readmb writemb util` into a [`DiskSample`].
pub fn parse_iostat_output(stdout: &str) -> Result<DiskSample, SamplingError> {
    let trimmed = stdout.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() != FIELD_COUNT {
        return Err(SamplingError::FieldCount {
            expected: FIELD_COUNT,
            found: tokens.len(),
            output: trimmed.to_string(),
        });
    }

    let mut values = [0.0_f64; FIELD_COUNT];
    for ((slot, token), field) in values.iter_mut().zip(&tokens).zip(DiskField::ORDER) {
        *slot = token.parse().map_err(|source| SamplingError::Field {
            field,
            token: (*token).to_string(),
            source,
        })?;
    }

    let [reads, writes, read_mbps, write_mbps, util] = values;
    Ok(DiskSample {
        tps: reads + writes,
        reads,
        writes,
        read_mbps,
        write_mbps,
        util,
    })
}
