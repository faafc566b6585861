use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::{ApplyError, Parameter, ParameterApplier};
use crate::config::EngineTarget;

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append parameter {parameter} to {}: {source}", path.display())]
    Write {
        parameter: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Appends `name=value` lines to an existing option file.
///
/// Lines are never deduplicated; mysqld applies the last occurrence on its
/// next start.
pub fn append_parameters(path: &Path, params: &[Parameter]) -> Result<(), AppendError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| AppendError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    for param in params {
        // one write per line so concurrent appenders interleave whole lines
        let line = format!("{}={}\n", param.name, param.value);
        file.write_all(line.as_bytes())
            .map_err(|source| AppendError::Write {
                parameter: param.name.clone(),
                path: path.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MysqlApplier {
    cnf_path: PathBuf,
}

impl MysqlApplier {
    pub fn new(cnf_path: impl Into<PathBuf>) -> Self {
        MysqlApplier {
            cnf_path: cnf_path.into(),
        }
    }
}

#[async_trait]
impl ParameterApplier for MysqlApplier {
    fn engine(&self) -> EngineTarget {
        EngineTarget::Mysql
    }

    async fn apply(&self, params: &[Parameter]) -> Result<(), ApplyError> {
        let path = self.cnf_path.clone();
        let params = params.to_vec();
        let count = params.len();

        tokio::task::spawn_blocking(move || append_parameters(&path, &params))
            .await
            .map_err(|e| ApplyError::Task(e.to_string()))??;

        info!(path = %self.cnf_path.display(), count, "appended mysql parameters");
        Ok(())
    }
}
