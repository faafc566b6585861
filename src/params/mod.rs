//! Engine-specific configuration parameter mutation.
//!
//! One applier is selected from [`EngineTarget`] at startup and used for the
//! lifetime of the process. Neither variant rolls back: parameters applied
//! before a failing one stay applied.

pub mod mysql;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{AgentSettings, EngineTarget};

pub use mysql::{AppendError, MysqlApplier};
pub use postgres::{ParameterSession, PgSession, PostgresApplier};

/// A single `name = value` setting, applied in request order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Value")]
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Append(#[from] AppendError),
    #[error("failed to connect to postgres: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("parameter #{position} {name:?} is not a valid setting name")]
    InvalidName { name: String, position: usize },
    #[error("failed to set parameter #{position} {name}: {source}")]
    Rejected {
        name: String,
        position: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("parameter task failed: {0}")]
    Task(String),
}

impl ApplyError {
    /// Name of the parameter that failed, when one can be attributed.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ApplyError::Append(AppendError::Write { parameter, .. }) => Some(parameter),
            ApplyError::InvalidName { name, .. } | ApplyError::Rejected { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ParameterApplier: Send + Sync {
    fn engine(&self) -> EngineTarget;

    async fn apply(&self, params: &[Parameter]) -> Result<(), ApplyError>;
}

pub fn build_applier(settings: &AgentSettings) -> Arc<dyn ParameterApplier> {
    match settings.engine {
        EngineTarget::Mysql => Arc::new(MysqlApplier::new(settings.my_cnf_path.clone())),
        EngineTarget::Postgres => Arc::new(PostgresApplier::new(settings.pg_dsn.clone())),
    }
}
