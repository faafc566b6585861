use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};
use tracing::{info, warn};

use super::{ApplyError, Parameter, ParameterApplier};
use crate::config::EngineTarget;

/// One live server session able to change settings.
#[async_trait]
pub trait ParameterSession: Send {
    async fn set_parameter(&mut self, param: &Parameter) -> Result<(), sqlx::Error>;
}

pub struct PgSession {
    conn: PgConnection,
}

impl PgSession {
    pub async fn connect(dsn: &str) -> Result<Self, sqlx::Error> {
        let conn = PgConnection::connect(dsn).await?;
        Ok(PgSession { conn })
    }

    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}

#[async_trait]
impl ParameterSession for PgSession {
    async fn set_parameter(&mut self, param: &Parameter) -> Result<(), sqlx::Error> {
        // ALTER SYSTEM refuses to run inside a transaction block
        let statement = alter_system_statement(param);
        let conn: &mut PgConnection = &mut self.conn;
        conn.execute(sqlx::raw_sql(&statement)).await?;
        conn.execute("SELECT pg_reload_conf()").await?;
        Ok(())
    }
}

/// GUC names: a letter or underscore, then letters, digits, `_` or `.`.
pub fn is_valid_setting_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn alter_system_statement(param: &Parameter) -> String {
    format!(
        "ALTER SYSTEM SET {} = {}",
        param.name,
        quote_literal(&param.value)
    )
}

/// Applies `params` one at a time; stops at the first failure.
pub async fn apply_in_session<S>(session: &mut S, params: &[Parameter]) -> Result<(), ApplyError>
where
    S: ParameterSession + ?Sized,
{
    for (index, param) in params.iter().enumerate() {
        let position = index + 1;
        if !is_valid_setting_name(&param.name) {
            return Err(ApplyError::InvalidName {
                name: param.name.clone(),
                position,
            });
        }
        session
            .set_parameter(param)
            .await
            .map_err(|source| ApplyError::Rejected {
                name: param.name.clone(),
                position,
                source,
            })?;
        info!(name = %param.name, value = %param.value, "postgres parameter applied");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresApplier {
    dsn: String,
}

impl PostgresApplier {
    pub fn new(dsn: impl Into<String>) -> Self {
        PostgresApplier { dsn: dsn.into() }
    }
}

#[async_trait]
impl ParameterApplier for PostgresApplier {
    fn engine(&self) -> EngineTarget {
        EngineTarget::Postgres
    }

    async fn apply(&self, params: &[Parameter]) -> Result<(), ApplyError> {
        let mut session = PgSession::connect(&self.dsn)
            .await
            .map_err(ApplyError::Connect)?;

        let result = apply_in_session(&mut session, params).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close postgres session cleanly");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_session<S: ParameterSession + 'static>() {}

    #[test]
    fn pg_session_is_a_sendable_session() {
        assert_session::<PgSession>();
    }

    #[test]
    fn setting_names() {
        assert!(is_valid_setting_name("shared_buffers"));
        assert!(is_valid_setting_name("auto_explain.log_min_duration"));
        assert!(is_valid_setting_name("_private"));
        assert!(!is_valid_setting_name(""));
        assert!(!is_valid_setting_name("1abc"));
        assert!(!is_valid_setting_name("work_mem; DROP TABLE t"));
        assert!(!is_valid_setting_name("a-b"));
    }

    #[test]
    fn values_are_quoted_literals() {
        assert_eq!(
            alter_system_statement(&Parameter::new("work_mem", "64MB")),
            "ALTER SYSTEM SET work_mem = '64MB'"
        );
        assert_eq!(
            alter_system_statement(&Parameter::new("search_path", "it's")),
            "ALTER SYSTEM SET search_path = 'it''s'"
        );
    }
}
