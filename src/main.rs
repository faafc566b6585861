use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use dbagent::config::{self, EngineTarget, LogFormat, load_config, load_config_from_path};
use dbagent::http::{self, AppState};
use dbagent::logging::init_tracing;
use dbagent::params::build_applier;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "dbagent",
    about = "Database lifecycle control and host telemetry over HTTP"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8989 or :8989
    #[arg(long)]
    listen: Option<String>,

    /// Database type: mysql or postgres
    #[arg(long, value_enum)]
    db_type: Option<EngineTarget>,

    /// Command to start the database, e.g. "pg_ctlcluster 14 main start"
    #[arg(long)]
    start_cmd: Option<String>,

    /// Command to stop the database, e.g. "pg_ctlcluster 14 main stop"
    #[arg(long)]
    stop_cmd: Option<String>,

    /// PostgreSQL DSN
    #[arg(long)]
    pgdsn: Option<String>,

    /// Path to mysqld.cnf
    #[arg(long)]
    my_cnf_path: Option<PathBuf>,

    /// iostat pipeline; do not use $var or other shell expansions
    #[arg(long)]
    iostat_cmd: Option<String>,

    /// Log output: text or json
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli)?;
    init_tracing(&config.logging.level, config.logging.format)?;

    // an unknown or missing engine stops us here, before anything binds
    let settings = config.validate()?;
    info!(
        engine = settings.engine.as_str(),
        start = %settings.start,
        stop = %settings.stop,
        "configuration loaded"
    );

    let applier = build_applier(&settings);
    http::serve(AppState::new(settings, applier)).await?;
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Result<config::Config> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };

    if let Some(ref listen) = cli.listen {
        config.server.listen = listen.clone();
    }
    if let Some(engine) = cli.db_type {
        config.database.engine = Some(engine);
    }
    if let Some(ref cmd) = cli.start_cmd {
        config.lifecycle.start_cmd = Some(cmd.clone());
    }
    if let Some(ref cmd) = cli.stop_cmd {
        config.lifecycle.stop_cmd = Some(cmd.clone());
    }
    if let Some(ref dsn) = cli.pgdsn {
        config.database.pg_dsn = dsn.clone();
    }
    if let Some(ref path) = cli.my_cnf_path {
        config.database.my_cnf_path = path.clone();
    }
    if let Some(ref cmd) = cli.iostat_cmd {
        config.sampler.iostat_cmd = cmd.clone();
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    Ok(config)
}
