//! # Word Count Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicia el logging, construye el motor de jobs
//! con el workload de conteo y bloquea atendiendo conexiones.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wordcount_server::config::Config;
use wordcount_server::error::ServerError;
use wordcount_server::jobs::{EngineConfig, JobEngine};
use wordcount_server::server::Server;
use wordcount_server::wordcount::WordCountWorkload;

fn main() -> ExitCode {
    let config = Config::new();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new("wordcount_server=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    config.log_summary();

    let workload = WordCountWorkload::new(config.fetch_timeout())?;
    let engine = Arc::new(JobEngine::new(workload, EngineConfig::from_config(&config))?);

    // `run` sólo retorna si el listener falla; SIGINT termina el proceso
    // sin drenar la cola.
    let server = Server::new(config, Arc::clone(&engine));
    let served = server.run();

    info!("listener closed, draining job queue");
    engine.shutdown();

    served?;
    Ok(())
}
