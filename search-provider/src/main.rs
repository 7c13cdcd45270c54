use std::env;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use search_provider::{Dependencies, Settings, StartupError};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Result<(), StartupError> {
    let settings = Settings::from_env()?;
    let dependencies = Dependencies::new(settings).await?;

    info!(
        document_types = dependencies.document_types.len(),
        "Search provider ready, waiting for shutdown signal"
    );
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Search provider failed to start");
            ExitCode::FAILURE
        }
    }
}
