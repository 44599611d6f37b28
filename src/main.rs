use std::error::Error;

use ai_llm_service::error_handler::ProcessEnv;
use ai_llm_service::telemetry;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file if present.
    let dotenv = dotenvy::dotenv();

    telemetry::init_subscriber("info")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, ".env ignored"),
    }

    let state = api::AppState::from_env(&ProcessEnv)?;
    api::start(state).await?;

    Ok(())
}
