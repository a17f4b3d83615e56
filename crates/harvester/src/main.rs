use std::sync::Arc;

use anyhow::{Context, Result};
use common::{config::AppConfig, logging};
use harvester::{export, metrics, profile_source, GithubClient, Harvester, HttpExec};
use harvester::{ReqwestExecutor, RestGithubClient};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.observability.log_level);

    let exec: Arc<dyn HttpExec> = Arc::new(ReqwestExecutor::new(&config.github.user_agent)?);
    let client: Arc<dyn GithubClient> = Arc::new(RestGithubClient::new(exec, &config.github)?);
    let profiles = profile_source(config.harvester.profile_source, client.clone());
    info!(
        repository = %config.harvester.repository,
        profile_source = profiles.kind(),
        authenticated = config.github.token.is_some(),
        "harvester started"
    );

    let harvester = Harvester::new(config.harvester.clone(), client, profiles);
    let records = harvester.run_once().await?;

    export::write_records_to_path(&config.harvester.output_path, &records)
        .with_context(|| format!("writing {}", config.harvester.output_path))?;
    info!(
        path = %config.harvester.output_path,
        records = records.len(),
        "wrote support requests"
    );

    if let Some(path) = &config.observability.metrics_path {
        metrics::write_text_exposition(path).with_context(|| format!("writing {path}"))?;
    }
    Ok(())
}
