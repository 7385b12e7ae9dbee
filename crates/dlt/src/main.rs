use std::sync::Arc;

use dlt_core::{config::Config, ports::TranslationBackend};
use dlt_google::GoogleTranslateClient;

#[tokio::main]
async fn main() -> Result<(), dlt_core::Error> {
    let cfg = Config::load()?;
    dlt_core::logging::init("dlt", &cfg.log_level)?;
    cfg.ensure_dirs()?;

    tracing::info!(project = %cfg.google_project_id, "using Google Cloud Translation backend");
    let backend: Arc<dyn TranslationBackend> = Arc::new(GoogleTranslateClient::from_config(&cfg)?);

    dlt_telegram::router::run_polling(Arc::new(cfg), backend)
        .await
        .map_err(|e| dlt_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
