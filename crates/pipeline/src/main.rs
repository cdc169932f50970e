use anyhow::Context;

use partsync_catalog::CatalogClient;
use partsync_core::SyncConfig;
use partsync_export::XmlExporter;
use partsync_infra::PostgresProductStore;
use partsync_pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();

    let config = SyncConfig::from_env().context("invalid configuration")?;
    partsync_observability::init(Some(&config.paths.log_dir)).context("failed to set up logging")?;

    tracing::info!(
        input = %config.paths.input_dir.display(),
        interval_seconds = config.fetch_interval.as_secs(),
        "program started"
    );

    let catalog = CatalogClient::new(&config).context("failed to build catalog client")?;
    let store = PostgresProductStore::new(&config.database, &config.tables);
    let pipeline = Pipeline::new(
        catalog,
        store,
        XmlExporter::new(&config.paths.result_dir),
        config.fetch_interval,
        &config.paths.archive_dir,
    );

    let reports = pipeline.run_dir(&config.paths.input_dir).await?;
    tracing::info!(files = reports.len(), "program finished");
    Ok(())
}
