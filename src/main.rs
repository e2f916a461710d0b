use std::sync::Arc;

use anyhow::Context;
use weathervane::config::WeathervaneConfig;
use weathervane::forecast::ForecastClient;
use weathervane::geocoding::NominatimClient;
use weathervane::resolve::ResolutionWorkflow;
use weathervane::store::{self, PgCoordinateStore};
use weathervane::{telemetry, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WeathervaneConfig::load().context("Failed to load configuration")?;
    let _telemetry_guard =
        telemetry::init(&config.telemetry).context("Failed to initialize telemetry")?;

    let pool = store::create_pool(&config.database.url())
        .context("Failed to configure the coordinate store pool")?;
    store::run_migrations(&pool).await;

    let geocoder = NominatimClient::new(
        config.geocoding.base_url.clone(),
        config.geocoding.timeout_seconds,
    )?;
    let forecast = ForecastClient::new(
        config.forecast.base_url.clone(),
        config.forecast.timeout_seconds,
    )?;

    let workflow = Arc::new(ResolutionWorkflow::new(
        Arc::new(PgCoordinateStore::new(pool)),
        Arc::new(geocoder),
        Arc::new(forecast),
        config.server.public_base_url.clone(),
    ));

    web::run(workflow, config.server.port).await
}
