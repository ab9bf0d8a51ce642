use patient_tracker::{
    config::TrackerConfig,
    connect::connect,
    dispatcher::Dispatcher,
    logging,
    patient::fixtures,
    repository::PatientRepository,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init()?;

    let config = TrackerConfig::from_env()?;
    info!(backend = %config.backend, collection = %config.collection, "starting patient tracker");

    let store = connect(&config).await?;
    let repository = PatientRepository::new(&store, &config.collection);

    if config.seed_fixtures {
        let fixtures = fixtures();
        repository.seed(&fixtures).await?;
        info!(count = fixtures.len(), "seeded fixture patients");
    }

    let report = Dispatcher::new(repository).run(&config.plan).await;
    match report.failures() {
        0 => info!("all operations completed"),
        failed => warn!(failed, "some operations failed"),
    }

    store.shutdown().await?;

    Ok(())
}
