use airly::{Airly, AirlyError, LatLon, LocationConfig, RefreshOutcome};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), AirlyError> {
    env_logger::init();
    let api_key = env::var("AIRLY_API_KEY").unwrap_or_default();
    let location = LatLon(50.0614, 19.9366);

    let airly = Airly::new()?;
    let check = airly
        .validate_location()
        .api_key(api_key.as_str())
        .location(location)
        .call()
        .await?;

    let mut config = LocationConfig::new(api_key, location);
    config.name = "Kraków".to_string();
    config.use_nearest = check.use_nearest;
    config.scan_interval = 60;

    let coordinator = airly
        .setup_entry()
        .entry_id("krakow")
        .config(config)
        .call()
        .await?;

    if let Some(snapshot) = coordinator.current_snapshot() {
        println!("{:#?}", snapshot.to_map());
    }

    coordinator.subscribe(|outcome: &RefreshOutcome| match outcome {
        RefreshOutcome::Updated(snapshot) => {
            println!("CAQI {} ({}): {}", snapshot.caqi, snapshot.caqi_level, snapshot.description)
        }
        other => println!("Refresh did not update: {:?}", other),
    });

    tokio::time::sleep(Duration::from_secs(180)).await;
    airly.shutdown().await;

    Ok(())
}
