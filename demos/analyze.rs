//! Runs the driver against a simulated link, probing real download speed over HTTP.
//!
//! ```text
//! RUST_LOG=batch_pacer=debug cargo run --example analyze
//! ```

use batch_pacer::driver::{Driver, DriverConfig, SimulatedTransport};
use batch_pacer::{ControllerConfig, ObjectCountController, ProbeConfig, ProbeResource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MIB: u64 = 1024 * 1024;

fn config() -> ControllerConfig {
    ControllerConfig {
        target_round_duration: Duration::from_secs(4),
        min_round_size: 5,
        max_round_size: 150,
        initial_round_size: Some(20),
        base_increase_step: 2.0,
        base_decrease_factor: 0.85,
        success_rate_threshold: 0.95,
        duration_over_target_factor: 1.3,
        duration_under_target_factor: 0.6,
        speed_smoothing_factor: 0.25,
        duration_smoothing_factor: 0.35,
        probe: ProbeConfig {
            resources: vec![
                ProbeResource::new(
                    "https://freetestdata.com/wp-content/uploads/2022/02/Free_Test_Data_1MB_JPG.jpg",
                    MIB,
                ),
                ProbeResource::new(
                    "https://freetestdata.com/wp-content/uploads/2021/09/Free_Test_Data_2MB_MP3.mp3",
                    2 * MIB,
                ),
            ],
            timeout: Duration::from_secs(20),
        },
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("batch_pacer=debug,analyze=info")),
        )
        .init();

    let controller = Arc::new(ObjectCountController::with_http(config()));
    let driver = Driver::new(
        controller.clone(),
        SimulatedTransport::new(),
        DriverConfig::default(),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver_task = tokio::spawn(driver.run(shutdown_rx));

    let mut report = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = report.tick() => {
                let (round_size, speed) = controller.snapshot();
                info!(speed_mbps = speed.as_mbps(), round_size, "Current estimate");
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Ok(stats) = driver_task.await {
        info!(?stats, "Finished");
    }
}
