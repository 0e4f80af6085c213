//! Probes and round reports racing on a shared controller.

pub mod common;

use batch_pacer::ObjectCountController;
use common::harness::{init_tracing, test_config, TimedFetcher, MIB};
use futures::future::join_all;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_probes_and_outcomes_keep_invariants() {
    init_tracing();
    let controller = Arc::new(ObjectCountController::new(
        test_config(),
        TimedFetcher::new(MIB, Duration::from_millis(5)),
    ));
    let (min, max) = (controller.config().min_round_size, controller.config().max_round_size);

    let prober = {
        let controller = controller.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                controller.probe_speed(pending()).await;
            }
        })
    };

    let reporters = (0..4u32).map(|worker| {
        let controller = controller.clone();
        tokio::spawn(async move {
            for n in 0..250u32 {
                let size = controller.round_size();
                let succeeded = if (n + worker) % 3 == 0 { size / 2 } else { size };
                controller.record_outcome(
                    Duration::from_millis(50) * size,
                    size,
                    succeeded,
                );

                let (gated, speed) = controller.snapshot();
                if speed.is_usable() {
                    assert!((min..=max).contains(&gated), "gated size {}", gated);
                } else {
                    assert_eq!(gated, 0);
                }
                tokio::task::yield_now().await;
            }
        })
    });

    prober.await.unwrap();
    for reporter in join_all(reporters).await {
        reporter.unwrap();
    }

    assert_eq!(controller.fetcher().calls(), 20);
    assert!(controller.speed_estimate().is_usable());
    assert_eq!(controller.current_round_size(), controller.round_size());
    assert!((min..=max).contains(&controller.round_size()));
}

#[tokio::test(start_paused = true)]
async fn test_interleaved_probes_all_complete() {
    init_tracing();
    let controller = Arc::new(ObjectCountController::new(
        test_config(),
        TimedFetcher::new(MIB, Duration::from_secs(1)),
    ));

    let probes = (0..8).map(|_| {
        let controller = controller.clone();
        async move { controller.probe_speed(pending()).await }
    });
    let results = join_all(probes).await;

    assert!(results.iter().all(|speed| speed.is_some()));
    assert_eq!(controller.fetcher().calls(), 8);
    assert!((controller.current_speed_mbps() - 8.0).abs() < 1e-6);
}
