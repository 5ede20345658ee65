use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use subscout::scheduler::Scheduler;

/// With concurrency N and 10N candidates all blocking on a controllable
/// gate, the number of simultaneously executing tasks never exceeds N.
#[tokio::test]
async fn in_flight_executions_never_exceed_concurrency() {
    const N: usize = 4;
    const CANDIDATES: usize = 10 * N;

    let release = Arc::new(Semaphore::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let scheduler = Scheduler::new(N);
    let run = {
        let release = release.clone();
        let in_flight = in_flight.clone();
        let max_in_flight = max_in_flight.clone();
        tokio::spawn(async move {
            scheduler
                .run((0..CANDIDATES).collect(), move |i: usize| {
                    let release = release.clone();
                    let in_flight = in_flight.clone();
                    let max_in_flight = max_in_flight.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        // Hold the slot until the test opens the gate.
                        let permit = release.acquire().await.unwrap();
                        permit.forget();
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Some(i)
                    }
                })
                .await
        })
    };

    // Let the fan-out saturate the admission gate.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(in_flight.load(Ordering::SeqCst), N);

    release.add_permits(CANDIDATES);
    let results = run.await.unwrap();

    assert_eq!(results.len(), CANDIDATES);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), N);
}

/// Dispatch is unbounded even when the gate is narrow: all candidates are
/// scheduled up front and every one eventually completes.
#[tokio::test]
async fn single_slot_gate_still_drains_every_candidate() {
    let scheduler = Scheduler::new(1);
    let mut results = scheduler
        .run((0u32..25).collect(), |i| async move { Some(i) })
        .await;
    results.sort();
    assert_eq!(results, (0u32..25).collect::<Vec<_>>());
}
