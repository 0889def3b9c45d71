use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use xgt_core::scheduler::{PollJob, SchedulerHandle};

/// A job firing every second whose own body sleeps past the next tick must
/// never run concurrently with itself: `max_instances=1` should skip the
/// overlapping firing rather than queue it.
#[tokio::test]
async fn overlapping_firings_are_skipped_not_queued() {
    let mut scheduler = SchedulerHandle::new().await.expect("scheduler starts");

    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_concurrent = Arc::new(AtomicUsize::new(0));
    let runs = Arc::new(AtomicUsize::new(0));

    let concurrent_job = Arc::clone(&concurrent);
    let max_concurrent_job = Arc::clone(&max_concurrent);
    let runs_job = Arc::clone(&runs);

    scheduler
        .add_job(
            PollJob {
                label: "overlap-test".into(),
                cron_expr: "* * * * * *".into(),
                misfire_grace: std::time::Duration::from_secs(30),
            },
            move || {
                let concurrent = Arc::clone(&concurrent_job);
                let max_concurrent = Arc::clone(&max_concurrent_job);
                let runs = Arc::clone(&runs_job);
                async move {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_concurrent.fetch_max(now, Ordering::SeqCst);
                    runs.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                }
            },
        )
        .await
        .expect("job registers");

    scheduler.start().await.expect("scheduler starts running");
    tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
    scheduler.shutdown(std::time::Duration::from_secs(2)).await.expect("clean shutdown");

    assert!(runs.load(Ordering::SeqCst) >= 1, "job should have fired at least once");
    assert_eq!(max_concurrent.load(Ordering::SeqCst), 1, "no firing should overlap a still-running one");
}
