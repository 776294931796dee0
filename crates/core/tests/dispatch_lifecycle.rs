//! Dispatch lifecycle integration tests.
//!
//! These tests drive submissions through the ingestion service and the
//! dispatcher together, on a paused clock:
//! yet_to_start -> triggered -> completed

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use ingestor_core::{
    testing::MockWorker, BatchStatus, BatchUpdateCallback, BatchWorker, Dispatcher,
    DispatcherConfig, IngestionConfig, IngestionService, IngestionStatus, MemoryStatusStore,
    PriorityScheduler, Priority, RateLimiter, StatusStore,
};

/// Test helper wiring the service and dispatcher over shared state.
struct TestHarness {
    service: IngestionService,
    scheduler: Arc<PriorityScheduler>,
    store: Arc<MemoryStatusStore>,
    worker: Arc<MockWorker>,
}

impl TestHarness {
    fn new() -> Self {
        let store = Arc::new(MemoryStatusStore::new());
        let scheduler = Arc::new(PriorityScheduler::new());
        let service = IngestionService::new(
            IngestionConfig::default(),
            Arc::clone(&store) as Arc<dyn StatusStore>,
            Arc::clone(&scheduler),
        );

        Self {
            service,
            scheduler,
            store,
            worker: Arc::new(MockWorker::new()),
        }
    }

    fn create_dispatcher(&self, window_ms: u64) -> Dispatcher {
        let config = DispatcherConfig {
            rate_limit_window_ms: window_ms,
            burst: 1,
            process_delay_ms: 0,
            shutdown_grace_ms: 1000,
        };
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_window(), config.burst));

        Dispatcher::new(
            config,
            Arc::clone(&self.store) as Arc<dyn StatusStore>,
            Arc::clone(&self.scheduler),
            limiter,
            Arc::clone(&self.worker) as Arc<dyn BatchWorker>,
        )
    }

    async fn submit(&self, ids: &[u64], priority: Priority, batch_size: usize) -> String {
        self.service
            .submit(ids, priority, batch_size)
            .await
            .expect("submission should be accepted")
    }

    /// Item ids of each batch in the order its work started.
    async fn started_ids(&self) -> Vec<Vec<u64>> {
        self.worker
            .recorded()
            .await
            .into_iter()
            .map(|w| w.ids)
            .collect()
    }
}

fn assert_spacing(starts: &[Instant], window: Duration) {
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= window,
            "dispatches {:?} apart, expected at least {:?}",
            gap,
            window
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_dispatched_before_earlier_medium() {
    let harness = TestHarness::new();
    harness.worker.set_duration(Duration::from_secs(2)).await;
    let dispatcher = harness.create_dispatcher(5000);

    let first = harness.submit(&[1, 2, 3, 4, 5], Priority::Medium, 3).await;
    let second = harness.submit(&[6, 7, 8, 9], Priority::High, 3).await;

    let t0 = Instant::now();
    dispatcher.start().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = harness.service.get_status(&second).await.unwrap();
    assert_eq!(snapshot.status, IngestionStatus::Triggered);
    let snapshot = harness.service.get_status(&first).await.unwrap();
    assert_eq!(snapshot.status, IngestionStatus::YetToStart);

    tokio::time::sleep(Duration::from_secs(18)).await;

    assert_eq!(
        harness.started_ids().await,
        vec![vec![6, 7, 8], vec![9], vec![1, 2, 3], vec![4, 5]]
    );

    let starts: Vec<_> = harness
        .worker
        .recorded()
        .await
        .iter()
        .map(|w| w.started_at)
        .collect();
    assert!(starts[0] - t0 < Duration::from_millis(10));
    assert_spacing(&starts, Duration::from_secs(5));
    assert!(starts[3] - t0 < Duration::from_millis(15_100));

    for id in [&first, &second] {
        let snapshot = harness.service.get_status(id).await.unwrap();
        assert_eq!(snapshot.status, IngestionStatus::Completed);
        assert!(snapshot
            .batches
            .iter()
            .all(|b| b.status == BatchStatus::Completed));
    }

    dispatcher.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_jumps_queued_low_work() {
    let harness = TestHarness::new();
    let dispatcher = harness.create_dispatcher(1000);

    harness.submit(&[1, 2, 3, 4, 5, 6], Priority::Low, 1).await;
    dispatcher.start().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.worker.work_count().await, 1);

    // Arrives while low work is still queued
    harness.submit(&[100, 101], Priority::High, 1).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        harness.started_ids().await,
        vec![vec![1], vec![100], vec![101]]
    );

    dispatcher.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fifo_within_same_priority() {
    let harness = TestHarness::new();
    let dispatcher = harness.create_dispatcher(1000);

    harness.submit(&[1, 2], Priority::Medium, 1).await;
    harness.submit(&[3], Priority::Medium, 1).await;
    harness.submit(&[4, 5], Priority::Medium, 1).await;

    dispatcher.start().await;
    tokio::time::sleep(Duration::from_millis(4500)).await;

    assert_eq!(
        harness.started_ids().await,
        vec![vec![1], vec![2], vec![3], vec![4], vec![5]]
    );

    dispatcher.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_bounds_throughput() {
    let harness = TestHarness::new();
    let dispatcher = harness.create_dispatcher(1000);

    // Spread across priorities and ingestions; the limit is global
    harness.submit(&[1, 2, 3, 4], Priority::High, 1).await;
    harness.submit(&[5, 6, 7, 8], Priority::Low, 1).await;
    harness.submit(&[9, 10], Priority::Medium, 1).await;

    dispatcher.start().await;
    tokio::time::sleep(Duration::from_millis(4500)).await;

    let starts: Vec<_> = harness
        .worker
        .recorded()
        .await
        .iter()
        .map(|w| w.started_at)
        .collect();
    assert_eq!(starts.len(), 5);
    assert_spacing(&starts, Duration::from_secs(1));

    let status = dispatcher.status();
    assert_eq!(status.dispatched_total, 5);
    assert_eq!(status.pending, 5);

    dispatcher.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_batch_status_never_regresses() {
    let harness = TestHarness::new();
    harness.worker.set_duration(Duration::from_millis(1500)).await;
    harness.worker.fail_items(&[5]).await;

    let transitions: Arc<Mutex<HashMap<String, Vec<BatchStatus>>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let callback: BatchUpdateCallback = {
        let transitions = Arc::clone(&transitions);
        Arc::new(move |batch_id: &str, status: BatchStatus| {
            transitions
                .lock()
                .unwrap()
                .entry(batch_id.to_string())
                .or_default()
                .push(status);
        })
    };
    let dispatcher = harness
        .create_dispatcher(1000)
        .with_update_callback(callback);

    let id = harness.submit(&[1, 2, 3, 4, 5, 6], Priority::Medium, 2).await;
    dispatcher.start().await;

    // Poll while work is running and check each batch only moves forward
    let mut last_seen: HashMap<String, BatchStatus> = HashMap::new();
    for _ in 0..40 {
        let snapshot = harness.service.get_status(&id).await.unwrap();
        for batch in &snapshot.batches {
            if let Some(previous) = last_seen.get(&batch.batch_id) {
                assert!(
                    *previous == batch.status || previous.can_transition_to(batch.status),
                    "batch {} went from {} to {}",
                    batch.batch_id,
                    previous,
                    batch.status
                );
            }
            last_seen.insert(batch.batch_id.clone(), batch.status);
        }
        tokio::time::sleep(Duration::from_millis(125)).await;
    }

    let snapshot = harness.service.get_status(&id).await.unwrap();
    assert_eq!(snapshot.status, IngestionStatus::Failed);

    let transitions = transitions.lock().unwrap();
    assert_eq!(transitions.len(), 3);
    for batch in &snapshot.batches {
        let expected_end = if batch.ids.contains(&5) {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };
        assert_eq!(
            transitions[&batch.batch_id],
            vec![BatchStatus::Triggered, expected_end]
        );
        assert_eq!(batch.status, expected_end);
    }

    dispatcher.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_leaves_undispatched_batches_pending() {
    let harness = TestHarness::new();
    let dispatcher = harness.create_dispatcher(5000);

    let id = harness.submit(&[1, 2, 3], Priority::High, 1).await;
    dispatcher.start().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    dispatcher.stop().await.unwrap();

    let snapshot = harness.service.get_status(&id).await.unwrap();
    let statuses: Vec<_> = snapshot.batches.iter().map(|b| b.status).collect();
    assert_eq!(
        statuses,
        vec![
            BatchStatus::Completed,
            BatchStatus::YetToStart,
            BatchStatus::YetToStart
        ]
    );
    assert_eq!(snapshot.status, IngestionStatus::Triggered);
    assert_eq!(harness.scheduler.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submissions_while_running_are_picked_up() {
    let harness = TestHarness::new();
    let dispatcher = harness.create_dispatcher(1000);
    dispatcher.start().await;

    let mut ids = Vec::new();
    for n in 0..3u64 {
        ids.push(harness.submit(&[n * 10, n * 10 + 1], Priority::Low, 2).await);
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    for id in &ids {
        let snapshot = harness.service.get_status(id).await.unwrap();
        assert_eq!(snapshot.status, IngestionStatus::Completed);
    }

    dispatcher.stop().await.unwrap();
}
