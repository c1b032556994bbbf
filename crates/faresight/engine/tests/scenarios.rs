//! End-to-end scenarios on a paused tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use faresight_engine::random::shared;
use faresight_engine::views::{AnomalyDetectionView, DashboardView, MarketAnalyticsView, SystemHealthView};
use faresight_engine::{
    FareSightConfig, LiveTickEngine, NotificationFilter, NotificationStore, ScriptedSource,
    StatusChannel, TriggerOutcome, ViewContext, ViewScope,
};
use faresight_types::{ActionStatus, Metric, NewNotification, StatusLevel};

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn context(channel: &StatusChannel) -> ViewContext {
    ViewContext::new(FareSightConfig::default(), Arc::new(channel.clone()))
}

#[tokio::test(start_paused = true)]
async fn cpu_moves_at_most_five_after_one_tick() {
    let scope = ViewScope::new("system-health");
    let engine = LiveTickEngine::new("system-health", shared(Box::new(ScriptedSource::new([0.9, 0.1]))));
    let cpu = Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap();

    engine.start(&scope, Duration::from_millis(2000), vec![cpu]).unwrap();
    let mut snapshots = engine.watch_snapshots();
    snapshots.borrow_and_update();

    tokio::time::advance(Duration::from_millis(1999)).await;
    settle().await;
    assert_eq!(engine.latest().unwrap().tick, 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    snapshots.changed().await.unwrap();

    let snap = engine.latest().unwrap();
    assert_eq!(snap.tick, 1);
    let cpu = snap.value("cpu").unwrap();
    assert!((40.0..=50.0).contains(&cpu), "cpu was {cpu}");
    assert!((cpu - 49.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn ticks_keep_coming_until_stopped() {
    let channel = StatusChannel::default();
    let view = SystemHealthView::mount(&context(&channel)).unwrap();

    tokio::time::sleep(Duration::from_millis(2000 * 3 + 10)).await;
    let snap = view.latest().unwrap();
    assert_eq!(snap.tick, 3);
    for metric in &snap.metrics {
        assert!(metric.is_within_bounds());
    }

    view.teardown();
    view.teardown();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(view.latest().unwrap().tick, 3);
}

#[tokio::test(start_paused = true)]
async fn panicking_subscriber_does_not_stop_the_clock() {
    let scope = ViewScope::new("system-health");
    let engine = LiveTickEngine::new("system-health", shared(Box::new(ScriptedSource::constant(0.5))));
    let delivered = Arc::new(AtomicUsize::new(0));

    engine.subscribe(|_| panic!("chart exploded"));
    let d = Arc::clone(&delivered);
    engine.subscribe(move |_| {
        d.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let cpu = Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap();
    engine.start(&scope, Duration::from_millis(100), vec![cpu]).unwrap();

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(engine.is_running());
    assert_eq!(delivered.load(Ordering::SeqCst), 3);
    assert_eq!(engine.subscriber_failures(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let scope = ViewScope::new("system-health");
    let engine = LiveTickEngine::new("system-health", shared(Box::new(ScriptedSource::constant(0.5))));
    let cpu = Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap();

    engine.start(&scope, Duration::from_millis(100), vec![cpu]).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    engine.stop();
    engine.stop();
    let tick = engine.latest().unwrap().tick;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!engine.is_running());
    assert_eq!(engine.latest().unwrap().tick, tick);
}

#[tokio::test(start_paused = true)]
async fn detection_finds_one_anomaly_after_delay() {
    let channel = StatusChannel::new(32);
    let mut rx = channel.subscribe();
    let ctx = context(&channel);
    let view = AnomalyDetectionView::mount(&ctx);
    let before = ctx.anomalies.read().len();

    assert_eq!(view.run_detection(), TriggerOutcome::Started);
    assert_eq!(view.detection().status(), ActionStatus::Running);
    let loading = rx.try_recv().unwrap();
    assert_eq!(loading.level, StatusLevel::Loading);
    assert_eq!(loading.text, "Running anomaly detection algorithms...");

    tokio::time::advance(Duration::from_millis(2499)).await;
    settle().await;
    assert_eq!(view.detection().status(), ActionStatus::Running);
    assert_eq!(ctx.anomalies.read().len(), before);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(view.detection().status(), ActionStatus::Succeeded);
    assert_eq!(ctx.anomalies.read().len(), before + 1);

    let done = rx.try_recv().unwrap();
    assert_eq!(done.level, StatusLevel::Success);
    assert_eq!(done.key, loading.key);
    assert_eq!(done.text, "Detection complete. 1 new anomaly found.");
}

#[tokio::test(start_paused = true)]
async fn torn_down_view_never_completes() {
    let channel = StatusChannel::new(32);
    let ctx = context(&channel);
    let view = AnomalyDetectionView::mount(&ctx);
    let before = ctx.anomalies.read().len();

    view.run_detection();
    tokio::time::advance(Duration::from_millis(1000)).await;
    view.teardown();
    tokio::time::advance(Duration::from_millis(5000)).await;
    settle().await;

    assert_eq!(ctx.anomalies.read().len(), before);
    assert_eq!(view.run_detection(), TriggerOutcome::ScopeClosed);
}

#[test]
fn unread_filter_returns_first_and_third() {
    let mut store = NotificationStore::default();
    let first = store.add(NewNotification::warning("Price Spike Detected", "SFO-JFK"));
    let second = store.add(NewNotification::success("Model Accuracy Improved", "89.2%"));
    let third = store.add(NewNotification::info("Data Batch Processed", "1.2M records"));

    store.mark_read(second);
    let unread: Vec<_> = store
        .filter(NotificationFilter::Unread)
        .map(|r| r.id)
        .collect();

    // Most recent first.
    assert_eq!(unread, vec![third, first]);
}

#[tokio::test(start_paused = true)]
async fn dashboard_and_market_share_one_session() {
    let channel = StatusChannel::new(32);
    let mut rx = channel.subscribe();
    let config = FareSightConfig {
        random: faresight_engine::config::RandomConfig { seed: Some(42) },
        ..FareSightConfig::default()
    };
    let ctx = ViewContext::new(config, Arc::new(channel.clone()));
    let dashboard = DashboardView::mount(&ctx).unwrap();
    let market = MarketAnalyticsView::mount(&ctx);

    dashboard.run_refresh();
    dashboard.run_analysis();
    tokio::time::advance(Duration::from_millis(5000)).await;
    settle().await;

    assert_eq!(dashboard.refresh().status(), ActionStatus::Succeeded);
    assert_eq!(dashboard.analysis().status(), ActionStatus::Succeeded);
    assert!(dashboard.stats().active_routes >= 150);

    let report = market.export_report().unwrap();
    assert!(report.name.starts_with("market_analysis_"));

    let successes: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|m| m.level == StatusLevel::Success)
        .map(|m| m.text)
        .collect();
    assert_eq!(
        successes,
        vec![
            "Dashboard data refreshed successfully",
            "System analysis completed. Report generated.",
            "Report downloaded successfully",
        ]
    );

    dashboard.teardown();
    market.teardown();
}
