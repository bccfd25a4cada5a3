//! End-to-end flow: compile a schedule from medication state, let the
//! background engine poll against a fake clock and check that the
//! reminder fires exactly once per day.

use chrono::NaiveDate;
use pilltime_domain::{
    Frequency, Medication, MessageStyle, NotificationSetting, NotificationSettings,
};
use pilltime_engine::{
    Controller, InMemoryMedicationSource, InProcessContextRegistry, NotificationEngine,
    RecordingNotificationHost,
};
use pilltime_infra::{Config, FakeSys, KVStore, PillTimeContext, Repos};
use std::sync::Arc;
use std::time::Duration;

fn loxonin() -> Medication {
    Medication {
        id: "m1".parse().unwrap(),
        name: "ロキソニン".into(),
        dose_amount: 1.0,
        unit: "錠".into(),
        selected_times: vec!["08:00".parse().unwrap()],
        time: None,
        frequency: Frequency::Daily,
    }
}

async fn wait_for_fires(host: &RecordingNotificationHost, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while host.shown().len() < count && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn a_scheduled_dose_fires_once_per_day_and_again_the_next_day() {
    let sys = Arc::new(FakeSys::new(
        NaiveDate::from_ymd_opt(2026, 8, 23)
            .unwrap()
            .and_hms_opt(8, 0, 5)
            .unwrap(),
    ));
    let mut config = Config::default();
    config.check_interval = Duration::from_millis(20);
    let ctx = PillTimeContext {
        repos: Repos::create_inmemory(),
        config: config.clone(),
        sys: sys.clone(),
    };
    let store = KVStore::new(ctx.repos.kv.clone());

    let registry = Arc::new(InProcessContextRegistry::new());
    let host = RecordingNotificationHost::new();
    let (engine, handle) = NotificationEngine::new(ctx, registry, Arc::new(host.clone()));
    engine.spawn();

    let source = Arc::new(InMemoryMedicationSource::new());
    source.set_medications(vec![loxonin()]);
    let mut settings = NotificationSettings::new();
    settings.insert(
        "m1".parse().unwrap(),
        NotificationSetting {
            enabled: true,
            message_style: MessageStyle::Default,
        },
    );
    source.set_settings(settings);

    // Connecting starts the checker and answers the engine's requests
    let controller = Controller::connect(handle, source, store, &config).await;
    let entries = controller.update_notification_schedules().await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fire_key(), "m1_08:00");
    assert_eq!(entries[0].title, "お薬を飲む時間です！");
    assert_eq!(entries[0].body, "ロキソニンを1 錠服用してください");

    // Fires during the 08:00 minute...
    wait_for_fires(&host, 1).await;
    assert_eq!(host.shown().len(), 1);
    assert_eq!(host.shown()[0].tag, "m1_08:00");

    // ...and not again for the rest of the day
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(host.shown().len(), 1);

    // The next day at 08:00 it is eligible again
    sys.set(
        NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(8, 0, 5)
            .unwrap(),
    );
    wait_for_fires(&host, 2).await;
    assert_eq!(host.shown().len(), 2);
}
