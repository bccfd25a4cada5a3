mod telemetry;

use pilltime_engine::{
    Controller, InMemoryMedicationSource, InProcessContextRegistry, LogNotificationHost,
    NotificationEngine,
};
use pilltime_infra::{setup_context, KVStore};
use std::sync::Arc;
use telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("pilltime".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await;
    let store = KVStore::new(context.repos.kv.clone());
    let config = context.config.clone();

    let registry = Arc::new(InProcessContextRegistry::new());
    let host = Arc::new(LogNotificationHost);
    let (engine, engine_handle) = NotificationEngine::new(context, registry, host);
    engine.spawn();

    // The daemon acts as its own foreground context: medications and
    // settings live in the in-memory source until the management UI
    // replaces them.
    let source = Arc::new(InMemoryMedicationSource::new());
    let controller = Controller::connect(engine_handle, source, store, &config).await;
    controller.update_notification_schedules().await;
    info!("Notification checker started");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    controller.stop_checker();

    Ok(())
}
