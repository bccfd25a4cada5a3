use crate::engine::EngineHandle;
use crate::messages::{ClientMessage, EngineMessage};
use pilltime_domain::{compile_schedules, Medication, NotificationSettings, ScheduleEntry};
use pilltime_infra::{Config, KVStore, SCHEDULES_KEY};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

/// Live medication and notification-setting state, owned by the
/// medication-management collaborator. The controller only reads
/// snapshots when compiling schedules.
#[async_trait::async_trait]
pub trait IMedicationSource: Send + Sync {
    async fn medications(&self) -> Vec<Medication>;
    async fn notification_settings(&self) -> NotificationSettings;
}

pub struct InMemoryMedicationSource {
    medications: Mutex<Vec<Medication>>,
    settings: Mutex<NotificationSettings>,
}

impl InMemoryMedicationSource {
    pub fn new() -> Self {
        Self {
            medications: Mutex::new(Vec::new()),
            settings: Mutex::new(NotificationSettings::new()),
        }
    }

    pub fn set_medications(&self, medications: Vec<Medication>) {
        *self.medications.lock().unwrap() = medications;
    }

    pub fn set_settings(&self, settings: NotificationSettings) {
        *self.settings.lock().unwrap() = settings;
    }
}

impl Default for InMemoryMedicationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IMedicationSource for InMemoryMedicationSource {
    async fn medications(&self) -> Vec<Medication> {
        self.medications.lock().unwrap().clone()
    }

    async fn notification_settings(&self) -> NotificationSettings {
        self.settings.lock().unwrap().clone()
    }
}

/// The foreground side of the bridge: one controller per open
/// application context. It attaches to the engine, keeps the persisted
/// schedule in sync with live medication state and answers the
/// engine's schedule requests.
pub struct Controller {
    engine: EngineHandle,
    source: Arc<dyn IMedicationSource>,
    store: KVStore,
    client_id: Option<u64>,
    reply_task: JoinHandle<()>,
}

impl Controller {
    /// Attaches to the engine as a foreground context and starts the
    /// checker. The attach handshake is bounded: if the engine does not
    /// take control within the configured timeout, the controller
    /// proceeds with best-effort direct messaging anyway.
    ///
    /// `StartChecker` is re-sent on every connection because the
    /// engine's timer never survives a host suspend.
    pub async fn connect(
        engine: EngineHandle,
        source: Arc<dyn IMedicationSource>,
        store: KVStore,
        config: &Config,
    ) -> Self {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = oneshot::channel();
        engine.attach_client(config.app_url.clone(), client_tx, ack_tx);

        let client_id = match tokio::time::timeout(config.handshake_timeout, ack_rx).await {
            Ok(Ok(id)) => Some(id),
            _ => {
                warn!("Engine did not take control within the handshake timeout, falling back to direct messaging");
                None
            }
        };

        let reply_task = Self::spawn_reply_loop(engine.clone(), source.clone(), client_rx);

        engine.post_message(EngineMessage::StartChecker);

        Self {
            engine,
            source,
            store,
            client_id,
            reply_task,
        }
    }

    /// Answers `RequestSchedules` with a freshly compiled schedule from
    /// live state, for as long as this controller stays attached.
    fn spawn_reply_loop(
        engine: EngineHandle,
        source: Arc<dyn IMedicationSource>,
        mut client_rx: mpsc::UnboundedReceiver<ClientMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = client_rx.recv().await {
                match message {
                    ClientMessage::RequestSchedules => {
                        let entries = compile_schedules(
                            &source.medications().await,
                            &source.notification_settings().await,
                        );
                        engine.post_message(EngineMessage::SchedulesResponse(entries));
                    }
                }
            }
        })
    }

    pub fn client_id(&self) -> Option<u64> {
        self.client_id
    }

    /// Recompiles the schedule from current medication and setting
    /// state, persists it and pushes it across the bridge. Called by
    /// the UI whenever medications or settings change; always a full
    /// rebuild.
    pub async fn update_notification_schedules(&self) -> Vec<ScheduleEntry> {
        let entries = compile_schedules(
            &self.source.medications().await,
            &self.source.notification_settings().await,
        );

        self.store.put(SCHEDULES_KEY, &entries).await;
        self.engine
            .post_message(EngineMessage::UpdateSchedules(entries.clone()));

        entries
    }

    pub fn start_checker(&self) {
        self.engine.post_message(EngineMessage::StartChecker);
    }

    pub fn stop_checker(&self) {
        self.engine.post_message(EngineMessage::StopChecker);
    }

    /// Manual "start fresh" action: empties today's fire record.
    pub fn reset_fired(&self) {
        self.engine.post_message(EngineMessage::ResetFired);
    }

    pub fn disconnect(self) {
        if let Some(client_id) = self.client_id {
            self.engine.detach_client(client_id);
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.reply_task.abort();
        if let Some(client_id) = self.client_id {
            self.engine.detach_client(client_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{IContextRegistry, InProcessContextRegistry};
    use crate::engine::NotificationEngine;
    use crate::notify::RecordingNotificationHost;
    use chrono::NaiveDate;
    use pilltime_domain::{Frequency, MessageStyle, NotificationSetting};
    use pilltime_infra::{FakeSys, PillTimeContext, Repos};
    use std::time::Duration;

    struct TestApp {
        controller: Controller,
        source: Arc<InMemoryMedicationSource>,
        registry: Arc<InProcessContextRegistry>,
        host: RecordingNotificationHost,
        store: KVStore,
    }

    async fn spawn_app(hh: u32, mm: u32) -> TestApp {
        let sys = Arc::new(FakeSys::new(
            NaiveDate::from_ymd_opt(2026, 8, 23)
                .unwrap()
                .and_hms_opt(hh, mm, 0)
                .unwrap(),
        ));
        let mut config = Config::default();
        config.check_interval = Duration::from_millis(20);
        let ctx = PillTimeContext {
            repos: Repos::create_inmemory(),
            config: config.clone(),
            sys,
        };
        let store = KVStore::new(ctx.repos.kv.clone());
        let registry = Arc::new(InProcessContextRegistry::new());
        let host = RecordingNotificationHost::new();
        let (engine, handle) =
            NotificationEngine::new(ctx, registry.clone(), Arc::new(host.clone()));
        engine.spawn();

        let source = Arc::new(InMemoryMedicationSource::new());
        source.set_medications(vec![Medication {
            id: "m1".parse().unwrap(),
            name: "ロキソニン".into(),
            dose_amount: 1.0,
            unit: "錠".into(),
            selected_times: vec!["08:00".parse().unwrap()],
            time: None,
            frequency: Frequency::Daily,
        }]);
        let mut settings = NotificationSettings::new();
        settings.insert(
            "m1".parse().unwrap(),
            NotificationSetting {
                enabled: true,
                message_style: MessageStyle::Default,
            },
        );
        source.set_settings(settings);

        let controller =
            Controller::connect(handle, source.clone(), store.clone(), &config).await;

        TestApp {
            controller,
            source,
            registry,
            host,
            store,
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !condition() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn connecting_attaches_a_foreground_context() {
        let app = spawn_app(7, 0).await;

        assert!(app.controller.client_id().is_some());
        assert_eq!(app.registry.match_all().await.len(), 1);
    }

    #[tokio::test]
    async fn update_persists_and_pushes_the_compiled_schedule() {
        let app = spawn_app(7, 0).await;

        let entries = app.controller.update_notification_schedules().await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "お薬を飲む時間です！");
        assert_eq!(entries[0].body, "ロキソニンを1 錠服用してください");
        assert_eq!(
            app.store.get::<Vec<ScheduleEntry>>(SCHEDULES_KEY).await,
            Some(entries)
        );
    }

    #[tokio::test]
    async fn the_delegation_round_trip_fires_a_due_dose() {
        let app = spawn_app(8, 0).await;

        // Connect already started the checker; the engine asks this
        // controller for schedules, evaluates the response and fires.
        let host = app.host.clone();
        wait_for(move || !host.shown().is_empty()).await;

        let shown = app.host.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].tag, "m1_08:00");

        // The foreground-supplied schedule was cached durably
        assert_eq!(
            app.store
                .get::<Vec<ScheduleEntry>>(SCHEDULES_KEY)
                .await
                .map(|entries| entries.len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn a_dose_fires_at_most_once_per_day_across_many_ticks() {
        let app = spawn_app(8, 0).await;

        let host = app.host.clone();
        wait_for(move || !host.shown().is_empty()).await;
        // Let several more polling intervals elapse
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(app.host.shown().len(), 1);
    }

    #[tokio::test]
    async fn disabling_notifications_compiles_an_empty_schedule() {
        let app = spawn_app(7, 0).await;
        app.source.set_settings(NotificationSettings::new());

        let entries = app.controller.update_notification_schedules().await;

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn disconnect_detaches_the_context() {
        let app = spawn_app(7, 0).await;
        let registry = app.registry.clone();

        app.controller.disconnect();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !registry.match_all().await.is_empty()
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(registry.match_all().await.is_empty());
    }
}
