use crate::clients::IContextRegistry;
use crate::messages::{ClientMessage, EngineMessage};
use crate::notify::{
    INotificationHost, NotificationData, ShowNotificationOptions, NOTIFICATION_BADGE,
    NOTIFICATION_ICON, VIBRATION_PATTERN,
};
use chrono::Days;
use pilltime_domain::{format_day, ScheduleEntry, TimeOfDay};
use pilltime_infra::{FireLedger, KVStore, PillTimeContext, SCHEDULES_KEY};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Everything that can wake the engine: bridge messages from a
/// foreground controller, timer ticks, context lifecycle and
/// notification clicks.
pub(crate) enum EngineEvent {
    Bridge(EngineMessage),
    Tick,
    Attach {
        url: String,
        sender: UnboundedSender<ClientMessage>,
        ack: oneshot::Sender<u64>,
    },
    Detach(u64),
    NotificationClick(NotificationData),
}

/// Cloneable sender half of the controller-worker bridge.
#[derive(Clone)]
pub struct EngineHandle {
    tx: UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    /// At-most-once delivery: a message to a gone engine is dropped.
    pub fn post_message(&self, message: EngineMessage) {
        let _ = self.tx.send(EngineEvent::Bridge(message));
    }

    pub fn attach_client(
        &self,
        url: String,
        sender: UnboundedSender<ClientMessage>,
        ack: oneshot::Sender<u64>,
    ) {
        let _ = self.tx.send(EngineEvent::Attach { url, sender, ack });
    }

    pub fn detach_client(&self, client_id: u64) {
        let _ = self.tx.send(EngineEvent::Detach(client_id));
    }

    pub fn notification_click(&self, data: NotificationData) {
        let _ = self.tx.send(EngineEvent::NotificationClick(data));
    }
}

/// The background poller. Two states: Idle (no ticker armed) and
/// Polling (ticker armed). The ticker never survives the engine task;
/// a resumed engine stays Idle until a controller re-issues
/// `StartChecker`, which every controller does on (re)connection.
pub struct NotificationEngine {
    store: KVStore,
    ledger: FireLedger,
    ctx: PillTimeContext,
    registry: Arc<dyn IContextRegistry>,
    host: Arc<dyn INotificationHost>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped once per Idle -> Polling transition; re-issuing start
    /// while polling must not arm a second ticker.
    ticker_generation: u64,
    last_seen_day: Option<String>,
    tx: UnboundedSender<EngineEvent>,
    rx: UnboundedReceiver<EngineEvent>,
}

impl NotificationEngine {
    pub fn new(
        ctx: PillTimeContext,
        registry: Arc<dyn IContextRegistry>,
        host: Arc<dyn INotificationHost>,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = EngineHandle { tx: tx.clone() };
        let store = KVStore::new(ctx.repos.kv.clone());
        let engine = Self {
            ledger: FireLedger::new(store.clone()),
            store,
            ctx,
            registry,
            host,
            ticker: None,
            ticker_generation: 0,
            last_seen_day: None,
            tx,
            rx,
        };
        (engine, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.handle_event(event).await;
        }
        self.stop_checker();
    }

    pub fn is_polling(&self) -> bool {
        self.ticker.is_some()
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Bridge(message) => self.handle_message(message).await,
            EngineEvent::Tick => self.check_and_fire().await,
            EngineEvent::Attach { url, sender, ack } => {
                let client_id = self.registry.attach(url, sender).await;
                let _ = ack.send(client_id);
            }
            EngineEvent::Detach(client_id) => self.registry.detach(client_id).await,
            EngineEvent::NotificationClick(data) => self.handle_notification_click(data).await,
        }
    }

    async fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::UpdateSchedules(entries) => {
                self.store.put(SCHEDULES_KEY, &entries).await;
            }
            EngineMessage::SchedulesResponse(entries) => {
                // Cache the freshest foreground-supplied schedule so a
                // later headless pass works without a foreground context.
                self.store.put(SCHEDULES_KEY, &entries).await;
                if let Err(e) = self.evaluate(&entries).await {
                    debug!("Evaluation of schedules response failed: {:?}", e);
                }
            }
            EngineMessage::StartChecker => self.start_checker().await,
            EngineMessage::StopChecker => self.stop_checker(),
            EngineMessage::ResetFired => {
                let today = format_day(&self.ctx.sys.local_now().date());
                self.ledger.reset(&today).await;
            }
        }
    }

    /// Idle -> Polling. Arms the recurring ticker and runs one
    /// evaluation pass immediately, without waiting for the first tick.
    /// A no-op when already polling.
    async fn start_checker(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let tx = self.tx.clone();
        let period = self.ctx.config.check_interval;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Ticks missed while the host suspends us must not burst.
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The immediate first tick is covered by the out-of-band
            // pass below.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(EngineEvent::Tick).is_err() {
                    break;
                }
            }
        }));
        self.ticker_generation += 1;

        self.check_and_fire().await;
    }

    /// Polling -> Idle. Cancels future ticks; a pass already in flight
    /// is never aborted. A no-op when idle.
    fn stop_checker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// One evaluation pass. Every failure is swallowed: the engine must
    /// keep running unattended and the next tick retries.
    async fn check_and_fire(&mut self) {
        if let Err(e) = self.run_pass().await {
            debug!("Evaluation pass failed: {:?}", e);
        }
    }

    async fn run_pass(&mut self) -> anyhow::Result<()> {
        let today = format_day(&self.ctx.sys.local_now().date());
        self.prune_on_rollover(&today).await;

        // With a foreground context attached, ask it for the live
        // schedule; the reply evaluates on arrival, not in this pass.
        // A context that stopped listening does not count: the pass
        // falls through to the store so reminders keep firing.
        for client in self.registry.match_all().await {
            if client.post_message(ClientMessage::RequestSchedules) {
                return Ok(());
            }
        }

        // Headless: work from the last persisted schedule.
        let entries: Vec<ScheduleEntry> = self.store.get(SCHEDULES_KEY).await.unwrap_or_default();
        self.evaluate(&entries).await
    }

    async fn evaluate(&mut self, entries: &[ScheduleEntry]) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let now = self.ctx.sys.local_now();
        let current_time = TimeOfDay::from_datetime(&now);
        let today = format_day(&now.date());
        let mut fired = self.ledger.load(&today).await;

        for entry in entries {
            let fire_key = entry.fire_key();
            if fired.has_fired(&fire_key) {
                continue;
            }
            if entry.time != current_time {
                continue;
            }

            self.host
                .show(ShowNotificationOptions {
                    title: entry.title.clone(),
                    body: entry.body.clone(),
                    icon: NOTIFICATION_ICON.into(),
                    badge: NOTIFICATION_BADGE.into(),
                    tag: fire_key.clone(),
                    vibrate: VIBRATION_PATTERN.to_vec(),
                    require_interaction: true,
                    data: NotificationData {
                        med_id: entry.med_id.clone(),
                        url: self.ctx.config.app_url.clone(),
                    },
                })
                .await?;

            // Persist the mark before considering the next entry.
            fired.mark_fired(&fire_key);
            self.ledger.mark_fired(&today, &fire_key).await;
        }

        Ok(())
    }

    /// Fire records are never pruned mid-day; on the first pass of a
    /// new day, records older than the retention window are deleted.
    async fn prune_on_rollover(&mut self, today: &str) {
        if self.last_seen_day.as_deref() == Some(today) {
            return;
        }
        self.last_seen_day = Some(today.to_string());

        let retention = self.ctx.config.fired_retention_days;
        let cutoff = self
            .ctx
            .sys
            .local_now()
            .date()
            .checked_sub_days(Days::new(retention.saturating_sub(1) as u64));
        match cutoff {
            Some(cutoff) => self.ledger.prune_before(&format_day(&cutoff)).await,
            None => warn!("Could not compute fire-record retention cutoff"),
        }
    }

    /// Clicking a reminder focuses an already-open foreground context
    /// when one exists, otherwise opens a new one at the payload url.
    async fn handle_notification_click(&self, data: NotificationData) {
        let clients = self.registry.match_all().await;
        if let Some(client) = clients.first() {
            if self.registry.focus(client.id).await {
                return;
            }
        }
        self.registry.open_window(&data.url).await;
    }
}

impl Drop for NotificationEngine {
    fn drop(&mut self) {
        self.stop_checker();
    }
}
