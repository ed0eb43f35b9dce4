//! Schedule session controller.
//!
//! Owns the current [`Selection`] and the latest [`LoadState`]. All mutations go
//! through the session's mutex, so they are serialized. Each [`ScheduleSession::load`]
//! starts a new generation: the previous in-flight task is aborted and, should
//! it still reach the publishing step, its stale generation makes it a no-op.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use shared::{
    domain::{DateRange, Selection, ALL_SUBGROUPS},
    protocol::{ScheduleQuery, ScheduleResponse},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    aggregator::{self, DayGroup, DaySchedule},
    catalog,
    error::TransportError,
    gateway::{CancelToken, GenerationCounter, ScheduleGateway},
    settings::SelectionStore,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded(DaySchedule),
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn schedule(&self) -> Option<&DaySchedule> {
        match self {
            Self::Loaded(schedule) => Some(schedule),
            _ => None,
        }
    }

    pub fn days(&self) -> &[DayGroup] {
        self.schedule().map(DaySchedule::days).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub selection: Selection,
    pub state: LoadState,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SelectionChanged(SessionSnapshot),
    StateChanged(SessionSnapshot),
}

impl SessionEvent {
    pub fn snapshot(&self) -> &SessionSnapshot {
        match self {
            Self::SelectionChanged(snapshot) | Self::StateChanged(snapshot) => snapshot,
        }
    }
}

struct SessionState {
    selection: Selection,
    load: LoadState,
    in_flight: Option<JoinHandle<()>>,
    did_initial_load: bool,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selection: self.selection.clone(),
            state: self.load.clone(),
        }
    }
}

pub struct ScheduleSession {
    gateway: Arc<dyn ScheduleGateway>,
    settings: SelectionStore,
    generations: GenerationCounter,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ScheduleSession {
    /// Builds a session from the stored selection, falling back to the first
    /// catalog group and `"*"`. Corrections made while validating the stored
    /// values are written back.
    pub async fn new(
        gateway: Arc<dyn ScheduleGateway>,
        settings: SelectionStore,
        date_range: DateRange,
    ) -> Arc<Self> {
        let (group, subgroup) = initial_selection(&settings).await;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            gateway,
            settings,
            generations: GenerationCounter::default(),
            inner: Mutex::new(SessionState {
                selection: Selection {
                    group,
                    subgroup,
                    date_range,
                },
                load: LoadState::Idle,
                in_flight: None,
                did_initial_load: false,
            }),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn selection(&self) -> Selection {
        self.inner.lock().await.selection.clone()
    }

    pub async fn state(&self) -> LoadState {
        self.inner.lock().await.load.clone()
    }

    /// Switches group and resets the subgroup to `"*"` when it is not offered
    /// for the new group. Groups outside the catalog are ignored. Does not
    /// reload.
    pub async fn set_group(&self, group: &str) -> bool {
        if !catalog::is_known_group(group) {
            warn!(group, "ignoring group outside the catalog");
            return false;
        }

        let mut inner = self.inner.lock().await;
        let subgroup = catalog::validated_subgroup(&inner.selection.subgroup, group);
        let subgroup_changed = subgroup != inner.selection.subgroup;
        inner.selection.group = group.to_string();
        inner.selection.subgroup = subgroup;

        if let Err(err) = self.settings.save_group(group).await {
            warn!(error = %err, "failed to persist selected group");
        }
        if subgroup_changed {
            debug!(group, "subgroup not offered for group, reset to all");
            if let Err(err) = self.settings.save_subgroup(&inner.selection.subgroup).await {
                warn!(error = %err, "failed to persist selected subgroup");
            }
        }

        self.publish(SessionEvent::SelectionChanged(inner.snapshot()));
        true
    }

    pub async fn set_subgroup(&self, subgroup: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if !catalog::is_valid_subgroup(subgroup, &inner.selection.group) {
            debug!(
                subgroup,
                group = %inner.selection.group,
                "rejected subgroup not offered for group"
            );
            return false;
        }

        inner.selection.subgroup = subgroup.to_string();
        if let Err(err) = self.settings.save_subgroup(subgroup).await {
            warn!(error = %err, "failed to persist selected subgroup");
        }

        self.publish(SessionEvent::SelectionChanged(inner.snapshot()));
        true
    }

    pub async fn set_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        let mut inner = self.inner.lock().await;
        inner.selection.date_range = DateRange::new(start, end);
        self.publish(SessionEvent::SelectionChanged(inner.snapshot()));
    }

    pub async fn set_quick_range(&self, days_from_today: i64) {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        inner.selection.date_range = DateRange::days_from(now, days_from_today);
        self.publish(SessionEvent::SelectionChanged(inner.snapshot()));
    }

    /// Starts a load for the current selection, superseding any load still in
    /// flight. Returns the generation of the new load.
    pub async fn load(self: &Arc<Self>) -> u64 {
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.in_flight.take() {
            previous.abort();
        }

        let token = self.generations.next();
        let generation = token.generation();
        let selection = inner.selection.clone();
        let query = ScheduleQuery {
            group: selection.group,
            subgroup: selection.subgroup.clone(),
            start: selection.date_range.start(),
            end: selection.date_range.end(),
        };
        debug!(generation, group = %query.group, subgroup = %query.subgroup, "starting load");

        inner.load = LoadState::Loading;
        self.publish(SessionEvent::StateChanged(inner.snapshot()));

        let gateway = Arc::clone(&self.gateway);
        let session: Weak<Self> = Arc::downgrade(self);
        let subgroup = selection.subgroup;
        inner.in_flight = Some(tokio::spawn(async move {
            let result = gateway.fetch_schedule(&query, &token).await;
            if let Some(session) = session.upgrade() {
                session.finish_load(&token, &subgroup, result).await;
            }
        }));

        generation
    }

    pub async fn retry(self: &Arc<Self>) -> u64 {
        self.load().await
    }

    /// Performs the first load of the session's lifetime; later calls do
    /// nothing and return `None`.
    pub async fn load_once(self: &Arc<Self>) -> Option<u64> {
        {
            let mut inner = self.inner.lock().await;
            if inner.did_initial_load {
                return None;
            }
            inner.did_initial_load = true;
        }
        Some(self.load().await)
    }

    async fn finish_load(
        &self,
        token: &CancelToken,
        subgroup: &str,
        result: Result<ScheduleResponse, TransportError>,
    ) {
        let mut inner = self.inner.lock().await;
        if token.is_cancelled() {
            debug!(generation = token.generation(), "discarding superseded load");
            return;
        }
        inner.in_flight = None;

        inner.load = match result {
            Ok(response) => {
                let schedule = aggregator::reconcile(response, subgroup);
                info!(
                    generation = token.generation(),
                    days = schedule.days().len(),
                    events = schedule.event_count(),
                    "schedule loaded"
                );
                LoadState::Loaded(schedule)
            }
            Err(err) if err.is_cancelled() => {
                debug!(generation = token.generation(), "load cancelled");
                return;
            }
            Err(err) => {
                error!(generation = token.generation(), error = %err, "schedule load failed");
                LoadState::Failed(err.user_message())
            }
        };

        self.publish(SessionEvent::StateChanged(inner.snapshot()));
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for ScheduleSession {
    fn drop(&mut self) {
        if let Some(task) = self.inner.get_mut().in_flight.take() {
            task.abort();
        }
    }
}

async fn initial_selection(settings: &SelectionStore) -> (String, String) {
    let stored = match settings.load().await {
        Ok(stored) => stored,
        Err(err) => {
            warn!(error = %err, "failed to read stored selection, using defaults");
            None
        }
    };

    let Some(stored) = stored else {
        return (
            catalog::default_group().to_string(),
            ALL_SUBGROUPS.to_string(),
        );
    };

    let group = match stored.group {
        Some(group) => group,
        None => {
            let group = catalog::default_group().to_string();
            if let Err(err) = settings.save_group(&group).await {
                warn!(error = %err, "failed to persist corrected group");
            }
            group
        }
    };

    let raw_subgroup = stored
        .subgroup
        .unwrap_or_else(|| ALL_SUBGROUPS.to_string());
    let subgroup = catalog::validated_subgroup(&raw_subgroup, &group);
    if subgroup != raw_subgroup {
        debug!(stored = %raw_subgroup, group = %group, "stored subgroup invalid for group");
        if let Err(err) = settings.save_subgroup(&subgroup).await {
            warn!(error = %err, "failed to persist corrected subgroup");
        }
    }

    (group, subgroup)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
