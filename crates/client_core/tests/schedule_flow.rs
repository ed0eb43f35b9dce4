use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use client_core::{connect_session, ClientSettings, LoadState, SessionEvent};
use serde_json::json;
use storage::MemorySettingsStore;
use tokio::{
    net::TcpListener,
    sync::{broadcast, Mutex},
    time::timeout,
};

#[derive(Clone, Default)]
struct ServerState {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    failures_left: Arc<AtomicUsize>,
}

async fn handle_schedule(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.queries.lock().await.push(params);
    if state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    Json(json!({
        "events": [
            {"ClID": "2", "Day": "2025-09-22", "group": "ИТ25-11", "topic": "Физика",
             "start": "10:00", "end": "11:30", "room": "210", "color": "", "title": ""},
            {"ClID": "3", "Day": "2025-09-21", "group": "ИТ25-11", "topic": "История",
             "start": "12:00", "end": "13:30", "room": "115", "color": "", "title": ""},
            {"ClID": "1", "Day": "2025-09-22", "group": "ИТ25-11", "topic": "Математика",
             "start": "08:00", "end": "09:30", "room": "305", "color": "", "title": ""}
        ]
    }))
    .into_response()
}

async fn spawn_schedule_server(failures: usize) -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState {
        queries: Arc::default(),
        failures_left: Arc::new(AtomicUsize::new(failures)),
    };
    let app = Router::new()
        .route("/api/v1/schedule", get(handle_schedule))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn settings_for(base_url: String) -> ClientSettings {
    ClientSettings {
        base_url,
        request_timeout_secs: 5,
        ..ClientSettings::default()
    }
}

async fn next_terminal(rx: &mut broadcast::Receiver<SessionEvent>) -> LoadState {
    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event channel closed");
        if let SessionEvent::StateChanged(snapshot) = event {
            if snapshot.state.is_terminal() {
                return snapshot.state;
            }
        }
    }
}

#[tokio::test]
async fn first_year_schedule_is_grouped_by_day() {
    let (base_url, server) = spawn_schedule_server(0).await;
    let session = connect_session(&settings_for(base_url), Arc::new(MemorySettingsStore::new()))
        .await
        .expect("session");
    let mut rx = session.subscribe();

    assert!(session.set_group("ИТ25-11").await);
    session.load_once().await;
    let state = next_terminal(&mut rx).await;

    let schedule = state.schedule().expect("loaded");
    assert_eq!(schedule.sorted_days(), vec!["2025-09-21", "2025-09-22"]);
    let starts: Vec<&str> = schedule
        .events_for("2025-09-22")
        .expect("day")
        .iter()
        .map(|event| event.start.as_str())
        .collect();
    assert_eq!(starts, vec!["08:00", "10:00"]);

    let queries = server.queries.lock().await;
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].get("group").map(String::as_str), Some("ИТ25-11"));
    assert_eq!(queries[0].get("subgroup").map(String::as_str), Some("*"));
    assert_eq!(queries[0].get("start").map(String::len), Some(10));
}

#[tokio::test]
async fn profile_subgroup_is_reset_when_switching_to_first_year() {
    let (base_url, _server) = spawn_schedule_server(0).await;
    let store = Arc::new(MemorySettingsStore::new());
    let session = connect_session(&settings_for(base_url), store.clone())
        .await
        .expect("session");

    assert!(session.set_group("ИТ24-11").await);
    assert!(session.set_subgroup("BE").await);
    assert!(session.set_group("ИТ25-11").await);

    assert_eq!(session.selection().await.subgroup, "*");
    let stored = store.snapshot().await;
    assert_eq!(stored.get("selectedSubgroup").map(String::as_str), Some("*"));
    assert_eq!(stored.get("hasStoredSettings").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn server_failure_then_retry_repeats_identical_query() {
    let (base_url, server) = spawn_schedule_server(1).await;
    let session = connect_session(&settings_for(base_url), Arc::new(MemorySettingsStore::new()))
        .await
        .expect("session");
    let mut rx = session.subscribe();

    session.load().await;
    let failed = next_terminal(&mut rx).await;
    assert_eq!(failed.error_message(), Some("Сервер вернул код 500."));

    session.retry().await;
    let loaded = next_terminal(&mut rx).await;
    assert!(loaded.schedule().is_some());

    let queries = server.queries.lock().await;
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], queries[1]);
}
