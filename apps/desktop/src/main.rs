use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, ValueEnum};
use client_core::{
    catalog,
    config::{load_settings, normalize_database_url},
    connect_session,
    display::{self, QuickRange},
    LoadState, SessionEvent,
};
use shared::protocol::DAY_KEY_FORMAT;
use storage::{MemorySettingsStore, SettingsStore, Storage};
use tokio::sync::broadcast;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Today,
    ThreeDays,
    Week,
}

impl From<Preset> for QuickRange {
    fn from(value: Preset) -> Self {
        match value {
            Preset::Today => QuickRange::Today,
            Preset::ThreeDays => QuickRange::ThreeDays,
            Preset::Week => QuickRange::Week,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Show the class schedule for a group")]
struct Args {
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    /// Keep the selection in memory only.
    #[arg(long)]
    no_persist: bool,
    #[arg(long)]
    group: Option<String>,
    #[arg(long)]
    subgroup: Option<String>,
    #[arg(long, value_enum, conflicts_with_all = ["start", "end"])]
    preset: Option<Preset>,
    /// First day, yyyy-MM-dd.
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Last day, yyyy-MM-dd.
    #[arg(long, requires = "start")]
    end: Option<String>,
    #[arg(long)]
    list_groups: bool,
    #[arg(long)]
    list_subgroups: bool,
    /// Retry this many times after a failed load.
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("desktop=info,client_core=info")),
        )
        .init();
    let args = Args::parse();

    if args.list_groups {
        for group in catalog::GROUPS {
            println!("{group}");
        }
        return Ok(());
    }

    let mut settings = load_settings();
    if let Some(base_url) = args.base_url.clone() {
        settings.base_url = base_url;
    }
    if let Some(database_url) = args.database_url.as_deref() {
        settings.database_url = database_url.to_string();
    }

    let store: Arc<dyn SettingsStore> = if args.no_persist {
        Arc::new(MemorySettingsStore::new())
    } else {
        let database_url = normalize_database_url(&settings.database_url);
        Arc::new(Storage::new(&database_url).await?)
    };

    let session = connect_session(&settings, store).await?;

    if let Some(group) = args.group.as_deref() {
        if !session.set_group(group).await {
            bail!("unknown group '{group}', see --list-groups");
        }
    }
    if let Some(subgroup) = args.subgroup.as_deref() {
        if !session.set_subgroup(subgroup).await {
            warn!(subgroup, "subgroup not offered for the selected group, keeping current");
        }
    }

    let selection = session.selection().await;
    if args.list_subgroups {
        for subgroup in catalog::available_subgroups(&selection.group) {
            println!("{subgroup}\t{}", display::profile_name(subgroup));
        }
        return Ok(());
    }

    if let Some(preset) = args.preset {
        session
            .set_quick_range(QuickRange::from(preset).days_from_today())
            .await;
    } else if let (Some(start), Some(end)) = (args.start.as_deref(), args.end.as_deref()) {
        session
            .set_date_range(parse_day(start)?, parse_day(end)?)
            .await;
    }

    let mut events = session.subscribe();
    session.load_once().await;
    let wait_limit = settings.load_wait_limit();
    let mut state = wait_for_result(&mut events, wait_limit).await?;

    let mut attempts = 0;
    while state.error_message().is_some() && attempts < args.retries {
        attempts += 1;
        warn!(attempt = attempts, "retrying schedule load");
        session.retry().await;
        state = wait_for_result(&mut events, wait_limit).await?;
    }

    let snapshot = session.snapshot().await;
    println!(
        "{} · {} · {}",
        snapshot.selection.group,
        snapshot.selection.subgroup,
        display::format_range(&snapshot.selection.date_range)
    );
    render(&state)
}

fn parse_day(raw: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, DAY_KEY_FORMAT)
        .with_context(|| format!("expected yyyy-MM-dd, got '{raw}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid day '{raw}'"))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

async fn wait_for_result(
    events: &mut broadcast::Receiver<SessionEvent>,
    limit: Duration,
) -> Result<LoadState> {
    tokio::time::timeout(limit, next_terminal_state(events))
        .await
        .with_context(|| format!("schedule load did not finish within {}s", limit.as_secs()))?
}

async fn next_terminal_state(events: &mut broadcast::Receiver<SessionEvent>) -> Result<LoadState> {
    loop {
        let event = events.recv().await;
        match event {
            Ok(SessionEvent::StateChanged(snapshot)) if snapshot.state.is_terminal() => {
                return Ok(snapshot.state);
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "session events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => bail!("session closed"),
        }
    }
}

fn render(state: &LoadState) -> Result<()> {
    if let Some(message) = state.error_message() {
        bail!("Ошибка загрузки: {message}");
    }

    let days = state.days();
    if days.is_empty() {
        println!("Нет занятий. На выбранные даты занятия не найдены.");
        return Ok(());
    }

    for day in days {
        println!();
        println!(
            "{} ({} {})",
            display::format_day(&day.day),
            day.events.len(),
            display::lessons_label(day.events.len())
        );
        for event in &day.events {
            let room = if event.room.is_empty() || event.room == "—" {
                String::new()
            } else {
                format!(" · {}", event.room)
            };
            println!("  {}–{}  {}{}", event.start, event.end, event.topic, room);
            if !event.title.is_empty() && event.title != event.topic {
                println!("              {}", event.title);
            }
            if !event.is_unrestricted() {
                println!("              {}", display::subgroup_summary(event));
            }
        }
    }
    Ok(())
}
