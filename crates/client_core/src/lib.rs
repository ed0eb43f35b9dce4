//! Schedule client core: catalog lookups, the HTTP gateway, the day-grouping
//! aggregator and the session controller that ties them together.

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod gateway;
pub mod session;
pub mod settings;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::DateRange;
use storage::SettingsStore;

pub use aggregator::{reconcile, DayGroup, DaySchedule};
pub use config::ClientSettings;
pub use error::TransportError;
pub use gateway::{CancelToken, HttpScheduleGateway, ScheduleGateway};
pub use session::{LoadState, ScheduleSession, SessionEvent, SessionSnapshot};
pub use settings::SelectionStore;
pub use transport::{Endpoint, HttpTransport, ReqwestTransport};

pub async fn connect_session(
    settings: &ClientSettings,
    store: Arc<dyn SettingsStore>,
) -> Result<Arc<ScheduleSession>> {
    let transport = ReqwestTransport::new(&settings.base_url, settings.request_timeout())
        .with_context(|| format!("invalid schedule base url '{}'", settings.base_url))?;
    let gateway = HttpScheduleGateway::new(Arc::new(transport));
    let range = DateRange::days_from(chrono::Utc::now(), settings.initial_range_days);
    Ok(ScheduleSession::new(Arc::new(gateway), SelectionStore::new(store), range).await)
}
