use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::protocol::{ScheduleQuery, ScheduleResponse, SCHEDULE_PATH};
use tracing::debug;

use crate::{
    error::TransportError,
    transport::{send_json, Endpoint, HttpTransport},
};

/// Generation-based cancellation. A token is cancelled as soon as a newer
/// generation has been issued from the same source.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl CancelToken {
    /// Token that is never cancelled, for one-off calls outside a session.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    pub fn check(&self) -> Result<(), TransportError> {
        if self.is_cancelled() {
            Err(TransportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn next(&self) -> CancelToken {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[async_trait]
pub trait ScheduleGateway: Send + Sync {
    async fn fetch_schedule(
        &self,
        query: &ScheduleQuery,
        cancel: &CancelToken,
    ) -> Result<ScheduleResponse, TransportError>;
}

pub struct HttpScheduleGateway {
    transport: Arc<dyn HttpTransport>,
}

impl HttpScheduleGateway {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn endpoint_for(query: &ScheduleQuery) -> Endpoint {
        query
            .query_pairs()
            .into_iter()
            .fold(Endpoint::get(SCHEDULE_PATH), |endpoint, (name, value)| {
                endpoint.query(name, value)
            })
    }
}

#[async_trait]
impl ScheduleGateway for HttpScheduleGateway {
    async fn fetch_schedule(
        &self,
        query: &ScheduleQuery,
        cancel: &CancelToken,
    ) -> Result<ScheduleResponse, TransportError> {
        cancel.check()?;
        let endpoint = Self::endpoint_for(query);
        debug!(
            group = %query.group,
            subgroup = %query.subgroup,
            generation = cancel.generation(),
            "fetching schedule"
        );
        let response = send_json::<ScheduleResponse>(self.transport.as_ref(), &endpoint).await;
        cancel.check()?;
        response
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
