// Ingress Use Case - accept one event, enqueue one work item

pub mod validate;

use crate::domain::{EventCounter, WorkItem, WorkPayload};
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider, WorkQueue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Status string returned for every accepted event
pub const STATUS_ENQUEUED: &str = "enqueued";

/// Acknowledgment echoed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub status: String,
    pub data: serde_json::Value,
}

impl Acknowledgment {
    pub fn enqueued(data: serde_json::Value) -> Self {
        Self {
            status: STATUS_ENQUEUED.to_string(),
            data,
        }
    }
}

/// The only producer into the work queue
pub struct IngressService {
    queue: Arc<dyn WorkQueue>,
    counter: EventCounter,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl IngressService {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        counter: EventCounter,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue,
            counter,
            id_provider,
            time_provider,
        }
    }

    pub fn counter(&self) -> &EventCounter {
        &self.counter
    }

    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    /// Accept one event
    ///
    /// The counter is incremented only after the item is enqueued, so a
    /// rejected event is never counted.
    ///
    /// # Errors
    /// - `AppError::Validation` if the payload is not a JSON object or is too deep
    /// - `AppError::QueueClosed` if the queue no longer accepts work
    pub async fn accept(&self, payload: serde_json::Value) -> Result<Acknowledgment> {
        validate::validate_payload(&payload)?;

        let item = WorkItem::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            WorkPayload::new(payload.clone()),
        );
        let item_id = item.id.clone();

        if let Err(e) = self.queue.enqueue(item).await {
            warn!(item_id = %item_id, error = %e, "Event rejected");
            return Err(e);
        }

        let total = self.counter.increment();
        debug!(item_id = %item_id, accepted_total = total, "Event accepted");

        Ok(Acknowledgment::enqueued(payload))
    }
}
