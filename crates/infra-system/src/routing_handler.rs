// Routing payload handler

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use dispatch_core::domain::WorkItem;
use dispatch_core::port::{HandlerError, HandlerReport, PayloadHandler};

/// Sends payloads carrying `command` to the subprocess handler, the rest to the log handler
pub struct RoutingHandler {
    log: Arc<dyn PayloadHandler>,
    subprocess: Arc<dyn PayloadHandler>,
}

impl RoutingHandler {
    pub fn new(log: Arc<dyn PayloadHandler>, subprocess: Arc<dyn PayloadHandler>) -> Self {
        Self { log, subprocess }
    }
}

#[async_trait]
impl PayloadHandler for RoutingHandler {
    async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError> {
        if item.payload.field("command").is_some() {
            debug!(item_id = %item.id, route = "subprocess", "Routing work item");
            self.subprocess.handle(item).await
        } else {
            debug!(item_id = %item.id, route = "log", "Routing work item");
            self.log.handle(item).await
        }
    }
}
