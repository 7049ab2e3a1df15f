// Handler selection

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dispatch_core::port::{PayloadHandler, TimeProvider};

use crate::{LogPayloadHandler, RoutingHandler, SubprocessHandler};

/// Which processing function the worker pool runs
///
/// `Log` is the default; running payloads as commands is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    #[default]
    Log,
    Subprocess,
    Auto,
}

impl FromStr for HandlerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "subprocess" => Ok(Self::Subprocess),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown handler '{}', expected log, subprocess or auto",
                other
            )),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Log => "log",
            Self::Subprocess => "subprocess",
            Self::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Build the handler shared by every worker
pub fn build_handler(
    kind: HandlerKind,
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
) -> Arc<dyn PayloadHandler> {
    match kind {
        HandlerKind::Log => Arc::new(LogPayloadHandler::new(time_provider)),
        HandlerKind::Subprocess => Arc::new(SubprocessHandler::new(time_provider, env_allowlist)),
        HandlerKind::Auto => Arc::new(RoutingHandler::new(
            Arc::new(LogPayloadHandler::new(Arc::clone(&time_provider))),
            Arc::new(SubprocessHandler::new(time_provider, env_allowlist)),
        )),
    }
}
