// Subprocess payload handler
// reason: tokio::process for async child management, nix for SIGTERM/SIGKILL
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use dispatch_core::domain::WorkItem;
use dispatch_core::port::{HandlerError, HandlerReport, PayloadHandler, TimeProvider};

/// Time a child gets to exit after SIGTERM before it is killed
pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Longest stdout kept in a `HandlerReport`
const MAX_CAPTURED_OUTPUT: usize = 4096;

/// Execution parameters read from a work item payload
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: String,
    pub timeout_ms: Option<u64>,
}

impl CommandSpec {
    /// Parse `{command, args, env, working_dir, timeout_ms}`
    ///
    /// Only `command` is required. Non-string args and env values are ignored.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, HandlerError> {
        let command = payload
            .get("command")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HandlerError::InvalidPayload("Missing 'command' in payload".to_string()))?;

        let args = payload
            .get("args")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let env = payload
            .get("env")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let working_dir = payload
            .get("working_dir")
            .and_then(|v| v.as_str())
            .unwrap_or(".")
            .to_string();

        let timeout_ms = payload.get("timeout_ms").and_then(|v| v.as_u64());

        Ok(Self {
            command: command.to_string(),
            args,
            env,
            working_dir,
            timeout_ms,
        })
    }
}

/// Runs the command described by a work item in a child process
///
/// The child starts with a cleared environment. Only allowlisted variables are
/// passed through, from the daemon's environment or the payload's `env`.
pub struct SubprocessHandler {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
    default_timeout: Option<Duration>,
}

impl SubprocessHandler {
    /// Create a new subprocess handler
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Environment variables a child may see
    ///
    /// # Example
    /// ```text
    /// let handler = SubprocessHandler::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
            default_timeout: None,
        }
    }

    /// Timeout applied when the payload has no `timeout_ms`
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    fn is_allowed(&self, key: &str) -> bool {
        self.env_allowlist.iter().any(|k| k == key)
    }

    /// Allowlisted daemon variables, overridden by allowlisted payload variables
    fn child_env(&self, payload_env: &HashMap<String, String>) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| self.is_allowed(k))
            .collect();

        for (k, v) in payload_env {
            if self.is_allowed(k) {
                env.insert(k.clone(), v.clone());
            } else {
                warn!(var = %k, "Dropping environment variable not in allowlist");
            }
        }
        env
    }

    async fn spawn_and_wait(&self, spec: &CommandSpec) -> Result<Output, HandlerError> {
        let child = Command::new(&spec.command)
            .args(&spec.args)
            .env_clear()
            .envs(self.child_env(&spec.env))
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HandlerError::SpawnFailed(format!("{}: {}", spec.command, e)))?;

        let pid = child.id();
        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let limit = spec
            .timeout_ms
            .map(Duration::from_millis)
            .or(self.default_timeout);

        let Some(limit) = limit else {
            return wait.await.map_err(|e| HandlerError::Io(e.to_string()));
        };

        match timeout(limit, &mut wait).await {
            Ok(result) => result.map_err(|e| HandlerError::Io(e.to_string())),
            Err(_) => {
                warn!(command = %spec.command, pid = ?pid, timeout_ms = limit.as_millis() as u64, "Subprocess timed out");
                if let Some(pid) = pid {
                    terminate(pid, &mut wait).await;
                }
                Err(HandlerError::Timeout(limit.as_millis() as i64))
            }
        }
    }
}

/// SIGTERM, then SIGKILL if the child outlives the grace period
#[cfg(unix)]
async fn terminate<F>(pid: u32, wait: &mut std::pin::Pin<&mut F>)
where
    F: std::future::Future<Output = std::io::Result<Output>>,
{
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    info!(pid = %pid, "Sending SIGTERM");
    if let Err(e) = kill(pid, Signal::SIGTERM) {
        warn!(pid = %pid, error = %e, "SIGTERM failed");
    }

    if timeout(TERMINATE_GRACE_PERIOD, wait.as_mut()).await.is_ok() {
        return;
    }

    warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
    if let Err(e) = kill(pid, Signal::SIGKILL) {
        warn!(pid = %pid, error = %e, "SIGKILL failed");
    }
    let _ = wait.as_mut().await;
}

// Elsewhere the child is killed when the wait future is dropped (kill_on_drop)
#[cfg(not(unix))]
async fn terminate<F>(_pid: u32, _wait: &mut std::pin::Pin<&mut F>)
where
    F: std::future::Future<Output = std::io::Result<Output>>,
{
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_CAPTURED_OUTPUT {
        let mut cut = MAX_CAPTURED_OUTPUT;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[async_trait]
impl PayloadHandler for SubprocessHandler {
    async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError> {
        let spec = CommandSpec::from_payload(item.payload.as_value())?;
        let start = self.time_provider.now_millis();

        info!(
            item_id = %item.id,
            command = %spec.command,
            args = ?spec.args,
            working_dir = %spec.working_dir,
            timeout_ms = ?spec.timeout_ms,
            "Starting subprocess"
        );

        let output = self.spawn_and_wait(&spec).await?;
        let duration_ms = self.time_provider.now_millis() - start;
        let exit_code = output.status.code();

        if !output.status.success() {
            return Err(HandlerError::NonZeroExit {
                code: exit_code,
                stderr: truncate(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            });
        }

        info!(
            item_id = %item.id,
            command = %spec.command,
            duration_ms,
            exit_code = ?exit_code,
            "Subprocess completed"
        );

        Ok(HandlerReport {
            duration_ms,
            exit_code,
            output: Some(truncate(String::from_utf8_lossy(&output.stdout).to_string())),
        })
    }
}
