//! Dispatch CLI - Command-line interface for the Dispatch daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";

#[derive(Parser)]
#[command(name = "dispatch")]
#[command(about = "Dispatch engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "DISPATCH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an event to the work queue
    Ingest {
        /// Payload as a JSON object, e.g. '{"id": 1}'
        #[arg(long)]
        payload: String,
    },

    /// Show engine status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct IngestResult {
    status: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct StatsResult {
    events_accepted: u64,
    queue_depth: usize,
    queue_closed: bool,
    items_processed: u64,
    items_failed: u64,
    workers: usize,
    uptime_seconds: u64,
}

#[derive(Tabled)]
struct StatRow {
    metric: &'static str,
    value: String,
}

impl StatsResult {
    fn rows(&self) -> Vec<StatRow> {
        let row = |metric, value: String| StatRow { metric, value };
        vec![
            row("Events accepted", self.events_accepted.to_string()),
            row("Queue depth", self.queue_depth.to_string()),
            row("Queue", if self.queue_closed { "closed" } else { "open" }.to_string()),
            row("Items processed", self.items_processed.to_string()),
            row("Items failed", self.items_failed.to_string()),
            row("Workers", self.workers.to_string()),
            row("Uptime", format!("{}s", self.uptime_seconds)),
        ]
    }
}

/// Parse `--payload`, which must be a JSON object
fn parse_payload(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(raw).context("Invalid JSON payload")?;
    if !value.is_object() {
        anyhow::bail!("Payload must be a JSON object");
    }
    Ok(value)
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { payload } => {
            let params = json!({ "payload": parse_payload(&payload)? });

            let result = call_rpc(&cli.rpc_url, "events.ingest.v1", params).await?;
            let ack: IngestResult = serde_json::from_value(result)?;

            println!("{}", format!("✓ Event {}", ack.status).green().bold());
            println!("{}", serde_json::to_string_pretty(&ack.data)?);
        }

        Commands::Status => {
            println!("{}", "Dispatch Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(result) => {
                    let stats: StatsResult = serde_json::from_value(result)?;
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    let status = if stats.queue_closed {
                        "DRAINING".yellow()
                    } else {
                        "ONLINE".green()
                    };
                    println!("  {} {}", "Status:".bold(), status);
                    println!();
                    println!("{}", Table::new(stats.rows()));
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
