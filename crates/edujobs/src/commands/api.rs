//! Direct registry access: list endpoints, run them by name, watch a query.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tabled::Tabled;
use tokio::time::{Instant, Interval, interval_at};

use edujobs_core::{Endpoint, JobBoard, QueryState};

use crate::cli::{ApiArgs, ApiCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

/// How often `watch` sweeps unobserved cache entries.
const WATCH_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

// ── Endpoint listing ────────────────────────────────────────────────

#[derive(Serialize)]
struct EndpointInfo {
    name: String,
    kind: String,
    method: String,
    path: String,
}

impl From<&Arc<Endpoint>> for EndpointInfo {
    fn from(e: &Arc<Endpoint>) -> Self {
        Self {
            name: e.name().to_owned(),
            kind: e.kind().to_string(),
            method: e.method().to_string(),
            path: e.path_template().to_owned(),
        }
    }
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&EndpointInfo> for EndpointRow {
    fn from(e: &EndpointInfo) -> Self {
        Self {
            name: e.name.clone(),
            kind: e.kind.clone(),
            method: e.method.clone(),
            path: e.path.clone(),
        }
    }
}

// ── Watch rendering ─────────────────────────────────────────────────

fn state_json(state: &QueryState) -> Value {
    json!({
        "status": state.status.to_string(),
        "isFetching": state.is_fetching,
        "isStale": state.is_stale,
        "data": state.data.as_deref(),
        "error": state.error.as_ref().map(ToString::to_string),
    })
}

fn print_state(state: &QueryState, global: &GlobalOpts) {
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let mut flags = Vec::new();
            if state.is_fetching {
                flags.push("fetching");
            }
            if state.is_stale {
                flags.push("stale");
            }
            let mut line = format!(
                "[{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                state.status
            );
            if !flags.is_empty() {
                line.push_str(&format!(" ({})", flags.join(", ")));
            }
            if let Some(ref err) = state.error {
                line.push_str(&format!("\n  error: {err}"));
            }
            if matches!(global.output, OutputFormat::Table) && !state.is_fetching {
                if let Some(ref data) = state.data {
                    line.push('\n');
                    line.push_str(&output::render_json_pretty(&**data));
                }
            }
            line
        }
        // One document per state change so the stream stays parseable.
        _ => output::render_json_compact(&state_json(state)),
    };
    output::print_output(&out, global.quiet);
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(board: &JobBoard, args: ApiArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ApiCommand::Endpoints => {
            let endpoints: Vec<EndpointInfo> =
                board.registry().iter().map(EndpointInfo::from).collect();
            let out = output::render_list(
                &global.output,
                &endpoints,
                |e| EndpointRow::from(e),
                |e| e.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ApiCommand::Query { endpoint, arg } => {
            let arg = util::parse_json_arg(&arg)?;
            let value = board.query(&endpoint, &arg).await?;
            output::print_output(&output::render_value(&global.output, &value), global.quiet);
            Ok(())
        }

        ApiCommand::Mutate {
            endpoint,
            arg,
            from_file,
        } => {
            let arg = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => util::parse_json_arg(&arg)?,
            };
            let value = board.mutate(&endpoint, &arg).await?;
            output::print_output(&output::render_value(&global.output, &value), global.quiet);
            Ok(())
        }

        ApiCommand::Watch {
            endpoint,
            arg,
            interval,
        } => {
            let arg = util::parse_json_arg(&arg)?;
            board.start_pruner(WATCH_PRUNE_INTERVAL);

            let mut sub = board.subscribe(&endpoint, &arg).await?;
            tracing::info!(key = %sub.key(), "watching");
            print_state(&sub.state(), global);

            let mut ticker = (interval > 0).then(|| {
                let period = Duration::from_secs(interval);
                interval_at(Instant::now() + period, period)
            });

            loop {
                let refetch = tokio::select! {
                    changed = sub.changed() => match changed {
                        Some(state) => {
                            print_state(&state, global);
                            false
                        }
                        None => break,
                    },
                    () = next_tick(ticker.as_mut()) => true,
                    _ = tokio::signal::ctrl_c() => break,
                };
                if refetch {
                    // Failures surface through the next state change.
                    if let Err(e) = sub.refetch().await {
                        tracing::debug!(error = %e, "periodic refetch failed");
                    }
                }
            }
            Ok(())
        }
    }
}
