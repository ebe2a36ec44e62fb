//! Plan, prompt and rank command handlers.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::{error, info};

use pagepilot_config::Config;
use pagepilot_planner::{PlanRequest, Planner, RankedElement};
use pagepilot_protocols::{ElementCategory, PageSnapshot};

use crate::setup::build_planner;

/// Read a page snapshot JSON file.
pub(crate) fn load_snapshot(path: &Path) -> Result<PageSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid snapshot {}", path.display()))
}

pub(crate) async fn run_plan(config: &Config, snapshot: &Path, user_id: Option<String>) -> Result<()> {
    let planner = build_planner(config)?;
    let mut request = PlanRequest::from(load_snapshot(snapshot)?);
    if let Some(user_id) = user_id {
        request = request.with_user_id(user_id);
    }

    info!(
        "Planning '{}' over {} elements",
        request.goal,
        request.elements.len()
    );
    let result = planner.plan(&request).await;
    log_usage(&planner);

    match result {
        Ok(steps) => {
            println!("{}", serde_json::to_string_pretty(&json!({ "steps": steps }))?);
            Ok(())
        }
        Err(e) => {
            error!("Planning failed ({:?}): {}", e.kind(), e);
            bail!(e)
        }
    }
}

pub(crate) async fn run_prompt(config: &Config, snapshot: &Path) -> Result<()> {
    let planner = build_planner(config)?;
    let request = PlanRequest::from(load_snapshot(snapshot)?);
    let (_, prompt) = planner.prepare(&request).await;
    println!("{}", prompt);
    Ok(())
}

pub(crate) async fn run_rank(config: &Config, snapshot: &Path) -> Result<()> {
    let planner = build_planner(config)?;
    let request = PlanRequest::from(load_snapshot(snapshot)?);
    let ranked = planner.rank(&request).await;

    let mut output = serde_json::Map::new();
    output.insert("mode".to_string(), json!(format!("{:?}", ranked.mode)));
    for category in ElementCategory::ALL {
        let bucket: Vec<Value> = ranked.bucket(category).iter().map(ranked_json).collect();
        output.insert(category.as_str().to_string(), Value::Array(bucket));
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    Ok(())
}

fn ranked_json(ranked: &RankedElement) -> Value {
    json!({
        "score": ranked.similarity_score,
        "element": ranked.element,
    })
}

fn log_usage(planner: &Planner) {
    let chain = planner.providers();
    for id in chain.provider_ids() {
        let stats = chain.stats(id);
        info!(
            "Provider '{}': {} attempts, {} successes, {} failures",
            id, stats.attempts, stats.successes, stats.failures
        );
    }

    let status = planner.gate().limiter().status();
    info!(
        "Rate limit: {}/{} used, {} remaining",
        status.used, status.limit, status.remaining
    );
}
