//! Command implementations.
//!
//! Each command returns its rendered output so `main` only prints it.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pixland_common::progression::format_reward_unlock;
use pixland_common::{
    CancellationToken, HttpJobStatus, JobPoller, LevelResult, LevelTable, PixlandConfig,
    PollOutcome, SpatialKeyCodec,
};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

/// Rendered command output plus whether it counts as success
#[derive(Debug)]
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn codec(config: &PixlandConfig, max_value: Option<u64>) -> Result<SpatialKeyCodec> {
    let max_value = max_value.unwrap_or(config.grid.max_value);
    SpatialKeyCodec::new(max_value).context("Invalid grid size")
}

pub fn key_encode(
    config: &PixlandConfig,
    x: i64,
    y: i64,
    max_value: Option<u64>,
    as_json: bool,
) -> Result<Output> {
    let codec = codec(config, max_value)?;
    let key = codec.encode(x, y)?;
    let text = if as_json {
        to_json(&json!({ "x": x, "y": y, "max_value": codec.max_value(), "key": key }))?
    } else {
        format!("{}", key)
    };
    Ok(Output::ok(text))
}

pub fn key_decode(
    config: &PixlandConfig,
    key: u64,
    max_value: Option<u64>,
    as_json: bool,
) -> Result<Output> {
    let codec = codec(config, max_value)?;
    let cell = codec.decode(key)?;
    let text = if as_json {
        to_json(&json!({ "key": key, "max_value": codec.max_value(), "x": cell.x, "y": cell.y }))?
    } else {
        format!("{} {}", cell.x, cell.y)
    };
    Ok(Output::ok(text))
}

pub fn key_box(
    config: &PixlandConfig,
    upper_left: (i64, i64),
    lower_right: (i64, i64),
    max_value: Option<u64>,
    as_json: bool,
) -> Result<Output> {
    let codec = codec(config, max_value)?;
    let keys = codec.keys_in_box(upper_left, lower_right)?;
    let text = if as_json {
        to_json(&keys)?
    } else {
        keys.iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    };
    Ok(Output::ok(text))
}

fn level_table(config: &PixlandConfig) -> Result<LevelTable> {
    config
        .progression
        .level_table()
        .context("Failed to load level table")
}

fn render_level(result: &LevelResult) -> String {
    let mut lines = vec![
        format!(
            "{} (level {})",
            result.name.bold(),
            result.index + 1
        ),
        format!("  {}", result.message.italic()),
        format!("  Pixel limit:   {}", result.pixel_limit),
        format!("  Pixels placed: {}", result.pixels_placed),
    ];
    match result.pixels_to_next() {
        Some(remaining) => lines.push(format!(
            "  Next level at: {} ({} to go, {}%)",
            result.next_threshold,
            remaining,
            result.progress_percent()
        )),
        None => lines.push(format!("  {}", "Max level reached".green())),
    }
    if !result.unlocked_rewards.is_empty() {
        lines.push(format!("  Rewards:       {}", result.unlocked_rewards.join(", ")));
    }
    lines.join("\n")
}

pub fn level(
    config: &PixlandConfig,
    pixels: u64,
    since: Option<u64>,
    as_json: bool,
) -> Result<Output> {
    let table = level_table(config)?;
    let result = table.classify(pixels);
    let level_up = since.and_then(|old| table.level_up(old, pixels));
    let fresh = since
        .map(|old| table.newly_unlocked(old, pixels))
        .unwrap_or_default();

    if as_json {
        return Ok(Output::ok(to_json(&json!({
            "level": result,
            "level_up": level_up.is_some(),
            "newly_unlocked": fresh,
        }))?));
    }

    let mut text = render_level(&result);
    if level_up.is_some() {
        text.push_str(&format!("\n{}", "Level up!".yellow().bold()));
    }
    for reward in &fresh {
        text.push('\n');
        text.push_str(&format_reward_unlock(reward));
    }
    Ok(Output::ok(text))
}

pub fn rewards(
    config: &PixlandConfig,
    pixels: u64,
    unlocked_only: bool,
    as_json: bool,
) -> Result<Output> {
    let table = level_table(config)?;
    let rewards: Vec<_> = table
        .list_rewards(pixels)
        .into_iter()
        .filter(|r| r.unlocked || !unlocked_only)
        .collect();

    if as_json {
        return Ok(Output::ok(to_json(&rewards)?));
    }

    let text = rewards
        .iter()
        .map(|r| {
            let mark = if r.unlocked { "[x]" } else { "[ ]" };
            format!("{} {:<40} {}", mark, r.identifier, r.owner_tier_name.dimmed())
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Output::ok(text))
}

fn render_table(table: &LevelTable) -> String {
    table
        .levels()
        .iter()
        .map(|l| {
            format!(
                "{:>9}  {:<20} limit {:>3}  {}",
                l.min_pixels,
                l.name,
                l.pixel_limit,
                l.rewards.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn levels_show(config: &PixlandConfig, as_json: bool) -> Result<Output> {
    let table = level_table(config)?;
    let text = if as_json {
        to_json(table.levels())?
    } else {
        render_table(&table)
    };
    Ok(Output::ok(text))
}

pub fn levels_check(path: &Path, as_json: bool) -> Result<Output> {
    match LevelTable::load(path) {
        Ok(table) => {
            let text = if as_json {
                to_json(&json!({ "valid": true, "levels": table.len() }))?
            } else {
                format!("{} {} levels", "OK".green(), table.len())
            };
            Ok(Output::ok(text))
        }
        Err(e) => {
            let text = if as_json {
                to_json(&json!({ "valid": false, "error": e.to_string() }))?
            } else {
                format!("{} {}", "INVALID".red(), e)
            };
            Ok(Output {
                text,
                success: false,
            })
        }
    }
}

pub fn render_outcome(outcome: &PollOutcome<Value>, as_json: bool) -> Result<Output> {
    let success = outcome.is_complete();
    if as_json {
        return Ok(Output {
            text: to_json(outcome)?,
            success,
        });
    }
    let text = match outcome {
        PollOutcome::Complete { payload, attempts } => format!(
            "{} after {} check(s)\n{}",
            "Job complete".green(),
            attempts,
            serde_json::to_string_pretty(payload)?
        ),
        PollOutcome::Timeout {
            attempts,
            max_attempts,
            last_status,
        } => format!(
            "{} after {} check(s) (max attempts {}), last status: {}",
            "Gave up".yellow(),
            attempts,
            max_attempts,
            last_status
        ),
        PollOutcome::Cancelled { attempts } => {
            format!("{} after {} check(s)", "Cancelled".yellow(), attempts)
        }
    };
    Ok(Output { text, success })
}

pub async fn poll(
    config: &PixlandConfig,
    job_id: &str,
    max_attempts: Option<u32>,
    as_json: bool,
) -> Result<Output> {
    let status = HttpJobStatus::new(&config.api).context("Failed to build HTTP client")?;
    let poller = JobPoller::new(&config.poller);
    let max_attempts = max_attempts.unwrap_or_else(|| config.poller.effective_max_attempts());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    info!(
        job_id,
        max_attempts,
        worst_case_ms = poller.worst_case_wait(max_attempts).as_millis() as u64,
        "polling job"
    );
    let outcome = poller
        .poll_until_complete(&status, job_id, max_attempts, &cancel)
        .await
        .with_context(|| format!("Status check for job {} failed", job_id))?;

    render_outcome(&outcome, as_json)
}
