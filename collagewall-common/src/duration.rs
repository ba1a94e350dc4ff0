use anyhow::{Context, Result};
use std::time::Duration;

/// Parses a human-readable duration like "90s", "5m" or "1h 30m".
pub fn parse_duration(input: &str) -> Result<Duration> {
    humantime::parse_duration(input.trim())
        .with_context(|| format!("Invalid duration: {:?}", input))
}
