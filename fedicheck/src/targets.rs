//! Target list loading.
//!
//! The default format is a relay listing where instance lines carry a `[*]`
//! marker and everything else is decoration. Plain lists hold one target per line.

use anyhow::{Context, Result};
use std::path::Path;

const MARKER: &str = "[*]";

pub fn parse_targets(content: &str, plain: bool) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(|line| {
            if plain {
                let t = line.trim();
                if t.is_empty() || t.starts_with('#') { None } else { Some(t.to_string()) }
            } else if line.contains(MARKER) {
                let t = line.replacen(MARKER, "", 1);
                let t = t.trim();
                if t.is_empty() { None } else { Some(t.to_string()) }
            } else {
                None
            }
        })
        .collect()
}

pub fn load_targets(path: &Path, plain: bool) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading target list {}", path.display()))?;
    Ok(parse_targets(&content, plain))
}
