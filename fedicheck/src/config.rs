use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "fedicheck.yaml";
pub const DEFAULT_TARGETS_FILE: &str = "domains.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "domains.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CheckConfig {
    pub targets: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub redirects: Option<usize>,
    pub schema_prefix: Option<String>,
    pub user_agent: Option<String>,
    pub plain_list: Option<bool>,
    pub pretty: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub check: Option<CheckConfig>,
}

/// Load `path`, or `./fedicheck.yaml` when no path is given and it exists.
/// An explicit path that cannot be read, or any file that fails to parse, is an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(cfg))
}

/// Command-line values for a check run; `None` means "not given on the command line".
#[derive(Debug, Default, Clone)]
pub struct CheckArgs {
    pub targets: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub redirects: Option<usize>,
    pub schema_prefix: Option<String>,
    pub user_agent: Option<String>,
    pub plain: bool,
    pub pretty: bool,
}

/// Effective settings: command line over config file over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub targets: PathBuf,
    pub output: PathBuf,
    pub timeout: Duration,
    pub redirects: usize,
    pub schema_prefix: String,
    pub user_agent: String,
    pub plain_list: bool,
    pub pretty: bool,
}

impl Settings {
    pub fn resolve(args: CheckArgs, cfg: Option<&Config>) -> Settings {
        let file = cfg.and_then(|c| c.check.clone()).unwrap_or_default();
        Settings {
            targets: args.targets.or(file.targets).unwrap_or_else(|| PathBuf::from(DEFAULT_TARGETS_FILE)),
            output: args.out.or(file.output).unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            timeout: Duration::from_millis(args.timeout_ms.or(file.timeout_ms).unwrap_or(DEFAULT_TIMEOUT_MS)),
            redirects: args.redirects.or(file.redirects).unwrap_or(10),
            schema_prefix: args
                .schema_prefix
                .or(file.schema_prefix)
                .unwrap_or_else(|| nodeinfo::DEFAULT_SCHEMA_PREFIX.to_string()),
            user_agent: args
                .user_agent
                .or(file.user_agent)
                .unwrap_or_else(|| format!("fedicheck/{}", env!("CARGO_PKG_VERSION"))),
            plain_list: args.plain || file.plain_list.unwrap_or(false),
            pretty: args.pretty || file.pretty.unwrap_or(false),
        }
    }
}
