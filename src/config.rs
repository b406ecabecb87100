use serde::{Deserialize, Serialize};
use std::{
  env, fs,
  path::{Path, PathBuf},
  str::FromStr,
};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::seeding::{EliminationType, PlayoffFormat, SeedingPattern};
use crate::standings::OverallPolicy;

pub const DEFAULT_PLAYOFF_FORMAT: PlayoffFormat = PlayoffFormat::Top8;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Tournament defaults. Unset fields fall back to the environment, then to
/// the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub playoff_format: Option<PlayoffFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub elimination_type: Option<EliminationType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seeding_pattern: Option<SeedingPattern>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub overall_policy: Option<OverallPolicy>,
  pub log_dir: String,
  pub log_filter: String,
}

impl AppConfig {
  pub fn playoff_format(&self) -> PlayoffFormat {
    self.playoff_format.unwrap_or(DEFAULT_PLAYOFF_FORMAT)
  }

  pub fn elimination_type(&self) -> EliminationType {
    self.elimination_type.unwrap_or_default()
  }

  pub fn seeding_pattern(&self) -> SeedingPattern {
    self.seeding_pattern.unwrap_or_default()
  }

  pub fn overall_policy(&self) -> OverallPolicy {
    self.overall_policy.unwrap_or_default()
  }

  pub fn log_dir(&self) -> PathBuf {
    let trimmed = self.log_dir.trim();
    if trimmed.is_empty() {
      repo_root().join("logs")
    } else {
      resolve_repo_path(trimmed)
    }
  }

  pub fn log_filter(&self) -> &str {
    let trimmed = self.log_filter.trim();
    if trimmed.is_empty() {
      DEFAULT_LOG_FILTER
    } else {
      trimmed
    }
  }
}

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  match env_default("POOL_PLAY_CONFIG_PATH") {
    Some(raw) => resolve_repo_path(&raw),
    None => repo_root().join("tournament.json"),
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

fn parse_or_warn<T>(key: &str, raw: String) -> Option<T>
where
  T: FromStr<Err = Error>,
{
  match raw.parse() {
    Ok(value) => Some(value),
    Err(e) => {
      warn!("ignoring {key}: {e}");
      None
    }
  }
}

/// Fills unset fields from `lookup` (the environment in practice).
pub fn apply_defaults_from<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
  F: Fn(&str) -> Option<String>,
{
  if config.playoff_format.is_none() {
    config.playoff_format = lookup("PLAYOFF_FORMAT").and_then(|raw| parse_or_warn("PLAYOFF_FORMAT", raw));
  }
  if config.elimination_type.is_none() {
    config.elimination_type = lookup("ELIMINATION_TYPE").and_then(|raw| parse_or_warn("ELIMINATION_TYPE", raw));
  }
  if config.seeding_pattern.is_none() {
    config.seeding_pattern = lookup("SEEDING_PATTERN").and_then(|raw| parse_or_warn("SEEDING_PATTERN", raw));
  }
  if config.overall_policy.is_none() {
    config.overall_policy = lookup("STANDINGS_POLICY").and_then(|raw| parse_or_warn("STANDINGS_POLICY", raw));
  }
  if config.log_dir.trim().is_empty() {
    if let Some(value) = lookup("LOG_DIR") {
      config.log_dir = value;
    }
  }
  config
}

pub fn apply_env_defaults(config: AppConfig) -> AppConfig {
  apply_defaults_from(config, env_default)
}

pub fn load_config() -> Result<AppConfig> {
  load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|source| Error::Json { path: path.to_path_buf(), source })?;
  Ok(apply_env_defaults(config))
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
  let payload =
    serde_json::to_string_pretty(config).map_err(|source| Error::Json { path: path.to_path_buf(), source })?;
  fs::write(path, payload).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

/// Loads `<crate root>/.env`. A missing file is fine; an unreadable one is
/// logged and skipped.
pub fn load_env_file() {
  let path = repo_root().join(".env");
  if !path.is_file() {
    return;
  }
  match load_env_file_from(&path) {
    Ok(exported) => debug!("exported {exported} variable(s) from {}", path.display()),
    Err(e) => warn!("skipping env file: {e}"),
  }
}

/// Exports each variable in `path` that the environment doesn't already
/// define. Returns how many were exported.
pub fn load_env_file_from(path: &Path) -> Result<usize> {
  let contents = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
  let fresh = contents
    .lines()
    .filter_map(parse_env_line)
    .filter(|(key, _)| env::var_os(key).is_none())
    .collect::<Vec<_>>();
  let exported = fresh.len();
  for (key, value) in fresh {
    env::set_var(key, value);
  }
  Ok(exported)
}

/// `KEY=VALUE`, optionally prefixed with `export`. Quoted values are taken
/// verbatim; unquoted ones stop at a `#`. Keys must be identifiers.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
  let (key, value) = line.split_once('=')?;
  let key = key.trim();
  if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
    return None;
  }
  let value = value.trim();
  let value = ['"', '\'']
    .into_iter()
    .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
    .unwrap_or_else(|| value.split('#').next().unwrap_or_default().trim_end());
  Some((key.to_string(), value.to_string()))
}
