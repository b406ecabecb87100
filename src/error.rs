use std::path::PathBuf;

use crate::seeding::{EliminationType, PlayoffFormat, SeedingPattern};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("no bracket is defined for {format} {elimination} elimination with {pattern} seeding across {pool_count} pool(s)")]
  UnsupportedConfiguration {
    format: PlayoffFormat,
    elimination: EliminationType,
    pattern: SeedingPattern,
    pool_count: usize,
  },
  #[error("{pattern} seeding needs exactly {expected} pools, found {found}")]
  PoolCountMismatch {
    pattern: SeedingPattern,
    expected: usize,
    found: usize,
  },
  #[error("{format} needs {required} teams, only {available} available")]
  InsufficientTeams {
    format: PlayoffFormat,
    required: usize,
    available: usize,
  },
  #[error("pool {pool} has {available} ranked teams, {required} needed")]
  InsufficientPoolTeams {
    pool: String,
    required: usize,
    available: usize,
  },
  #[error("unknown {kind}: {value}")]
  UnknownValue { kind: &'static str, value: String },
  #[error("division {0} not found")]
  DivisionNotFound(String),
  #[error("game {game_id} not found in division {division_id}")]
  GameNotFound { division_id: String, game_id: String },
  #[error("game {0} is not a playoff game")]
  NotPlayoffGame(String),
  #[error("division {0} already has a playoff bracket")]
  BracketExists(String),
  #[error("invalid result: {0}")]
  InvalidResult(String),
  #[error("inconsistent bracket state: {0}")]
  Inconsistent(String),
  #[error("read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("parse {path}: {source}")]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Coarse classification for callers that translate errors into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  BadConfiguration,
  NotFound,
  Conflict,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::UnsupportedConfiguration { .. }
      | Error::PoolCountMismatch { .. }
      | Error::InsufficientTeams { .. }
      | Error::InsufficientPoolTeams { .. }
      | Error::UnknownValue { .. }
      | Error::NotPlayoffGame(_)
      | Error::InvalidResult(_) => ErrorKind::BadConfiguration,
      Error::DivisionNotFound(_) | Error::GameNotFound { .. } => ErrorKind::NotFound,
      Error::BracketExists(_) => ErrorKind::Conflict,
      Error::Inconsistent(_) | Error::Io { .. } | Error::Json { .. } => ErrorKind::Internal,
    }
  }

  pub fn status_code(&self) -> u16 {
    match self.kind() {
      ErrorKind::BadConfiguration => 400,
      ErrorKind::NotFound => 404,
      ErrorKind::Conflict => 409,
      ErrorKind::Internal => 500,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn configuration_errors_are_client_errors() {
    let err = Error::PoolCountMismatch {
      pattern: SeedingPattern::CrossPool3,
      expected: 3,
      found: 2,
    };
    assert_eq!(err.kind(), ErrorKind::BadConfiguration);
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "cross_pool_3 seeding needs exactly 3 pools, found 2");
  }

  #[test]
  fn inconsistencies_are_internal_errors() {
    let err = Error::Inconsistent("slot references game 99".to_string());
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.status_code(), 500);
  }
}
