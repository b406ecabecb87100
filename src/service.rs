//! Request-level operations over a shared store.

use serde::{Deserialize, Serialize};

use tracing::info;

use crate::bracket::generate_bracket;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::seeding::{seed_teams, EliminationType, PlayoffFormat, PlayoffPlan, Seeding, SeedingPattern};
use crate::standings::{division_pool_standings, overall_standings, OverallPolicy};
use crate::store::{GameResult, ResultApplied, TournamentStore};
use crate::types::{Game, Pool, PoolStandings, SharedStore, Team, TeamStanding};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Lock the store, then call `f` with it.
fn with_store<F, R>(store: &SharedStore, f: F) -> Result<R>
where
  F: FnOnce(&mut TournamentStore) -> Result<R>,
{
  let mut guard = store
    .lock()
    .map_err(|e| Error::Inconsistent(format!("store lock poisoned: {e}")))?;
  f(&mut guard)
}

// ── Standings ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRequest {
  pub pools: Vec<Pool>,
  pub teams: Vec<Team>,
  pub games: Vec<Game>,
  #[serde(default)]
  pub policy: OverallPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
  pub pools: Vec<PoolStandings>,
  pub overall: Vec<TeamStanding>,
}

/// Pool tables plus the overall order for a set of pools over a set of games.
/// Playoff games never count towards standings.
pub fn compute_standings(request: &StandingsRequest) -> StandingsResponse {
  let pool_games = request
    .games
    .iter()
    .filter(|game| !game.is_playoff())
    .cloned()
    .collect::<Vec<_>>();
  StandingsResponse {
    pools: division_pool_standings(&request.pools, &request.teams, &pool_games),
    overall: overall_standings(request.policy, &request.pools, &request.teams, &pool_games),
  }
}

pub fn division_standings(store: &SharedStore, division_id: &str, policy: OverallPolicy) -> Result<StandingsResponse> {
  with_store(store, |store| {
    let division = store.division(division_id)?;
    Ok(compute_standings(&StandingsRequest {
      pools: division.pools.clone(),
      teams: division.teams.clone(),
      games: division.pool_games(),
      policy,
    }))
  })
}

// ── Bracket generation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBracketRequest {
  pub division_id: String,
  pub format: PlayoffFormat,
  #[serde(default)]
  pub elimination: EliminationType,
  #[serde(default)]
  pub pattern: SeedingPattern,
  #[serde(default)]
  pub policy: OverallPolicy,
}

impl GenerateBracketRequest {
  /// Request for `division_id` using the configured defaults.
  pub fn from_config(division_id: &str, config: &AppConfig) -> Self {
    Self {
      division_id: division_id.to_string(),
      format: config.playoff_format(),
      elimination: config.elimination_type(),
      pattern: config.seeding_pattern(),
      policy: config.overall_policy(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBracket {
  pub division_id: String,
  pub seeding: Seeding,
  pub games: Vec<Game>,
}

/// Ranks the division, seeds the bracket and inserts its games. Nothing is
/// written unless every step succeeds.
pub fn generate_division_bracket(store: &SharedStore, request: &GenerateBracketRequest) -> Result<GeneratedBracket> {
  with_store(store, |store| {
    let division_id = request.division_id.as_str();
    let (seeding, games) = {
      let division = store.division(division_id)?;
      if division.has_bracket() {
        return Err(Error::BracketExists(division_id.to_string()));
      }
      let plan = PlayoffPlan::new(request.format, request.elimination, request.pattern, division.pools.len())?;
      let pool_games = division.pool_games();
      let pool_tables = division_pool_standings(&division.pools, &division.teams, &pool_games);
      let overall = overall_standings(request.policy, &division.pools, &division.teams, &pool_games);
      let seeding = seed_teams(&plan, &pool_tables, &overall)?;
      let games = generate_bracket(division_id, &plan, &seeding)?;
      (seeding, games)
    };
    store.insert_playoff_games(division_id, games.clone())?;
    info!(
      "division {division_id}: bracket generated with {} games, {} seeds",
      games.len(),
      seeding.seeds.len()
    );
    Ok(GeneratedBracket {
      division_id: division_id.to_string(),
      seeding,
      games,
    })
  })
}

// ── Results ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResultRequest {
  pub division_id: String,
  pub game_id: String,
  #[serde(flatten)]
  pub result: GameResult,
}

pub fn apply_game_result(store: &SharedStore, request: &ApplyResultRequest) -> Result<ResultApplied> {
  with_store(store, |store| store.record_result(&request.division_id, &request.game_id, &request.result))
}

pub fn reset_game_result(store: &SharedStore, division_id: &str, game_id: &str) -> Result<ResultApplied> {
  with_store(store, |store| store.reset_result(division_id, game_id))
}
