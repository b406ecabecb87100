//! In-memory tournament storage.
//!
//! Each division is an independent unit of work: [`TournamentStore::with_division`]
//! runs a closure against a working copy and only commits it when the closure
//! succeeds, so a result write and its bracket progression land together or
//! not at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::progression::{apply_corrected_result, reset_game, ProgressionUpdate};
use crate::types::{ForfeitStatus, Game, GameStatus, Pool, Team};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub pools: Vec<Pool>,
  #[serde(default)]
  pub teams: Vec<Team>,
  #[serde(default)]
  pub games: Vec<Game>,
  #[serde(default)]
  pub audit: Vec<AuditEntry>,
}

impl Division {
  pub fn new(id: &str, name: &str) -> Self {
    Self {
      id: id.to_string(),
      name: name.to_string(),
      ..Self::default()
    }
  }

  pub fn has_bracket(&self) -> bool {
    self.games.iter().any(Game::is_playoff)
  }

  pub fn playoff_games(&self) -> impl Iterator<Item = &Game> {
    self.games.iter().filter(|game| game.is_playoff())
  }

  pub fn pool_games(&self) -> Vec<Game> {
    self.games.iter().filter(|game| !game.is_playoff()).cloned().collect()
  }

  pub fn game(&self, game_id: &str) -> Result<&Game> {
    self.games.iter().find(|game| game.id == game_id).ok_or_else(|| Error::GameNotFound {
      division_id: self.id.clone(),
      game_id: game_id.to_string(),
    })
  }

  fn game_position(&self, game_id: &str) -> Result<usize> {
    self.games.iter().position(|game| game.id == game_id).ok_or_else(|| Error::GameNotFound {
      division_id: self.id.clone(),
      game_id: game_id.to_string(),
    })
  }

  /// Playoff rows only, in storage order. Progression never sees pool games.
  fn split_playoff_games(&mut self) -> (Vec<usize>, Vec<Game>) {
    self
      .games
      .iter()
      .enumerate()
      .filter(|(_, game)| game.is_playoff())
      .map(|(index, game)| (index, game.clone()))
      .unzip()
  }

  fn write_back(&mut self, positions: &[usize], playoff: Vec<Game>) {
    for (position, game) in positions.iter().zip(playoff) {
      self.games[*position] = game;
    }
  }
}

/// Score entry for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
  pub home_score: u32,
  pub away_score: u32,
  pub home_innings_batted: f64,
  pub away_innings_batted: f64,
  #[serde(default)]
  pub forfeit_status: ForfeitStatus,
}

impl GameResult {
  pub fn new(home_score: u32, away_score: u32) -> Self {
    Self {
      home_score,
      away_score,
      home_innings_batted: 7.0,
      away_innings_batted: 7.0,
      forfeit_status: ForfeitStatus::None,
    }
  }

  fn validate(&self) -> Result<()> {
    for innings in [self.home_innings_batted, self.away_innings_batted] {
      if !innings.is_finite() || innings < 0.0 {
        return Err(Error::InvalidResult(format!("innings batted must be a non-negative number, got {innings}")));
      }
    }
    Ok(())
  }
}

/// The fields of a game an audit entry compares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
  pub status: GameStatus,
  pub home_team_id: Option<String>,
  pub away_team_id: Option<String>,
  pub home_score: Option<u32>,
  pub away_score: Option<u32>,
  pub forfeit_status: ForfeitStatus,
}

impl From<&Game> for GameSnapshot {
  fn from(game: &Game) -> Self {
    Self {
      status: game.status,
      home_team_id: game.home_team_id.clone(),
      away_team_id: game.away_team_id.clone(),
      home_score: game.home_score,
      away_score: game.away_score,
      forfeit_status: game.forfeit_status,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  ResultRecorded,
  ResultReset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
  pub at: DateTime<Utc>,
  pub action: AuditAction,
  pub game_id: String,
  pub before: GameSnapshot,
  pub after: GameSnapshot,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub progression: Vec<ProgressionUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultApplied {
  pub game: Game,
  pub updates: Vec<ProgressionUpdate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentStore {
  divisions: BTreeMap<String, Division>,
}

impl TournamentStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_division(&mut self, division: Division) {
    self.divisions.insert(division.id.clone(), division);
  }

  pub fn division(&self, division_id: &str) -> Result<&Division> {
    self
      .divisions
      .get(division_id)
      .ok_or_else(|| Error::DivisionNotFound(division_id.to_string()))
  }

  pub fn divisions(&self) -> impl Iterator<Item = &Division> {
    self.divisions.values()
  }

  /// Runs `f` against a working copy of the division and commits the copy
  /// only if `f` returns `Ok`.
  pub fn with_division<F, R>(&mut self, division_id: &str, f: F) -> Result<R>
  where
    F: FnOnce(&mut Division) -> Result<R>,
  {
    let current = self
      .divisions
      .get(division_id)
      .ok_or_else(|| Error::DivisionNotFound(division_id.to_string()))?;
    let mut working = current.clone();
    let out = f(&mut working)?;
    self.divisions.insert(division_id.to_string(), working);
    Ok(out)
  }

  pub fn insert_playoff_games(&mut self, division_id: &str, games: Vec<Game>) -> Result<()> {
    self.with_division(division_id, |division| {
      if division.has_bracket() {
        return Err(Error::BracketExists(division.id.clone()));
      }
      division.games.extend(games);
      Ok(())
    })
  }

  /// Writes a score and, for playoff games, pushes the winner/loser into the
  /// downstream slots in the same transaction. Correcting a playoff score so
  /// the outcome changes clears everything downstream of the game first.
  pub fn record_result(&mut self, division_id: &str, game_id: &str, result: &GameResult) -> Result<ResultApplied> {
    result.validate()?;
    self.with_division(division_id, |division| {
      let position = division.game_position(game_id)?;
      let before = GameSnapshot::from(&division.games[position]);
      let previous = division.games[position].outcome();
      {
        let game = &mut division.games[position];
        if game.home_team_id.is_none() || game.away_team_id.is_none() {
          return Err(Error::InvalidResult(format!("game {game_id} does not have both teams yet")));
        }
        game.home_score = Some(result.home_score);
        game.away_score = Some(result.away_score);
        game.home_innings_batted = result.home_innings_batted;
        game.away_innings_batted = result.away_innings_batted;
        game.forfeit_status = result.forfeit_status;
        game.status = GameStatus::Completed;
      }

      let updates = match division.games[position].game_number() {
        Some(number) => {
          let (positions, mut playoff) = division.split_playoff_games();
          let updates = apply_corrected_result(number, previous.as_ref(), &mut playoff)?;
          division.write_back(&positions, playoff);
          updates
        }
        None => Vec::new(),
      };

      let game = division.games[position].clone();
      division.audit.push(AuditEntry {
        at: Utc::now(),
        action: AuditAction::ResultRecorded,
        game_id: game_id.to_string(),
        before,
        after: GameSnapshot::from(&game),
        progression: updates.clone(),
      });
      info!(
        "division {}: recorded {} {}-{} ({} slot update(s))",
        division.id,
        game_id,
        result.home_score,
        result.away_score,
        updates.len()
      );
      Ok(ResultApplied { game, updates })
    })
  }

  /// Clears a playoff game's result along with everything downstream of it.
  pub fn reset_result(&mut self, division_id: &str, game_id: &str) -> Result<ResultApplied> {
    self.with_division(division_id, |division| {
      let position = division.game_position(game_id)?;
      let Some(number) = division.games[position].game_number() else {
        return Err(Error::NotPlayoffGame(game_id.to_string()));
      };
      let before = GameSnapshot::from(&division.games[position]);
      let (positions, mut playoff) = division.split_playoff_games();
      let updates = reset_game(number, &mut playoff)?;
      division.write_back(&positions, playoff);

      let game = division.games[position].clone();
      division.audit.push(AuditEntry {
        at: Utc::now(),
        action: AuditAction::ResultReset,
        game_id: game_id.to_string(),
        before,
        after: GameSnapshot::from(&game),
        progression: updates.clone(),
      });
      info!("division {}: reset {} ({} slot update(s))", division.id, game_id, updates.len());
      Ok(ResultApplied { game, updates })
    })
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let raw = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| Error::Json { path: path.to_path_buf(), source })
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
    }
    let payload =
      serde_json::to_string_pretty(self).map_err(|source| Error::Json { path: path.to_path_buf(), source })?;
    fs::write(path, payload).map_err(|source| Error::Io { path: path.to_path_buf(), source })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::generate_bracket;
  use crate::seeding::{EliminationType, PlayoffFormat, PlayoffPlan, Seeding, SeedingPattern};
  use crate::types::{PlayoffSlot, BracketSide, SeededTeam, SlotSource};

  fn make_playoff_game(number: u32, home: Option<&str>, away: Option<&str>) -> Game {
    Game {
      id: format!("div-playoff-{number}"),
      division_id: "div".to_string(),
      home_team_id: home.map(str::to_string),
      away_team_id: away.map(str::to_string),
      status: GameStatus::Scheduled,
      home_score: None,
      away_score: None,
      home_innings_batted: 0.0,
      away_innings_batted: 0.0,
      forfeit_status: ForfeitStatus::None,
      playoff: Some(PlayoffSlot {
        round: if number == 3 { 2 } else { 1 },
        game_number: number,
        bracket: if number == 3 { BracketSide::Championship } else { BracketSide::Winners },
        team1_source: (number == 3).then(|| SlotSource::winner(1)),
        team2_source: (number == 3).then(|| SlotSource::winner(2)),
        if_necessary: false,
        label: None,
      }),
    }
  }

  fn make_test_store() -> TournamentStore {
    let mut division = Division::new("div", "12U");
    division.games = vec![
      make_playoff_game(1, Some("a"), Some("d")),
      make_playoff_game(2, Some("b"), Some("c")),
      make_playoff_game(3, None, None),
    ];
    let mut store = TournamentStore::new();
    store.insert_division(division);
    store
  }

  #[test]
  fn test_record_result_propagates_and_audits() {
    let mut store = make_test_store();
    let applied = store.record_result("div", "div-playoff-1", &GameResult::new(2, 5)).unwrap();
    assert_eq!(applied.updates.len(), 1);
    assert_eq!(applied.updates[0].team_id.as_deref(), Some("d"));

    let division = store.division("div").unwrap();
    assert_eq!(division.games[2].home_team_id.as_deref(), Some("d"));
    assert_eq!(division.audit.len(), 1);
    let entry = &division.audit[0];
    assert_eq!(entry.before.status, GameStatus::Scheduled);
    assert_eq!(entry.after.away_score, Some(5));
    assert_eq!(entry.progression.len(), 1);
  }

  #[test]
  fn test_failed_write_leaves_division_untouched() {
    let mut store = make_test_store();
    let before = store.division("div").unwrap().clone();
    let err = store.record_result("div", "div-playoff-3", &GameResult::new(1, 0)).unwrap_err();
    assert!(matches!(err, Error::InvalidResult(_)));
    let mut bad = GameResult::new(1, 0);
    bad.home_innings_batted = -1.0;
    assert!(store.record_result("div", "div-playoff-1", &bad).is_err());
    assert_eq!(store.division("div").unwrap(), &before);
    assert!(matches!(
      store.record_result("div", "nope", &GameResult::new(1, 0)),
      Err(Error::GameNotFound { .. })
    ));
  }

  #[test]
  fn test_reset_result_clears_downstream() {
    let mut store = make_test_store();
    store.record_result("div", "div-playoff-1", &GameResult::new(4, 1)).unwrap();
    store.record_result("div", "div-playoff-2", &GameResult::new(4, 1)).unwrap();
    let applied = store.reset_result("div", "div-playoff-1").unwrap();
    assert_eq!(applied.updates.len(), 1);
    let division = store.division("div").unwrap();
    assert_eq!(division.games[2].home_team_id, None);
    assert_eq!(division.games[2].away_team_id.as_deref(), Some("b"));
    assert_eq!(division.audit.last().map(|e| e.action), Some(AuditAction::ResultReset));
  }

  fn make_eight_team_store() -> TournamentStore {
    let seeding = Seeding {
      seeds: (1..=8)
        .map(|seed| SeededTeam {
          seed,
          team_id: format!("t{seed}"),
          pool_name: "Pool A".to_string(),
          pool_rank: seed as usize,
        })
        .collect(),
      first_round: Vec::new(),
      rematch_warnings: Vec::new(),
    };
    let plan = PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Single, SeedingPattern::Standard, 1).unwrap();
    let mut division = Division::new("div", "16U");
    division.games = generate_bracket("div", &plan, &seeding).unwrap();
    let mut store = TournamentStore::new();
    store.insert_division(division);
    store
  }

  #[test]
  fn test_corrected_score_clears_later_games() {
    let mut store = make_eight_team_store();
    for number in 1..=4 {
      store.record_result("div", &format!("div-playoff-{number}"), &GameResult::new(5, 1)).unwrap();
    }
    store.record_result("div", "div-playoff-5", &GameResult::new(3, 2)).unwrap();
    assert_eq!(store.division("div").unwrap().game("div-playoff-7").unwrap().home_team_id.as_deref(), Some("t1"));

    let applied = store.record_result("div", "div-playoff-1", &GameResult::new(1, 5)).unwrap();
    assert!(applied.updates.iter().any(|u| u.game_number == 7 && u.team_id.is_none()));
    let division = store.division("div").unwrap();
    let semi = division.game("div-playoff-5").unwrap();
    assert_eq!(semi.home_team_id.as_deref(), Some("t8"));
    assert_eq!(semi.status, GameStatus::Scheduled);
    assert_eq!(semi.home_score, None);
    assert_eq!(division.game("div-playoff-7").unwrap().home_team_id, None);
  }

  #[test]
  fn test_tie_replacing_result_empties_fed_slots() {
    let mut store = make_eight_team_store();
    store.record_result("div", "div-playoff-1", &GameResult::new(5, 1)).unwrap();
    store.record_result("div", "div-playoff-1", &GameResult::new(2, 2)).unwrap();
    let division = store.division("div").unwrap();
    assert_eq!(division.game("div-playoff-5").unwrap().home_team_id, None);
    assert_eq!(division.audit.len(), 2);
    assert_eq!(division.audit[1].progression.len(), 1);
  }

  #[test]
  fn test_second_bracket_is_rejected() {
    let mut store = make_test_store();
    let err = store.insert_playoff_games("div", vec![make_playoff_game(4, None, None)]).unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(store.division("div").unwrap().games.len(), 3);
  }

  #[test]
  fn test_save_and_load_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store").join("tournament-state.json");
    let mut store = make_test_store();
    store.record_result("div", "div-playoff-1", &GameResult::new(3, 0)).unwrap();
    store.save_to(&path).unwrap();
    let loaded = TournamentStore::load_from(&path).unwrap();
    assert_eq!(loaded.division("div").unwrap(), store.division("div").unwrap());
  }
}
