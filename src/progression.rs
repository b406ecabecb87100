//! Fills sourced bracket slots from completed playoff games.
//!
//! Slots reference other games by game number; every lookup goes through a
//! game-number -> row index map built from the division's playoff games.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{ForfeitStatus, Game, GameOutcome, GameStatus, SlotPosition, SlotSource, SourcePosition};

/// One write to a playoff slot's team id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionUpdate {
  pub game_id: String,
  pub game_number: u32,
  pub position: SlotPosition,
  pub previous: Option<String>,
  pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotResolution {
  Ready(String),
  Empty,
  Pending,
}

/// Playoff game number -> index into `games`.
pub fn game_index(games: &[Game]) -> HashMap<u32, usize> {
  games
    .iter()
    .enumerate()
    .filter_map(|(index, game)| game.game_number().map(|number| (number, index)))
    .collect()
}

fn sources_of(game: &Game) -> [(SlotPosition, Option<SlotSource>); 2] {
  match &game.playoff {
    Some(slot) => [
      (SlotPosition::Team1, slot.team1_source),
      (SlotPosition::Team2, slot.team2_source),
    ],
    None => [(SlotPosition::Team1, None), (SlotPosition::Team2, None)],
  }
}

fn resolve_source(source: SlotSource, games: &[Game], index: &HashMap<u32, usize>) -> Option<SlotResolution> {
  let source_game = &games[*index.get(&source.game_number)?];
  if !source_game.is_completed() {
    return Some(SlotResolution::Pending);
  }
  Some(match source_game.outcome() {
    Some(GameOutcome::Decided { winner, loser }) => match source.position {
      SourcePosition::Winner => SlotResolution::Ready(winner),
      SourcePosition::Loser => SlotResolution::Ready(loser),
    },
    _ => SlotResolution::Pending,
  })
}

/// Writes `resolution` into the slot, returning the update only when the
/// stored team id actually changed.
fn apply_slot_resolution(game: &mut Game, position: SlotPosition, resolution: SlotResolution) -> Option<ProgressionUpdate> {
  let next = match resolution {
    SlotResolution::Ready(team_id) => Some(team_id),
    SlotResolution::Empty => None,
    SlotResolution::Pending => return None,
  };
  let slot = game.team_slot_mut(position);
  if *slot == next {
    return None;
  }
  let previous = std::mem::replace(slot, next.clone());
  Some(ProgressionUpdate {
    game_id: game.id.clone(),
    game_number: game.game_number().unwrap_or_default(),
    position,
    previous,
    team_id: next,
  })
}

fn is_if_necessary(game: &Game) -> bool {
  game.playoff.as_ref().is_some_and(|slot| slot.if_necessary)
}

/// Pushes the winner and loser of game `completed_number` into every slot
/// sourced from it. A game that is not completed, or ended in a tie without
/// a forfeit, produces no updates. Re-applying the same result is a no-op.
/// The if-necessary game only receives teams once it has to be played.
pub fn apply_progression(completed_number: u32, games: &mut [Game]) -> Result<Vec<ProgressionUpdate>> {
  let index = game_index(games);
  let Some(&completed_index) = index.get(&completed_number) else {
    return Err(Error::Inconsistent(format!("game {completed_number} is not in the bracket")));
  };
  let (winner, loser) = match games[completed_index].outcome() {
    Some(GameOutcome::Decided { winner, loser }) => (winner, loser),
    Some(GameOutcome::Tie) => {
      debug!("game {completed_number} ended level, nothing to propagate");
      return Ok(Vec::new());
    }
    None => return Ok(Vec::new()),
  };

  let hold_reset = if_necessary_needed(games) != Some(true);
  let mut updates = Vec::new();
  for game in games.iter_mut() {
    let held = hold_reset && is_if_necessary(game);
    for (position, source) in sources_of(game) {
      let Some(source) = source else {
        continue;
      };
      if source.game_number != completed_number {
        continue;
      }
      let resolution = if held {
        SlotResolution::Empty
      } else {
        SlotResolution::Ready(match source.position {
          SourcePosition::Winner => winner.clone(),
          SourcePosition::Loser => loser.clone(),
        })
      };
      if let Some(update) = apply_slot_resolution(game, position, resolution) {
        updates.push(update);
      }
    }
  }
  debug!("game {completed_number}: {} slot(s) updated", updates.len());
  Ok(updates)
}

/// Recomputes every sourced slot from the completed games, in game-number
/// order so chains resolve in one pass. Slots pointing at a game number that
/// doesn't exist are logged and left alone.
pub fn propagate_all(games: &mut [Game]) -> Vec<ProgressionUpdate> {
  let index = game_index(games);
  let mut numbers = index.keys().copied().collect::<Vec<_>>();
  numbers.sort_unstable();

  let mut updates = Vec::new();
  for number in numbers {
    let target = index[&number];
    for (position, source) in sources_of(&games[target]) {
      let Some(source) = source else {
        continue;
      };
      let Some(resolution) = resolve_source(source, games, &index) else {
        warn!(
          "game {} ({}): slot {:?} references missing game {}, skipping",
          number, games[target].id, position, source.game_number
        );
        continue;
      };
      let resolution = match resolution {
        SlotResolution::Ready(_) if is_if_necessary(&games[target]) && if_necessary_needed(games) != Some(true) => {
          SlotResolution::Empty
        }
        other => other,
      };
      if let Some(update) = apply_slot_resolution(&mut games[target], position, resolution) {
        updates.push(update);
      }
    }
  }
  updates
}

/// Progression for a result that may replace an earlier one. When the game
/// already had a decided outcome and the new one differs, every slot and
/// result downstream of it is cleared before the new winner and loser move
/// on, so no later game keeps a team the corrected score eliminated.
pub fn apply_corrected_result(
  number: u32,
  previous: Option<&GameOutcome>,
  games: &mut [Game],
) -> Result<Vec<ProgressionUpdate>> {
  let index = game_index(games);
  let Some(&position) = index.get(&number) else {
    return Err(Error::Inconsistent(format!("game {number} is not in the bracket")));
  };
  let current = games[position].outcome();
  let mut updates = Vec::new();
  if matches!(previous, Some(GameOutcome::Decided { .. })) && previous != current.as_ref() {
    warn!("game {number} ({}): outcome changed, clearing downstream games", games[position].id);
    updates = clear_downstream(number, games);
  }
  updates.extend(apply_progression(number, games)?);
  Ok(updates)
}

/// Game numbers whose participants depend, directly or transitively, on
/// `root`. Includes `root`.
pub fn collect_dependent_games(games: &[Game], root: u32) -> HashSet<u32> {
  let mut dependents: HashMap<u32, Vec<u32>> = HashMap::new();
  for game in games {
    let Some(number) = game.game_number() else {
      continue;
    };
    for (_, source) in sources_of(game) {
      if let Some(source) = source {
        dependents.entry(source.game_number).or_default().push(number);
      }
    }
  }

  let mut affected = HashSet::new();
  let mut stack = vec![root];
  while let Some(current) = stack.pop() {
    if !affected.insert(current) {
      continue;
    }
    if let Some(children) = dependents.get(&current) {
      stack.extend(children.iter().copied());
    }
  }
  affected
}

fn clear_result(game: &mut Game) {
  game.status = GameStatus::Scheduled;
  game.home_score = None;
  game.away_score = None;
  game.home_innings_batted = 0.0;
  game.away_innings_batted = 0.0;
  game.forfeit_status = ForfeitStatus::None;
}

/// Clears game `number`'s result, empties every slot fed by it or by any
/// game downstream of it, and clears the results of those downstream games.
pub fn reset_game(number: u32, games: &mut [Game]) -> Result<Vec<ProgressionUpdate>> {
  let index = game_index(games);
  let Some(&root_index) = index.get(&number) else {
    return Err(Error::Inconsistent(format!("game {number} is not in the bracket")));
  };
  clear_result(&mut games[root_index]);
  Ok(clear_downstream(number, games))
}

/// Empties every slot fed by `number` or by any game downstream of it, and
/// clears the results of those downstream games. `number` itself is left as is.
fn clear_downstream(number: u32, games: &mut [Game]) -> Vec<ProgressionUpdate> {
  let affected = collect_dependent_games(games, number);
  let mut updates = Vec::new();
  for game in games.iter_mut() {
    let Some(game_number) = game.game_number() else {
      continue;
    };
    if game_number == number || !affected.contains(&game_number) {
      continue;
    }
    let mut cleared = false;
    for (position, source) in sources_of(game) {
      let Some(source) = source else {
        continue;
      };
      if !affected.contains(&source.game_number) {
        continue;
      }
      if let Some(update) = apply_slot_resolution(game, position, SlotResolution::Empty) {
        updates.push(update);
      }
      cleared = true;
    }
    if cleared && game.is_completed() {
      warn!("game {game_number} ({}) lost its result after game {number} changed", game.id);
      clear_result(game);
    }
  }
  updates
}

/// For a double-elimination bracket: whether the if-necessary game has to be
/// played. `None` while the first championship game is undecided or when
/// the bracket has no such game. Team 2 of the first championship game is
/// the losers-bracket side.
pub fn if_necessary_needed(games: &[Game]) -> Option<bool> {
  let index = game_index(games);
  let reset = games
    .iter()
    .find(|game| game.playoff.as_ref().is_some_and(|slot| slot.if_necessary))?;
  let first_final = reset.playoff.as_ref()?.team1_source?.game_number;
  let first_final = &games[*index.get(&first_final)?];
  match first_final.outcome()? {
    GameOutcome::Decided { winner, .. } => Some(first_final.away_team_id.as_deref() == Some(winner.as_str())),
    GameOutcome::Tie => None,
  }
}
