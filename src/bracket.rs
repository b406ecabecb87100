//! Turns a validated plan plus seed assignments into playoff game rows.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::seeding::{BracketShape, CrossPoolTable, PlayoffPlan, Seeding};
use crate::templates::{BracketMatchup, SlotRef};
use crate::types::{BracketSide, Game, GameStatus, ForfeitStatus, PlayoffSlot, SlotSource};

pub fn playoff_game_id(division_id: &str, game_number: u32) -> String {
  format!("{division_id}-playoff-{game_number}")
}

/// Slot table for `plan`: the static template, or the cross-pool wiring
/// built from its matchup table.
pub fn bracket_matchups(plan: &PlayoffPlan) -> Vec<BracketMatchup> {
  match plan.shape {
    BracketShape::Template(key) => key.matchups().to_vec(),
    BracketShape::CrossPool(table) => cross_pool_matchups(table),
  }
}

/// First round from the table, then either bye games (seed vs first-round
/// winner) or a paired second round, then winners paired off down to a
/// single championship game.
fn cross_pool_matchups(table: &CrossPoolTable) -> Vec<BracketMatchup> {
  let mut matchups = Vec::new();
  let mut next_number = 1u32;
  let mut push = |matchups: &mut Vec<BracketMatchup>, round: u32, team1: SlotRef, team2: SlotRef| {
    let game_number = next_number;
    next_number += 1;
    matchups.push(BracketMatchup {
      round,
      game_number,
      bracket: BracketSide::Winners,
      team1,
      team2,
      if_necessary: false,
    });
    game_number
  };

  let first_round = table
    .first_round
    .iter()
    .map(|&(high, low)| push(&mut matchups, 1, SlotRef::Seed(high), SlotRef::Seed(low)))
    .collect::<Vec<_>>();
  let winner = |index: usize| SlotRef::Source(SlotSource::winner(first_round[index]));

  let mut round = 1;
  let mut previous = if !table.byes.is_empty() {
    round += 1;
    table
      .byes
      .iter()
      .map(|&(seed, index)| push(&mut matchups, round, SlotRef::Seed(seed), winner(index)))
      .collect::<Vec<_>>()
  } else if !table.second_round.is_empty() {
    round += 1;
    table
      .second_round
      .iter()
      .map(|&(a, b)| push(&mut matchups, round, winner(a), winner(b)))
      .collect::<Vec<_>>()
  } else {
    first_round.clone()
  };

  while previous.len() > 1 {
    round += 1;
    previous = previous
      .chunks(2)
      .map(|pair| match pair {
        [a, b] => push(
          &mut matchups,
          round,
          SlotRef::Source(SlotSource::winner(*a)),
          SlotRef::Source(SlotSource::winner(*b)),
        ),
        _ => pair[0],
      })
      .collect();
  }

  if let Some(last) = matchups.last_mut() {
    last.bracket = BracketSide::Championship;
  }
  matchups
}

/// Concrete game rows for a division's playoff bracket. Seeded slots get
/// their team id now, sourced slots stay empty until progression fills them.
pub fn generate_bracket(division_id: &str, plan: &PlayoffPlan, seeding: &Seeding) -> Result<Vec<Game>> {
  let by_seed = seeding
    .seeds
    .iter()
    .map(|team| (team.seed, team.team_id.as_str()))
    .collect::<HashMap<_, _>>();
  let labels = seeding
    .first_round
    .iter()
    .map(|matchup| ((matchup.team1_seed, matchup.team2_seed), matchup.label.as_str()))
    .collect::<HashMap<_, _>>();

  let resolve = |slot: SlotRef| -> Result<(Option<String>, Option<SlotSource>)> {
    match slot {
      SlotRef::Seed(seed) => by_seed
        .get(&seed)
        .map(|team_id| (Some(team_id.to_string()), None))
        .ok_or_else(|| Error::Inconsistent(format!("no team holds seed {seed}"))),
      SlotRef::Source(source) => Ok((None, Some(source))),
    }
  };

  let matchups = bracket_matchups(plan);
  let mut games = Vec::with_capacity(matchups.len());
  for matchup in &matchups {
    let (home_team_id, team1_source) = resolve(matchup.team1)?;
    let (away_team_id, team2_source) = resolve(matchup.team2)?;
    let label = match (matchup.team1.seed(), matchup.team2.seed()) {
      (Some(high), Some(low)) => labels.get(&(high, low)).map(|label| label.to_string()),
      _ if matchup.if_necessary => Some("Championship (if necessary)".to_string()),
      _ if matchup.bracket == BracketSide::Championship => Some("Championship".to_string()),
      _ => None,
    };
    games.push(Game {
      id: playoff_game_id(division_id, matchup.game_number),
      division_id: division_id.to_string(),
      home_team_id,
      away_team_id,
      status: GameStatus::Scheduled,
      home_score: None,
      away_score: None,
      home_innings_batted: 0.0,
      away_innings_batted: 0.0,
      forfeit_status: ForfeitStatus::None,
      playoff: Some(PlayoffSlot {
        round: matchup.round,
        game_number: matchup.game_number,
        bracket: matchup.bracket,
        team1_source,
        team2_source,
        if_necessary: matchup.if_necessary,
        label,
      }),
    });
  }
  debug!(
    "generated {} playoff games for division {division_id} ({} {} elimination, {} seeding)",
    games.len(),
    plan.format,
    plan.elimination,
    plan.pattern
  );
  Ok(games)
}
