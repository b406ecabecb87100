//! Read-only projections for a reporting layer.
//!
//! Explanations are rebuilt by re-running the standings resolver; nothing here
//! is stored alongside the standings.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use itertools::Itertools;

use crate::progression::if_necessary_needed;
use crate::standings::{games_among, rank_with_resolutions};
use crate::tiebreak::{TieBreakNote, TieBreakRule};
use crate::types::{BracketSide, Game, GameOutcome, Pool, PoolStandings, Team, TeamStanding};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationStep {
  pub rule: TieBreakRule,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<f64>,
  pub tied_with: Vec<String>,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamExplanation {
  pub team_id: String,
  pub team_name: String,
  pub rank: usize,
  pub points: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub decided_by: Option<TieBreakRule>,
  pub steps: Vec<ExplanationStep>,
}

impl TeamExplanation {
  pub fn summary(&self) -> String {
    match (&self.decided_by, self.steps.last()) {
      (Some(rule), Some(step)) => format!("#{} {} ({} pts), placed by {}: {}", self.rank, self.team_name, self.points, rule, step.text),
      _ => format!("#{} {} ({} pts)", self.rank, self.team_name, self.points),
    }
  }
}

fn format_value(rule: TieBreakRule, value: Option<f64>) -> String {
  match (rule, value) {
    (_, None) => String::new(),
    (TieBreakRule::ForfeitEligibility, Some(value)) => format!("{value:.0} forfeit loss(es)"),
    (TieBreakRule::HeadToHead, Some(value)) => format!("{value:.0} head-to-head win(s)"),
    (_, Some(value)) if value.is_infinite() => "no defensive innings".to_string(),
    (_, Some(value)) => format!("{value:.3}"),
  }
}

fn explain_note(note: &TieBreakNote, names: &HashMap<&str, &str>) -> ExplanationStep {
  let others = note
    .tied_with
    .iter()
    .filter(|id| id.as_str() != note.team_id)
    .map(|id| names.get(id.as_str()).copied().unwrap_or(id.as_str()))
    .join(", ");
  let value = format_value(note.rule, note.value);
  let text = if value.is_empty() {
    format!("tied with {others}; {}", note.rule)
  } else {
    format!("tied with {others}; {}: {value}", note.rule)
  };
  ExplanationStep {
    rule: note.rule,
    value: note.value,
    tied_with: note.tied_with.clone(),
    text,
  }
}

/// Per-team account of how the standings over `teams` and `games` were
/// ordered, in rank order.
pub fn explain_standings(teams: &[Team], games: &[Game]) -> Vec<TeamExplanation> {
  let (ranked, resolutions) = rank_with_resolutions(teams, games);
  let names = teams
    .iter()
    .map(|team| (team.id.as_str(), team.name.as_str()))
    .collect::<HashMap<_, _>>();

  ranked
    .iter()
    .map(|standing| {
      let steps = resolutions
        .iter()
        .flat_map(|resolution| resolution.notes_for(&standing.team.id))
        .map(|note| explain_note(note, &names))
        .collect();
      TeamExplanation {
        team_id: standing.team.id.clone(),
        team_name: standing.team.name.clone(),
        rank: standing.rank,
        points: standing.points,
        decided_by: standing.decided_by,
        steps,
      }
    })
    .collect()
}

/// Explanation for one pool, counting only games between its teams.
pub fn explain_pool(pool: &Pool, teams: &[Team], games: &[Game]) -> Vec<TeamExplanation> {
  let members = teams
    .iter()
    .filter(|team| team.pool_id == pool.id)
    .cloned()
    .collect::<Vec<_>>();
  explain_standings(&members, &games_among(&members, games))
}

fn standing_json(standing: &TeamStanding) -> Value {
  let stats = &standing.stats;
  json!({
    "rank": standing.rank,
    "teamId": standing.team.id,
    "teamName": standing.team.name,
    "record": format!("{}-{}-{}", stats.wins, stats.losses, stats.ties),
    "points": standing.points,
    "runsFor": stats.runs_for,
    "runsAgainst": stats.runs_against,
    "runsAgainstPerInning": standing.runs_against_per_inning,
    "runsForPerInning": standing.runs_for_per_inning,
    "forfeitLosses": stats.forfeit_losses,
    "poolWinner": standing.is_pool_winner,
    "poolRunnerUp": standing.is_pool_runner_up,
    "decidedBy": standing.decided_by,
  })
}

pub fn standings_json(pools: &[PoolStandings], overall: &[TeamStanding]) -> Value {
  let pools = pools
    .iter()
    .map(|table| {
      json!({
        "id": table.pool.id,
        "name": table.pool.name,
        "standings": table.standings.iter().map(standing_json).collect::<Vec<_>>(),
      })
    })
    .collect::<Vec<_>>();
  json!({
    "pools": pools,
    "overall": overall.iter().map(standing_json).collect::<Vec<_>>(),
  })
}

pub fn bracket_json(games: &[Game]) -> Value {
  let rounds = games
    .iter()
    .filter_map(|game| game.playoff.as_ref().map(|slot| (slot, game)))
    .sorted_by_key(|(slot, _)| slot.game_number)
    .map(|(slot, game)| {
      json!({
        "gameNumber": slot.game_number,
        "id": game.id,
        "round": slot.round,
        "bracket": slot.bracket,
        "label": slot.label,
        "ifNecessary": slot.if_necessary,
        "team1": { "teamId": game.home_team_id, "source": slot.team1_source.map(|s| s.to_string()), "score": game.home_score },
        "team2": { "teamId": game.away_team_id, "source": slot.team2_source.map(|s| s.to_string()), "score": game.away_score },
        "status": game.status,
        "winnerId": game.winner_id(),
      })
    })
    .collect::<Vec<_>>();
  json!({
    "games": rounds,
    "ifNecessaryRequired": if_necessary_needed(games),
  })
}

// ── Final placements ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Finish {
  Champion,
  RunnerUp,
  Eliminated { bracket: BracketSide, round: u32, game_number: u32 },
  PoolPlay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
  pub place: usize,
  pub team_id: String,
  pub finish: Finish,
}

/// The game that settles the title: the if-necessary game when it has to be
/// played, otherwise the first championship game.
fn deciding_game(games: &[Game]) -> Option<(String, String)> {
  let reset_needed = if_necessary_needed(games) == Some(true);
  let game = games.iter().find(|game| {
    game.playoff.as_ref().is_some_and(|slot| {
      slot.bracket == BracketSide::Championship && slot.if_necessary == reset_needed
    })
  })?;
  match game.outcome()? {
    GameOutcome::Decided { winner, loser } => Some((winner, loser)),
    GameOutcome::Tie => None,
  }
}

/// Champion, runner-up, then the rest of the playoff field by how late they
/// were knocked out (teams eliminated in the same round share a place),
/// then everyone else in `overall` order. `None` until the title is decided.
pub fn final_placements(games: &[Game], overall: &[TeamStanding]) -> Option<Vec<Placement>> {
  let (champion, runner_up) = deciding_game(games)?;
  let overall_index = overall
    .iter()
    .enumerate()
    .map(|(index, standing)| (standing.team.id.as_str(), index))
    .collect::<HashMap<_, _>>();

  // last completed playoff game per team
  let mut last_game: HashMap<&str, (u32, BracketSide, u32)> = HashMap::new();
  for game in games.iter().filter(|game| game.is_completed()) {
    let Some(slot) = &game.playoff else {
      continue;
    };
    for team_id in [game.home_team_id.as_deref(), game.away_team_id.as_deref()].into_iter().flatten() {
      let entry = last_game.entry(team_id).or_insert((slot.game_number, slot.bracket, slot.round));
      if slot.game_number > entry.0 {
        *entry = (slot.game_number, slot.bracket, slot.round);
      }
    }
  }

  let mut placements = vec![
    Placement { place: 1, team_id: champion.clone(), finish: Finish::Champion },
    Placement { place: 2, team_id: runner_up.clone(), finish: Finish::RunnerUp },
  ];

  // rank knockout tiers by the latest game number anyone in the tier played
  let mut tier_latest: HashMap<(BracketSide, u32), u32> = HashMap::new();
  for (number, bracket, round) in last_game.values() {
    let latest = tier_latest.entry((*bracket, *round)).or_insert(*number);
    *latest = (*latest).max(*number);
  }
  let eliminated = last_game
    .iter()
    .filter(|(team_id, _)| **team_id != champion && **team_id != runner_up)
    .map(|(team_id, (number, bracket, round))| (*team_id, *number, *bracket, *round))
    .sorted_by(|a, b| {
      let tier_a = tier_latest[&(a.2, a.3)];
      let tier_b = tier_latest[&(b.2, b.3)];
      tier_b
        .cmp(&tier_a)
        .then_with(|| overall_index.get(a.0).unwrap_or(&usize::MAX).cmp(overall_index.get(b.0).unwrap_or(&usize::MAX)))
        .then_with(|| a.0.cmp(b.0))
    })
    .collect::<Vec<_>>();

  let mut previous_tier = None;
  let mut tier_place = placements.len() + 1;
  for (team_id, game_number, bracket, round) in eliminated {
    if previous_tier != Some((bracket, round)) {
      tier_place = placements.len() + 1;
      previous_tier = Some((bracket, round));
    }
    placements.push(Placement {
      place: tier_place,
      team_id: team_id.to_string(),
      finish: Finish::Eliminated { bracket, round, game_number },
    });
  }

  for standing in overall {
    if placements.iter().any(|placement| placement.team_id == standing.team.id) {
      continue;
    }
    placements.push(Placement {
      place: placements.len() + 1,
      team_id: standing.team.id.clone(),
      finish: Finish::PoolPlay,
    });
  }
  Some(placements)
}
