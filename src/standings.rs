//! Ranked standings per pool and across a division.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::stats::team_stats;
use crate::tiebreak::{Resolution, TieBreaker};
use crate::types::{Game, Pool, PoolStandings, Team, TeamStanding};

/// How a division-wide order is built from pool play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallPolicy {
  /// Every team in one table by points, then tie-breaks.
  #[default]
  ByPoints,
  /// Pool winners first, then runners-up (each ordered by runs allowed per
  /// inning), then everyone else by points and tie-breaks.
  PoolWinnersFirst,
}

impl fmt::Display for OverallPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OverallPolicy::ByPoints => write!(f, "by_points"),
      OverallPolicy::PoolWinnersFirst => write!(f, "pool_winners_first"),
    }
  }
}

impl FromStr for OverallPolicy {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "by_points" | "points" => Ok(OverallPolicy::ByPoints),
      "pool_winners_first" => Ok(OverallPolicy::PoolWinnersFirst),
      _ => Err(Error::UnknownValue { kind: "standings policy", value: raw.to_string() }),
    }
  }
}

/// Completed pool-play games whose participants are both in `teams`.
pub fn games_among(teams: &[Team], games: &[Game]) -> Vec<Game> {
  let ids = teams.iter().map(|team| team.id.as_str()).collect::<HashSet<_>>();
  games
    .iter()
    .filter(|game| game.is_completed() && !game.is_playoff())
    .filter(|game| {
      let home = game.home_team_id.as_deref().is_some_and(|id| ids.contains(id));
      let away = game.away_team_id.as_deref().is_some_and(|id| ids.contains(id));
      home && away
    })
    .cloned()
    .collect()
}

/// Points-then-tie-break table over `teams`, ranked 1..N.
pub fn build_standings(teams: &[Team], games: &[Game]) -> Vec<TeamStanding> {
  rank_with_resolutions(teams, games).0
}

/// Same as [`build_standings`], also returning the resolver output for every
/// group of teams that shared a points total.
pub fn rank_with_resolutions(teams: &[Team], games: &[Game]) -> (Vec<TeamStanding>, Vec<Resolution>) {
  let tie_breaker = TieBreaker::new(games);
  let grouped = teams
    .iter()
    .map(|team| TeamStanding::from_stats(team.clone(), team_stats(&team.id, games, None)))
    .sorted_by(|a, b| b.points.cmp(&a.points))
    .chunk_by(|standing| standing.points);

  let mut ranked = Vec::with_capacity(teams.len());
  let mut resolutions = Vec::new();
  for (_, group) in &grouped {
    let group = group.collect::<Vec<_>>();
    if group.len() == 1 {
      ranked.extend(group);
      continue;
    }
    let resolution = tie_breaker.resolve(&group);
    let mut by_id = group
      .into_iter()
      .map(|standing| (standing.team.id.clone(), standing))
      .collect::<HashMap<_, _>>();
    for team_id in &resolution.order {
      if let Some(mut standing) = by_id.remove(team_id) {
        standing.decided_by = resolution.deciding_rule(team_id);
        ranked.push(standing);
      }
    }
    resolutions.push(resolution);
  }

  assign_ranks(&mut ranked);
  (ranked, resolutions)
}

/// Standings for one pool, counting only games between the pool's teams.
pub fn pool_standings(pool: &Pool, teams: &[Team], games: &[Game]) -> PoolStandings {
  let members = teams
    .iter()
    .filter(|team| team.pool_id == pool.id)
    .cloned()
    .collect::<Vec<_>>();
  let pool_games = games_among(&members, games);
  let mut standings = build_standings(&members, &pool_games);
  for standing in standings.iter_mut() {
    standing.is_pool_winner = standing.rank == 1;
    standing.is_pool_runner_up = standing.rank == 2;
  }
  PoolStandings { pool: pool.clone(), standings }
}

/// Standings for every pool, pools ordered by name.
pub fn division_pool_standings(pools: &[Pool], teams: &[Team], games: &[Game]) -> Vec<PoolStandings> {
  pools
    .iter()
    .sorted_by(|a, b| a.name.cmp(&b.name))
    .map(|pool| pool_standings(pool, teams, games))
    .collect()
}

pub fn overall_standings(
  policy: OverallPolicy,
  pools: &[Pool],
  teams: &[Team],
  games: &[Game],
) -> Vec<TeamStanding> {
  let pool_tables = division_pool_standings(pools, teams, games);
  let division_games = games_among(teams, games);
  let mut overall = match policy {
    OverallPolicy::ByPoints => build_standings(teams, &division_games),
    OverallPolicy::PoolWinnersFirst => pool_winners_first(&pool_tables, teams, &division_games),
  };
  mark_pool_finishers(&mut overall, &pool_tables);
  overall
}

fn pool_winners_first(pool_tables: &[PoolStandings], teams: &[Team], games: &[Game]) -> Vec<TeamStanding> {
  let finishers_at = |index: usize| {
    pool_tables
      .iter()
      .filter_map(|table| table.standings.get(index).cloned())
      .sorted_by(|a, b| a.runs_against_per_inning.total_cmp(&b.runs_against_per_inning))
      .collect::<Vec<_>>()
  };
  let mut ordered = finishers_at(0);
  ordered.extend(finishers_at(1));

  let placed = ordered
    .iter()
    .map(|standing| standing.team.id.clone())
    .collect::<HashSet<_>>();
  let remaining = teams
    .iter()
    .filter(|team| !placed.contains(&team.id))
    .cloned()
    .collect::<Vec<_>>();
  ordered.extend(build_standings(&remaining, games));

  assign_ranks(&mut ordered);
  ordered
}

fn mark_pool_finishers(overall: &mut [TeamStanding], pool_tables: &[PoolStandings]) {
  let pool_rank = pool_tables
    .iter()
    .flat_map(|table| table.standings.iter())
    .map(|standing| (standing.team.id.as_str(), standing.rank))
    .collect::<HashMap<_, _>>();
  for standing in overall.iter_mut() {
    let rank = pool_rank.get(standing.team.id.as_str()).copied();
    standing.is_pool_winner = rank == Some(1);
    standing.is_pool_runner_up = rank == Some(2);
  }
}

fn assign_ranks(standings: &mut [TeamStanding]) {
  for (index, standing) in standings.iter_mut().enumerate() {
    standing.rank = index + 1;
  }
}
