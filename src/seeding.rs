//! Seed assignment from standings.
//!
//! A [`PlayoffPlan`] is validated once from (format, elimination, pattern,
//! pool count); everything after that works from the resulting
//! [`BracketShape`], so an unsupported combination never reaches the bracket
//! generator.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{Error, Result};
use crate::templates::TemplateKey;
use crate::types::{PoolStandings, SeededTeam, TeamStanding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayoffFormat {
  #[serde(rename = "top_4")]
  Top4,
  #[serde(rename = "top_6")]
  Top6,
  #[serde(rename = "top_8")]
  Top8,
  #[serde(rename = "top_12")]
  Top12,
  #[serde(rename = "top_16")]
  Top16,
}

impl PlayoffFormat {
  pub fn team_count(&self) -> usize {
    match self {
      PlayoffFormat::Top4 => 4,
      PlayoffFormat::Top6 => 6,
      PlayoffFormat::Top8 => 8,
      PlayoffFormat::Top12 => 12,
      PlayoffFormat::Top16 => 16,
    }
  }
}

impl fmt::Display for PlayoffFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "top_{}", self.team_count())
  }
}

impl FromStr for PlayoffFormat {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "top_4" => Ok(PlayoffFormat::Top4),
      "top_6" => Ok(PlayoffFormat::Top6),
      "top_8" => Ok(PlayoffFormat::Top8),
      "top_12" => Ok(PlayoffFormat::Top12),
      "top_16" => Ok(PlayoffFormat::Top16),
      _ => Err(Error::UnknownValue { kind: "playoff format", value: raw.to_string() }),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationType {
  #[default]
  Single,
  Double,
}

impl fmt::Display for EliminationType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EliminationType::Single => write!(f, "single"),
      EliminationType::Double => write!(f, "double"),
    }
  }
}

impl FromStr for EliminationType {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "single" | "single_elimination" => Ok(EliminationType::Single),
      "double" | "double_elimination" => Ok(EliminationType::Double),
      _ => Err(Error::UnknownValue { kind: "elimination type", value: raw.to_string() }),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingPattern {
  #[default]
  Standard,
  #[serde(rename = "cross_pool_2")]
  CrossPool2,
  #[serde(rename = "cross_pool_3")]
  CrossPool3,
  #[serde(rename = "cross_pool_4")]
  CrossPool4,
}

impl SeedingPattern {
  /// Exact pool count a cross-pool pattern is built for.
  pub fn required_pools(&self) -> Option<usize> {
    match self {
      SeedingPattern::Standard => None,
      SeedingPattern::CrossPool2 => Some(2),
      SeedingPattern::CrossPool3 => Some(3),
      SeedingPattern::CrossPool4 => Some(4),
    }
  }
}

impl fmt::Display for SeedingPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.required_pools() {
      None => write!(f, "standard"),
      Some(count) => write!(f, "cross_pool_{count}"),
    }
  }
}

impl FromStr for SeedingPattern {
  type Err = Error;

  fn from_str(raw: &str) -> Result<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "standard" => Ok(SeedingPattern::Standard),
      "cross_pool_2" => Ok(SeedingPattern::CrossPool2),
      "cross_pool_3" => Ok(SeedingPattern::CrossPool3),
      "cross_pool_4" => Ok(SeedingPattern::CrossPool4),
      _ => Err(Error::UnknownValue { kind: "seeding pattern", value: raw.to_string() }),
    }
  }
}

/// Matchup table and wiring for a programmatically built cross-pool bracket.
/// Seeds run pool by pool within each pool rank (A1, B1, ..., A2, B2, ...),
/// followed by any wildcard seeds.
#[derive(Debug, PartialEq, Eq)]
pub struct CrossPoolTable {
  pub per_pool: usize,
  pub wildcards: usize,
  /// First-round games as (higher seed, lower seed).
  pub first_round: &'static [(u32, u32)],
  /// Seeds that skip the first round, paired with the index of the
  /// first-round game whose winner they meet.
  pub byes: &'static [(u32, usize)],
  /// Second-round pairings of first-round game indexes when nobody has a bye.
  pub second_round: &'static [(usize, usize)],
}

impl CrossPoolTable {
  pub fn team_count(&self) -> usize {
    self.first_round.len() * 2 + self.byes.len()
  }
}

const TOP4_CROSS_POOL_2: CrossPoolTable = CrossPoolTable {
  per_pool: 2,
  wildcards: 0,
  first_round: &[(1, 4), (2, 3)],
  byes: &[],
  second_round: &[],
};

// Provisional: the wildcard can come from pool A and meet A1.
const TOP4_CROSS_POOL_3: CrossPoolTable = CrossPoolTable {
  per_pool: 1,
  wildcards: 1,
  first_round: &[(1, 4), (2, 3)],
  byes: &[],
  second_round: &[],
};

const TOP4_CROSS_POOL_4: CrossPoolTable = CrossPoolTable {
  per_pool: 1,
  wildcards: 0,
  first_round: &[(1, 4), (2, 3)],
  byes: &[],
  second_round: &[],
};

const TOP6_CROSS_POOL_2: CrossPoolTable = CrossPoolTable {
  per_pool: 3,
  wildcards: 0,
  first_round: &[(3, 6), (4, 5)],
  byes: &[(1, 1), (2, 0)],
  second_round: &[],
};

const TOP6_CROSS_POOL_3: CrossPoolTable = CrossPoolTable {
  per_pool: 2,
  wildcards: 0,
  first_round: &[(3, 5), (4, 6)],
  byes: &[(1, 0), (2, 1)],
  second_round: &[],
};

// Provisional: wildcards 5 and 6 can share a pool with seeds 3 and 4.
const TOP6_CROSS_POOL_4: CrossPoolTable = CrossPoolTable {
  per_pool: 1,
  wildcards: 2,
  first_round: &[(3, 6), (4, 5)],
  byes: &[(1, 1), (2, 0)],
  second_round: &[],
};

const TOP8_CROSS_POOL_2: CrossPoolTable = CrossPoolTable {
  per_pool: 4,
  wildcards: 0,
  first_round: &[(1, 8), (4, 5), (2, 7), (3, 6)],
  byes: &[],
  second_round: &[(0, 1), (2, 3)],
};

// Provisional: wildcards 7 and 8 can share a pool with seeds 1 and 2.
const TOP8_CROSS_POOL_3: CrossPoolTable = CrossPoolTable {
  per_pool: 2,
  wildcards: 2,
  first_round: &[(1, 8), (3, 5), (2, 7), (4, 6)],
  byes: &[],
  second_round: &[(0, 1), (2, 3)],
};

const TOP8_CROSS_POOL_4: CrossPoolTable = CrossPoolTable {
  per_pool: 2,
  wildcards: 0,
  first_round: &[(1, 7), (4, 6), (2, 8), (3, 5)],
  byes: &[],
  second_round: &[(0, 1), (2, 3)],
};

fn cross_pool_table(format: PlayoffFormat, pool_count: usize) -> Option<&'static CrossPoolTable> {
  match (format, pool_count) {
    (PlayoffFormat::Top4, 2) => Some(&TOP4_CROSS_POOL_2),
    (PlayoffFormat::Top4, 3) => Some(&TOP4_CROSS_POOL_3),
    (PlayoffFormat::Top4, 4) => Some(&TOP4_CROSS_POOL_4),
    (PlayoffFormat::Top6, 2) => Some(&TOP6_CROSS_POOL_2),
    (PlayoffFormat::Top6, 3) => Some(&TOP6_CROSS_POOL_3),
    (PlayoffFormat::Top6, 4) => Some(&TOP6_CROSS_POOL_4),
    (PlayoffFormat::Top8, 2) => Some(&TOP8_CROSS_POOL_2),
    (PlayoffFormat::Top8, 3) => Some(&TOP8_CROSS_POOL_3),
    (PlayoffFormat::Top8, 4) => Some(&TOP8_CROSS_POOL_4),
    _ => None,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketShape {
  Template(TemplateKey),
  CrossPool(&'static CrossPoolTable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoffPlan {
  pub format: PlayoffFormat,
  pub elimination: EliminationType,
  pub pattern: SeedingPattern,
  pub pool_count: usize,
  pub shape: BracketShape,
}

impl PlayoffPlan {
  pub fn new(
    format: PlayoffFormat,
    elimination: EliminationType,
    pattern: SeedingPattern,
    pool_count: usize,
  ) -> Result<Self> {
    let unsupported = || Error::UnsupportedConfiguration { format, elimination, pattern, pool_count };
    if let Some(expected) = pattern.required_pools() {
      if expected != pool_count {
        return Err(Error::PoolCountMismatch { pattern, expected, found: pool_count });
      }
    }
    let shape = match pattern {
      SeedingPattern::Standard => {
        BracketShape::Template(TemplateKey::lookup(elimination, format.team_count()).ok_or_else(unsupported)?)
      }
      _ => {
        if elimination != EliminationType::Single {
          return Err(unsupported());
        }
        BracketShape::CrossPool(cross_pool_table(format, pool_count).ok_or_else(unsupported)?)
      }
    };
    Ok(PlayoffPlan { format, elimination, pattern, pool_count, shape })
  }

  pub fn team_count(&self) -> usize {
    self.format.team_count()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
  pub team1_seed: u32,
  pub team2_seed: u32,
  pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seeding {
  pub seeds: Vec<SeededTeam>,
  pub first_round: Vec<Matchup>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub rematch_warnings: Vec<String>,
}

impl Seeding {
  pub fn team_for_seed(&self, seed: u32) -> Option<&SeededTeam> {
    self.seeds.iter().find(|team| team.seed == seed)
  }
}

/// Assigns seeds 1..N for `plan`. `pools` supplies pool names and ranks,
/// `overall` the division order used by the standard pattern.
pub fn seed_teams(plan: &PlayoffPlan, pools: &[PoolStandings], overall: &[TeamStanding]) -> Result<Seeding> {
  let seeds = match plan.shape {
    BracketShape::Template(_) => standard_seeds(plan, pools, overall)?,
    BracketShape::CrossPool(table) => cross_pool_seeds(plan, table, pools)?,
  };
  let pairs = match plan.shape {
    BracketShape::Template(key) => key
      .matchups()
      .iter()
      .filter_map(|matchup| Some((matchup.team1.seed()?, matchup.team2.seed()?)))
      .collect::<Vec<_>>(),
    BracketShape::CrossPool(table) => table.first_round.to_vec(),
  };

  let by_seed = seeds.iter().map(|team| (team.seed, team)).collect::<HashMap<_, _>>();
  let mut first_round = Vec::with_capacity(pairs.len());
  let mut rematch_warnings = Vec::new();
  for (high, low) in pairs {
    let (Some(team1), Some(team2)) = (by_seed.get(&high), by_seed.get(&low)) else {
      continue;
    };
    let label = format!("{} vs {}", seed_label(team1), seed_label(team2));
    if team1.pool_name == team2.pool_name {
      warn!("seed {high} and seed {low} both come from {}: {label}", team1.pool_name);
      rematch_warnings.push(format!("same-pool first-round matchup: {label}"));
    }
    first_round.push(Matchup { team1_seed: high, team2_seed: low, label });
  }

  Ok(Seeding { seeds, first_round, rematch_warnings })
}

/// Short pool code used in matchup labels: "Pool A" -> "A".
pub fn pool_code(pool_name: &str) -> &str {
  pool_name.split_whitespace().last().unwrap_or(pool_name)
}

fn seed_label(team: &SeededTeam) -> String {
  format!("{}{}", pool_code(&team.pool_name), team.pool_rank)
}

fn standard_seeds(plan: &PlayoffPlan, pools: &[PoolStandings], overall: &[TeamStanding]) -> Result<Vec<SeededTeam>> {
  let required = plan.team_count();
  if overall.len() < required {
    return Err(Error::InsufficientTeams { format: plan.format, required, available: overall.len() });
  }
  let pool_of = pools
    .iter()
    .flat_map(|table| {
      table
        .standings
        .iter()
        .map(move |standing| (standing.team.id.as_str(), (table.pool.name.as_str(), standing.rank)))
    })
    .collect::<HashMap<_, _>>();

  Ok(
    overall
      .iter()
      .take(required)
      .enumerate()
      .map(|(index, standing)| {
        let (pool_name, pool_rank) = pool_of.get(standing.team.id.as_str()).copied().unwrap_or(("", 0));
        SeededTeam {
          seed: index as u32 + 1,
          team_id: standing.team.id.clone(),
          pool_name: pool_name.to_string(),
          pool_rank,
        }
      })
      .collect(),
  )
}

fn cross_pool_seeds(plan: &PlayoffPlan, table: &CrossPoolTable, pools: &[PoolStandings]) -> Result<Vec<SeededTeam>> {
  if pools.len() != plan.pool_count {
    return Err(Error::PoolCountMismatch {
      pattern: plan.pattern,
      expected: plan.pool_count,
      found: pools.len(),
    });
  }
  let mut ordered = pools.iter().collect::<Vec<_>>();
  ordered.sort_by(|a, b| a.pool.name.cmp(&b.pool.name));
  for pool in &ordered {
    if pool.standings.len() < table.per_pool {
      return Err(Error::InsufficientPoolTeams {
        pool: pool.pool.name.clone(),
        required: table.per_pool,
        available: pool.standings.len(),
      });
    }
  }

  let mut seeds = Vec::with_capacity(table.team_count());
  for rank in 0..table.per_pool {
    for pool in &ordered {
      let standing = &pool.standings[rank];
      seeds.push(SeededTeam {
        seed: seeds.len() as u32 + 1,
        team_id: standing.team.id.clone(),
        pool_name: pool.pool.name.clone(),
        pool_rank: rank + 1,
      });
    }
  }

  if table.wildcards > 0 {
    let mut candidates = ordered
      .iter()
      .flat_map(|pool| pool.standings.iter().skip(table.per_pool).map(move |standing| (pool, standing)))
      .collect::<Vec<_>>();
    if candidates.len() < table.wildcards {
      return Err(Error::InsufficientTeams {
        format: plan.format,
        required: table.team_count(),
        available: seeds.len() + candidates.len(),
      });
    }
    candidates.sort_by(|(_, a), (_, b)| compare_wildcards(a, b));
    for (pool, standing) in candidates.into_iter().take(table.wildcards) {
      seeds.push(SeededTeam {
        seed: seeds.len() as u32 + 1,
        team_id: standing.team.id.clone(),
        pool_name: pool.pool.name.clone(),
        pool_rank: standing.rank,
      });
    }
  }
  Ok(seeds)
}

fn compare_wildcards(a: &TeamStanding, b: &TeamStanding) -> Ordering {
  a.rank
    .cmp(&b.rank)
    .then_with(|| a.runs_against_per_inning.total_cmp(&b.runs_against_per_inning))
    .then_with(|| b.runs_for_per_inning.total_cmp(&a.runs_for_per_inning))
    .then_with(|| a.team.name.cmp(&b.team.name))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::stats::TeamStats;
  use crate::types::{Pool, Team};

  fn make_pool(name: &str, ids: &[&str]) -> PoolStandings {
    let pool = Pool { id: name.to_lowercase().replace(' ', "-"), name: name.to_string() };
    let standings = ids
      .iter()
      .enumerate()
      .map(|(index, id)| {
        let mut standing =
          TeamStanding::from_stats(Team::new(id, &id.to_uppercase(), &pool.id), TeamStats::default());
        standing.rank = index + 1;
        standing
      })
      .collect();
    PoolStandings { pool, standings }
  }

  fn make_four_pools() -> Vec<PoolStandings> {
    vec![
      make_pool("Pool D", &["d1", "d2", "d3"]),
      make_pool("Pool B", &["b1", "b2", "b3"]),
      make_pool("Pool C", &["c1", "c2", "c3"]),
      make_pool("Pool A", &["a1", "a2", "a3"]),
    ]
  }

  fn overall_of(pools: &[PoolStandings]) -> Vec<TeamStanding> {
    let mut overall = pools.iter().flat_map(|p| p.standings.clone()).collect::<Vec<_>>();
    overall.sort_by(|a, b| a.team.id.cmp(&b.team.id));
    overall
  }

  #[test]
  fn test_plan_rejects_unsupported_combinations() {
    let err = PlayoffPlan::new(PlayoffFormat::Top12, EliminationType::Single, SeedingPattern::CrossPool2, 2);
    assert!(matches!(err, Err(Error::UnsupportedConfiguration { .. })));
    let err = PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Single, SeedingPattern::CrossPool3, 2);
    assert!(matches!(err, Err(Error::PoolCountMismatch { expected: 3, found: 2, .. })));
    let err = PlayoffPlan::new(PlayoffFormat::Top6, EliminationType::Double, SeedingPattern::Standard, 1);
    assert!(matches!(err, Err(Error::UnsupportedConfiguration { .. })));
    let err = PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Double, SeedingPattern::CrossPool2, 2);
    assert!(matches!(err, Err(Error::UnsupportedConfiguration { .. })));
    assert!(PlayoffPlan::new(PlayoffFormat::Top12, EliminationType::Double, SeedingPattern::Standard, 3).is_ok());
  }

  #[test]
  fn test_cross_pool_4_top_8_crosses_every_matchup() {
    let pools = make_four_pools();
    let plan = PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Single, SeedingPattern::CrossPool4, 4).unwrap();
    let seeding = seed_teams(&plan, &pools, &[]).unwrap();
    let order = seeding.seeds.iter().map(|s| s.team_id.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["a1", "b1", "c1", "d1", "a2", "b2", "c2", "d2"]);
    let labels = seeding.first_round.iter().map(|m| m.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["A1 vs C2", "D1 vs B2", "B1 vs D2", "C1 vs A2"]);
    assert!(seeding.rematch_warnings.is_empty());
  }

  #[test]
  fn test_seeds_are_unique_and_contiguous() {
    let pools = make_four_pools();
    let overall = overall_of(&pools);
    let plans = [
      PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Single, SeedingPattern::Standard, 4).unwrap(),
      PlayoffPlan::new(PlayoffFormat::Top6, EliminationType::Single, SeedingPattern::CrossPool4, 4).unwrap(),
      PlayoffPlan::new(PlayoffFormat::Top4, EliminationType::Double, SeedingPattern::Standard, 4).unwrap(),
    ];
    for plan in plans {
      let seeding = seed_teams(&plan, &pools, &overall).unwrap();
      let mut seeds = seeding.seeds.iter().map(|s| s.seed).collect::<Vec<_>>();
      seeds.sort();
      assert_eq!(seeds, (1..=plan.team_count() as u32).collect::<Vec<_>>());
      let mut teams = seeding.seeds.iter().map(|s| s.team_id.clone()).collect::<Vec<_>>();
      teams.sort();
      teams.dedup();
      assert_eq!(teams.len(), plan.team_count());
    }
  }

  #[test]
  fn test_wildcards_flag_same_pool_rematch() {
    let mut pools = make_four_pools();
    // c2 has the best runs-allowed rate of the runners-up
    for pool in pools.iter_mut() {
      for standing in pool.standings.iter_mut() {
        standing.runs_against_per_inning = if standing.team.id == "c2" { 0.1 } else { 0.5 };
      }
    }
    let plan = PlayoffPlan::new(PlayoffFormat::Top6, EliminationType::Single, SeedingPattern::CrossPool4, 4).unwrap();
    let seeding = seed_teams(&plan, &pools, &[]).unwrap();
    assert_eq!(seeding.team_for_seed(5).map(|s| s.team_id.as_str()), Some("c2"));
    assert_eq!(seeding.team_for_seed(6).map(|s| s.team_id.as_str()), Some("a2"));
    assert_eq!(seeding.first_round[0].label, "C1 vs A2");
    assert_eq!(seeding.first_round[1].label, "D1 vs C2");
    assert!(seeding.rematch_warnings.is_empty());

    let plan = PlayoffPlan::new(PlayoffFormat::Top4, EliminationType::Single, SeedingPattern::CrossPool3, 3).unwrap();
    let three = vec![
      make_pool("Pool A", &["a1", "a2"]),
      make_pool("Pool B", &["b1"]),
      make_pool("Pool C", &["c1"]),
    ];
    let seeding = seed_teams(&plan, &three, &[]).unwrap();
    assert_eq!(seeding.first_round[0].label, "A1 vs A2");
    assert_eq!(seeding.rematch_warnings.len(), 1);
  }

  #[test]
  fn test_every_cross_pool_table_seeds_and_wires_cleanly() {
    let patterns = [
      (2, SeedingPattern::CrossPool2),
      (3, SeedingPattern::CrossPool3),
      (4, SeedingPattern::CrossPool4),
    ];
    for format in [PlayoffFormat::Top4, PlayoffFormat::Top6, PlayoffFormat::Top8] {
      for (pool_count, pattern) in patterns {
        let pools = ["A", "B", "C", "D"][..pool_count]
          .iter()
          .map(|code| {
            let ids = (1..=4).map(|rank| format!("{}{rank}", code.to_lowercase())).collect::<Vec<_>>();
            make_pool(&format!("Pool {code}"), &ids.iter().map(String::as_str).collect::<Vec<_>>())
          })
          .collect::<Vec<_>>();
        let plan = PlayoffPlan::new(format, EliminationType::Single, pattern, pool_count).unwrap();
        let BracketShape::CrossPool(table) = plan.shape else {
          panic!("{format} {pattern} should use a cross-pool table");
        };
        assert_eq!(table.team_count(), plan.team_count(), "{format} {pattern}");

        let seeding = seed_teams(&plan, &pools, &[]).unwrap();
        let mut seeds = seeding.seeds.iter().map(|s| s.seed).collect::<Vec<_>>();
        seeds.sort();
        assert_eq!(seeds, (1..=plan.team_count() as u32).collect::<Vec<_>>(), "{format} {pattern}");
        if table.wildcards == 0 {
          assert!(seeding.rematch_warnings.is_empty(), "{format} {pattern}: {:?}", seeding.rematch_warnings);
        }

        let games = crate::bracket::generate_bracket("div", &plan, &seeding).unwrap();
        assert_eq!(games.len(), plan.team_count() - 1, "{format} {pattern}");
        let mut placed = games
          .iter()
          .flat_map(|game| [game.home_team_id.clone(), game.away_team_id.clone()])
          .flatten()
          .collect::<Vec<_>>();
        placed.sort();
        placed.dedup();
        assert_eq!(placed.len(), plan.team_count(), "{format} {pattern}");
        let last = games.last().and_then(|game| game.playoff.as_ref()).unwrap();
        assert_eq!(last.bracket, crate::types::BracketSide::Championship, "{format} {pattern}");
      }
    }
  }

  #[test]
  fn test_insufficient_teams() {
    let pools = vec![make_pool("Pool A", &["a1", "a2"]), make_pool("Pool B", &["b1", "b2", "b3"])];
    let plan = PlayoffPlan::new(PlayoffFormat::Top6, EliminationType::Single, SeedingPattern::CrossPool2, 2).unwrap();
    assert!(matches!(
      seed_teams(&plan, &pools, &[]),
      Err(Error::InsufficientPoolTeams { required: 3, available: 2, .. })
    ));
    let plan = PlayoffPlan::new(PlayoffFormat::Top8, EliminationType::Single, SeedingPattern::Standard, 2).unwrap();
    let overall = overall_of(&pools);
    assert!(matches!(
      seed_teams(&plan, &pools, &overall),
      Err(Error::InsufficientTeams { required: 8, available: 5, .. })
    ));
  }

  #[test]
  fn test_standard_seeds_follow_overall_order() {
    let pools = make_four_pools();
    let overall = overall_of(&pools);
    let plan = PlayoffPlan::new(PlayoffFormat::Top4, EliminationType::Single, SeedingPattern::Standard, 4).unwrap();
    let seeding = seed_teams(&plan, &pools, &overall).unwrap();
    let order = seeding.seeds.iter().map(|s| s.team_id.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["a1", "a2", "a3", "b1"]);
    assert_eq!(seeding.first_round[0].label, "A1 vs B1");
    assert_eq!(seeding.first_round[1].label, "A2 vs A3");
    assert_eq!(seeding.rematch_warnings.len(), 1);
  }

  #[test]
  fn test_names_round_trip() {
    assert_eq!("cross_pool_4".parse::<SeedingPattern>().ok(), Some(SeedingPattern::CrossPool4));
    assert_eq!(PlayoffFormat::Top8.to_string(), "top_8");
    assert_eq!("top_6".parse::<PlayoffFormat>().ok(), Some(PlayoffFormat::Top6));
    assert!("top_5".parse::<PlayoffFormat>().is_err());
    assert_eq!(
      serde_json::to_string(&SeedingPattern::CrossPool3).unwrap(),
      "\"cross_pool_3\""
    );
  }
}
