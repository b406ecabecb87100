//! Tie-break cascade for teams that finish on the same standings points.
//!
//! Rules are applied in [`TieBreakRule::CASCADE`] order. A rule that splits the
//! group sends every resulting partition back through the whole cascade, so a
//! partition narrowed down to two teams gets its head-to-head check. A rule that
//! leaves the group intact hands it to the next rule. The coin toss always
//! finishes the job.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::stats::{team_stats, wins_against, TeamStats};
use crate::types::{Game, TeamStanding};

/// Two ratios closer than this are treated as equal.
pub const TIE_TOLERANCE: f64 = 0.001;

/// Tolerant float comparison used by every ratio rule. Non-finite values only
/// match exactly.
pub fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
  if !a.is_finite() || !b.is_finite() {
    return a == b;
  }
  (a - b).abs() < tolerance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakRule {
  ForfeitEligibility,
  HeadToHead,
  RunsAgainstAmongTied,
  RunsAgainstOverall,
  RunsForAmongTied,
  RunsForOverall,
  CoinToss,
}

impl TieBreakRule {
  pub const CASCADE: [TieBreakRule; 7] = [
    TieBreakRule::ForfeitEligibility,
    TieBreakRule::HeadToHead,
    TieBreakRule::RunsAgainstAmongTied,
    TieBreakRule::RunsAgainstOverall,
    TieBreakRule::RunsForAmongTied,
    TieBreakRule::RunsForOverall,
    TieBreakRule::CoinToss,
  ];

  pub fn description(&self) -> &'static str {
    match self {
      TieBreakRule::ForfeitEligibility => "forfeit losses",
      TieBreakRule::HeadToHead => "head-to-head record",
      TieBreakRule::RunsAgainstAmongTied => "runs allowed per defensive inning among tied teams",
      TieBreakRule::RunsAgainstOverall => "runs allowed per defensive inning in all games",
      TieBreakRule::RunsForAmongTied => "runs scored per offensive inning among tied teams",
      TieBreakRule::RunsForOverall => "runs scored per offensive inning in all games",
      TieBreakRule::CoinToss => "coin toss",
    }
  }

  fn ascending(&self) -> bool {
    matches!(self, TieBreakRule::RunsAgainstAmongTied | TieBreakRule::RunsAgainstOverall)
  }
}

impl fmt::Display for TieBreakRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.description())
  }
}

/// One step of a team's tie-break history: the rule that separated it from
/// `tied_with`, and the value it was compared on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieBreakNote {
  pub team_id: String,
  pub rule: TieBreakRule,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<f64>,
  pub tied_with: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
  pub order: Vec<String>,
  pub trail: Vec<TieBreakNote>,
}

impl Resolution {
  pub fn notes_for<'a>(&'a self, team_id: &'a str) -> impl Iterator<Item = &'a TieBreakNote> + 'a {
    self.trail.iter().filter(move |note| note.team_id == team_id)
  }

  /// The last rule that moved the team, i.e. the one that fixed its place.
  pub fn deciding_rule(&self, team_id: &str) -> Option<TieBreakRule> {
    self.notes_for(team_id).last().map(|note| note.rule)
  }
}

pub struct TieBreaker<'a> {
  games: &'a [Game],
}

impl<'a> TieBreaker<'a> {
  pub fn new(games: &'a [Game]) -> Self {
    TieBreaker { games }
  }

  /// Orders a group of teams that share the same points total.
  pub fn resolve(&self, group: &[TeamStanding]) -> Resolution {
    let mut trail = Vec::new();
    let ordered = self.resolve_from(group.iter().collect(), 0, &mut trail);
    Resolution {
      order: ordered.into_iter().map(|standing| standing.team.id.clone()).collect(),
      trail,
    }
  }

  fn resolve_from<'s>(
    &self,
    group: Vec<&'s TeamStanding>,
    rule_index: usize,
    trail: &mut Vec<TieBreakNote>,
  ) -> Vec<&'s TeamStanding> {
    if group.len() <= 1 {
      return group;
    }
    let rule = TieBreakRule::CASCADE[rule_index];
    match rule {
      TieBreakRule::ForfeitEligibility => self.apply_forfeit_filter(group, trail),
      TieBreakRule::HeadToHead => match self.head_to_head(&group, trail) {
        Some(ordered) => ordered,
        None => self.resolve_from(group, rule_index + 1, trail),
      },
      TieBreakRule::CoinToss => coin_toss(group, trail),
      _ => {
        let values = group
          .iter()
          .map(|standing| self.metric(rule, standing, &group))
          .collect::<Vec<_>>();
        let partitions = partition_by_value(&group, &values, rule.ascending());
        if partitions.len() == 1 {
          return self.resolve_from(group, rule_index + 1, trail);
        }
        for (standing, value) in group.iter().zip(&values) {
          trail.push(note(rule, standing, Some(*value), &group));
        }
        partitions
          .into_iter()
          .flat_map(|partition| self.resolve_from(partition, 0, trail))
          .collect()
      }
    }
  }

  fn apply_forfeit_filter<'s>(
    &self,
    group: Vec<&'s TeamStanding>,
    trail: &mut Vec<TieBreakNote>,
  ) -> Vec<&'s TeamStanding> {
    let (eligible, mut ineligible): (Vec<_>, Vec<_>) =
      group.iter().copied().partition(|standing| standing.stats.forfeit_losses == 0);
    if ineligible.is_empty() {
      return self.resolve_from(eligible, 1, trail);
    }

    for standing in &group {
      trail.push(note(
        TieBreakRule::ForfeitEligibility,
        standing,
        Some(standing.stats.forfeit_losses as f64),
        &group,
      ));
    }
    ineligible.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.team.name.cmp(&b.team.name)));

    let mut ordered = if eligible.len() <= 1 {
      eligible
    } else {
      self.resolve_from(eligible, 1, trail)
    };
    ordered.extend(ineligible);
    ordered
  }

  /// Only decides a pair; three or more teams skip straight to the ratios so a
  /// head-to-head cycle can't stall the cascade.
  fn head_to_head<'s>(
    &self,
    group: &[&'s TeamStanding],
    trail: &mut Vec<TieBreakNote>,
  ) -> Option<Vec<&'s TeamStanding>> {
    let [first, second] = group else {
      return None;
    };
    let first_wins = wins_against(first.team_id(), second.team_id(), self.games);
    let second_wins = wins_against(second.team_id(), first.team_id(), self.games);
    if first_wins == second_wins {
      return None;
    }
    trail.push(note(TieBreakRule::HeadToHead, first, Some(first_wins as f64), group));
    trail.push(note(TieBreakRule::HeadToHead, second, Some(second_wins as f64), group));
    if first_wins > second_wins {
      Some(vec![*first, *second])
    } else {
      Some(vec![*second, *first])
    }
  }

  fn metric(&self, rule: TieBreakRule, standing: &TeamStanding, group: &[&TeamStanding]) -> f64 {
    match rule {
      TieBreakRule::RunsAgainstAmongTied => runs_against_ratio(&self.among_tied(standing, group)),
      TieBreakRule::RunsAgainstOverall => runs_against_ratio(&standing.stats),
      TieBreakRule::RunsForAmongTied => runs_for_ratio(&self.among_tied(standing, group)),
      TieBreakRule::RunsForOverall => runs_for_ratio(&standing.stats),
      _ => 0.0,
    }
  }

  fn among_tied(&self, standing: &TeamStanding, group: &[&TeamStanding]) -> TeamStats {
    let opponents = group
      .iter()
      .map(|other| other.team_id())
      .filter(|id| *id != standing.team_id())
      .collect::<HashSet<_>>();
    team_stats(standing.team_id(), self.games, Some(&opponents))
  }
}

/// Runs allowed per defensive inning; a team with no defensive innings ranks
/// behind everyone.
fn runs_against_ratio(stats: &TeamStats) -> f64 {
  if stats.defensive_innings > 0.0 {
    stats.runs_against as f64 / stats.defensive_innings
  } else {
    f64::INFINITY
  }
}

fn runs_for_ratio(stats: &TeamStats) -> f64 {
  if stats.offensive_innings > 0.0 {
    stats.runs_for as f64 / stats.offensive_innings
  } else {
    0.0
  }
}

/// Sorts by value and splits wherever the next value is no longer within
/// tolerance of the first value of the current partition.
fn partition_by_value<'s>(
  group: &[&'s TeamStanding],
  values: &[f64],
  ascending: bool,
) -> Vec<Vec<&'s TeamStanding>> {
  let mut indexed = group.iter().copied().zip(values.iter().copied()).collect::<Vec<_>>();
  indexed.sort_by(|(_, a), (_, b)| if ascending { a.total_cmp(b) } else { b.total_cmp(a) });

  let mut partitions: Vec<Vec<&TeamStanding>> = Vec::new();
  let mut anchor: Option<f64> = None;
  for (standing, value) in indexed {
    if let (Some(first), Some(current)) = (anchor, partitions.last_mut()) {
      if approx_equal(first, value, TIE_TOLERANCE) {
        current.push(standing);
        continue;
      }
    }
    anchor = Some(value);
    partitions.push(vec![standing]);
  }
  partitions
}

fn coin_toss<'s>(group: Vec<&'s TeamStanding>, trail: &mut Vec<TieBreakNote>) -> Vec<&'s TeamStanding> {
  let mut keyed = group
    .iter()
    .map(|standing| (CoinToss::for_team(standing.team_id()).next_u64(), *standing))
    .collect::<Vec<_>>();
  keyed.sort_by(|(a_key, a), (b_key, b)| a_key.cmp(b_key).then_with(|| a.team_id().cmp(b.team_id())));
  for (_, standing) in &keyed {
    trail.push(note(TieBreakRule::CoinToss, standing, None, &group));
  }
  keyed.into_iter().map(|(_, standing)| standing).collect()
}

fn note(rule: TieBreakRule, standing: &TeamStanding, value: Option<f64>, group: &[&TeamStanding]) -> TieBreakNote {
  TieBreakNote {
    team_id: standing.team.id.clone(),
    rule,
    value,
    tied_with: group
      .iter()
      .map(|other| other.team.id.clone())
      .filter(|id| *id != standing.team.id)
      .collect(),
  }
}

/// Stable pseudo-random key per team: FNV-1a of the id fed into a xorshift step.
#[derive(Clone, Debug)]
struct CoinToss {
  state: u64,
}

impl CoinToss {
  fn for_team(team_id: &str) -> Self {
    let mut state = 0xcbf2_9ce4_8422_2325u64;
    for byte in team_id.bytes() {
      state ^= byte as u64;
      state = state.wrapping_mul(0x0100_0000_01b3);
    }
    if state == 0 {
      state = 0x9E37_79B9_7F4A_7C15;
    }
    CoinToss { state }
  }

  fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{ForfeitStatus, GameStatus, Team};

  fn make_game(home: &str, away: &str, home_score: u32, away_score: u32) -> Game {
    Game {
      id: format!("{home}-{away}"),
      division_id: "d1".to_string(),
      home_team_id: Some(home.to_string()),
      away_team_id: Some(away.to_string()),
      status: GameStatus::Completed,
      home_score: Some(home_score),
      away_score: Some(away_score),
      home_innings_batted: 7.0,
      away_innings_batted: 7.0,
      forfeit_status: ForfeitStatus::None,
      playoff: None,
    }
  }

  fn make_standings(ids: &[&str], games: &[Game]) -> Vec<TeamStanding> {
    ids
      .iter()
      .map(|id| {
        let team = Team::new(id, &format!("Team {}", id.to_uppercase()), "p1");
        TeamStanding::from_stats(team, team_stats(id, games, None))
      })
      .collect()
  }

  #[test]
  fn test_approx_equal() {
    assert!(approx_equal(0.5, 0.5004, TIE_TOLERANCE));
    assert!(!approx_equal(0.5, 0.502, TIE_TOLERANCE));
    assert!(approx_equal(f64::INFINITY, f64::INFINITY, TIE_TOLERANCE));
    assert!(!approx_equal(f64::INFINITY, 1e12, TIE_TOLERANCE));
  }

  #[test]
  fn test_cyclic_head_to_head_falls_through_to_runs_against() {
    // a > b > c > a; runs allowed among the three: a 9, b 10, c 8
    let games = vec![
      make_game("a", "b", 6, 4),
      make_game("b", "c", 5, 4),
      make_game("c", "a", 5, 3),
      make_game("a", "d", 1, 0),
      make_game("b", "d", 1, 0),
      make_game("c", "d", 1, 0),
    ];
    let standings = make_standings(&["a", "b", "c"], &games);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    assert_eq!(resolution.order, vec!["c", "a", "b"]);
    for id in ["a", "b", "c"] {
      assert_eq!(resolution.deciding_rule(id), Some(TieBreakRule::RunsAgainstAmongTied));
    }
  }

  #[test]
  fn test_head_to_head_decides_a_pair_over_ratios() {
    let games = vec![
      make_game("a", "b", 2, 1),
      make_game("c", "a", 12, 0),
      make_game("b", "c", 3, 0),
    ];
    let standings = make_standings(&["b", "a"], &games);
    assert!(standings[0].runs_against_per_inning < standings[1].runs_against_per_inning);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    assert_eq!(resolution.order, vec!["a", "b"]);
    assert_eq!(resolution.deciding_rule("a"), Some(TieBreakRule::HeadToHead));
  }

  #[test]
  fn test_split_pair_re_enters_head_to_head() {
    // runs allowed among tied: a 3, b 5, c 5; b beat c head to head
    let games = vec![
      make_game("a", "b", 3, 1),
      make_game("b", "c", 4, 2),
      make_game("c", "a", 2, 1),
    ];
    let standings = make_standings(&["c", "b", "a"], &games);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    assert_eq!(resolution.order, vec!["a", "b", "c"]);
    assert_eq!(resolution.deciding_rule("a"), Some(TieBreakRule::RunsAgainstAmongTied));
    assert_eq!(resolution.deciding_rule("b"), Some(TieBreakRule::HeadToHead));
    assert_eq!(resolution.deciding_rule("c"), Some(TieBreakRule::HeadToHead));
  }

  #[test]
  fn test_forfeit_losses_rank_last() {
    let mut forfeit = make_game("x", "a", 0, 7);
    forfeit.forfeit_status = ForfeitStatus::Away;
    let games = vec![
      forfeit,
      make_game("a", "b", 20, 0),
      make_game("b", "c", 1, 0),
      make_game("c", "x", 3, 0),
    ];
    let standings = make_standings(&["a", "b", "c"], &games);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    assert_eq!(resolution.order.last().map(String::as_str), Some("a"));
    assert_eq!(resolution.deciding_rule("a"), Some(TieBreakRule::ForfeitEligibility));
  }

  #[test]
  fn test_single_eligible_team_returns_immediately() {
    let mut first = make_game("a", "z", 0, 0);
    first.forfeit_status = ForfeitStatus::Home;
    let mut second = make_game("b", "z", 0, 0);
    second.forfeit_status = ForfeitStatus::Home;
    let games = vec![first, second, make_game("c", "z", 1, 0)];
    let standings = make_standings(&["b", "a", "c"], &games);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    // ineligible teams follow by name
    assert_eq!(resolution.order, vec!["c", "a", "b"]);
  }

  #[test]
  fn test_no_games_uses_deterministic_coin_toss() {
    let standings = make_standings(&["t1", "t2", "t3", "t4"], &[]);
    let first = TieBreaker::new(&[]).resolve(&standings);
    let mut reversed = standings.clone();
    reversed.reverse();
    let second = TieBreaker::new(&[]).resolve(&reversed);
    assert_eq!(first.order, second.order);
    assert_eq!(first.order.len(), 4);
    assert_eq!(first.deciding_rule("t1"), Some(TieBreakRule::CoinToss));
  }

  #[test]
  fn test_ratios_within_tolerance_stay_tied() {
    let mut a_game = make_game("a", "z", 1, 1000);
    a_game.away_innings_batted = 1000.0;
    a_game.home_innings_batted = 1000.0;
    let mut b_game = make_game("b", "z", 1, 1000);
    b_game.away_innings_batted = 1000.5;
    b_game.home_innings_batted = 1000.0;
    let games = vec![a_game, b_game];
    let standings = make_standings(&["a", "b"], &games);
    let resolution = TieBreaker::new(&games).resolve(&standings);
    assert_eq!(resolution.deciding_rule("a"), Some(TieBreakRule::CoinToss));
  }
}
