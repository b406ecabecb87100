//! Per-team counting stats folded from completed games.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::{ForfeitStatus, Game, POINTS_PER_TIE, POINTS_PER_WIN};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
  pub wins: u32,
  pub losses: u32,
  pub ties: u32,
  pub runs_for: u32,
  pub runs_against: u32,
  pub offensive_innings: f64,
  pub defensive_innings: f64,
  pub forfeit_losses: u32,
}

impl TeamStats {
  pub fn games_played(&self) -> u32 {
    self.wins + self.losses + self.ties
  }

  pub fn points(&self) -> u32 {
    self.wins * POINTS_PER_WIN + self.ties * POINTS_PER_TIE
  }

  /// Runs allowed per defensive inning, 0 when no innings were played.
  pub fn runs_against_per_inning(&self) -> f64 {
    if self.defensive_innings > 0.0 {
      self.runs_against as f64 / self.defensive_innings
    } else {
      0.0
    }
  }

  /// Runs scored per offensive inning, 0 when no innings were batted.
  pub fn runs_for_per_inning(&self) -> f64 {
    if self.offensive_innings > 0.0 {
      self.runs_for as f64 / self.offensive_innings
    } else {
      0.0
    }
  }

  fn record(&mut self, game: &Game, team_id: &str) {
    let is_home = game.home_team_id.as_deref() == Some(team_id);
    let home_score = game.home_score.unwrap_or(0);
    let away_score = game.away_score.unwrap_or(0);
    let (score_for, score_against, innings_for, innings_against) = if is_home {
      (home_score, away_score, game.home_innings_batted, game.away_innings_batted)
    } else {
      (away_score, home_score, game.away_innings_batted, game.home_innings_batted)
    };

    self.runs_for += score_for;
    self.runs_against += score_against;
    self.offensive_innings += innings_for;
    self.defensive_innings += innings_against;

    let forfeited_by_team = match game.forfeit_status {
      ForfeitStatus::Home => Some(is_home),
      ForfeitStatus::Away => Some(!is_home),
      ForfeitStatus::None => None,
    };
    match forfeited_by_team {
      Some(true) => {
        self.losses += 1;
        self.forfeit_losses += 1;
      }
      Some(false) => self.wins += 1,
      None => match score_for.cmp(&score_against) {
        std::cmp::Ordering::Greater => self.wins += 1,
        std::cmp::Ordering::Less => self.losses += 1,
        std::cmp::Ordering::Equal => self.ties += 1,
      },
    }
  }
}

/// Stats for `team_id` over the completed games in `games`. With an opponent
/// filter only games against one of those teams are counted.
pub fn team_stats(team_id: &str, games: &[Game], opponents: Option<&HashSet<&str>>) -> TeamStats {
  let mut stats = TeamStats::default();
  for game in games {
    if !game.is_completed() {
      continue;
    }
    let Some(opponent) = game.opponent_of(team_id) else {
      continue;
    };
    if let Some(filter) = opponents {
      if !filter.contains(opponent) {
        continue;
      }
    }
    stats.record(game, team_id);
  }
  stats
}

/// Head-to-head wins of `team_id` over `opponent_id`.
pub fn wins_against(team_id: &str, opponent_id: &str, games: &[Game]) -> u32 {
  games
    .iter()
    .filter(|game| game.opponent_of(team_id) == Some(opponent_id))
    .filter(|game| game.winner_id().as_deref() == Some(team_id))
    .count() as u32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::GameStatus;

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

  #[test]
  fn test_counts_results_from_both_sides() {
    let games = vec![
      make_game("a", "b", 5, 3),
      make_game("c", "a", 2, 2),
      make_game("b", "a", 9, 1),
    ];
    let stats = team_stats("a", &games, None);
    assert_eq!((stats.wins, stats.losses, stats.ties), (1, 1, 1));
    assert_eq!(stats.runs_for, 8);
    assert_eq!(stats.runs_against, 14);
    assert_eq!(stats.offensive_innings, 21.0);
    assert_eq!(stats.points(), 3);
  }

  #[test]
  fn test_forfeit_ignores_scores() {
    let mut game = make_game("a", "b", 10, 0);
    game.forfeit_status = ForfeitStatus::Home;
    let games = vec![game];
    let home = team_stats("a", &games, None);
    assert_eq!((home.wins, home.losses, home.forfeit_losses), (0, 1, 1));
    let away = team_stats("b", &games, None);
    assert_eq!((away.wins, away.losses, away.forfeit_losses), (1, 0, 0));
  }

  #[test]
  fn test_skips_scheduled_games_and_filters_opponents() {
    let mut scheduled = make_game("a", "c", 0, 0);
    scheduled.status = GameStatus::Scheduled;
    let games = vec![make_game("a", "b", 4, 1), make_game("a", "c", 6, 0), scheduled];
    let filter: HashSet<&str> = ["b"].into_iter().collect();
    let stats = team_stats("a", &games, Some(&filter));
    assert_eq!(stats.games_played(), 1);
    assert_eq!(stats.runs_against, 1);
    assert_eq!(team_stats("a", &games, None).games_played(), 2);
  }

  #[test]
  fn test_ratios_are_zero_without_innings() {
    let stats = TeamStats::default();
    assert_eq!(stats.runs_against_per_inning(), 0.0);
    assert_eq!(stats.runs_for_per_inning(), 0.0);
  }

  #[test]
  fn test_wins_against() {
    let games = vec![make_game("a", "b", 3, 1), make_game("b", "a", 2, 4), make_game("a", "c", 0, 1)];
    assert_eq!(wins_against("a", "b", &games), 2);
    assert_eq!(wins_against("b", "a", &games), 0);
    assert_eq!(wins_against("c", "a", &games), 1);
  }
}
