use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, Mutex},
};

use crate::stats::TeamStats;
use crate::store::TournamentStore;
use crate::tiebreak::TieBreakRule;

// ── Constants ──────────────────────────────────────────────────────────

/// Standings points awarded per win.
pub const POINTS_PER_WIN: u32 = 2;
/// Standings points awarded per tie.
pub const POINTS_PER_TIE: u32 = 1;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedStore = Arc<Mutex<TournamentStore>>;

// ── Tournament domain types ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub pool_id: String,
}

impl Team {
    pub fn new(id: &str, name: &str, pool_id: &str) -> Self {
        Team {
            id: id.to_string(),
            name: name.to_string(),
            pool_id: pool_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Scheduled,
    Completed,
}

/// Which side, if any, forfeited the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitStatus {
    #[default]
    None,
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Winners,
    Losers,
    Championship,
}

impl fmt::Display for BracketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketSide::Winners => write!(f, "winners"),
            BracketSide::Losers => write!(f, "losers"),
            BracketSide::Championship => write!(f, "championship"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePosition {
    Winner,
    Loser,
}

/// Forward reference from a bracket slot to the game that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSource {
    pub game_number: u32,
    pub position: SourcePosition,
}

impl SlotSource {
    pub const fn winner(game_number: u32) -> Self {
        SlotSource { game_number, position: SourcePosition::Winner }
    }

    pub const fn loser(game_number: u32) -> Self {
        SlotSource { game_number, position: SourcePosition::Loser }
    }
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            SourcePosition::Winner => write!(f, "Winner of Game {}", self.game_number),
            SourcePosition::Loser => write!(f, "Loser of Game {}", self.game_number),
        }
    }
}

/// Team 1 of a bracket slot plays as the home side, team 2 as away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPosition {
    Team1,
    Team2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffSlot {
    pub round: u32,
    pub game_number: u32,
    pub bracket: BracketSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1_source: Option<SlotSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2_source: Option<SlotSource>,
    #[serde(default)]
    pub if_necessary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PlayoffSlot {
    pub fn source(&self, position: SlotPosition) -> Option<SlotSource> {
        match position {
            SlotPosition::Team1 => self.team1_source,
            SlotPosition::Team2 => self.team2_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub division_id: String,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    #[serde(default)]
    pub status: GameStatus,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    #[serde(default)]
    pub home_innings_batted: f64,
    #[serde(default)]
    pub away_innings_batted: f64,
    #[serde(default)]
    pub forfeit_status: ForfeitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playoff: Option<PlayoffSlot>,
}

/// Deterministic result of a completed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    Decided { winner: String, loser: String },
    Tie,
}

impl Game {
    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    pub fn is_playoff(&self) -> bool {
        self.playoff.is_some()
    }

    pub fn game_number(&self) -> Option<u32> {
        self.playoff.as_ref().map(|slot| slot.game_number)
    }

    pub fn involves(&self, team_id: &str) -> bool {
        self.home_team_id.as_deref() == Some(team_id) || self.away_team_id.as_deref() == Some(team_id)
    }

    /// The other participant, if `team_id` played in this game.
    pub fn opponent_of(&self, team_id: &str) -> Option<&str> {
        if self.home_team_id.as_deref() == Some(team_id) {
            self.away_team_id.as_deref()
        } else if self.away_team_id.as_deref() == Some(team_id) {
            self.home_team_id.as_deref()
        } else {
            None
        }
    }

    pub fn team_in(&self, position: SlotPosition) -> Option<&str> {
        match position {
            SlotPosition::Team1 => self.home_team_id.as_deref(),
            SlotPosition::Team2 => self.away_team_id.as_deref(),
        }
    }

    pub fn team_slot_mut(&mut self, position: SlotPosition) -> &mut Option<String> {
        match position {
            SlotPosition::Team1 => &mut self.home_team_id,
            SlotPosition::Team2 => &mut self.away_team_id,
        }
    }

    /// Winner/loser of a completed game. A forfeit decides the game without
    /// looking at the scores; equal scores without a forfeit yield `Tie`.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if !self.is_completed() {
            return None;
        }
        let home = self.home_team_id.clone()?;
        let away = self.away_team_id.clone()?;
        match self.forfeit_status {
            ForfeitStatus::Home => return Some(GameOutcome::Decided { winner: away, loser: home }),
            ForfeitStatus::Away => return Some(GameOutcome::Decided { winner: home, loser: away }),
            ForfeitStatus::None => {}
        }
        let home_score = self.home_score?;
        let away_score = self.away_score?;
        Some(match home_score.cmp(&away_score) {
            std::cmp::Ordering::Greater => GameOutcome::Decided { winner: home, loser: away },
            std::cmp::Ordering::Less => GameOutcome::Decided { winner: away, loser: home },
            std::cmp::Ordering::Equal => GameOutcome::Tie,
        })
    }

    pub fn winner_id(&self) -> Option<String> {
        match self.outcome()? {
            GameOutcome::Decided { winner, .. } => Some(winner),
            GameOutcome::Tie => None,
        }
    }

    pub fn loser_id(&self) -> Option<String> {
        match self.outcome()? {
            GameOutcome::Decided { loser, .. } => Some(loser),
            GameOutcome::Tie => None,
        }
    }
}

// ── Derived standings types ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team: Team,
    pub stats: TeamStats,
    pub points: u32,
    pub runs_against_per_inning: f64,
    pub runs_for_per_inning: f64,
    pub rank: usize,
    #[serde(default)]
    pub is_pool_winner: bool,
    #[serde(default)]
    pub is_pool_runner_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<TieBreakRule>,
}

impl TeamStanding {
    pub fn from_stats(team: Team, stats: TeamStats) -> Self {
        TeamStanding {
            points: stats.points(),
            runs_against_per_inning: stats.runs_against_per_inning(),
            runs_for_per_inning: stats.runs_for_per_inning(),
            team,
            stats,
            rank: 0,
            is_pool_winner: false,
            is_pool_runner_up: false,
            decided_by: None,
        }
    }

    pub fn team_id(&self) -> &str {
        &self.team.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStandings {
    pub pool: Pool,
    pub standings: Vec<TeamStanding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeededTeam {
    pub seed: u32,
    pub team_id: String,
    pub pool_name: String,
    pub pool_rank: usize,
}
