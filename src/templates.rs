//! Fixed elimination bracket shapes.
//!
//! Each template is an ordered table of [`BracketMatchup`]s in play order.
//! A slot is either bound to a seed or fed by the winner/loser of an earlier
//! game number. Tables are never mutated; the generator copies them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::seeding::EliminationType;
use crate::types::{BracketSide, SlotSource};

/// Where a bracket slot's team comes from: a fixed seed or another game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotRef {
    Seed(u32),
    Source(SlotSource),
}

impl SlotRef {
    pub fn seed(&self) -> Option<u32> {
        match self {
            SlotRef::Seed(seed) => Some(*seed),
            SlotRef::Source(_) => None,
        }
    }

    pub fn source(&self) -> Option<SlotSource> {
        match self {
            SlotRef::Seed(_) => None,
            SlotRef::Source(source) => Some(*source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketMatchup {
    pub round: u32,
    pub game_number: u32,
    pub bracket: BracketSide,
    pub team1: SlotRef,
    pub team2: SlotRef,
    pub if_necessary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    Single4,
    Single6,
    Single8,
    Single16,
    Double4,
    Double8,
    Double12,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 7] = [
        TemplateKey::Single4,
        TemplateKey::Single6,
        TemplateKey::Single8,
        TemplateKey::Single16,
        TemplateKey::Double4,
        TemplateKey::Double8,
        TemplateKey::Double12,
    ];

    pub fn lookup(elimination: EliminationType, team_count: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.elimination() == elimination && key.team_count() == team_count)
    }

    pub fn elimination(&self) -> EliminationType {
        match self {
            TemplateKey::Single4 | TemplateKey::Single6 | TemplateKey::Single8 | TemplateKey::Single16 => {
                EliminationType::Single
            }
            TemplateKey::Double4 | TemplateKey::Double8 | TemplateKey::Double12 => EliminationType::Double,
        }
    }

    pub fn team_count(&self) -> usize {
        match self {
            TemplateKey::Single4 | TemplateKey::Double4 => 4,
            TemplateKey::Single6 => 6,
            TemplateKey::Single8 | TemplateKey::Double8 => 8,
            TemplateKey::Double12 => 12,
            TemplateKey::Single16 => 16,
        }
    }

    pub fn matchups(&self) -> &'static [BracketMatchup] {
        match self {
            TemplateKey::Single4 => SINGLE_4,
            TemplateKey::Single6 => SINGLE_6,
            TemplateKey::Single8 => SINGLE_8,
            TemplateKey::Single16 => SINGLE_16,
            TemplateKey::Double4 => DOUBLE_4,
            TemplateKey::Double8 => DOUBLE_8,
            TemplateKey::Double12 => DOUBLE_12,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-elimination-{}", self.elimination(), self.team_count())
    }
}

// ── Table helpers ───────────────────────────────────────────────────

const W: BracketSide = BracketSide::Winners;
const L: BracketSide = BracketSide::Losers;
const C: BracketSide = BracketSide::Championship;

const fn seed(n: u32) -> SlotRef {
    SlotRef::Seed(n)
}

const fn winner_of(game_number: u32) -> SlotRef {
    SlotRef::Source(SlotSource::winner(game_number))
}

const fn loser_of(game_number: u32) -> SlotRef {
    SlotRef::Source(SlotSource::loser(game_number))
}

const fn game(round: u32, game_number: u32, bracket: BracketSide, team1: SlotRef, team2: SlotRef) -> BracketMatchup {
    BracketMatchup { round, game_number, bracket, team1, team2, if_necessary: false }
}

const fn if_necessary(round: u32, game_number: u32, team1: SlotRef, team2: SlotRef) -> BracketMatchup {
    BracketMatchup { round, game_number, bracket: C, team1, team2, if_necessary: true }
}

// ── Single elimination ──────────────────────────────────────────────

const SINGLE_4: &[BracketMatchup] = &[
    game(1, 1, W, seed(1), seed(4)),
    game(1, 2, W, seed(2), seed(3)),
    game(2, 3, C, winner_of(1), winner_of(2)),
];

// Seeds 1 and 2 bye; seed 2 draws the 3/6 winner.
const SINGLE_6: &[BracketMatchup] = &[
    game(1, 1, W, seed(3), seed(6)),
    game(1, 2, W, seed(4), seed(5)),
    game(2, 3, W, seed(1), winner_of(2)),
    game(2, 4, W, seed(2), winner_of(1)),
    game(3, 5, C, winner_of(3), winner_of(4)),
];

const SINGLE_8: &[BracketMatchup] = &[
    game(1, 1, W, seed(1), seed(8)),
    game(1, 2, W, seed(4), seed(5)),
    game(1, 3, W, seed(2), seed(7)),
    game(1, 4, W, seed(3), seed(6)),
    game(2, 5, W, winner_of(1), winner_of(2)),
    game(2, 6, W, winner_of(3), winner_of(4)),
    game(3, 7, C, winner_of(5), winner_of(6)),
];

const SINGLE_16: &[BracketMatchup] = &[
    game(1, 1, W, seed(1), seed(16)),
    game(1, 2, W, seed(8), seed(9)),
    game(1, 3, W, seed(4), seed(13)),
    game(1, 4, W, seed(5), seed(12)),
    game(1, 5, W, seed(2), seed(15)),
    game(1, 6, W, seed(7), seed(10)),
    game(1, 7, W, seed(3), seed(14)),
    game(1, 8, W, seed(6), seed(11)),
    game(2, 9, W, winner_of(1), winner_of(2)),
    game(2, 10, W, winner_of(3), winner_of(4)),
    game(2, 11, W, winner_of(5), winner_of(6)),
    game(2, 12, W, winner_of(7), winner_of(8)),
    game(3, 13, W, winner_of(9), winner_of(10)),
    game(3, 14, W, winner_of(11), winner_of(12)),
    game(4, 15, C, winner_of(13), winner_of(14)),
];

// ── Double elimination ──────────────────────────────────────────────
//
// The last game is the bracket reset: it is only played when the losers
// bracket champion wins the first championship game.

const DOUBLE_4: &[BracketMatchup] = &[
    game(1, 1, W, seed(1), seed(4)),
    game(1, 2, W, seed(2), seed(3)),
    game(2, 3, W, winner_of(1), winner_of(2)),
    game(1, 4, L, loser_of(1), loser_of(2)),
    game(2, 5, L, loser_of(3), winner_of(4)),
    game(1, 6, C, winner_of(3), winner_of(5)),
    if_necessary(2, 7, winner_of(6), loser_of(6)),
];

// Losers round 2 crosses the drop-downs so first-round opponents don't meet again.
const DOUBLE_8: &[BracketMatchup] = &[
    game(1, 1, W, seed(1), seed(8)),
    game(1, 2, W, seed(4), seed(5)),
    game(1, 3, W, seed(2), seed(7)),
    game(1, 4, W, seed(3), seed(6)),
    game(2, 5, W, winner_of(1), winner_of(2)),
    game(2, 6, W, winner_of(3), winner_of(4)),
    game(1, 7, L, loser_of(1), loser_of(2)),
    game(1, 8, L, loser_of(3), loser_of(4)),
    game(2, 9, L, winner_of(7), loser_of(6)),
    game(2, 10, L, winner_of(8), loser_of(5)),
    game(3, 11, W, winner_of(5), winner_of(6)),
    game(3, 12, L, winner_of(9), winner_of(10)),
    game(4, 13, L, winner_of(12), loser_of(11)),
    game(1, 14, C, winner_of(11), winner_of(13)),
    if_necessary(2, 15, winner_of(14), loser_of(14)),
];

const DOUBLE_12: &[BracketMatchup] = &[
    game(1, 1, W, seed(5), seed(12)),
    game(1, 2, W, seed(8), seed(9)),
    game(1, 3, W, seed(6), seed(11)),
    game(1, 4, W, seed(7), seed(10)),
    game(2, 5, W, seed(1), winner_of(2)),
    game(2, 6, W, seed(4), winner_of(1)),
    game(2, 7, W, seed(2), winner_of(4)),
    game(2, 8, W, seed(3), winner_of(3)),
    game(1, 9, L, loser_of(5), loser_of(4)),
    game(1, 10, L, loser_of(6), loser_of(3)),
    game(1, 11, L, loser_of(7), loser_of(2)),
    game(1, 12, L, loser_of(8), loser_of(1)),
    game(3, 13, W, winner_of(5), winner_of(6)),
    game(3, 14, W, winner_of(7), winner_of(8)),
    game(2, 15, L, winner_of(9), winner_of(10)),
    game(2, 16, L, winner_of(11), winner_of(12)),
    game(3, 17, L, winner_of(15), loser_of(14)),
    game(3, 18, L, winner_of(16), loser_of(13)),
    game(4, 19, W, winner_of(13), winner_of(14)),
    game(4, 20, L, winner_of(17), winner_of(18)),
    game(5, 21, L, winner_of(20), loser_of(19)),
    game(1, 22, C, winner_of(19), winner_of(21)),
    if_necessary(2, 23, winner_of(22), loser_of(22)),
];
