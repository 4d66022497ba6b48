//! Game state, scoring and termination arithmetic.
//!
//! Scores move in steps of [`POINTS_PER_QUESTION`]. A game is won when the
//! team reaches [`target_score`], i.e. 90% of the maximum rounded up.

use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{
    entity::{AnswerOption, Flashcard, Vote},
    value_object::{AnswerId, FlashcardId, SessionId, Timestamp, Username},
};

/// Points awarded for a correct team answer.
pub const POINTS_PER_QUESTION: u32 = 100;

/// Share of the maximum score needed to win, in percent.
pub const WIN_THRESHOLD_PERCENT: u32 = 90;

/// Status of the question state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    QuestionActive,
    QuestionEnded,
    GameFinished,
}

/// Maximum reachable score for a deck of `deck_len` cards.
pub fn max_possible_score(deck_len: usize) -> u32 {
    POINTS_PER_QUESTION.saturating_mul(deck_len as u32)
}

/// `⌈0.9 × max⌉`.
pub fn target_score(max_possible_score: u32) -> u32 {
    (max_possible_score * WIN_THRESHOLD_PERCENT).div_ceil(100)
}

/// Whether the team can still reach the target.
///
/// `unplayed_from` is the index of the question whose outcome was just
/// recorded. Cards from that index to the end of the deck count as available,
/// so the closed question itself is included: a five-card game that misses
/// its first two questions ends after the second one, not the first.
pub fn victory_reachable(total_score: u32, max_possible_score: u32, deck_len: usize, unplayed_from: usize) -> bool {
    let remaining_cards = deck_len.saturating_sub(unplayed_from) as u32;
    let remaining = POINTS_PER_QUESTION * remaining_cards;
    total_score + remaining >= target_score(max_possible_score)
}

/// Win/loss verdict of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameVerdict {
    Won,
    Lost,
}

impl GameVerdict {
    pub fn from_score(total_score: u32, max_possible_score: u32) -> Self {
        if max_possible_score > 0 && total_score * 100 >= max_possible_score * WIN_THRESHOLD_PERCENT {
            GameVerdict::Won
        } else {
            GameVerdict::Lost
        }
    }
}

/// Score as a percentage of the maximum, rounded to one decimal.
pub fn percentage(total_score: u32, max_possible_score: u32) -> f64 {
    if max_possible_score == 0 {
        return 0.0;
    }
    let raw = f64::from(total_score) / f64::from(max_possible_score) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Count votes per answer.
pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> BTreeMap<AnswerId, u32> {
    let mut counts = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote.answer_id).or_insert(0) += 1;
    }
    counts
}

/// Pick the team answer: the most voted option, ties broken uniformly at random.
///
/// Returns `None` when nobody voted.
pub fn pick_winner<R: Rng + ?Sized>(counts: &BTreeMap<AnswerId, u32>, rng: &mut R) -> Option<AnswerId> {
    let max = counts.values().copied().max()?;
    let candidates: Vec<AnswerId> = counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(answer, _)| *answer)
        .collect();
    candidates.choose(rng).copied()
}

/// Answer option without its correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedAnswer {
    pub id: AnswerId,
    pub text: String,
}

/// Question payload that is safe to show while voting is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedQuestion {
    pub flashcard_id: FlashcardId,
    pub question: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub answers: Vec<SanitizedAnswer>,
}

impl SanitizedQuestion {
    pub fn from_flashcard(card: &Flashcard, question_index: usize, total_questions: usize) -> Self {
        Self {
            flashcard_id: card.id,
            question: card.question.clone(),
            question_index,
            total_questions,
            answers: card
                .answers
                .iter()
                .map(|a| SanitizedAnswer {
                    id: a.id,
                    text: a.text.clone(),
                })
                .collect(),
        }
    }
}

/// Server-computed team answer, correctness and points for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub flashcard_id: FlashcardId,
    pub question_index: usize,
    pub winning_answer_id: Option<AnswerId>,
    pub correct_answer_id: Option<AnswerId>,
    pub was_correct: bool,
    pub points_earned: u32,
    pub total_score: u32,
    pub vote_counts: BTreeMap<AnswerId, u32>,
    /// Revealed options, including the correctness flag.
    pub answers: Vec<AnswerOption>,
}

/// Final result envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub session_id: SessionId,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub percentage: f64,
    pub status: GameVerdict,
    pub questions_answered: usize,
    pub total_questions: usize,
}

/// Live game state of a started session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub current_question_index: usize,
    pub current_flashcard_id: FlashcardId,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub status: GameStatus,
    pub questions_answered: usize,
    pub total_questions: usize,
    pub question_started_at: Timestamp,
    pub game_started_at: Timestamp,
    pub game_ended_at: Option<Timestamp>,
    /// Outcome of the most recently closed question. Never serialized with the
    /// state itself; read models expose it only once the answer is revealed.
    #[serde(skip)]
    pub last_outcome: Option<QuestionOutcome>,
}

impl GameState {
    /// Fresh state pointing at the first card of `deck`.
    ///
    /// The caller guarantees the deck is not empty.
    pub fn start(first: &Flashcard, deck_len: usize, now: Timestamp) -> Self {
        Self {
            current_question_index: 0,
            current_flashcard_id: first.id,
            total_score: 0,
            max_possible_score: max_possible_score(deck_len),
            status: GameStatus::QuestionActive,
            questions_answered: 0,
            total_questions: deck_len,
            question_started_at: now,
            game_started_at: now,
            game_ended_at: None,
            last_outcome: None,
        }
    }

    /// Build the final result for `session_id`.
    pub fn result(&self, session_id: &SessionId) -> GameResult {
        GameResult {
            session_id: session_id.clone(),
            total_score: self.total_score,
            max_possible_score: self.max_possible_score,
            percentage: percentage(self.total_score, self.max_possible_score),
            status: GameVerdict::from_score(self.total_score, self.max_possible_score),
            questions_answered: self.questions_answered,
            total_questions: self.total_questions,
        }
    }
}

/// One entry of the anonymized per-vote list broadcast with `vote_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    pub username: Username,
    pub answer_id: AnswerId,
    pub voted_at: Timestamp,
}
