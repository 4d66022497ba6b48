//! Session aggregate.
//!
//! A [`Session`] owns its roster, its game state, the votes cast for each
//! flashcard and the chat log. All transitions of the question state machine
//! are methods on the aggregate so that the invariants are checked in one
//! place; authorization and event emission live in the use case layer.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    entity::{ChatMessage, Flashcard, Participant, Subject, User, Vote},
    error::SessionError,
    game::{
        self, GameResult, GameState, GameStatus, QuestionOutcome, SanitizedQuestion, VoteEntry,
    },
    value_object::{
        AnswerId, ChatMessageId, FlashcardId, GroupName, JoinCode, MessageContent, SessionId,
        Timestamp, UserId, VoteId,
    },
    view::{ParticipantView, SessionView, Snapshot},
};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

/// What happened when a user left a session.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// The user was not a participant; nothing changed.
    NotParticipant,
    /// A regular participant left.
    Left(Participant),
    /// The host left a waiting session; the session must be dropped.
    TornDown { participants: Vec<Participant> },
    /// The host left and the earliest-joined remaining participant took over.
    HostTransferred {
        previous: Participant,
        new_host: Participant,
    },
    /// The host was alone in a running game; the game was finalized.
    Finalized(GameResult),
}

/// Result of moving past the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceOutcome {
    /// Outcome of the question closed implicitly by this advance, if any.
    pub ended: Option<QuestionOutcome>,
    pub step: AdvanceStep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceStep {
    Next {
        question: SanitizedQuestion,
        total_score: u32,
    },
    Finished(GameResult),
}

/// A hosted quiz round bound to one deck and one study group.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub join_code: JoinCode,
    pub subject: Subject,
    pub host_id: UserId,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub flashcard_count: usize,
    /// Roster in join order.
    pub participants: Vec<Participant>,
    pub game: Option<GameState>,
    deck: Vec<Flashcard>,
    votes: HashMap<FlashcardId, HashMap<UserId, Vote>>,
    chat: Vec<ChatMessage>,
    next_vote_id: u64,
    next_message_id: u64,
    closed: bool,
}

impl Session {
    /// Create a waiting session with `host` as its first participant.
    pub fn new(
        id: SessionId,
        join_code: JoinCode,
        host: User,
        subject: Subject,
        flashcard_count: usize,
        now: Timestamp,
    ) -> Self {
        let host_id = host.id;
        Self {
            id,
            join_code,
            subject,
            host_id,
            status: SessionStatus::Waiting,
            created_at: now,
            flashcard_count,
            participants: vec![Participant::new(host, true, now)],
            game: None,
            deck: Vec::new(),
            votes: HashMap::new(),
            chat: Vec::new(),
            next_vote_id: 1,
            next_message_id: 1,
            closed: false,
        }
    }

    pub fn group(&self) -> &GroupName {
        &self.subject.group
    }

    /// Whether the session still accepts a join code.
    pub fn is_active(&self) -> bool {
        !self.closed && self.status != SessionStatus::Finished
    }

    /// Whether the session was dropped from the store.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the session as dropped. Handles still held elsewhere see it as gone.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn participant(&self, user: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user.id == user)
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.participant(user).is_some()
    }

    pub fn is_host(&self, user: UserId) -> bool {
        self.host_id == user
    }

    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_host)
    }

    /// Participants other than the host.
    pub fn guest_count(&self) -> usize {
        self.participants.iter().filter(|p| !p.is_host).count()
    }

    pub fn ensure_participant(&self, user: UserId) -> Result<(), SessionError> {
        if !self.is_participant(user) {
            return Err(SessionError::NotParticipant(user));
        }
        Ok(())
    }

    pub fn ensure_host(&self, user: UserId) -> Result<(), SessionError> {
        if !self.is_host(user) {
            return Err(SessionError::NotHost(user));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: SessionStatus) -> Result<(), SessionError> {
        if self.status != expected {
            return Err(SessionError::InvalidSessionStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    /// Append `user` to the roster.
    ///
    /// Returns `None` if the user is already a participant. Join timestamps
    /// never go backwards even if the wall clock does.
    pub fn add_participant(&mut self, user: User, now: Timestamp) -> Option<&Participant> {
        if self.is_participant(user.id) {
            return None;
        }
        let joined_at = self
            .participants
            .last()
            .map_or(now, |last| now.max(last.joined_at));
        self.participants.push(Participant::new(user, false, joined_at));
        self.participants.last()
    }

    /// Remove `user` from the session, applying the host-leave rules.
    pub fn leave(&mut self, user: UserId, now: Timestamp) -> LeaveOutcome {
        let Some(position) = self.participants.iter().position(|p| p.user.id == user) else {
            return LeaveOutcome::NotParticipant;
        };

        if !self.participants[position].is_host {
            return LeaveOutcome::Left(self.participants.remove(position));
        }

        if self.status == SessionStatus::Waiting {
            self.close();
            return LeaveOutcome::TornDown {
                participants: std::mem::take(&mut self.participants),
            };
        }

        if self.participants.len() == 1 {
            if self.status == SessionStatus::Playing {
                return LeaveOutcome::Finalized(self.finish(now));
            }
            self.close();
            return LeaveOutcome::TornDown {
                participants: std::mem::take(&mut self.participants),
            };
        }

        let previous = self.participants.remove(position);
        // Roster is in join order, so the first entry is the earliest joiner.
        let new_host = &mut self.participants[0];
        new_host.is_host = true;
        self.host_id = new_host.user.id;
        LeaveOutcome::HostTransferred {
            previous,
            new_host: new_host.clone(),
        }
    }

    /// Start the game on `deck`.
    pub fn start(
        &mut self,
        user: UserId,
        deck: Vec<Flashcard>,
        now: Timestamp,
    ) -> Result<SanitizedQuestion, SessionError> {
        self.ensure_host(user)?;
        self.ensure_status(SessionStatus::Waiting)?;
        let first = deck.first().ok_or(SessionError::EmptyDeck)?;

        let state = GameState::start(first, deck.len(), now);
        let question = SanitizedQuestion::from_flashcard(first, 0, deck.len());
        self.flashcard_count = deck.len();
        self.deck = deck;
        self.game = Some(state);
        self.status = SessionStatus::Playing;
        Ok(question)
    }

    fn game(&self) -> Result<&GameState, SessionError> {
        self.game.as_ref().ok_or(SessionError::GameNotStarted)
    }

    fn game_mut(&mut self) -> Result<&mut GameState, SessionError> {
        self.game.as_mut().ok_or(SessionError::GameNotStarted)
    }

    /// The flashcard currently on screen.
    pub fn current_flashcard(&self) -> Option<&Flashcard> {
        let game = self.game.as_ref()?;
        self.deck.get(game.current_question_index)
    }

    /// The sanitized current question, if the game has started.
    pub fn current_question(&self) -> Option<SanitizedQuestion> {
        let game = self.game.as_ref()?;
        let card = self.current_flashcard()?;
        Some(SanitizedQuestion::from_flashcard(
            card,
            game.current_question_index,
            game.total_questions,
        ))
    }

    /// Cast or overwrite `user`'s vote for the active flashcard.
    pub fn cast_vote(
        &mut self,
        user: &User,
        flashcard_id: FlashcardId,
        answer_id: AnswerId,
        now: Timestamp,
    ) -> Result<VoteId, SessionError> {
        self.ensure_participant(user.id)?;
        let game = self.game()?;
        if game.status != GameStatus::QuestionActive {
            return Err(SessionError::InvalidGameStatus {
                expected: GameStatus::QuestionActive,
                actual: game.status,
            });
        }
        if game.current_flashcard_id != flashcard_id {
            return Err(SessionError::FlashcardNotActive {
                requested: flashcard_id,
                active: game.current_flashcard_id,
            });
        }
        let card_has_answer = self
            .current_flashcard()
            .is_some_and(|card| card.has_answer(answer_id));
        if !card_has_answer {
            return Err(SessionError::UnknownAnswer {
                flashcard: flashcard_id,
                answer: answer_id,
            });
        }

        let votes = self.votes.entry(flashcard_id).or_default();
        if let Some(existing) = votes.get_mut(&user.id) {
            existing.answer_id = answer_id;
            existing.voted_at = now;
            return Ok(existing.id);
        }
        let id = VoteId::new(self.next_vote_id);
        self.next_vote_id += 1;
        votes.insert(
            user.id,
            Vote {
                id,
                user: user.clone(),
                flashcard_id,
                answer_id,
                voted_at: now,
            },
        );
        Ok(id)
    }

    /// Current vote count per answer for `flashcard_id`.
    pub fn vote_tally(&self, flashcard_id: FlashcardId) -> BTreeMap<AnswerId, u32> {
        self.votes
            .get(&flashcard_id)
            .map(|votes| game::tally(votes.values()))
            .unwrap_or_default()
    }

    /// Anonymized vote list for `flashcard_id`, oldest first.
    pub fn vote_entries(&self, flashcard_id: FlashcardId) -> Vec<VoteEntry> {
        let mut entries: Vec<VoteEntry> = self
            .votes
            .get(&flashcard_id)
            .map(|votes| {
                votes
                    .values()
                    .map(|v| VoteEntry {
                        username: v.user.username.clone(),
                        answer_id: v.answer_id,
                        voted_at: v.voted_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| {
            a.voted_at
                .cmp(&b.voted_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        entries
    }

    /// Number of votes stored for `flashcard_id`.
    pub fn vote_count(&self, flashcard_id: FlashcardId) -> usize {
        self.votes.get(&flashcard_id).map_or(0, HashMap::len)
    }

    /// Close the active question as `user`, who must be the host.
    pub fn end_question<R: Rng + ?Sized>(
        &mut self,
        user: UserId,
        rng: &mut R,
    ) -> Result<QuestionOutcome, SessionError> {
        self.ensure_host(user)?;
        self.close_question(rng)
    }

    fn close_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<QuestionOutcome, SessionError> {
        let game = self.game()?;
        if game.status != GameStatus::QuestionActive {
            return Err(SessionError::InvalidGameStatus {
                expected: GameStatus::QuestionActive,
                actual: game.status,
            });
        }
        let flashcard_id = game.current_flashcard_id;
        let question_index = game.current_question_index;
        let card = self
            .current_flashcard()
            .cloned()
            .ok_or(SessionError::GameNotStarted)?;

        let counts = self.vote_tally(flashcard_id);
        let winning_answer_id = game::pick_winner(&counts, rng);
        let correct_answer_id = card.correct_answer_id();
        let was_correct = winning_answer_id.is_some() && winning_answer_id == correct_answer_id;
        let points_earned = if was_correct {
            game::POINTS_PER_QUESTION
        } else {
            0
        };

        let game = self.game_mut()?;
        game.total_score = (game.total_score + points_earned).min(game.max_possible_score);
        game.questions_answered += 1;
        game.status = GameStatus::QuestionEnded;

        let outcome = QuestionOutcome {
            flashcard_id,
            question_index,
            winning_answer_id,
            correct_answer_id,
            was_correct,
            points_earned,
            total_score: game.total_score,
            vote_counts: counts,
            answers: card.answers,
        };
        game.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Move to the next question or finish the game.
    ///
    /// An active question is closed first so that its outcome is recorded
    /// before the game moves on.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        user: UserId,
        rng: &mut R,
        now: Timestamp,
    ) -> Result<AdvanceOutcome, SessionError> {
        self.ensure_host(user)?;
        let status = self.game()?.status;
        let ended = match status {
            GameStatus::GameFinished => return Err(SessionError::GameFinished),
            GameStatus::QuestionActive => Some(self.close_question(rng)?),
            GameStatus::QuestionEnded | GameStatus::Waiting => None,
        };

        let game = self.game()?;
        let next_index = game.current_question_index + 1;
        let exhausted = next_index >= game.total_questions;
        let reachable = game::victory_reachable(
            game.total_score,
            game.max_possible_score,
            game.total_questions,
            game.current_question_index,
        );

        if exhausted || !reachable {
            let result = self.finish(now);
            return Ok(AdvanceOutcome {
                ended,
                step: AdvanceStep::Finished(result),
            });
        }

        let next_card_id = self
            .deck
            .get(next_index)
            .map(|card| card.id)
            .ok_or(SessionError::GameNotStarted)?;
        let game = self.game_mut()?;
        game.current_question_index = next_index;
        game.current_flashcard_id = next_card_id;
        game.status = GameStatus::QuestionActive;
        game.question_started_at = now;
        let total_score = game.total_score;
        let question = self
            .current_question()
            .ok_or(SessionError::GameNotStarted)?;
        Ok(AdvanceOutcome {
            ended,
            step: AdvanceStep::Next {
                question,
                total_score,
            },
        })
    }

    /// Finalize the game with the current score.
    fn finish(&mut self, now: Timestamp) -> GameResult {
        self.status = SessionStatus::Finished;
        match self.game.as_mut() {
            Some(game) => {
                game.status = GameStatus::GameFinished;
                game.game_ended_at = Some(now);
                game.result(&self.id)
            }
            None => GameState {
                current_question_index: 0,
                current_flashcard_id: FlashcardId::new(0),
                total_score: 0,
                max_possible_score: game::max_possible_score(self.flashcard_count),
                status: GameStatus::GameFinished,
                questions_answered: 0,
                total_questions: self.flashcard_count,
                question_started_at: now,
                game_started_at: now,
                game_ended_at: Some(now),
                last_outcome: None,
            }
            .result(&self.id),
        }
    }

    /// Final result, available once the game is finished.
    pub fn result(&self) -> Option<GameResult> {
        let game = self.game.as_ref()?;
        (game.status == GameStatus::GameFinished).then(|| game.result(&self.id))
    }

    /// Append a chat message from `user`.
    pub fn post_message(
        &mut self,
        user: &User,
        content: MessageContent,
        now: Timestamp,
    ) -> Result<ChatMessage, SessionError> {
        self.ensure_participant(user.id)?;
        let message = ChatMessage {
            id: ChatMessageId::new(self.next_message_id),
            from: user.clone(),
            content,
            sent_at: now,
        };
        self.next_message_id += 1;
        self.chat.push(message.clone());
        Ok(message)
    }

    /// The last `limit` chat messages in chronological order.
    pub fn recent_messages(&self, limit: usize) -> Vec<ChatMessage> {
        let skip = self.chat.len().saturating_sub(limit);
        self.chat[skip..].to_vec()
    }

    pub fn participant_views(&self) -> Vec<ParticipantView> {
        self.participants.iter().map(ParticipantView::from).collect()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(self)
    }

    /// Consistent read model of the session and its game.
    pub fn snapshot(&self) -> Snapshot {
        let game = self.game.clone();
        let revealed = game.as_ref().is_some_and(|g| {
            matches!(
                g.status,
                GameStatus::QuestionEnded | GameStatus::GameFinished
            )
        });
        let outcome = if revealed {
            game.as_ref().and_then(|g| g.last_outcome.clone())
        } else {
            None
        };
        Snapshot {
            session: self.view(),
            question: self.current_question(),
            correct_answer_id: outcome.as_ref().and_then(|o| o.correct_answer_id),
            outcome,
            game,
        }
    }
}
