//! UseCase: ゲーム進行（開始・投票・締め切り・次の問題・結果）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - GameUseCase の start / cast_vote / end_current_question / advance / get_state / result
//! - イベントの発行順序（question_ended → next_question / game_finished）
//!
//! ### なぜこのテストが必要か
//! - 得点計算と早期終了の判定はゲームの勝敗を決める
//! - 回答受付中のイベントに正誤情報が含まれないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全問正解で勝利、投票の変更
//! - 異常系：ホスト以外の操作、終了後の操作、空デッキ
//! - エッジケース：2 問連続不正解での早期終了、投票ゼロ、ホスト移譲

use rand::thread_rng;
use tracing::info;

use crate::domain::{
    AdvanceOutcome, AdvanceStep, AnswerId, Event, FlashcardId, GameResult, GameState,
    QuestionOutcome, SanitizedQuestion, SessionId, Snapshot, Timestamp, User, VoteId,
};

use super::{context::UseCaseContext, error::UseCaseError};

/// 開始直後のゲーム状態と最初の問題
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedGame {
    pub game: GameState,
    pub question: SanitizedQuestion,
}

/// ゲーム進行のユースケース
pub struct GameUseCase {
    ctx: UseCaseContext,
}

impl GameUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// ゲームを開始する
    ///
    /// デッキはセッションロックの外で取得する。
    ///
    /// * `Err(Forbidden)` - ホスト以外
    /// * `Err(Conflict)` - 待機中でない
    /// * `Err(FailedPrecondition)` - デッキが空
    pub async fn start(&self, user: &User, session_id: &SessionId) -> Result<StartedGame, UseCaseError> {
        let key = self.ctx.session_key(session_id).await?;
        let deck = self.ctx.catalog.deck(key.subject_id).await?;

        let mut session = UseCaseContext::lock_handle(key.handle).await?;
        let question = session.start(user.id, deck, Timestamp::now())?;
        let game = session
            .game
            .clone()
            .ok_or_else(|| UseCaseError::Internal("Game state missing after start".to_string()))?;

        info!(
            session_id = %session.id,
            user_id = %user.id,
            total_questions = game.total_questions,
            "game started"
        );
        self.ctx.publish_room(
            &session,
            Event::GameStarted {
                session_id: session.id.clone(),
                game: game.clone(),
                question: question.clone(),
                participants: session.participant_views(),
            },
        );
        self.ctx.publish_lobby_update(&session);
        Ok(StartedGame { game, question })
    }

    /// 現在の問題に投票する（再投票は上書き）
    pub async fn cast_vote(
        &self,
        user: &User,
        session_id: &SessionId,
        flashcard_id: FlashcardId,
        answer_id: AnswerId,
    ) -> Result<VoteId, UseCaseError> {
        let mut session = self.ctx.lock_session(session_id).await?;
        let vote_id = session.cast_vote(user, flashcard_id, answer_id, Timestamp::now())?;

        let votes = session.vote_entries(flashcard_id);
        self.ctx.publish_room(
            &session,
            Event::VoteUpdate {
                session_id: session.id.clone(),
                flashcard_id,
                tally: session.vote_tally(flashcard_id),
                total_votes: votes.len(),
                votes,
            },
        );
        Ok(vote_id)
    }

    /// 現在の問題を締め切り、チームの回答と得点を確定する
    pub async fn end_current_question(
        &self,
        user: &User,
        session_id: &SessionId,
    ) -> Result<QuestionOutcome, UseCaseError> {
        let mut session = self.ctx.lock_session(session_id).await?;
        let outcome = session.end_question(user.id, &mut thread_rng())?;

        info!(
            session_id = %session.id,
            flashcard_id = %outcome.flashcard_id,
            was_correct = outcome.was_correct,
            total_score = outcome.total_score,
            "question ended"
        );
        self.ctx.publish_room(
            &session,
            Event::QuestionEnded {
                session_id: session.id.clone(),
                outcome: outcome.clone(),
            },
        );
        Ok(outcome)
    }

    /// 次の問題へ進む、またはゲームを終了する
    ///
    /// 回答受付中であれば先に締め切り、question_ended を次のイベントより前に発行する。
    pub async fn advance(&self, user: &User, session_id: &SessionId) -> Result<AdvanceOutcome, UseCaseError> {
        let mut session = self.ctx.lock_session(session_id).await?;
        let outcome = session.advance(user.id, &mut thread_rng(), Timestamp::now())?;

        if let Some(ended) = &outcome.ended {
            self.ctx.publish_room(
                &session,
                Event::QuestionEnded {
                    session_id: session.id.clone(),
                    outcome: ended.clone(),
                },
            );
        }

        let mut release_code = None;
        match &outcome.step {
            AdvanceStep::Next {
                question,
                total_score,
            } => {
                info!(
                    session_id = %session.id,
                    question_index = question.question_index,
                    "next question"
                );
                self.ctx.publish_room(
                    &session,
                    Event::NextQuestion {
                        session_id: session.id.clone(),
                        question: question.clone(),
                        total_score: *total_score,
                    },
                );
            }
            AdvanceStep::Finished(result) => {
                info!(
                    session_id = %session.id,
                    total_score = result.total_score,
                    questions_answered = result.questions_answered,
                    verdict = ?result.status,
                    "game finished"
                );
                self.ctx.publish_room(
                    &session,
                    Event::GameFinished {
                        session_id: session.id.clone(),
                        result: result.clone(),
                    },
                );
                release_code = Some(session.join_code.clone());
            }
        }
        drop(session);

        if let Some(code) = release_code {
            self.ctx.sessions.release_code(&code).await;
        }
        Ok(outcome)
    }

    /// セッションとゲームの一貫したスナップショット
    pub async fn get_state(&self, user: &User, session_id: &SessionId) -> Result<Snapshot, UseCaseError> {
        let key = self.ctx.session_key(session_id).await?;
        let is_member = self.ctx.is_member(&key.group, user.id).await?;

        let session = UseCaseContext::lock_handle(key.handle).await?;
        UseCaseContext::ensure_can_read(&session, user.id, is_member)?;
        Ok(session.snapshot())
    }

    /// 最終結果（ゲーム終了後のみ）
    pub async fn result(&self, user: &User, session_id: &SessionId) -> Result<GameResult, UseCaseError> {
        let session = self.ctx.lock_session(session_id).await?;
        session.ensure_participant(user.id)?;
        session
            .result()
            .ok_or_else(|| UseCaseError::Conflict("Game is not finished".to_string()))
    }
}
