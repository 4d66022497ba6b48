//! UseCase のテスト用フィクスチャ

use std::sync::{Arc, Mutex};

use crate::{
    domain::{
        AnswerId, AnswerOption, Audience, Event, EventPublisher, Flashcard, FlashcardId, GroupName,
        SubjectName, User, UserId, Username,
    },
    infrastructure::repository::{
        InMemoryCatalog, InMemoryInvitationRepository, InMemorySessionRepository,
        inmemory::catalog::{CatalogData, GroupRecord, SubjectRecord},
    },
};

use super::context::UseCaseContext;

/// 発行されたイベントを順番に記録する Publisher
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    events: Mutex<Vec<(Audience, Event)>>,
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, audience: Audience, event: Event) {
        self.events.lock().unwrap().push((audience, event));
    }
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(Audience, Event)> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(|(_, e)| e.kind()).collect()
    }

    pub fn events_of_kind(&self, kind: &str) -> Vec<(Audience, Event)> {
        self.events()
            .into_iter()
            .filter(|(_, e)| e.kind() == kind)
            .collect()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.events_of_kind(kind).len()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// `card` 番目のカードの `option` 番目の選択肢 ID（1 番目が正解）
pub(crate) fn answer(card: i64, option: i64) -> AnswerId {
    AnswerId::new(card * 10 + option)
}

/// `n` 枚のデッキ。カード `i` の選択肢は `i*10+1..=i*10+4` で、最初が正解。
pub(crate) fn deck(n: i64) -> Vec<Flashcard> {
    (1..=n)
        .map(|i| Flashcard {
            id: FlashcardId::new(i),
            question: format!("Q{i}"),
            answers: (1..=4)
                .map(|j| AnswerOption {
                    id: answer(i, j),
                    text: format!("A{j}"),
                    is_correct: j == 1,
                })
                .collect(),
        })
        .collect()
}

/// alice / bob / carol / dave がメンバーのグループ "biology" と、
/// 科目 "Cells" を持つカタログに接続されたコンテキスト。mallory はメンバーではない。
pub(crate) struct Fixture {
    pub alice: User,
    pub bob: User,
    pub carol: User,
    pub dave: User,
    pub mallory: User,
    pub publisher: Arc<RecordingPublisher>,
    ctx: UseCaseContext,
}

impl Fixture {
    pub fn new(deck_len: i64) -> Self {
        let user = |id: i64, name: &str| User::new(UserId::new(id), Username::new(name.to_string()).unwrap());
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let carol = user(3, "carol");
        let dave = user(4, "dave");
        let mallory = user(9, "mallory");

        let data = CatalogData {
            users: vec![
                alice.clone(),
                bob.clone(),
                carol.clone(),
                dave.clone(),
                mallory.clone(),
            ],
            groups: vec![GroupRecord {
                name: Self::group_name(),
                members: vec![alice.id, bob.id, carol.id, dave.id],
            }],
            subjects: vec![SubjectRecord {
                id: crate::domain::SubjectId::new(1),
                name: Self::subject_name(),
                group: Self::group_name(),
                flashcards: deck(deck_len),
            }],
        };
        let publisher = Arc::new(RecordingPublisher::default());
        let ctx = UseCaseContext::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryInvitationRepository::new()),
            Arc::new(InMemoryCatalog::from_data(data)),
            publisher.clone(),
            50,
        );
        Self {
            alice,
            bob,
            carol,
            dave,
            mallory,
            publisher,
            ctx,
        }
    }

    pub fn ctx(&self) -> UseCaseContext {
        self.ctx.clone()
    }

    pub fn group_name() -> GroupName {
        GroupName::new("biology".to_string()).unwrap()
    }

    pub fn subject_name() -> SubjectName {
        SubjectName::new("Cells".to_string()).unwrap()
    }
}
