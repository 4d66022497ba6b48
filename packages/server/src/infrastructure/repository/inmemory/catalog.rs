//! InMemory Catalog 実装
//!
//! ユーザー、グループ、科目、フラッシュカードを JSON ファイルから読み込み、
//! 読み取り専用で提供します。

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::domain::{
    Catalog, Flashcard, Group, GroupName, RepositoryError, Subject, SubjectId, SubjectName, User,
    UserId, Username,
};

/// グループの定義
#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    pub name: GroupName,
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// 科目とそのデッキの定義
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub name: SubjectName,
    pub group: GroupName,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

/// カタログファイルの内容
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
}

/// インメモリ Catalog 実装
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    users: HashMap<UserId, User>,
    groups: HashMap<GroupName, Group>,
    subjects: HashMap<SubjectId, Subject>,
    decks: HashMap<SubjectId, Vec<Flashcard>>,
}

impl InMemoryCatalog {
    pub fn from_data(data: CatalogData) -> Self {
        let users = data.users.into_iter().map(|u| (u.id, u)).collect();
        let groups = data
            .groups
            .into_iter()
            .map(|g| {
                let group = Group {
                    name: g.name.clone(),
                    members: g.members.into_iter().collect::<BTreeSet<_>>(),
                };
                (g.name, group)
            })
            .collect();
        let mut subjects = HashMap::new();
        let mut decks = HashMap::new();
        for record in data.subjects {
            subjects.insert(
                record.id,
                Subject {
                    id: record.id,
                    name: record.name,
                    group: record.group,
                },
            );
            decks.insert(record.id, record.flashcards);
        }
        Self {
            users,
            groups,
            subjects,
            decks,
        }
    }

    /// JSON ファイルからカタログを読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::CatalogUnavailable(format!("{}: {e}", path.display()))
        })?;
        let data: CatalogData = serde_json::from_str(&raw).map_err(|e| {
            RepositoryError::CatalogUnavailable(format!("{}: {e}", path.display()))
        })?;
        let catalog = Self::from_data(data);
        info!(
            path = %path.display(),
            users = catalog.users.len(),
            groups = catalog.groups.len(),
            subjects = catalog.subjects.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.get(&id).cloned())
    }

    async fn find_user_by_name(&self, name: &Username) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.values().find(|u| u.username == *name).cloned())
    }

    async fn find_group(&self, name: &GroupName) -> Result<Option<Group>, RepositoryError> {
        Ok(self.groups.get(name).cloned())
    }

    async fn is_group_member(&self, group: &GroupName, user: UserId) -> Result<bool, RepositoryError> {
        Ok(self.groups.get(group).is_some_and(|g| g.is_member(user)))
    }

    async fn find_subject(
        &self,
        group: &GroupName,
        name: &SubjectName,
    ) -> Result<Option<Subject>, RepositoryError> {
        Ok(self
            .subjects
            .values()
            .find(|s| s.group == *group && s.name == *name)
            .cloned())
    }

    async fn deck(&self, subject: SubjectId) -> Result<Vec<Flashcard>, RepositoryError> {
        Ok(self.decks.get(&subject).cloned().unwrap_or_default())
    }
}
