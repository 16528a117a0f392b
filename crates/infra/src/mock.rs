//! # テスト用モックリポジトリ
//!
//! ユースケース・ハンドラのテストで使用するインメモリリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! lexitrack-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! DB の制約を次のように再現する:
//!
//! - 一意制約: 重複時に [`InfraError::conflict`]
//! - 外部キー制約: [`MockUserRepository`] に紐付けた場合のみ、
//!   ユーザーが存在しなければ [`InfraError::foreign_key`]
//! - 障害: [`MockControl`] で失敗・遅延を注入できる

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use lexitrack_domain::{
    pagination::Pagination,
    progress::{ProgressId, UserProgress, WordId},
    session::{SessionId, UserSession},
    statistics::UserStatistics,
    user::{Email, User, UserId},
    word_set::{UserWordSet, UserWordSetId},
};

use crate::{
    error::InfraError,
    repository::{
        UserProgressRepository,
        UserRepository,
        UserSessionRepository,
        UserStatisticsRepository,
        UserWordSetRepository,
    },
};

/// 障害注入の設定
#[derive(Debug, Default)]
pub struct MockControl {
    unavailable: AtomicBool,
    delay:       Mutex<Option<Duration>>,
}

impl MockControl {
    async fn check(&self) -> Result<(), InfraError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("mock repository is unavailable"));
        }
        Ok(())
    }
}

fn paginate<T>(items: Vec<T>, page: Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

macro_rules! impl_mock_control {
    ($Mock:ident) => {
        impl $Mock {
            /// 以降の呼び出しをすべて失敗させる
            pub fn set_unavailable(&self, unavailable: bool) {
                self.control.unavailable.store(unavailable, Ordering::SeqCst);
            }

            /// 各呼び出しの前に待機する
            pub fn set_delay(&self, delay: Duration) {
                *self.control.delay.lock().unwrap() = Some(delay);
            }
        }
    };
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users:   Arc<Mutex<Vec<User>>>,
    control: Arc<MockControl>,
}

impl_mock_control!(MockUserRepository);

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.users.lock().unwrap().iter().any(|u| u.id() == id)
    }

    fn check_unique(users: &[User], user: &User) -> Result<(), InfraError> {
        let others = users.iter().filter(|u| u.id() != user.id());
        for other in others {
            if other.username() == user.username() {
                return Err(InfraError::conflict("users", "users_username_key"));
            }
            if other.email() == user.email() {
                return Err(InfraError::conflict("users", "users_email_key"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        self.control.check().await?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.id() == user.id()) {
            return Err(InfraError::conflict("users", "users_pkey"));
        }
        Self::check_unique(&users, user)?;
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        self.control.check().await?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id() == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        self.control.check().await?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<User>, InfraError> {
        self.control.check().await?;
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(paginate(users, page))
    }

    async fn update(&self, user: &User) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut users = self.users.lock().unwrap();
        Self::check_unique(&users, user)?;
        match users.iter_mut().find(|u| u.id() == user.id()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id() != id);
        Ok(users.len() < before)
    }
}

/// 紐付けたユーザーリポジトリに対する外部キー検査
fn check_user_exists(
    users: Option<&MockUserRepository>,
    user_id: &UserId,
    table: &str,
) -> Result<(), InfraError> {
    match users {
        Some(users) if !users.contains(user_id) => {
            Err(InfraError::foreign_key(table, format!("{table}_user_id_fkey")))
        }
        _ => Ok(()),
    }
}

// ===== MockUserStatisticsRepository =====

#[derive(Clone, Default)]
pub struct MockUserStatisticsRepository {
    statistics: Arc<Mutex<Vec<UserStatistics>>>,
    users:      Option<MockUserRepository>,
    control:    Arc<MockControl>,
}

impl_mock_control!(MockUserStatisticsRepository);

impl MockUserStatisticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 外部キー制約を有効にする
    pub fn linked_to(mut self, users: &MockUserRepository) -> Self {
        self.users = Some(users.clone());
        self
    }

    pub fn add_statistics(&self, statistics: UserStatistics) {
        self.statistics.lock().unwrap().push(statistics);
    }
}

#[async_trait]
impl UserStatisticsRepository for MockUserStatisticsRepository {
    async fn insert(&self, statistics: &UserStatistics) -> Result<(), InfraError> {
        self.control.check().await?;
        check_user_exists(self.users.as_ref(), statistics.user_id(), "user_statistics")?;
        let mut all = self.statistics.lock().unwrap();
        if all.iter().any(|s| s.user_id() == statistics.user_id()) {
            return Err(InfraError::conflict("user_statistics", "user_statistics_pkey"));
        }
        all.push(statistics.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserStatistics>, InfraError> {
        self.control.check().await?;
        Ok(self
            .statistics
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id() == user_id)
            .cloned())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<UserStatistics>, InfraError> {
        self.control.check().await?;
        let mut all = self.statistics.lock().unwrap().clone();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.user_id().as_uuid().cmp(b.user_id().as_uuid()))
        });
        Ok(paginate(all, page))
    }

    async fn update(&self, statistics: &UserStatistics) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.statistics.lock().unwrap();
        match all.iter_mut().find(|s| s.user_id() == statistics.user_id()) {
            Some(existing) => {
                *existing = statistics.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.statistics.lock().unwrap();
        let before = all.len();
        all.retain(|s| s.user_id() != user_id);
        Ok(all.len() < before)
    }
}

// ===== MockUserProgressRepository =====

#[derive(Clone, Default)]
pub struct MockUserProgressRepository {
    progress: Arc<Mutex<Vec<UserProgress>>>,
    users:    Option<MockUserRepository>,
    control:  Arc<MockControl>,
}

impl_mock_control!(MockUserProgressRepository);

impl MockUserProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked_to(mut self, users: &MockUserRepository) -> Self {
        self.users = Some(users.clone());
        self
    }

    pub fn add_progress(&self, progress: UserProgress) {
        self.progress.lock().unwrap().push(progress);
    }
}

#[async_trait]
impl UserProgressRepository for MockUserProgressRepository {
    async fn insert(&self, progress: &UserProgress) -> Result<(), InfraError> {
        self.control.check().await?;
        check_user_exists(self.users.as_ref(), progress.user_id(), "user_progress")?;
        let mut all = self.progress.lock().unwrap();
        if all
            .iter()
            .any(|p| p.user_id() == progress.user_id() && p.word_id() == progress.word_id())
        {
            return Err(InfraError::conflict("user_progress", "user_progress_user_word_key"));
        }
        all.push(progress.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ProgressId) -> Result<Option<UserProgress>, InfraError> {
        self.control.check().await?;
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id() == id)
            .cloned())
    }

    async fn find_by_user_and_word(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserProgress>, InfraError> {
        self.control.check().await?;
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id() == user_id && p.word_id() == word_id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserProgress>, InfraError> {
        self.control.check().await?;
        let mut matched: Vec<_> = self
            .progress
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(paginate(matched, page))
    }

    async fn update(&self, progress: &UserProgress) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.progress.lock().unwrap();
        match all.iter_mut().find(|p| p.id() == progress.id()) {
            Some(existing) => {
                *existing = progress.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ProgressId) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.progress.lock().unwrap();
        let before = all.len();
        all.retain(|p| p.id() != id);
        Ok(all.len() < before)
    }
}

// ===== MockUserSessionRepository =====

#[derive(Clone, Default)]
pub struct MockUserSessionRepository {
    sessions: Arc<Mutex<Vec<UserSession>>>,
    users:    Option<MockUserRepository>,
    control:  Arc<MockControl>,
}

impl_mock_control!(MockUserSessionRepository);

impl MockUserSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked_to(mut self, users: &MockUserRepository) -> Self {
        self.users = Some(users.clone());
        self
    }

    pub fn add_session(&self, session: UserSession) {
        self.sessions.lock().unwrap().push(session);
    }

    fn sorted(mut sessions: Vec<UserSession>) -> Vec<UserSession> {
        sessions.sort_by(|a, b| {
            b.started_at()
                .cmp(&a.started_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        sessions
    }
}

#[async_trait]
impl UserSessionRepository for MockUserSessionRepository {
    async fn insert(&self, session: &UserSession) -> Result<(), InfraError> {
        self.control.check().await?;
        check_user_exists(self.users.as_ref(), session.user_id(), "user_sessions")?;
        let mut all = self.sessions.lock().unwrap();
        if all.iter().any(|s| s.id() == session.id()) {
            return Err(InfraError::conflict("user_sessions", "user_sessions_pkey"));
        }
        all.push(session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<UserSession>, InfraError> {
        self.control.check().await?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id() == id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserSession>, InfraError> {
        self.control.check().await?;
        let matched = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        Ok(paginate(Self::sorted(matched), page))
    }

    async fn list_active(&self, page: Pagination) -> Result<Vec<UserSession>, InfraError> {
        self.control.check().await?;
        let matched = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        Ok(paginate(Self::sorted(matched), page))
    }

    async fn update(&self, session: &UserSession) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.sessions.lock().unwrap();
        match all.iter_mut().find(|s| s.id() == session.id()) {
            Some(existing) => {
                *existing = session.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.sessions.lock().unwrap();
        let before = all.len();
        all.retain(|s| s.id() != id);
        Ok(all.len() < before)
    }
}

// ===== MockUserWordSetRepository =====

#[derive(Clone, Default)]
pub struct MockUserWordSetRepository {
    word_sets: Arc<Mutex<Vec<UserWordSet>>>,
    users:     Option<MockUserRepository>,
    control:   Arc<MockControl>,
}

impl_mock_control!(MockUserWordSetRepository);

impl MockUserWordSetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked_to(mut self, users: &MockUserRepository) -> Self {
        self.users = Some(users.clone());
        self
    }

    pub fn add_word_set(&self, word_set: UserWordSet) {
        self.word_sets.lock().unwrap().push(word_set);
    }

    fn check_unique(word_sets: &[UserWordSet], word_set: &UserWordSet) -> Result<(), InfraError> {
        let duplicated = word_sets.iter().any(|w| {
            w.id() != word_set.id()
                && w.user_id() == word_set.user_id()
                && w.word_set_id() == word_set.word_set_id()
        });
        if duplicated {
            return Err(InfraError::conflict(
                "user_word_sets",
                "user_word_sets_user_word_set_key",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserWordSetRepository for MockUserWordSetRepository {
    async fn insert(&self, word_set: &UserWordSet) -> Result<(), InfraError> {
        self.control.check().await?;
        check_user_exists(self.users.as_ref(), word_set.user_id(), "user_word_sets")?;
        let mut all = self.word_sets.lock().unwrap();
        Self::check_unique(&all, word_set)?;
        all.push(word_set.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserWordSetId) -> Result<Option<UserWordSet>, InfraError> {
        self.control.check().await?;
        Ok(self
            .word_sets
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id() == id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Vec<UserWordSet>, InfraError> {
        self.control.check().await?;
        let mut matched: Vec<_> = self
            .word_sets
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.user_id() == user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(paginate(matched, page))
    }

    async fn update(&self, word_set: &UserWordSet) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.word_sets.lock().unwrap();
        Self::check_unique(&all, word_set)?;
        match all.iter_mut().find(|w| w.id() == word_set.id()) {
            Some(existing) => {
                *existing = word_set.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &UserWordSetId) -> Result<bool, InfraError> {
        self.control.check().await?;
        let mut all = self.word_sets.lock().unwrap();
        let before = all.len();
        all.retain(|w| w.id() != id);
        Ok(all.len() < before)
    }
}
