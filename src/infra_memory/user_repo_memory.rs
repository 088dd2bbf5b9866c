use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// User store kept in process memory; used by the `memory` backend and tests.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserRecord>,
    logins: DashMap<String, UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, record: &UserRecord) -> Result<(), AuthError> {
        match self.logins.entry(record.login.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                self.users.insert(record.user_id, record.clone());
                slot.insert(record.user_id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, AuthError> {
        let Some(user_id) = self.logins.get(login).map(|r| *r.value()) else {
            return Ok(None);
        };
        self.find_by_id(user_id).await
    }

    async fn list_page(&self, offset: u64, limit: u32) -> Result<Vec<UserRecord>, AuthError> {
        let mut all: Vec<UserRecord> = self.users.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(all.into_iter().skip(offset).take(limit as usize).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(login: &str) -> UserRecord {
        UserRecord {
            user_id: UserId::new_v4(),
            login: login.to_string(),
            name: "n".to_string(),
            role: Role::User,
            password_hash: "h".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn finds_by_id_and_login() {
        let repo = MemoryUserRepo::new();
        let rec = record("a@x.com");
        repo.create(&rec).await.unwrap();

        let by_id = repo.find_by_id(rec.user_id).await.unwrap().unwrap();
        assert_eq!(by_id.login, "a@x.com");
        let by_login = repo.find_by_login("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_login.user_id, rec.user_id);
        assert!(repo.find_by_login("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_login_is_rejected() {
        let repo = MemoryUserRepo::new();
        repo.create(&record("a@x.com")).await.unwrap();
        assert!(matches!(
            repo.create(&record("a@x.com")).await,
            Err(AuthError::UserExists)
        ));
    }

    #[tokio::test]
    async fn offset_past_the_end_is_empty() {
        let repo = MemoryUserRepo::new();
        repo.create(&record("a@x.com")).await.unwrap();
        assert!(repo.list_page(5, 10).await.unwrap().is_empty());
        assert_eq!(repo.list_page(0, 10).await.unwrap().len(), 1);
    }
}
