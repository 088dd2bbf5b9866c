use crate::application_port::{AuthError, UserService};
use crate::domain_model::{MAX_PAGE_SIZE, PageQuery, UserProfile};
use crate::domain_port::UserRepo;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn list_users(&self, query: PageQuery) -> Result<Vec<UserProfile>, AuthError> {
        let page = query.page();
        let limit = query.limit();
        if page == 0 {
            return Err(AuthError::Validation("page starts at 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AuthError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let offset = u64::from(page - 1) * u64::from(limit);
        let users = self.user_repo.list_page(offset, limit).await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{Role, UserId, UserRecord};
    use crate::infra_memory::MemoryUserRepo;
    use chrono::{Duration, Utc};

    async fn seeded(n: i64) -> RealUserService {
        let repo = Arc::new(MemoryUserRepo::new());
        let base = Utc::now();
        for i in 0..n {
            repo.create(&UserRecord {
                user_id: UserId::new_v4(),
                login: format!("u{i}@x.com"),
                name: format!("u{i}"),
                role: Role::User,
                password_hash: String::new(),
                created_at: base + Duration::seconds(i),
            })
            .await
            .unwrap();
        }
        RealUserService::new(repo)
    }

    #[tokio::test]
    async fn pages_are_one_based() {
        let service = seeded(25).await;
        let first = service
            .list_users(PageQuery { page: None, limit: None })
            .await
            .unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].login, "u0@x.com");

        let third = service
            .list_users(PageQuery { page: Some(3), limit: Some(10) })
            .await
            .unwrap();
        assert_eq!(third.len(), 5);
        assert_eq!(third[0].login, "u20@x.com");
    }

    #[tokio::test]
    async fn rejects_out_of_range_queries() {
        let service = seeded(1).await;
        for query in [
            PageQuery { page: Some(0), limit: None },
            PageQuery { page: None, limit: Some(0) },
            PageQuery { page: None, limit: Some(MAX_PAGE_SIZE + 1) },
        ] {
            assert!(matches!(
                service.list_users(query).await,
                Err(AuthError::Validation(_))
            ));
        }
    }
}
