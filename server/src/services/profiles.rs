//! Profiles service

use crate::database::{Profile, Repository, Session};
use crate::error::{AppError, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfilesService {
    repo: Repository,
}

impl ProfilesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The caller's profile and balance
    pub async fn get_profile(&self, caller: Option<&str>) -> Result<Profile> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;
        self.repo
            .get_profile(user_id)
            .await?
            .ok_or(AppError::ProfileNotFound)
    }

    /// Create a user with a starting balance and a session token
    pub async fn provision_user(&self, credits: i64) -> Result<(Profile, Session)> {
        if credits < 0 {
            return Err(AppError::Validation("Credits cannot be negative".to_string()));
        }

        let user_id = Uuid::new_v4().to_string();
        let profile = self.repo.create_profile(&user_id, credits).await?;
        let session = self.repo.create_session(&user_id).await?;

        tracing::info!("Provisioned user {} with {} credits", user_id, credits);
        Ok((profile, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    #[tokio::test]
    async fn test_provision_and_read() {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let service = ProfilesService::new(repo.clone());

        let (profile, session) = service.provision_user(5).await.unwrap();
        assert_eq!(session.user_id, profile.user_id);

        let read = service.get_profile(Some(&profile.user_id)).await.unwrap();
        assert_eq!(read.credits, 5);
        assert_eq!(
            repo.find_session_user(&session.token).await.unwrap(),
            Some(profile.user_id)
        );
    }

    #[tokio::test]
    async fn test_errors() {
        let service = ProfilesService::new(Repository::new(create_memory_pool().await.unwrap()));

        assert!(matches!(service.get_profile(None).await, Err(AppError::Unauthorized)));
        assert!(matches!(
            service.get_profile(Some("ghost")).await,
            Err(AppError::ProfileNotFound)
        ));
        assert!(matches!(
            service.provision_user(-1).await,
            Err(AppError::Validation(_))
        ));
    }
}
