//! Identity gateway
//!
//! Resolves the caller behind a request. The service layer only ever sees
//! the resolved user id (or its absence).

use crate::database::Repository;
use crate::error::Result;
use async_trait::async_trait;

/// Resolves bearer credentials to a user identity
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Returns the user id behind `token`, or `None` for unknown/expired tokens
    async fn current_user(&self, token: &str) -> Result<Option<String>>;
}

/// Identity backed by the `sessions` table
#[derive(Clone)]
pub struct SessionIdentity {
    repo: Repository,
}

impl SessionIdentity {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl IdentityGateway for SessionIdentity {
    async fn current_user(&self, token: &str) -> Result<Option<String>> {
        if token.trim().is_empty() {
            return Ok(None);
        }
        self.repo.find_session_user(token.trim()).await
    }
}
