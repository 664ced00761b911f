//! Resume-after-login
//!
//! When a generation is refused with 401 the action is parked while the
//! user signs in. Closing the sign-in prompt waits briefly for a session to
//! appear and replays the parked action once. The action is moved out of
//! the state when replayed, so it cannot run twice.

use super::GeneratedLogos;
use crate::error::{AppError, Result};
use crate::services::GenerateRequest;
use async_trait::async_trait;
use std::time::Duration;

pub const SLOW_LOGIN_MESSAGE: &str = "Login detected slowly, please press Generate again.";

/// Work waiting for authentication
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Generate(GenerateRequest),
    Adjust {
        parent_logo_id: String,
        instruction: String,
    },
}

impl PendingAction {
    fn to_request(&self) -> GenerateRequest {
        match self {
            PendingAction::Generate(request) => request.clone(),
            PendingAction::Adjust {
                parent_logo_id,
                instruction,
            } => GenerateRequest {
                parent_logo_id: Some(parent_logo_id.clone()),
                edit_instruction: Some(instruction.clone()),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    AwaitingAuth(PendingAction),
    Executing,
}

/// Reports whether a signed-in session exists yet
#[async_trait]
pub trait SessionCheck: Send + Sync {
    async fn has_session(&self) -> bool;
}

/// Performs generation requests
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedLogos>;
}

/// How long to wait for a session after the sign-in prompt closes
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            timeout: Duration::from_millis(4_000),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResumeFlow {
    state: FlowState,
    policy: SessionPolicy,
}

impl ResumeFlow {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            state: FlowState::Idle,
            policy,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Run an action; a 401 parks it until sign-in completes
    pub async fn submit(
        &mut self,
        action: PendingAction,
        api: &dyn GenerationApi,
    ) -> Result<GeneratedLogos> {
        if self.state == FlowState::Executing {
            return Err(AppError::Generic("A request is already running".to_string()));
        }

        self.state = FlowState::Executing;
        let result = api.generate(&action.to_request()).await;

        self.state = match &result {
            Err(AppError::Unauthorized) => {
                tracing::info!("Request needs a session; waiting for sign-in");
                FlowState::AwaitingAuth(action)
            }
            _ => FlowState::Idle,
        };
        result
    }

    /// The sign-in prompt closed.
    ///
    /// Returns `Ok(None)` when nothing was waiting. Otherwise polls for a
    /// session and replays the parked action once.
    pub async fn on_auth_closed(
        &mut self,
        session: &dyn SessionCheck,
        api: &dyn GenerationApi,
    ) -> Result<Option<GeneratedLogos>> {
        let action = match std::mem::take(&mut self.state) {
            FlowState::AwaitingAuth(action) => action,
            other => {
                self.state = other;
                return Ok(None);
            }
        };

        if !self.wait_for_session(session).await {
            tracing::warn!("No session after sign-in; dropping parked request");
            return Err(AppError::Generic(SLOW_LOGIN_MESSAGE.to_string()));
        }

        self.state = FlowState::Executing;
        let result = api.generate(&action.to_request()).await;
        self.state = FlowState::Idle;
        result.map(Some)
    }

    async fn wait_for_session(&self, session: &dyn SessionCheck) -> bool {
        let deadline = tokio::time::Instant::now() + self.policy.timeout;
        loop {
            if session.has_session().await {
                return true;
            }
            if tokio::time::Instant::now() + self.policy.poll_interval > deadline {
                return false;
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}
