//! Repository layer for database operations
//!
//! Balances, sessions, logo records and processed payment events.
//! Logo queries take the owning user and filter on it; the one unfiltered
//! lookup exists only to tell "missing" apart from "owned by someone else".

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use rand::RngCore;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Profiles and balance =====

    /// Create a profile with a starting balance
    pub async fn create_profile(&self, user_id: &str, credits: i64) -> Result<Profile> {
        let now = Utc::now();

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, credits, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(credits)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created profile: {} ({} credits)", user_id, credits);
        Ok(profile)
    }

    /// Get a profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Fresh read of a user's balance
    pub async fn get_credits(&self, user_id: &str) -> Result<Option<i64>> {
        let credits: Option<i64> =
            sqlx::query_scalar("SELECT credits FROM profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credits)
    }

    /// Apply `delta` only while the balance is at least `floor`.
    ///
    /// Single conditional UPDATE; returns the new balance, or `None` when the
    /// profile is missing or the condition did not hold.
    pub async fn adjust_credits_if_at_least(
        &self,
        user_id: &str,
        delta: i64,
        floor: i64,
    ) -> Result<Option<i64>> {
        let credits: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET credits = credits + ?, updated_at = ?
            WHERE user_id = ? AND credits >= ?
            RETURNING credits
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(user_id)
        .bind(floor)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(
            "Adjusted credits for {} by {} (floor {}): {:?}",
            user_id,
            delta,
            floor,
            credits
        );
        Ok(credits)
    }

    /// Credit a purchase once per payment event.
    ///
    /// The event marker and the balance change commit together; a replayed
    /// event id leaves the balance untouched.
    pub async fn apply_payment_event(
        &self,
        event_id: &str,
        event_type: &str,
        user_id: &str,
        credits: i64,
    ) -> Result<CreditOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, event_type, user_id, processed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            tracing::debug!("Payment event already processed: {}", event_id);
            return Ok(CreditOutcome::AlreadyProcessed);
        }

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles SET credits = credits + ?, updated_at = ?
            WHERE user_id = ?
            RETURNING credits
            "#,
        )
        .bind(credits)
        .bind(now)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = balance else {
            tx.rollback().await?;
            return Err(AppError::ProfileNotFound);
        };

        tx.commit().await?;

        tracing::debug!("Credited {} to {} via event {}", credits, user_id, event_id);
        Ok(CreditOutcome::Credited { credits: balance })
    }

    /// Whether a payment event id has been applied
    pub async fn is_event_processed(&self, event_id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE event_id = ?")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    // ===== Sessions =====

    /// Issue a new bearer session for a user
    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, NULL)
            RETURNING *
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created session for user: {}", user_id);
        Ok(session)
    }

    /// Resolve a live session token to its user
    pub async fn find_session_user(&self, token: &str) -> Result<Option<String>> {
        let user_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM sessions
            WHERE token = ? AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id)
    }

    // ===== Logos =====

    /// Insert a logo row
    pub async fn insert_logo(&self, new: NewLogo) -> Result<Logo> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let palette_json = new.palette.as_ref().map(serde_json::to_string).transpose()?;

        let logo = sqlx::query_as::<_, Logo>(
            r#"
            INSERT INTO logos (
                id, user_id, brand_name, symbol_description, business_description,
                palette_json, image_path, preview_path, editor_state_json,
                parent_logo_id, edit_instruction, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(&new.brand_name)
        .bind(&new.symbol_description)
        .bind(&new.business_description)
        .bind(&palette_json)
        .bind(&new.image_path)
        .bind(&new.parent_logo_id)
        .bind(&new.edit_instruction)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created logo: {} for user: {}", id, new.user_id);
        Ok(logo)
    }

    /// Look a logo up regardless of owner.
    ///
    /// Only for classifying access as missing versus forbidden; never return
    /// the row to a caller who does not own it.
    pub async fn find_logo_any_owner(&self, id: &str) -> Result<Option<Logo>> {
        let logo = sqlx::query_as::<_, Logo>("SELECT * FROM logos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(logo)
    }

    /// Get a logo owned by `user_id`
    pub async fn get_logo(&self, user_id: &str, id: &str) -> Result<Logo> {
        let logo = sqlx::query_as::<_, Logo>("SELECT * FROM logos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("logo {}", id)))?;

        Ok(logo)
    }

    /// List a user's logos, newest first
    pub async fn list_logos(&self, user_id: &str) -> Result<Vec<Logo>> {
        let logos = sqlx::query_as::<_, Logo>(
            r#"
            SELECT * FROM logos
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logos)
    }

    /// Record an editor save: preview path, optional state, fresh `updated_at`
    pub async fn update_logo_preview(
        &self,
        user_id: &str,
        id: &str,
        update: PreviewUpdate,
    ) -> Result<Logo> {
        let logo = sqlx::query_as::<_, Logo>(
            r#"
            UPDATE logos
            SET preview_path = ?,
                editor_state_json = COALESCE(?, editor_state_json),
                updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(&update.preview_path)
        .bind(&update.editor_state_json)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("logo {}", id)))?;

        tracing::debug!("Updated preview for logo: {}", id);
        Ok(logo)
    }

    /// Delete a logo row owned by `user_id`
    pub async fn delete_logo(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM logos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("logo {}", id)));
        }

        tracing::debug!("Deleted logo: {}", id);
        Ok(())
    }

    /// Count logos owned by a user
    pub async fn count_logos(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logos WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    fn new_logo(user_id: &str, brand: &str) -> NewLogo {
        NewLogo {
            user_id: user_id.to_string(),
            brand_name: brand.to_string(),
            symbol_description: "a fox head".to_string(),
            business_description: None,
            palette: Some(vec!["#FF0000".to_string(), "#222222".to_string()]),
            image_path: format!("{}/{}.png", user_id, Uuid::new_v4()),
            parent_logo_id: None,
            edit_instruction: None,
        }
    }

    #[tokio::test]
    async fn test_conditional_debit() {
        let repo = create_test_repo().await;
        repo.create_profile("u1", 1).await.unwrap();

        assert_eq!(
            repo.adjust_credits_if_at_least("u1", -1, 1).await.unwrap(),
            Some(0)
        );
        // Floor no longer satisfied
        assert_eq!(repo.adjust_credits_if_at_least("u1", -1, 1).await.unwrap(), None);
        assert_eq!(repo.get_credits("u1").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_missing_profile_has_no_credits() {
        let repo = create_test_repo().await;
        assert_eq!(repo.get_credits("ghost").await.unwrap(), None);
        assert_eq!(
            repo.adjust_credits_if_at_least("ghost", -1, 1).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_payment_event_applied_once() {
        let repo = create_test_repo().await;
        repo.create_profile("u1", 2).await.unwrap();

        let first = repo
            .apply_payment_event("evt_1", "checkout.session.completed", "u1", 20)
            .await
            .unwrap();
        assert_eq!(first, CreditOutcome::Credited { credits: 22 });

        let second = repo
            .apply_payment_event("evt_1", "checkout.session.completed", "u1", 20)
            .await
            .unwrap();
        assert_eq!(second, CreditOutcome::AlreadyProcessed);
        assert_eq!(repo.get_credits("u1").await.unwrap(), Some(22));
    }

    #[tokio::test]
    async fn test_payment_event_for_unknown_user_is_not_recorded() {
        let repo = create_test_repo().await;

        let result = repo
            .apply_payment_event("evt_2", "checkout.session.completed", "ghost", 20)
            .await;
        assert!(matches!(result, Err(AppError::ProfileNotFound)));
        assert!(!repo.is_event_processed("evt_2").await.unwrap());
    }

    #[tokio::test]
    async fn test_sessions() {
        let repo = create_test_repo().await;
        repo.create_profile("u1", 0).await.unwrap();

        let session = repo.create_session("u1").await.unwrap();
        assert_eq!(session.token.len(), 64);

        let user = repo.find_session_user(&session.token).await.unwrap();
        assert_eq!(user.as_deref(), Some("u1"));
        assert_eq!(repo.find_session_user("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logo_ownership_filters() {
        let repo = create_test_repo().await;
        repo.create_profile("alice", 0).await.unwrap();
        repo.create_profile("bob", 0).await.unwrap();

        let logo = repo.insert_logo(new_logo("alice", "Acme")).await.unwrap();
        assert_eq!(
            logo.palette(),
            Some(vec!["#FF0000".to_string(), "#222222".to_string()])
        );

        assert!(repo.get_logo("alice", &logo.id).await.is_ok());
        assert!(matches!(
            repo.get_logo("bob", &logo.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(repo.list_logos("bob").await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_logo("bob", &logo.id).await,
            Err(AppError::NotFound(_))
        ));

        let any = repo.find_logo_any_owner(&logo.id).await.unwrap().unwrap();
        assert_eq!(any.user_id, "alice");
    }

    #[tokio::test]
    async fn test_update_preview_keeps_state_when_absent() {
        let repo = create_test_repo().await;
        repo.create_profile("alice", 0).await.unwrap();
        let logo = repo.insert_logo(new_logo("alice", "Acme")).await.unwrap();

        let saved = repo
            .update_logo_preview(
                "alice",
                &logo.id,
                PreviewUpdate {
                    preview_path: format!("alice/{}.png", logo.id),
                    editor_state_json: Some(r#"{"v":1}"#.to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.editor_state_json.as_deref(), Some(r#"{"v":1}"#));
        assert!(saved.updated_at >= logo.updated_at);

        let again = repo
            .update_logo_preview(
                "alice",
                &logo.id,
                PreviewUpdate {
                    preview_path: format!("alice/{}.png", logo.id),
                    editor_state_json: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(again.editor_state_json.as_deref(), Some(r#"{"v":1}"#));
    }

    #[tokio::test]
    async fn test_deleting_parent_unlinks_children() {
        let repo = create_test_repo().await;
        repo.create_profile("alice", 0).await.unwrap();
        let parent = repo.insert_logo(new_logo("alice", "Acme")).await.unwrap();

        let mut child = new_logo("alice", "Acme");
        child.parent_logo_id = Some(parent.id.clone());
        child.edit_instruction = Some("make it blue".to_string());
        let child = repo.insert_logo(child).await.unwrap();

        repo.delete_logo("alice", &parent.id).await.unwrap();

        let child = repo.get_logo("alice", &child.id).await.unwrap();
        assert_eq!(child.parent_logo_id, None);
        assert_eq!(child.edit_instruction.as_deref(), Some("make it blue"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = create_test_repo().await;
        repo.create_profile("alice", 0).await.unwrap();

        let first = repo.insert_logo(new_logo("alice", "One")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.insert_logo(new_logo("alice", "Two")).await.unwrap();

        let logos = repo.list_logos("alice").await.unwrap();
        assert_eq!(logos.len(), 2);
        assert_eq!(logos[0].id, second.id);
        assert_eq!(logos[1].id, first.id);
        assert_eq!(repo.count_logos("alice").await.unwrap(), 2);
    }
}
