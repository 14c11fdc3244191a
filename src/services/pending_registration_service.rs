use crate::entities::pending_registration_entity as pending;
use crate::error::AppResult;
use crate::models::VerificationOutcome;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Store of in-flight registrations, one row per email.
#[derive(Clone)]
pub struct PendingRegistrationService {
    pool: DatabaseConnection,
    ttl: Duration,
}

impl PendingRegistrationService {
    pub fn new(pool: DatabaseConnection, ttl_minutes: i64) -> Self {
        Self {
            pool,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Writes or replaces the pending registration for `email`.
    ///
    /// Last write wins: name, hash, code and expiry are all replaced and
    /// `created_at` is refreshed, in a single `INSERT ... ON CONFLICT` statement.
    pub async fn upsert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        code: &str,
    ) -> AppResult<pending::Model> {
        self.upsert_at(name, email, password_hash, code, Utc::now()).await
    }

    pub async fn upsert_at(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<pending::Model> {
        let model = pending::Model {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            code: code.to_string(),
            expires_at: now + self.ttl,
            created_at: now,
        };

        let am = pending::ActiveModel {
            email: Set(model.email.clone()),
            name: Set(model.name.clone()),
            password_hash: Set(model.password_hash.clone()),
            code: Set(model.code.clone()),
            expires_at: Set(model.expires_at),
            created_at: Set(model.created_at),
        };

        pending::Entity::insert(am)
            .on_conflict(
                OnConflict::column(pending::Column::Email)
                    .update_columns([
                        pending::Column::Name,
                        pending::Column::PasswordHash,
                        pending::Column::Code,
                        pending::Column::ExpiresAt,
                        pending::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;

        Ok(model)
    }

    pub async fn find(&self, email: &str) -> AppResult<Option<pending::Model>> {
        Ok(pending::Entity::find_by_id(email.to_string())
            .one(&self.pool)
            .await?)
    }

    /// Checks `submitted_code` against the pending registration and consumes it on success.
    ///
    /// - no record: `Invalid`
    /// - past `expires_at`: record deleted, `Expired` (whatever the code)
    /// - wrong code: `Invalid`, record kept for retry
    /// - match: record deleted, `Success`
    ///
    /// The consuming delete is conditioned on the exact row that was read, so of
    /// several concurrent callers holding the right code only the one whose delete
    /// removes the row sees `Success`; the rest see `Invalid`. A concurrent upsert
    /// that replaced the code also turns the in-flight attempt into `Invalid`.
    pub async fn verify_and_consume(
        &self,
        email: &str,
        submitted_code: &str,
    ) -> AppResult<VerificationOutcome> {
        self.verify_and_consume_at(email, submitted_code, Utc::now()).await
    }

    pub async fn verify_and_consume_at(
        &self,
        email: &str,
        submitted_code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<VerificationOutcome> {
        let Some(record) = self.find(email).await? else {
            return Ok(VerificationOutcome::Invalid);
        };

        if record.is_expired_at(now) {
            // Only remove the row we judged expired; a fresh upsert may have landed since.
            self.delete_exact(&record).await?;
            return Ok(VerificationOutcome::Expired);
        }

        if record.code != submitted_code {
            return Ok(VerificationOutcome::Invalid);
        }

        if self.delete_exact(&record).await? {
            Ok(VerificationOutcome::Success {
                name: record.name,
                email: record.email,
                password_hash: record.password_hash,
            })
        } else {
            Ok(VerificationOutcome::Invalid)
        }
    }

    /// Idempotent removal.
    pub async fn delete(&self, email: &str) -> AppResult<()> {
        pending::Entity::delete_many()
            .filter(pending::Column::Email.eq(email))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes every registration whose code has expired; returns how many.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let res = pending::Entity::delete_many()
            .filter(pending::Column::ExpiresAt.lt(now))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    /// Deletes `record` only if the stored row is still exactly it.
    async fn delete_exact(&self, record: &pending::Model) -> AppResult<bool> {
        let res = pending::Entity::delete_many()
            .filter(pending::Column::Email.eq(record.email.as_str()))
            .filter(pending::Column::Code.eq(record.code.as_str()))
            .filter(pending::Column::ExpiresAt.eq(record.expires_at))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected == 1)
    }
}
