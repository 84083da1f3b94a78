//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The unique key on `user_id` is the only serialization point between
//! concurrent deliveries. A change carrying the full processor triad is a
//! single `INSERT .. ON CONFLICT DO UPDATE`; a partial change is a single-row
//! `UPDATE` that never creates a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::errors::map_sqlx_error;
use crate::domain::billing::{Subscription, SubscriptionStatus, SubscriptionUpsert};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{SubscriptionRepository, UpsertResult};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    stripe_customer_id: String,
    stripe_subscription_id: String,
    stripe_price_id: String,
    plan: Option<String>,
    status: String,
    current_period_end: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status: SubscriptionStatus = row.status.parse().map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;
        Ok(Subscription {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
            })?,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_price_id: row.stripe_price_id,
            plan: row.plan,
            status,
            current_period_end: Timestamp::from_datetime(row.current_period_end),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(&self, change: &SubscriptionUpsert) -> Result<UpsertResult, DomainError> {
        if change.can_create() {
            // xmax is zero only for a freshly inserted tuple
            let inserted: bool = sqlx::query_scalar(
                r#"
                INSERT INTO subscriptions (
                    user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id,
                    plan, status, current_period_end
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (user_id) DO UPDATE SET
                    stripe_customer_id = EXCLUDED.stripe_customer_id,
                    stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                    stripe_price_id = EXCLUDED.stripe_price_id,
                    plan = COALESCE(EXCLUDED.plan, subscriptions.plan),
                    status = EXCLUDED.status,
                    current_period_end = EXCLUDED.current_period_end,
                    updated_at = now()
                RETURNING (xmax = 0)
                "#,
            )
            .bind(change.user_id.as_str())
            .bind(&change.stripe_customer_id)
            .bind(&change.stripe_subscription_id)
            .bind(&change.stripe_price_id)
            .bind(&change.plan)
            .bind(change.status.as_str())
            .bind(change.current_period_end.as_datetime())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to upsert subscription", e))?;

            return Ok(if inserted {
                UpsertResult::Created
            } else {
                UpsertResult::Updated
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                stripe_customer_id = COALESCE($2, stripe_customer_id),
                stripe_subscription_id = COALESCE($3, stripe_subscription_id),
                stripe_price_id = COALESCE($4, stripe_price_id),
                plan = COALESCE($5, plan),
                status = $6,
                current_period_end = $7,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(change.user_id.as_str())
        .bind(&change.stripe_customer_id)
        .bind(&change.stripe_subscription_id)
        .bind(&change.stripe_price_id)
        .bind(&change.plan)
        .bind(change.status.as_str())
        .bind(change.current_period_end.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update subscription", e))?;

        Ok(if result.rows_affected() == 0 {
            UpsertResult::Skipped
        } else {
            UpsertResult::Updated
        })
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id,
                   plan, status, current_period_end
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_user_id_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let user_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM subscriptions
            WHERE stripe_customer_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to look up customer", e))?;

        user_id
            .map(|id| {
                UserId::new(id).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> SubscriptionRow {
        SubscriptionRow {
            user_id: "u1".to_string(),
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
            stripe_price_id: "price_basic".to_string(),
            plan: Some("basic".to_string()),
            status: status.to_string(),
            current_period_end: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn row_converts_to_subscription() {
        let subscription = Subscription::try_from(row("past_due")).unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::PastDue);
        assert_eq!(
            subscription.current_period_end.to_rfc3339(),
            "2023-11-14T22:13:20Z"
        );
    }

    #[test]
    fn unknown_stored_status_is_database_error() {
        let err = Subscription::try_from(row("frozen")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
