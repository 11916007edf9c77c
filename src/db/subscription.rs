//! Subscription repository (simulated, no payment processing)

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use super::DbPool;
use crate::{Error, Result};

/// Subscription state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Inactive,
}

impl SubscriptionStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A user's subscription record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: i64,
    pub status: SubscriptionStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Subscription {
    /// State reported for users who never subscribed
    #[must_use]
    pub const fn inactive(user_id: i64) -> Self {
        Self {
            user_id,
            status: SubscriptionStatus::Inactive,
            start_date: None,
            end_date: None,
        }
    }
}

/// Subscription repository
#[derive(Clone)]
pub struct SubscriptionRepo {
    pool: DbPool,
}

impl SubscriptionRepo {
    /// Create a new subscription repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Current subscription, inactive when no record exists
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, user_id: i64) -> Result<Subscription> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let sub = conn
            .query_row(
                "SELECT status, start_date, end_date FROM subscriptions WHERE user_id = ?1",
                [user_id],
                |row| {
                    let status: String = row.get(0)?;
                    Ok(Subscription {
                        user_id,
                        status: if status == "active" {
                            SubscriptionStatus::Active
                        } else {
                            SubscriptionStatus::Inactive
                        },
                        start_date: row.get(1)?,
                        end_date: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(sub.unwrap_or_else(|| Subscription::inactive(user_id)))
    }

    /// Mark the subscription active starting now
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist, or a database error
    pub fn activate(&self, user_id: i64) -> Result<Subscription> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let user: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE id = ?1", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        if user.is_none() {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let now = now_string();

        conn.execute(
            "INSERT INTO subscriptions (user_id, status, start_date, end_date)
             VALUES (?1, 'active', ?2, NULL)
             ON CONFLICT(user_id) DO UPDATE SET
                status = 'active', start_date = excluded.start_date, end_date = NULL",
            rusqlite::params![user_id, now],
        )?;

        tracing::info!(user_id, "subscription activated");

        Ok(Subscription {
            user_id,
            status: SubscriptionStatus::Active,
            start_date: Some(now),
            end_date: None,
        })
    }

    /// Cancel an active subscription
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` if there is no active subscription, or a
    /// database error
    pub fn cancel(&self, user_id: i64) -> Result<Subscription> {
        let current = self.get(user_id)?;
        if current.status != SubscriptionStatus::Active {
            return Err(Error::InvalidRequest("Subscription not active".to_string()));
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let now = now_string();

        conn.execute(
            "UPDATE subscriptions SET status = 'inactive', end_date = ?1 WHERE user_id = ?2",
            rusqlite::params![now, user_id],
        )?;

        tracing::info!(user_id, "subscription cancelled");

        Ok(Subscription {
            user_id,
            status: SubscriptionStatus::Inactive,
            start_date: current.start_date,
            end_date: Some(now),
        })
    }
}

fn now_string() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
