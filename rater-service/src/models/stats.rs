use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user running aggregate over that user's authored ratings.
///
/// `rating_avg` is undefined while `rating_count` is zero; it is stored as
/// zero for display but must never feed back into incremental arithmetic.
/// Rows are created lazily on a user's first rating and never deleted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserStat {
    pub user_id: Uuid,
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Singleton aggregate spanning all users' ratings. Same shape and
/// invariants as [`UserStat`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GlobalStat {
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived critic classification, recomputed on every read from
/// `bias = user_avg - global_avg`. Negative bias means the user rates
/// below the global average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticType {
    Harsh,
    SlightlyCritical,
    Balanced,
    EasyToPlease,
    Generous,
}

impl CriticType {
    pub fn from_bias(bias: Decimal) -> Self {
        let half = Decimal::new(5, 1);
        if bias <= -Decimal::ONE {
            CriticType::Harsh
        } else if bias <= -half {
            CriticType::SlightlyCritical
        } else if bias < half {
            CriticType::Balanced
        } else if bias < Decimal::ONE {
            CriticType::EasyToPlease
        } else {
            CriticType::Generous
        }
    }
}

/// Wire representation of one user's statistics, with bias and critic type
/// computed against the global aggregate at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsResponse {
    pub user_id: Uuid,
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub bias: Decimal,
    pub critic_type: CriticType,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserStatsResponse {
    /// Response for a user with no stats row yet.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            bias: Decimal::ZERO,
            critic_type: CriticType::Balanced,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn from_stats(stats: &UserStat, global: &GlobalStat) -> Self {
        // A zero-count aggregate holds no meaningful average on either side.
        let bias = if stats.rating_count == 0 || global.rating_count == 0 {
            Decimal::ZERO
        } else {
            stats.rating_avg - global.rating_avg
        };

        Self {
            user_id: stats.user_id,
            rating_avg: stats.rating_avg,
            rating_count: stats.rating_count,
            bias,
            critic_type: CriticType::from_bias(bias),
            created_at: Some(stats.created_at),
            updated_at: Some(stats.updated_at),
        }
    }
}

/// Wire representation of the global statistics row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStatsResponse {
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GlobalStatsResponse {
    pub fn empty() -> Self {
        Self {
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<&GlobalStat> for GlobalStatsResponse {
    fn from(stats: &GlobalStat) -> Self {
        Self {
            rating_avg: stats.rating_avg,
            rating_count: stats.rating_count,
            created_at: Some(stats.created_at),
            updated_at: Some(stats.updated_at),
        }
    }
}
