//! Incremental statistics engine.
//!
//! Maintains a per-user and a global running average of rating totals
//! without ever rescanning the ratings table. Both aggregates are applied
//! in one transaction per rating event: a crash between the two writes
//! would otherwise leave them permanently inconsistent with each other.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{GlobalStat, GlobalStatsResponse, RatingEvent, UserStatsResponse};
use crate::repository::stats as stats_repo;
use crate::repository::StatsRepository;

/// In-memory value of one aggregate row.
///
/// While `count` is zero the average is meaningless and must not feed back
/// into the incremental formulas; every operation below treats that state
/// as the bootstrap case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub avg: Decimal,
    pub count: i32,
}

impl Aggregate {
    pub const EMPTY: Aggregate = Aggregate {
        avg: Decimal::ZERO,
        count: 0,
    };

    /// Fold one new rating total into the running average.
    pub fn add(self, total: i32) -> Aggregate {
        if self.count == 0 {
            return Aggregate {
                avg: Decimal::from(total),
                count: 1,
            };
        }

        let count = self.count + 1;
        Aggregate {
            avg: (self.avg * Decimal::from(self.count) + Decimal::from(total))
                / Decimal::from(count),
            count,
        }
    }

    /// Replace one tracked total with another. The count is unchanged.
    pub fn update(self, old_total: i32, new_total: i32) -> Aggregate {
        if self.count == 0 {
            return self;
        }

        Aggregate {
            avg: (self.avg * Decimal::from(self.count) - Decimal::from(old_total)
                + Decimal::from(new_total))
                / Decimal::from(self.count),
            count: self.count,
        }
    }

    /// Drop one tracked total from the running average.
    pub fn remove(self, total: i32) -> Aggregate {
        let count = self.count - 1;
        if count <= 0 {
            return Aggregate::EMPTY;
        }

        Aggregate {
            avg: (self.avg * Decimal::from(self.count) - Decimal::from(total))
                / Decimal::from(count),
            count,
        }
    }
}

impl From<&GlobalStat> for Aggregate {
    fn from(stats: &GlobalStat) -> Self {
        Aggregate {
            avg: stats.rating_avg,
            count: stats.rating_count,
        }
    }
}

/// Applies rating lifecycle events to the stored aggregates and assembles
/// the read-side statistics views.
#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
    repo: StatsRepository,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        let repo = StatsRepository::new(pool.clone());
        Self { pool, repo }
    }

    pub async fn rating_created(&self, event: &RatingEvent) -> AppResult<()> {
        self.apply(event.user_id, |agg| agg.add(event.total)).await
    }

    /// `old_total` is the total of the rating row as it was before the
    /// update became visible.
    pub async fn rating_updated(&self, old_total: i32, event: &RatingEvent) -> AppResult<()> {
        self.apply(event.user_id, |agg| agg.update(old_total, event.total))
            .await
    }

    pub async fn rating_deleted(&self, event: &RatingEvent) -> AppResult<()> {
        self.apply(event.user_id, |agg| agg.remove(event.total)).await
    }

    /// Apply one aggregate operation to the user row and the global row
    /// inside a single transaction. Each row is created at zero before its
    /// lock is taken (a `FOR UPDATE` on a missing row locks nothing), then
    /// held for the duration, so concurrent raters serialize here instead
    /// of losing updates — including two first ratings racing to bootstrap
    /// the same row.
    async fn apply<F>(&self, user_id: Uuid, op: F) -> AppResult<()>
    where
        F: Fn(Aggregate) -> Aggregate,
    {
        let mut tx = self.pool.begin().await?;

        stats_repo::ensure_user_stats_row(&mut tx, user_id).await?;
        let current = stats_repo::user_stats_for_update(&mut tx, user_id)
            .await?
            .map(|s| Aggregate {
                avg: s.rating_avg,
                count: s.rating_count,
            })
            .unwrap_or(Aggregate::EMPTY);
        let next = op(current);
        stats_repo::upsert_user_stats(&mut tx, user_id, next.avg, next.count).await?;

        stats_repo::ensure_global_stats_row(&mut tx).await?;
        let current = stats_repo::global_stats_for_update(&mut tx)
            .await?
            .as_ref()
            .map(Aggregate::from)
            .unwrap_or(Aggregate::EMPTY);
        let next = op(current);
        stats_repo::upsert_global_stats(&mut tx, next.avg, next.count).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn user_stats(&self, user_id: Uuid) -> AppResult<UserStatsResponse> {
        let stats = self.repo.get_user_stats(user_id).await?;
        let global = self.repo.get_global_stats().await?;

        Ok(match (stats, global) {
            (Some(stats), Some(global)) => UserStatsResponse::from_stats(&stats, &global),
            _ => UserStatsResponse::empty(user_id),
        })
    }

    pub async fn list_user_stats(&self) -> AppResult<Vec<UserStatsResponse>> {
        let all = self.repo.list_user_stats().await?;
        let global = self.repo.get_global_stats().await?;

        let Some(global) = global else {
            return Ok(Vec::new());
        };

        Ok(all
            .iter()
            .map(|stats| UserStatsResponse::from_stats(stats, &global))
            .collect())
    }

    pub async fn global_stats(&self) -> AppResult<GlobalStatsResponse> {
        Ok(self
            .repo
            .get_global_stats()
            .await?
            .as_ref()
            .map(GlobalStatsResponse::from)
            .unwrap_or_else(GlobalStatsResponse::empty))
    }
}
