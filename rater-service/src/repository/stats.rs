//! Row access for the two statistics aggregates.
//!
//! The write-side functions take a `&mut PgConnection` so that the user and
//! global aggregate updates for one rating event can share a single
//! transaction, and their reads lock the row (`FOR UPDATE`) to serialize
//! concurrent raters.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{GlobalStat, UserStat};

/// Repository for read-side access to the aggregates.
#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn get_user_stats(&self, user_id: Uuid) -> Result<Option<UserStat>, sqlx::Error> {
        sqlx::query_as::<_, UserStat>(
            r#"
            SELECT user_id, rating_avg, rating_count, created_at, updated_at
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_user_stats(&self) -> Result<Vec<UserStat>, sqlx::Error> {
        sqlx::query_as::<_, UserStat>(
            r#"
            SELECT user_id, rating_avg, rating_count, created_at, updated_at
            FROM user_stats
            ORDER BY rating_count DESC, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_global_stats(&self) -> Result<Option<GlobalStat>, sqlx::Error> {
        sqlx::query_as::<_, GlobalStat>(
            r#"
            SELECT rating_avg, rating_count, created_at, updated_at
            FROM global_stats
            WHERE id
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }
}

/// Create the zero-valued aggregate row for `user_id` if it does not exist
/// yet. `FOR UPDATE` on a missing row locks nothing, so without this two
/// concurrent first ratings would both read an empty aggregate and the
/// later commit would overwrite the earlier one. With the row in place the
/// subsequent lock serializes them.
pub async fn ensure_user_stats_row(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_stats (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a user's aggregate with a row lock held for the rest of the
/// transaction.
pub async fn user_stats_for_update(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<UserStat>, sqlx::Error> {
    sqlx::query_as::<_, UserStat>(
        r#"
        SELECT user_id, rating_avg, rating_count, created_at, updated_at
        FROM user_stats
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn upsert_user_stats(
    conn: &mut PgConnection,
    user_id: Uuid,
    rating_avg: Decimal,
    rating_count: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_stats (user_id, rating_avg, rating_count)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET rating_avg = EXCLUDED.rating_avg,
            rating_count = EXCLUDED.rating_count,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(rating_avg)
    .bind(rating_count)
    .execute(conn)
    .await?;

    Ok(())
}

/// Create the zero-valued global aggregate row if it does not exist yet,
/// for the same reason as [`ensure_user_stats_row`].
pub async fn ensure_global_stats_row(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO global_stats (id)
        VALUES (TRUE)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch the global aggregate with a row lock held for the rest of the
/// transaction.
pub async fn global_stats_for_update(
    conn: &mut PgConnection,
) -> Result<Option<GlobalStat>, sqlx::Error> {
    sqlx::query_as::<_, GlobalStat>(
        r#"
        SELECT rating_avg, rating_count, created_at, updated_at
        FROM global_stats
        WHERE id
        FOR UPDATE
        "#,
    )
    .fetch_optional(conn)
    .await
}

pub async fn upsert_global_stats(
    conn: &mut PgConnection,
    rating_avg: Decimal,
    rating_count: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO global_stats (id, rating_avg, rating_count)
        VALUES (TRUE, $1, $2)
        ON CONFLICT (id) DO UPDATE
        SET rating_avg = EXCLUDED.rating_avg,
            rating_count = EXCLUDED.rating_count,
            updated_at = now()
        "#,
    )
    .bind(rating_avg)
    .bind(rating_count)
    .execute(conn)
    .await?;

    Ok(())
}
