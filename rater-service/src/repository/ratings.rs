use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateRatingRequest, Rating, UpdateRatingRequest};

/// Repository for rating rows.
#[derive(Clone)]
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, user_id, contest_id, act_id,
                   song, singing, show, looks, clothes,
                   created_at, updated_at
            FROM ratings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, user_id, contest_id, act_id,
                   song, singing, show, looks, clothes,
                   created_at, updated_at
            FROM ratings
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, user_id, contest_id, act_id,
                   song, singing, show, looks, clothes,
                   created_at, updated_at
            FROM ratings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        request: &CreateRatingRequest,
    ) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (user_id, contest_id, act_id, song, singing, show, looks, clothes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, contest_id, act_id,
                      song, singing, show, looks, clothes,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.contest_id)
        .bind(request.act_id)
        .bind(request.song)
        .bind(request.singing)
        .bind(request.show)
        .bind(request.looks)
        .bind(request.clothes)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(&self, request: &UpdateRatingRequest) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings
            SET song = $2, singing = $3, show = $4, looks = $5, clothes = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, contest_id, act_id,
                      song, singing, show, looks, clothes,
                      created_at, updated_at
            "#,
        )
        .bind(request.id)
        .bind(request.song)
        .bind(request.singing)
        .bind(request.show)
        .bind(request.looks)
        .bind(request.clothes)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            DELETE FROM ratings
            WHERE id = $1
            RETURNING id, user_id, contest_id, act_id,
                      song, singing, show, looks, clothes,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    /// Start time of a contest, used to reject ratings submitted before the
    /// contest has begun.
    pub async fn contest_start_time(
        &self,
        contest_id: Uuid,
    ) -> Result<DateTime<Utc>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT start_time FROM contests
            WHERE id = $1
            "#,
        )
        .bind(contest_id)
        .fetch_one(&self.pool)
        .await
    }
}
