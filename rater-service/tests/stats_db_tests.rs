//! Aggregate write-path tests against a live Postgres.
//!
//! Ignored by default: run with `DATABASE_URL` pointing at a scratch
//! database and `cargo test -- --ignored`.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use rater_service::models::{RatingEvent, RatingEventKind};
use rater_service::services::StatsService;

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect");
    rater_service::db::MIGRATOR.run(&pool).await.expect("migrate");
    pool
}

fn created_event(user_id: Uuid, total: i32) -> RatingEvent {
    let now = Utc::now();
    RatingEvent {
        kind: RatingEventKind::Created,
        id: Uuid::new_v4(),
        user_id,
        contest_id: Uuid::new_v4(),
        act_id: Uuid::new_v4(),
        song: total,
        singing: 0,
        show: 0,
        looks: 0,
        clothes: 0,
        total,
        created_at: now,
        updated_at: now,
    }
}

// Two first ratings for the same user race to create the aggregate row.
// The bootstrap insert-then-lock must serialize them so neither write is
// lost.
#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch Postgres"]
async fn concurrent_first_ratings_are_both_counted() {
    let pool = test_pool().await;
    let service = StatsService::new(pool);
    let user_id = Uuid::new_v4();

    let event_a = created_event(user_id, 10);
    let event_b = created_event(user_id, 20);
    let (a, b) = tokio::join!(
        service.rating_created(&event_a),
        service.rating_created(&event_b),
    );
    a.expect("first rating");
    b.expect("second rating");

    let stats = service.user_stats(user_id).await.expect("read back");
    assert_eq!(stats.rating_count, 2);
    assert_eq!(stats.rating_avg, Decimal::from(15));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a scratch Postgres"]
async fn create_then_delete_returns_user_to_zero() {
    let pool = test_pool().await;
    let service = StatsService::new(pool);
    let user_id = Uuid::new_v4();

    let event = created_event(user_id, 12);
    service.rating_created(&event).await.expect("create");

    let mut deleted = event.clone();
    deleted.kind = RatingEventKind::Deleted;
    service.rating_deleted(&deleted).await.expect("delete");

    let stats = service.user_stats(user_id).await.expect("read back");
    assert_eq!(stats.rating_count, 0);
    assert_eq!(stats.rating_avg, Decimal::ZERO);
}
