//! Rating CRUD handlers.
//!
//! Mutations follow one shape: authorize, persist, then notify — the
//! statistics engine first, the broadcast broker second. Both
//! notifications run after the rating write has committed; a statistics
//! failure is logged as a secondary error rather than failing the
//! response the client already earned.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::ops::RangeInclusive;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{
    CreateRatingRequest, RatingEvent, RatingEventKind, RatingResponse, UpdateRatingRequest,
};
use crate::state::AppState;

/// Accepted range for each of the five component scores. Bounding the
/// components also bounds the derived total, which feeds the running
/// averages as exact integer arithmetic.
const SCORE_RANGE: RangeInclusive<i32> = 1..=10;

fn validate_scores(scores: [i32; 5]) -> AppResult<()> {
    if scores.iter().any(|score| !SCORE_RANGE.contains(score)) {
        return Err(AppError::BadRequest(format!(
            "component scores must be between {} and {}",
            SCORE_RANGE.start(),
            SCORE_RANGE.end()
        )));
    }
    Ok(())
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ratings", web::get().to(list_ratings))
        .route("/ratings", web::post().to(create_rating))
        .route("/ratings/{id}", web::get().to(get_rating))
        .route("/ratings/{id}", web::put().to(update_rating))
        .route("/ratings/{id}", web::delete().to(delete_rating))
        .route("/users/{id}/ratings", web::get().to(list_user_ratings));
}

async fn list_ratings(_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let ratings = state.ratings.list().await?;
    let response: Vec<RatingResponse> = ratings.iter().map(RatingResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

async fn list_user_ratings(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let ratings = state.ratings.list_by_user(path.into_inner()).await?;
    let response: Vec<RatingResponse> = ratings.iter().map(RatingResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

async fn get_rating(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let rating = state.ratings.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(RatingResponse::from(&rating)))
}

async fn create_rating(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateRatingRequest>,
) -> AppResult<HttpResponse> {
    user.ensure_permission("write:ratings")?;
    validate_scores([body.song, body.singing, body.show, body.looks, body.clothes])?;

    let start_time = state
        .ratings
        .contest_start_time(body.contest_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::BadRequest("unknown contest".to_string()),
            other => AppError::from(other),
        })?;
    if start_time > Utc::now() {
        return Err(AppError::BadRequest(
            "contest has not started yet".to_string(),
        ));
    }

    let rating = state.ratings.insert(user.id, &body).await?;
    let event = RatingEvent::new(RatingEventKind::Created, &rating);

    if let Err(e) = state.stats.rating_created(&event).await {
        tracing::warn!(error = %e, rating_id = %rating.id, "statistics update failed");
    }
    state.broker.broadcast(event, user.id);

    Ok(HttpResponse::Created().json(RatingResponse::from(&rating)))
}

async fn update_rating(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateRatingRequest>,
) -> AppResult<HttpResponse> {
    if path.into_inner() != body.id {
        return Err(AppError::BadRequest("id mismatch".to_string()));
    }
    validate_scores([body.song, body.singing, body.show, body.looks, body.clothes])?;

    // The old row is read before the update becomes visible: its total is
    // the minuend of the statistics delta.
    let existing = state.ratings.get_by_id(body.id).await?;
    user.ensure_owner(existing.user_id)?;
    let old_total = existing.total();

    let rating = state.ratings.update(&body).await?;
    let event = RatingEvent::new(RatingEventKind::Updated, &rating);

    if let Err(e) = state.stats.rating_updated(old_total, &event).await {
        tracing::warn!(error = %e, rating_id = %rating.id, "statistics update failed");
    }
    state.broker.broadcast(event, user.id);

    Ok(HttpResponse::Ok().json(RatingResponse::from(&rating)))
}

async fn delete_rating(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let existing = state.ratings.get_by_id(id).await?;
    user.ensure_owner(existing.user_id)?;

    let rating = state.ratings.delete(id).await?;
    let event = RatingEvent::new(RatingEventKind::Deleted, &rating);

    if let Err(e) = state.stats.rating_deleted(&event).await {
        tracing::warn!(error = %e, rating_id = %rating.id, "statistics update failed");
    }
    state.broker.broadcast(event, user.id);

    Ok(HttpResponse::Ok().json(RatingResponse::from(&rating)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_inside_the_range_pass() {
        assert!(validate_scores([1, 5, 10, 3, 7]).is_ok());
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        assert!(validate_scores([0, 5, 5, 5, 5]).is_err());
        assert!(validate_scores([5, 5, 5, 5, 11]).is_err());
        assert!(validate_scores([5, -3, 5, 5, 5]).is_err());
        // An extreme value must be caught before the total is ever summed.
        assert!(validate_scores([i32::MAX, 1, 1, 1, 1]).is_err());
    }
}
