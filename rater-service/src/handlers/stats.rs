use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats/users", web::get().to(list_user_stats))
        .route("/stats/users/{id}", web::get().to(get_user_stats))
        .route("/stats/global", web::get().to(get_global_stats));
}

async fn list_user_stats(_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.stats.list_user_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn get_user_stats(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let stats = state.stats.user_stats(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn get_global_stats(_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.stats.global_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
