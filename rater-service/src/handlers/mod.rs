pub mod ratings;
pub mod stats;
pub mod stream;

use actix_web::web;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    // The static /ratings/events path must be registered before the
    // /ratings/{id} matcher.
    stream::register_routes(cfg);
    ratings::register_routes(cfg);
    stats::register_routes(cfg);
}
