use sqlx::PgPool;

use crate::config::Config;
use crate::events::EventBroker;
use crate::repository::RatingRepository;
use crate::services::StatsService;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub broker: EventBroker,
    pub ratings: RatingRepository,
    pub stats: StatsService,
}

impl AppState {
    pub fn new(config: Config, db: PgPool) -> Self {
        Self {
            broker: EventBroker::spawn(),
            ratings: RatingRepository::new(db.clone()),
            stats: StatsService::new(db),
            config,
        }
    }
}
