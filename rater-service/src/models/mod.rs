pub mod event;
pub mod rating;
pub mod stats;

pub use event::{RatingEvent, RatingEventKind};
pub use rating::{CreateRatingRequest, Rating, RatingResponse, UpdateRatingRequest};
pub use stats::{CriticType, GlobalStat, GlobalStatsResponse, UserStat, UserStatsResponse};
