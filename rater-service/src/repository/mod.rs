pub mod ratings;
pub mod stats;

pub use ratings::RatingRepository;
pub use stats::StatsRepository;
