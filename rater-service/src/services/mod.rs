pub mod stats;

pub use stats::{Aggregate, StatsService};
