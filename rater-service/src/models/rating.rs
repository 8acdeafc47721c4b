use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rating row as stored in PostgreSQL.
///
/// One user's scores for one act's performance in a contest. The five
/// component scores are kept separately; `total` is always derived, never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contest_id: Uuid,
    pub act_id: Uuid,
    pub song: i32,
    pub singing: i32,
    pub show: i32,
    pub looks: i32,
    pub clothes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    /// Sum of the five component scores.
    pub fn total(&self) -> i32 {
        self.song + self.singing + self.show + self.looks + self.clothes
    }
}

/// Request body for POST /ratings
#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub contest_id: Uuid,
    pub act_id: Uuid,
    pub song: i32,
    pub singing: i32,
    pub show: i32,
    pub looks: i32,
    pub clothes: i32,
}

/// Request body for PUT /ratings/{id}
#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub id: Uuid,
    pub song: i32,
    pub singing: i32,
    pub show: i32,
    pub looks: i32,
    pub clothes: i32,
}

/// Wire representation of a rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contest_id: Uuid,
    pub act_id: Uuid,
    pub song: i32,
    pub singing: i32,
    pub show: i32,
    pub looks: i32,
    pub clothes: i32,
    pub total: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id,
            user_id: rating.user_id,
            contest_id: rating.contest_id,
            act_id: rating.act_id,
            song: rating.song,
            singing: rating.singing,
            show: rating.show,
            looks: rating.looks,
            clothes: rating.clothes,
            total: rating.total(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(song: i32, singing: i32, show: i32, looks: i32, clothes: i32) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            contest_id: Uuid::new_v4(),
            act_id: Uuid::new_v4(),
            song,
            singing,
            show,
            looks,
            clothes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn total_is_sum_of_components() {
        assert_eq!(rating(1, 2, 3, 4, 5).total(), 15);
        assert_eq!(rating(0, 0, 0, 0, 0).total(), 0);
    }

    #[test]
    fn response_carries_derived_total() {
        let r = rating(3, 3, 3, 3, 3);
        let response = RatingResponse::from(&r);
        assert_eq!(response.total, 15);
        assert_eq!(response.id, r.id);
    }
}
