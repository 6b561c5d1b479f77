use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub completed_challenges: i64,
    pub total_stars: i64,
    pub can_publish: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub stars: i64,
    pub deadline: NaiveDateTime,
    pub created_by: Option<String>,
    pub is_ai: bool,
    pub is_global: bool,
    pub participants_count: i64,
    pub completed_count: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserChallengeRecord {
    pub id: i64,
    pub user_id: String,
    pub challenge_id: String,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub id: String,
    pub name: String,
    pub completed_count: i64,
}

/// Input for challenge creation; the id is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub stars: i64,
    pub deadline: NaiveDateTime,
    pub created_by: Option<String>,
    pub is_ai: bool,
    pub is_global: bool,
}

/// Result of flipping a user's completion state for one challenge.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub user: UserRecord,
}
