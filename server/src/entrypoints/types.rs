use chrono::NaiveDateTime;
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use shared::generation::GeneratedChallenge;
use shared::Difficulty;
use utoipa::ToSchema;

use crate::db::types::{ChallengeRecord, LeaderboardRecord, UserRecord};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
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
    pub completed: bool,
}

impl ChallengeResponse {
    pub fn from_record(record: ChallengeRecord, completed: bool) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            difficulty: record.difficulty,
            stars: record.stars,
            deadline: record.deadline,
            created_by: record.created_by,
            is_ai: record.is_ai,
            is_global: record.is_global,
            participants_count: record.participants_count,
            completed_count: record.completed_count,
            created_at: record.created_at,
            completed,
        }
    }
}

impl From<ChallengeRecord> for ChallengeResponse {
    fn from(record: ChallengeRecord) -> Self {
        // Without per-user context there is nothing to complete.
        Self::from_record(record, false)
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub difficulty: Difficulty,
    pub stars: i64,
    pub deadline: NaiveDateTime,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub is_global: bool,
}

/// The `filter_type` query value on challenge listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromFormField)]
pub enum FilterType {
    All,
    Active,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub completed_challenges: i64,
    pub total_stars: i64,
    pub can_publish: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            completed_challenges: record.completed_challenges,
            total_stars: record.total_stars,
            can_publish: record.can_publish,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignResponse {
    pub message: String,
    pub user_challenge_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStats {
    pub completed_challenges: i64,
    pub total_stars: i64,
    pub can_publish: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleResponse {
    pub completed: bool,
    pub user_stats: UserStats,
}

impl From<UserRecord> for UserStats {
    fn from(record: UserRecord) -> Self {
        Self {
            completed_challenges: record.completed_challenges,
            total_stars: record.total_stars,
            can_publish: record.can_publish,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub completed_count: i64,
    pub rank: u64,
    pub avatar: Option<String>,
}

impl LeaderboardEntry {
    pub fn ranked(record: LeaderboardRecord, rank: u64) -> Self {
        Self {
            id: record.id,
            name: record.name,
            completed_count: record.completed_count,
            rank,
            avatar: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub stars: u32,
}

impl From<GeneratedChallenge> for GenerateResponse {
    fn from(challenge: GeneratedChallenge) -> Self {
        Self {
            title: challenge.title,
            description: challenge.description,
            difficulty: challenge.difficulty.to_string(),
            stars: challenge.stars,
        }
    }
}
