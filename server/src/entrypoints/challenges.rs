use std::collections::HashMap;

use rocket::serde::json::Json;
use uuid::Uuid;

use super::types::{
    AssignResponse, ChallengeResponse, CreateChallengeRequest, FilterType, MessageResponse,
    ToggleResponse,
};
use crate::db::types::NewChallenge;
use crate::db::DB;
use crate::error::ApiError;

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "List challenges, with per-user completion when user_id is given", body = Vec<ChallengeResponse>)
))]
#[get("/?<user_id>&<filter_type>&<global_only>")]
pub async fn list_challenges(
    db: &DB,
    user_id: Option<&str>,
    filter_type: Option<FilterType>,
    global_only: Option<bool>,
) -> Result<Json<Vec<ChallengeResponse>>, ApiError> {
    let global_only = global_only.unwrap_or(false);
    let challenges = db.list_challenges(global_only).await?;

    let Some(user_id) = user_id else {
        return Ok(Json(challenges.into_iter().map(Into::into).collect()));
    };

    let completion: HashMap<String, bool> = db
        .list_user_challenges(user_id)
        .await?
        .into_iter()
        .map(|assignment| (assignment.challenge_id, assignment.completed))
        .collect();

    let mut result = Vec::new();
    for challenge in challenges {
        let assignment = completion.get(&challenge.id).copied();
        // Global listings show everything; otherwise only assigned challenges.
        if !global_only && assignment.is_none() {
            continue;
        }
        let completed = assignment.unwrap_or(false);
        match filter_type {
            Some(FilterType::Active) if completed => continue,
            Some(FilterType::Completed) if !completed => continue,
            _ => {}
        }
        result.push(ChallengeResponse::from_record(challenge, completed));
    }

    Ok(Json(result))
}

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "Fetch one challenge", body = ChallengeResponse),
    (status = 404, description = "Challenge not found")
))]
#[get("/<challenge_id>")]
pub async fn get_challenge(
    db: &DB,
    challenge_id: &str,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let challenge = db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Challenge not found"))?;
    Ok(Json(challenge.into()))
}

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "Create a challenge", body = ChallengeResponse)
))]
#[post("/", data = "<request>")]
pub async fn create_challenge(
    db: &DB,
    request: Json<CreateChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let request = request.into_inner();
    let challenge = db
        .create_challenge(&NewChallenge {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            difficulty: request.difficulty.to_string(),
            stars: request.stars,
            deadline: request.deadline,
            created_by: request.created_by,
            is_ai: request.is_ai,
            is_global: request.is_global,
        })
        .await?;
    Ok(Json(challenge.into()))
}

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "Assign a challenge to a user", body = AssignResponse),
    (status = 404, description = "Challenge or user not found"),
    (status = 409, description = "Already assigned")
))]
#[post("/<challenge_id>/assign?<user_id>")]
pub async fn assign_challenge(
    db: &DB,
    challenge_id: &str,
    user_id: &str,
) -> Result<Json<AssignResponse>, ApiError> {
    let user_challenge_id = db.assign_challenge(challenge_id, user_id).await?;
    Ok(Json(AssignResponse {
        message: "Challenge assigned successfully".to_string(),
        user_challenge_id,
    }))
}

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "Flip completion state", body = ToggleResponse),
    (status = 404, description = "Assignment or user not found")
))]
#[put("/<challenge_id>/toggle?<user_id>")]
pub async fn toggle_challenge(
    db: &DB,
    challenge_id: &str,
    user_id: &str,
) -> Result<Json<ToggleResponse>, ApiError> {
    let outcome = db.toggle_completion(challenge_id, user_id).await?;
    Ok(Json(ToggleResponse {
        completed: outcome.completed,
        user_stats: outcome.user.into(),
    }))
}

#[utoipa::path(context_path = "/api/challenges", responses(
    (status = 200, description = "Delete a challenge and its assignments", body = MessageResponse),
    (status = 404, description = "Challenge not found")
))]
#[delete("/<challenge_id>")]
pub async fn delete_challenge(
    db: &DB,
    challenge_id: &str,
) -> Result<Json<MessageResponse>, ApiError> {
    db.delete_challenge(challenge_id).await?;
    Ok(Json(MessageResponse::new("Challenge deleted successfully")))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing challenge entrypoints", |rocket| async {
        rocket.mount(
            "/api/challenges",
            rocket::routes![
                list_challenges,
                get_challenge,
                create_challenge,
                assign_challenge,
                toggle_challenge,
                delete_challenge
            ],
        )
    })
}
