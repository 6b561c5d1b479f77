use rocket::serde::json::Json;

use super::types::{CreateUserRequest, UserResponse};
use crate::db::DB;
use crate::error::ApiError;

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Fetch a user profile", body = UserResponse),
    (status = 404, description = "User not found")
))]
#[get("/<user_id>")]
pub async fn get_user(db: &DB, user_id: &str) -> Result<Json<UserResponse>, ApiError> {
    let user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.into()))
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Create a user, or return the existing one", body = UserResponse)
))]
#[post("/", data = "<request>")]
pub async fn create_user(
    db: &DB,
    request: Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db.get_or_create_user(&request.id, &request.name).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Rename a user", body = UserResponse),
    (status = 404, description = "User not found")
))]
#[put("/<user_id>?<name>")]
pub async fn update_user(
    db: &DB,
    user_id: &str,
    name: Option<&str>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db.rename_user(user_id, name).await?;
    Ok(Json(user.into()))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing user entrypoints", |rocket| async {
        rocket.mount(
            "/api/users",
            rocket::routes![get_user, create_user, update_user],
        )
    })
}
