use rocket::serde::json::Json;

use super::types::LeaderboardEntry;
use crate::db::DB;
use crate::error::ApiError;

#[utoipa::path(context_path = "/api/leaderboard", responses(
    (status = 200, description = "Ranked users by completed challenges", body = Vec<LeaderboardEntry>)
))]
#[get("/")]
pub async fn get_leaderboard(db: &DB) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let records = db.get_leaderboard().await?;
    let entries = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| LeaderboardEntry::ranked(record, index as u64 + 1))
        .collect();
    Ok(Json(entries))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing leaderboard entrypoints", |rocket| async {
        rocket.mount("/api/leaderboard", rocket::routes![get_leaderboard])
    })
}
