use rocket::fairing::AdHoc;
use rocket::serde::json::Json;
use serde::Serialize;
use utoipa::OpenApi;

pub mod ai;
pub mod challenges;
pub mod leaderboard;
pub mod types;
pub mod users;

#[derive(OpenApi)]
#[openapi(
    paths(
        challenges::list_challenges,
        challenges::get_challenge,
        challenges::create_challenge,
        challenges::assign_challenge,
        challenges::toggle_challenge,
        challenges::delete_challenge,
        users::get_user,
        users::create_user,
        users::update_user,
        leaderboard::get_leaderboard,
        ai::generate_challenge,
    ),
    components(schemas(
        types::ChallengeResponse,
        types::CreateChallengeRequest,
        types::UserResponse,
        types::CreateUserRequest,
        types::MessageResponse,
        types::AssignResponse,
        types::UserStats,
        types::ToggleResponse,
        types::LeaderboardEntry,
        types::GenerateRequest,
        types::GenerateResponse,
    ))
)]
struct ApiDoc;

#[derive(Debug, Serialize)]
struct BannerResponse {
    message: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[get("/")]
async fn index() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Challenge Arena API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[get("/health")]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[get("/openapi.json")]
async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .mount("/", rocket::routes![index, health])
            .mount("/api", rocket::routes![openapi])
            .attach(challenges::stage())
            .attach(users::stage())
            .attach(leaderboard::stage())
            .attach(ai::stage())
    })
}
