use rocket::serde::json::Json;
use rocket::State;
use shared::generation::{self, GenerationClient};

use super::types::{GenerateRequest, GenerateResponse};

/// Generation backend handle resolved once at startup. `None` means no
/// credential was configured and every request is served from the template
/// catalog.
pub struct Generation {
    pub client: Option<GenerationClient>,
}

#[utoipa::path(context_path = "/api/ai", responses(
    (status = 200, description = "Generate a challenge, falling back to templates on backend failure", body = GenerateResponse)
))]
#[post("/generate-challenge", data = "<request>")]
pub async fn generate_challenge(
    generation: &State<Generation>,
    request: Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    let request = request.into_inner();

    let challenge = match &generation.client {
        Some(client) => match client
            .generate(request.difficulty, request.category.as_deref())
            .await
        {
            Ok(challenge) => challenge,
            // Backend failures are never surfaced; the context chain still
            // tells a request error apart from a parse error in the logs.
            Err(e) => {
                tracing::warn!("Challenge generation failed, using fallback: {e:#}");
                generation::fallback_challenge(request.difficulty)
            }
        },
        None => generation::fallback_challenge(request.difficulty),
    };

    Json(challenge.into())
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing AI entrypoints", |rocket| async {
        rocket.mount("/api/ai", rocket::routes![generate_challenge])
    })
}
