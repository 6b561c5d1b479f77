#[macro_use]
extern crate rocket;

use rocket_cors::AllowedOrigins;
use rocket_prometheus::PrometheusMetrics;
use shared::generation::GenerationClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use challenge_arena_server::entrypoints::ai::Generation;
use challenge_arena_server::{db, entrypoints};

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    database_url: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    openai_model: Option<String>,
    frontend_url: Option<String>,
}

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");

    let database_url = env
        .database_url
        .unwrap_or_else(|| "sqlite:challenges.db?mode=rwc".to_string());
    let figment =
        rocket::Config::figment().merge(("databases.challenge_arena.url", database_url));

    let generation = Generation {
        client: env.openai_api_key.map(|api_key| {
            GenerationClient::new(api_key, env.openai_base_url, env.openai_model)
                .expect("Failed to create generation client")
        }),
    };
    if generation.client.is_none() {
        tracing::info!("No generation backend configured, serving template challenges");
    }

    let mut origins = vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ];
    if let Some(frontend_url) = env.frontend_url {
        origins.push(frontend_url);
    }
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::some_exact(&origins),
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to build CORS fairing");

    let prometheus = PrometheusMetrics::new();

    rocket::custom(figment)
        .attach(db::stage())
        .attach(cors)
        .attach(prometheus.clone())
        .mount("/metrics", prometheus)
        .manage(generation)
        .attach(entrypoints::stage())
}
