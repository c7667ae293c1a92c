mod config;
mod db;
mod frame;
mod llm;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use llm::types::{ImageGen, LlmStream};
use services::bus::SessionBus;
use services::generation::Generator;
use services::session::SessionStore;
use services::webhook::WebhookClient;
use store::KvStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env();

    let kv: Arc<dyn KvStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url).await.expect("database init failed");
            Arc::new(store::PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; sessions live in memory only");
            Arc::new(store::MemoryStore::new())
        }
    };
    let sessions = SessionStore::new(kv, SessionBus::new(config.bus_capacity), &config.session_key_prefix);

    // Missing provider keys degrade generation to an inline notice.
    let llm: Option<Arc<dyn LlmStream>> = match llm::LlmClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; generation disabled");
            None
        }
    };
    let images: Option<Arc<dyn ImageGen>> = match llm::image_client_from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "image client not configured; logo generation disabled");
            None
        }
    };
    let webhook = WebhookClient::new(config.webhook_timeout_secs).expect("webhook client build failed");
    let generator = Generator::new(llm, images, webhook, config.generation_max_tokens);

    let port = config.port;
    let state = state::AppState::new(config, sessions, generator);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "desksync listening");
    axum::serve(listener, app).await.expect("server failed");
}
