use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use clinicdesk::config::AppConfig;
use clinicdesk::db;
use clinicdesk::handlers;
use clinicdesk::services::ai::gemini::GeminiProvider;
use clinicdesk::services::ai::ollama::OllamaProvider;
use clinicdesk::services::ai::LlmProvider;
use clinicdesk::services::appointments::SqliteAppointments;
use clinicdesk::services::chat::telegram::TelegramBot;
use clinicdesk::services::directory::SqliteDirectory;
use clinicdesk::services::email::resend::ResendMailer;
use clinicdesk::services::sessions::SessionStore;
use clinicdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "gemini" => {
            anyhow::ensure!(
                !config.gemini_api_key.is_empty(),
                "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini"
            );
            tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
            Box::new(GeminiProvider::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                "llama3.2".to_string(),
            ))
        }
    };

    let state = Arc::new(AppState {
        db: Arc::clone(&db),
        config: config.clone(),
        directory: Box::new(SqliteDirectory::new(Arc::clone(&db))),
        appointments: Box::new(SqliteAppointments::new(Arc::clone(&db))),
        llm,
        mailer: Box::new(ResendMailer::new(
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        transport: Box::new(TelegramBot::new(config.telegram_bot_token.clone())),
        sessions: SessionStore::new(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook/telegram",
            post(handlers::webhook::telegram_webhook),
        )
        .route("/api/doctors", get(handlers::admin::get_doctors))
        .route("/api/appointments", get(handlers::admin::get_appointments))
        .route(
            "/api/appointments/:id",
            get(handlers::admin::get_appointment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
