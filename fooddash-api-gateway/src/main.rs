use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use fooddash_marketplace_service::{build_pool, establish_connection, run_migrations};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod slip;

use config::GatewaySettings;
use handlers::{ApiDoc, AppState};
use slip::SlipVerifier;

#[derive(Parser)]
#[command(version, about = "FoodDash API gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = GatewaySettings::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::Migrate => {
            let mut conn = establish_connection(&settings.core)?;
            run_migrations(&mut conn)?;
            Ok(())
        }
    }
}

async fn serve(settings: GatewaySettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let pool = build_pool(&settings.core)?;
    let slip = settings
        .slip_verifier
        .as_ref()
        .map(SlipVerifier::new)
        .transpose()?;
    if slip.is_none() {
        info!("SLIP_VERIFY_URL not set, slip uploads are disabled");
    }
    let bind_address = settings.bind_address.clone();

    let state = AppState {
        pool,
        settings: Arc::new(settings),
        slip,
    };

    let app = Router::new()
        .merge(handlers::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
