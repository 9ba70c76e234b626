#![allow(dead_code)]

mod analysis;
mod auth;
mod db_core;
mod email;
mod error;
mod model;
mod prompt;
mod request_tracing;
mod routes;
mod server_config;
#[cfg(test)]
mod testing;

use std::{env, net::SocketAddr, sync::Arc};

use analysis::AnalysisPipeline;
use auth::{CredentialProviderHandle, GoogleCredentialProvider};
use axum::{extract::FromRef, Router};
use email::client::{GmailGateway, MailboxGatewayHandle};
use mimalloc::MiMalloc;
use model::usage::UsageCtrl;
use prompt::CompletionClient;
use routes::AppRouter;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use server_config::{cfg, Frontend, Settings};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;

#[derive(Clone, FromRef)]
struct ServerState {
    http_client: HttpClient,
    conn: DatabaseConnection,
    credentials: CredentialProviderHandle,
    mailbox: MailboxGatewayHandle,
    pipeline: AnalysisPipeline,
    settings: Settings,
    frontend: Frontend,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL is not set in .env file");
    let mut db_options = ConnectOptions::new(db_url);
    db_options.sqlx_logging(false);

    let conn = Database::connect(db_options)
        .await
        .expect("Database connection failed");
    UsageCtrl::init_schema(&conn).await?;

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;

    let credentials: CredentialProviderHandle = Arc::new(GoogleCredentialProvider::new(
        http_client.clone(),
        cfg.gmail_config.clone(),
    )?);
    let mailbox: MailboxGatewayHandle = Arc::new(GmailGateway::new(http_client.clone()));
    let completion = Arc::new(CompletionClient::new(
        http_client.clone(),
        &cfg.api,
        &cfg.model,
    ));
    let pipeline = AnalysisPipeline::new(mailbox.clone(), completion);

    let state = ServerState {
        http_client,
        conn,
        credentials,
        mailbox,
        pipeline,
        settings: cfg.settings.clone(),
        frontend: cfg.frontend.clone(),
    };

    let router = AppRouter::create(state);
    run_server(router).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

async fn run_server(router: Router) -> anyhow::Result<()> {
    let port = env::var("PORT").unwrap_or("8000".to_string());
    tracing::info!("Gmail AI assistant running on http://0.0.0.0:{}", port);
    tracing::info!("{}", *cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse::<u16>()?));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}
