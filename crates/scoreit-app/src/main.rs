use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::logging::Logger;
use salvo::{Listener, Router};
use scoreit_app::app::api::routes;
use scoreit_core::config::load_config;
use scoreit_db::store::{MemoryCredentialStore, MemorySessionStore};
use scoreit_service::auth::{
    depot::{AuthFlowHandler, PolicyEngineHandler, TokenMakerHandler},
    flow::AuthFlow,
    policy::{CasbinPolicyEngine, FilePolicySource},
    token::JwtMaker,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting scoreit auth server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let token_maker = Arc::new(JwtMaker::from_config(&config.token)?);
    let credentials = Arc::new(MemoryCredentialStore::from_seed(&config.users).await?);
    let sessions = Arc::new(MemorySessionStore::new());

    let policy_source =
        FilePolicySource::new(&config.policy.policy_path).with_model(&config.policy.model_path);
    let engine = CasbinPolicyEngine::new(&policy_source).await?;

    let flow = AuthFlow::from_config(&config.token, token_maker.clone(), sessions, credentials)?;

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(Logger::new())
        .hoop(TokenMakerHandler { token_maker })
        .hoop(PolicyEngineHandler {
            engine: Arc::new(engine),
        })
        .hoop(AuthFlowHandler {
            flow: Arc::new(flow),
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
