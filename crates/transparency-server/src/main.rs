mod config;
mod error;
mod questions;
mod rate_limit;
mod server;
mod service;
mod store;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use questions::QuestionSource;
use rate_limit::RateLimiter;
use server::TransparencyServer;
use service::TransparencyService;
use store::Store;
use transparency_common::openai::{OpenAiClient, OpenAiClientConfig};
use transparency_common::redis::RedisClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting transparency MCP server");

    let config = Config::from_env()?;
    info!(
        redis = config.redis_url.is_some(),
        question_model = %config.question.model,
        rate_limit_rps = ?config.rate_limit_rps,
        "configuration loaded"
    );

    let store = open_store(config.redis_url.as_deref()).await;
    info!(backend = store.backend_name(), "record store ready");

    let openai_config = OpenAiClientConfig::from_env();
    let client = if openai_config.api_key.is_some() {
        info!(base_url = %openai_config.base_url, "LLM question generation enabled");
        Some(Arc::new(OpenAiClient::new(openai_config)?))
    } else {
        info!("no LLM API key configured, using fallback questions only");
        None
    };
    let limiter = config.rate_limit_rps.and_then(RateLimiter::new);
    let questions = QuestionSource::new(client, config.question.clone(), limiter);
    info!(llm = questions.uses_llm(), "question source ready");

    let server = TransparencyServer::new(TransparencyService::new(store, questions));

    if let Some(addr) = config.tcp_listen_addr.as_deref() {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}

/// Redis when configured and reachable, otherwise in-memory.
async fn open_store(redis_url: Option<&str>) -> Store {
    let Some(url) = redis_url else {
        info!("REDIS_URL not set, records are kept in memory");
        return Store::memory();
    };

    let client = match RedisClient::open(url) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "invalid REDIS_URL, records are kept in memory");
            return Store::memory();
        }
    };
    if client.is_available().await {
        info!("redis connected");
        Store::redis(client)
    } else {
        warn!("redis unreachable, records are kept in memory");
        Store::memory()
    }
}
