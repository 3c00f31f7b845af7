//! # Ledger DApp Controller
//!
//! Wallet-session and transaction-submission controller for a simple
//! ledger contract exposing `getBalance`, `deposit` and `withdraw`. It
//! provides:
//!
//! - REST API for the page's actions (connect, refresh, deposit, withdraw)
//! - WebSocket stream of status events and state changes
//! - A wallet provider boundary (EIP-1193 style) so keys never live here
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      DAPP CONTROLLER                             │
//! │                                                                  │
//! │  ┌─────────────────────┐          ┌─────────────────────────┐   │
//! │  │  REST API (Actix)   │          │  WebSocket  /ws         │   │
//! │  │  /wallet/connect    │          │  status, state_changed  │   │
//! │  │  /contract/*        │          │                         │   │
//! │  └─────────────────────┘          └─────────────────────────┘   │
//! │             │                                  ▲                 │
//! │  ┌──────────┴──────────────────────────────────┴─────────────┐  │
//! │  │                    SERVICE LAYER                           │  │
//! │  │  SessionController ◀── TransactionOrchestrator             │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │             │                                                    │
//! │  ┌──────────┴──────────┐                                        │
//! │  │  ContractHandle     │  abi encode / decode, receipt polling  │
//! │  └──────────┬──────────┘                                        │
//! │             │                                                    │
//! │  ┌──────────┴──────────┐                                        │
//! │  │  WalletProvider     │  JSON-RPC (eth_*)                      │
//! │  └─────────────────────┘                                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Copy `.env.example` to `.env` and point `WALLET_PROVIDER_URL` at a
//!    node with unlocked accounts (e.g. a local dev chain)
//! 2. Start the server: `cargo run`
//! 3. `curl -X POST http://127.0.0.1:8080/wallet/connect`

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod config;
mod contract;
mod models;
mod provider;
mod services;
mod status;
mod utils;
mod websocket;

#[cfg(test)]
mod testing;

use config::AppConfig;
use provider::ProviderAdapter;
use services::{SessionController, TransactionOrchestrator};
use status::StatusReporter;
use websocket::WsRegistry;

/// Application state shared across all handlers.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Wallet session
    pub session: Arc<SessionController>,

    /// Ledger operations and displayed state
    pub orchestrator: TransactionOrchestrator,

    /// WebSocket fan-out, also the status reporter
    pub ws_registry: WsRegistry,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // =========================================
    // STEP 1: Load Configuration
    // =========================================
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    // =========================================
    // STEP 2: Initialize Logging
    // =========================================
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    info!("🚀 Starting Ledger DApp Controller");

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    info!("📋 Configuration loaded");
    info!("   Contract: {}", config.contract_address);
    info!("   Receipt poll interval: {}ms", config.receipt_poll_interval_ms);
    info!("   Submission latch: {}", config.submission_latch);

    // =========================================
    // STEP 3: Wallet Provider
    // =========================================
    let adapter = ProviderAdapter::from_config(&config).map_err(std::io::Error::other)?;

    // =========================================
    // STEP 4: Initialize Services
    // =========================================
    let ws_registry = WsRegistry::new();
    let reporter: Arc<dyn StatusReporter> = Arc::new(ws_registry.clone());

    let session = Arc::new(SessionController::new(
        adapter,
        config.contract_address,
        reporter.clone(),
    ));
    let orchestrator =
        TransactionOrchestrator::new(session.clone(), reporter, config.submission_latch);

    info!("🔧 Services initialized");

    // =========================================
    // STEP 5: Create Application State
    // =========================================
    let app_state = Arc::new(AppState {
        config: config.clone(),
        session,
        orchestrator,
        ws_registry,
    });

    // =========================================
    // STEP 6: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // The page is served from elsewhere
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .configure(api::configure_routes)
            .configure(websocket::configure_routes)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
