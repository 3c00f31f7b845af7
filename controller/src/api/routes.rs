//! # API Route Configuration

use actix_web::web;

use super::handlers;

/// Configure all API routes.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health              GET  - Health check
/// ├── /state               GET  - Controller snapshot
/// ├── /amount              PUT  - Set amount input
/// ├── /wallet
/// │   └── /connect         POST - Connect wallet
/// └── /contract
///     ├── /balance         GET  - Fetch balance
///     ├── /deposit         POST - Deposit
///     └── /withdraw        POST - Withdraw
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))
        .route("/health", web::get().to(handlers::health_check))
        .route("/state", web::get().to(handlers::get_state))
        .route("/amount", web::put().to(handlers::set_amount))
        .service(
            web::scope("/wallet").route("/connect", web::post().to(handlers::connect_wallet)),
        )
        .service(
            web::scope("/contract")
                .route("/balance", web::get().to(handlers::get_balance))
                .route("/deposit", web::post().to(handlers::deposit))
                .route("/withdraw", web::post().to(handlers::withdraw)),
        );
}
