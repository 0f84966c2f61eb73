use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use reconcile_core::{InMemoryRepository, Settings};
use reconcile_service::routes;
use reconcile_service::state::AppState;

fn parse_cors_origins() -> Vec<String> {
    match std::env::var("ALLOWED_ORIGINS") {
        Ok(origins) => origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => vec![],
    }
}

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| o == "http://localhost" || o.starts_with("http://localhost:"))
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allow_any_header()
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allow_any_method().allow_any_header().max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    });

    let host = settings.host.clone();
    let port = settings.port;
    let rate_limit = settings.webhook_rate_limit_per_minute as u64;

    let state = web::Data::new(AppState {
        repository: Arc::new(InMemoryRepository::new()),
        settings,
    });

    let cors_origins = parse_cors_origins();

    tracing::info!("reconciliation service listening on {host}:{port}");
    tracing::info!("webhook rate limit: {rate_limit} req/min per IP");
    tracing::info!("  POST http://{host}:{port}/webhooks/payments");
    tracing::info!("  POST http://{host}:{port}/webhooks/transactions");
    tracing::info!("  GET  http://{host}:{port}/payments/");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(65_536))
            .service(routes::health)
            .service(routes::metrics_endpoint)
            .service(
                web::scope("/webhooks")
                    .wrap(Governor::new(&governor_conf))
                    .service(routes::payment_webhook)
                    .service(routes::transaction_webhook),
            )
            .service(routes::list_payments)
            .service(routes::get_payment)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
