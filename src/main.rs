use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use koperasi_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::ProofStorage,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let proof_storage = ProofStorage::new(&config.uploads);
    proof_storage
        .ensure_root()
        .await
        .expect("Failed to create upload directory");

    let auth_service = AuthService::new(pool.clone());
    let catalog_service = CatalogService::new(pool.clone());
    let order_service = OrderService::new(pool.clone());
    let checkout_service =
        CheckoutService::new(pool.clone(), proof_storage.clone(), config.checkout.clone());
    let session_service = SessionService::new(JwtService::new(
        &config.session.secret,
        config.session.expires_in,
    ));

    // first start: administrator and sample catalog
    auth_service
        .ensure_default_admin(&config.seed)
        .await
        .expect("Failed to seed administrator account");
    if config.seed.sample_products {
        catalog_service
            .seed_sample_products()
            .await
            .expect("Failed to seed sample products");
    }

    if !config.checkout.allow_oversell {
        log::info!("Strict stock checking enabled, checkout refuses to oversell");
    }
    if config.checkout.trust_client_prices {
        log::warn!("Checkout trusts client-submitted prices");
    }

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let session_config = config.session.clone();
    let max_upload_bytes = config.uploads.max_bytes;

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(
                session_service.clone(),
                session_config.cookie_name.clone(),
            ))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(proof_storage.clone()))
            .app_data(web::Data::new(session_config.clone()))
            .configure(|cfg| handlers::extractor_config(cfg, max_upload_bytes))
            .configure(swagger_config)
            .configure(handlers::auth_config)
            .configure(handlers::student_config)
            .configure(handlers::admin_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
