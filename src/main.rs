mod config;
mod db;
mod errors;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::utils::jwt::JwtKeys;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config.database).await?;
    db::create_tables(&db).await?;
    info!("Database ready");

    let keys = JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
    let bind = (config.server_host.clone(), config.server_port);
    info!("Starting server on http://{}:{}", bind.0, bind.1);

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(keys.clone()))
            .app_data(config.clone())
            .configure(routes::configure_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
