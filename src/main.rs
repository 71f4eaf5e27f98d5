use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;
use sqlx::PgPool;

use taskmanager::auth::{revocation, AuthMiddleware};
use taskmanager::config::Config;
use taskmanager::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    // All configuration (including the JWT secret) is read once here; a
    // missing required variable aborts startup instead of failing requests.
    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Best-effort sweep of expired denylist entries; independent of the
    // request path.
    revocation::spawn_purge_task(pool.clone());

    let auth_settings = config.auth.clone();
    let bind_addr = (config.server_host.clone(), config.server_port);

    info!("Starting taskmanager server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(auth_settings.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
