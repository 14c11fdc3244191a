use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::time::Duration;

use nutrisnap_backend::{
    api_config,
    config::Config,
    database::{create_pool, run_migrations},
    external::{GoogleAuthService, build_mailer},
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
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

    let config = Config::from_toml()?;

    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.expires_in);

    let mailer = build_mailer(&config.mail)?;
    let google = GoogleAuthService::new(config.google.clone())?;

    let pending_service =
        PendingRegistrationService::new(pool.clone(), config.registration.code_ttl_minutes);
    let user_service = UserService::new(pool.clone());
    let registration_service = RegistrationService::new(
        pending_service.clone(),
        user_service.clone(),
        jwt_service.clone(),
        mailer,
        Duration::from_secs(config.mail.timeout_secs),
    );
    let auth_service = AuthService::new(user_service.clone(), jwt_service.clone(), google);

    tasks::spawn_all(
        pending_service,
        Duration::from_secs(config.registration.purge_interval_secs),
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(registration_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .configure(swagger_config)
            .configure(api_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    log::info!("HTTP server stopped, closing database pool");
    pool.close().await?;
    Ok(())
}
