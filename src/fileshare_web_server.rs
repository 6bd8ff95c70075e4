use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing_actix_web::TracingLogger;

use crate::core::{AppConfig, EmailService};
use crate::db::{SqlxAccessRepository, SqlxFileRepository, SqlxUserRepository};
use crate::routes::fileshare_routes;
use crate::services::{AccessService, DiskStorage, FileService, UserService};

pub struct FileshareWebServer {
    port: u16,
    server: Server,
}

impl FileshareWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.fileshare_server_config.host, configuration.fileshare_server_config.port
        );

        let mysql_pool = MySqlPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_lazy_with(configuration.mysql.connect());

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, mysql_pool, configuration).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    mysql_pool: MySqlPool,
    configuration: AppConfig,
) -> Result<Server, anyhow::Error> {
    let user_repository = Arc::new(SqlxUserRepository::new(mysql_pool.clone()));
    let access_repository = Arc::new(SqlxAccessRepository::new(mysql_pool.clone()));
    let file_repository = Arc::new(SqlxFileRepository::new(mysql_pool.clone()));
    let email_service = Arc::new(EmailService::new(configuration.smtp.clone()));

    let user_service = Data::new(UserService::new(
        user_repository.clone(),
        email_service.clone(),
    ));
    let access_service = Data::new(AccessService::new(
        user_repository.clone(),
        access_repository.clone(),
    ));
    let file_service = Data::new(FileService::new(
        file_repository,
        access_repository,
        DiskStorage::new(&configuration.upload.path),
    ));

    let config = Data::new(configuration);
    let mysql_pool = Data::new(mysql_pool);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .configure(fileshare_routes)
            .app_data(mysql_pool.clone())
            .app_data(config.clone())
            .app_data(user_service.clone())
            .app_data(access_service.clone())
            .app_data(file_service.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
