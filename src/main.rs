use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::Arc;

use crate::{
    configs::{connect_database, run_migrations},
    middlewares::authentication,
    modules::{
        friend::{repository_pg::FriendRepositoryPg, service::FriendService},
        media::{model::UploadConfig, service::MediaService, storage::LocalMediaStorage},
        user::{model::OAuthBridgeConfig, repository_pg::UserRepositoryPg, service::UserService},
    },
    utils::{path_config, query_config, TokenConfig},
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let env = constants::Env::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Environment variables loaded");

    let db_pool = connect_database(&env.database_url)
        .await
        .map_err(|_| std::io::Error::other("Database connection error"))?;

    run_migrations(&db_pool).await.map_err(|e| std::io::Error::other(e.to_string()))?;

    let tokens = TokenConfig {
        secret: env.jwt_secret.clone(),
        access_ttl: env.access_token_expiration,
        refresh_ttl: env.refresh_token_expiration,
    };

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let friend_repo = Arc::new(FriendRepositoryPg::new(db_pool.clone()));
    let storage = Arc::new(LocalMediaStorage::new(
        env.upload_dir.clone(),
        env.media_base_url.clone(),
        env.jwt_secret.clone(),
    ));

    let user_service = UserService::with_dependencies(
        user_repo.clone(),
        storage.clone(),
        tokens.clone(),
        env.signed_url_ttl,
    );
    let friend_service = FriendService::with_dependencies(friend_repo, user_repo.clone());
    let media_service = MediaService::new(
        user_repo,
        storage,
        UploadConfig {
            max_file_size: env.max_upload_size,
            signed_url_ttl: env.signed_url_ttl,
            ..UploadConfig::default()
        },
    );
    let bridge = OAuthBridgeConfig { secret: env.oauth_bridge_secret.clone() };

    if bridge.secret.is_none() {
        log::warn!("OAUTH_BRIDGE_SECRET is not set, OAuth sign-in is disabled");
    }

    let frontend_url = env.frontend_url.clone();

    log::info!("Starting server at http://{}:{}", env.ip, env.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(path_config())
            .app_data(query_config())
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::new(bridge.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(friend_service.clone()))
            .app_data(web::Data::new(media_service.clone()))
            .service(health_check)
            .service(
                web::scope("/api")
                    .configure(modules::user::route::public_api_configure)
                    .configure(modules::media::route::public_api_configure)
                    .service(
                        web::scope("")
                            .wrap(from_fn(authentication))
                            .configure(modules::user::route::configure)
                            .configure(
                                modules::friend::route::configure::<
                                    FriendRepositoryPg,
                                    UserRepositoryPg,
                                >,
                            ),
                    ),
            )
    })
    .bind((env.ip.as_str(), env.port))?
    .workers(2)
    .run()
    .await
}
