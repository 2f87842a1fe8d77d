use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use clap::Parser;
use log::{error, info};

use manga_relay::{AppState, CacheManager, Config, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let cache = Arc::new(CacheManager::open(config.cache_ttl()));

    let state = match AppState::from_config(&config, Arc::clone(&cache)) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("Failed to initialise services: {}", e);
            return Err(io::Error::other(e.to_string()));
        }
    };

    info!("Listening on {}:{}, upstream {}", config.bind, config.port, config.senkuro_url);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await;

    cache.close().await;

    result
}
