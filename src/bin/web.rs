//! Single binary web server for the playoff bracket API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Set DATA_DIR to persist brackets as JSON files; otherwise they live in memory.

use actix_web::{web::Data, App, HttpServer};
use playoff_bracket::{api, BracketService, JsonFileStore, MemoryStore, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let service = match &config.data_dir {
        Some(dir) => {
            let store = JsonFileStore::open(dir)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            log::info!("Storing brackets in {}", dir.display());
            BracketService::new(store, config.save_retries)
        }
        None => {
            log::info!("Storing brackets in memory");
            BracketService::new(MemoryStore::new(), config.save_retries)
        }
    };
    let state = Data::new(service);

    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind(bind)?
        .run()
        .await
}
