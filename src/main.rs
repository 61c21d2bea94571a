use log::{error, info};
use service::{config::Config, logging::Logger};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    let interface = config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{interface}:{}", config.port);

    let store = service::init_store(&config);
    let app_state = AppState::new(config, store.clone(), store.clone(), store);
    let router = web::router::define_routes(app_state);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {listen_addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error while running: {e}");
        std::process::exit(1);
    }
}
