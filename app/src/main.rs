use tracing::{error, info};

mod ai;
mod auth;
mod config;
mod context;
mod error;
mod farm;
mod logging;
mod models;
mod rest;

#[tokio::main]
pub async fn main() {
    dotenv::dotenv().ok();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    logging::init(config.otel_stdout());
    info!("Starting elacare {}", elacare_core::CORE_VERSION);

    if let Err(err) = run(config).await {
        error!("{}", err);
        logging::shutdown();
        std::process::exit(1);
    }
    logging::shutdown();
}

async fn run(config: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let store = models::establish_datastore(config.database_url()).await?;
    let context = context::AppContext::new(config, store);
    let observer = farm::FarmObserver::new(context);

    rest::dispatch_server(observer, addr).await?;
    info!("Server stopped");
    Ok(())
}
