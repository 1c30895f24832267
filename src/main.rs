use anyhow::Result;
use sixdegrees::directory::HttpDirectory;
use sixdegrees::server::HttpServer;
use sixdegrees::{Config, ConnectionService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    log::info!("Starting SixDegrees v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!(
        "Directory: {} / {}",
        config.directory.users_api,
        config.directory.friends_api
    );
    log::info!(
        "Search horizon: {} hops, page size {}",
        config.search.max_hops,
        config.search.page_size
    );

    let directory = Arc::new(HttpDirectory::new(
        &config.directory,
        config.search.page_size,
    ));
    let service = Arc::new(ConnectionService::new(directory, &config));

    let server = HttpServer::new(service, config.server.clone());
    server.run().await?;

    Ok(())
}
