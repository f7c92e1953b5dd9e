use std::sync::Arc;

use waypost::config::Config;
use waypost::engine::Engine;
use waypost::error::Error;
use waypost::external::openrouteservice::OpenRouteService;
use waypost::server::serve;
use waypost::table::AddressTable;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    tracing::info!("starting with {:?}", config);

    let table = AddressTable::load(&config.data_path)?;
    let routing = OpenRouteService::new(config.routing.clone())?;

    let engine = Engine::new(table, Arc::new(routing), config.routing.profile.clone())
        .with_session_ttl(config.session_ttl);

    serve(engine, config.listen_addr).await;

    Ok(())
}
