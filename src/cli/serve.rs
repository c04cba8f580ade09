use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    api::{self, ApiState},
    config::Settings,
    error, info,
    recommend::{RecommendationEngine, StrategyKind},
    server::RequestServer,
    spotify::{Catalog, CatalogClient},
    success, warning,
};

/// Command-line overrides for the `serve` command.
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub address: Option<String>,
    pub workers: Option<usize>,
    pub strategy: Option<StrategyKind>,
}

/// Runs the recommendation server until Ctrl-C.
pub async fn serve(overrides: ServeOverrides) {
    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    if let Some(address) = overrides.address {
        settings.server.address = address;
    }
    if let Some(workers) = overrides.workers.filter(|w| *w > 0) {
        settings.server.workers = workers;
    }
    let strategy = overrides.strategy.unwrap_or(settings.strategy);

    let client = match CatalogClient::new(settings.catalog.clone()) {
        Ok(client) => client,
        Err(e) => error!("Cannot build catalog client. Err: {}", e),
    };

    info!("Authenticating with Spotify API...");
    if let Err(e) = client.authenticate().await {
        error!("Authentication failed. Err: {}", e);
    }
    success!("Authenticated with Spotify API");

    let catalog: Arc<dyn Catalog> = Arc::new(client);
    let engine = Arc::new(RecommendationEngine::new(
        strategy.build(settings.server.pool_size),
        catalog,
    ));

    let server = match RequestServer::bind(settings.server.clone(), Arc::clone(&engine)).await {
        Ok(server) => server,
        Err(e) => error!(
            "Cannot bind {}. Err: {}",
            settings.server.address,
            e
        ),
    };

    let shutdown = CancellationToken::new();

    if let Some(address) = settings.health_address.clone() {
        let state = Arc::new(ApiState {
            engine: Arc::clone(&engine),
            stats: server.stats(),
            pool_size: settings.server.pool_size,
        });
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = api::start_api_server(&address, state, token).await {
                warning!("Health endpoint stopped. Err: {}", e);
            }
        });
    }

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                signal_token.cancel();
            }
            Err(e) => warning!("Cannot listen for Ctrl-C. Err: {}", e),
        }
    });

    if let Err(e) = server.run(shutdown.clone()).await {
        warning!("Server stopped with error: {}", e);
    }
    shutdown.cancel();
}
