use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::info;

use pod_storefront as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    // Vendor clients
    let printify = api::clients::PrintifyClient::new(&cfg.printify)?;
    let printful = api::clients::PrintfulClient::new(&cfg.printful)?;

    // Services
    let catalog = Arc::new(api::catalog::CatalogService::new(
        printify,
        printful.clone(),
    ));
    let storage = api::cart::CartStorage::new(&cfg.cart_storage_path);
    let cart = Arc::new(api::cart::CartService::new(storage, printful));

    let state = api::AppState {
        config: Arc::new(cfg.clone()),
        catalog,
        cart,
    };

    let app = api::app(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("pod-storefront listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
