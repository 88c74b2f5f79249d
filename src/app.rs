use crate::{
    config::Settings, inference_service::InferenceService, ort_service::OrtModelService,
    scaler::Scaler, server::HttpServer,
};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Settings) -> Result<(), Box<dyn Error>> {
    // A missing or corrupt artifact is logged and the service keeps running;
    // every predict call then fails with a server error until the artifacts
    // are fixed and the process restarted.
    let model = match OrtModelService::new(&config.model) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::error!("Failed to load classifier model: {:?}", e);
            None
        }
    };
    let scaler = match Scaler::from_file(&config.model.get_scaler_path()) {
        Ok(scaler) => {
            tracing::info!("Loaded feature scaler fit on {} features", scaler.len());
            Some(scaler)
        }
        Err(e) => {
            tracing::error!("Failed to load feature scaler: {:?}", e);
            None
        }
    };
    if model.is_some() && scaler.is_some() {
        tracing::info!("Model and scaler successfully loaded");
    }

    let inference_service = Arc::new(InferenceService::new(model, scaler));

    let server = HttpServer::new(inference_service, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
