mod health;
mod metrics;
mod predict;

use crate::{model_service::ModelService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/", get(health::root))
        .route("/healthcheck", get(health::healthcheck))
        .route("/predict", post(predict::predict::<M>))
        .route("/metrics", get(metrics::metrics_handler::<M>))
}
